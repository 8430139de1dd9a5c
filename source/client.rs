use crate::{net, signal, wire, ClientArguments};
use anyhow::Context as _;
use nix::poll::{PollFd, PollFlags};
use std::{
  io::{self, BufRead as _, Write as _},
  net::TcpStream,
  os::fd::AsFd as _,
  time,
};

// Multiplex tick, in milliseconds; bounds how stale the shutdown flag can
// get while both descriptors are quiet.
const TICK: u16 = 1000;

#[derive(Debug, PartialEq)]
enum Line<'input> {
  Empty,
  Quit,
  Expression(&'input str),
}

// `quit` and `exit` end the session, but only bare: anything else goes to
// the server as an expression.
fn classify(line: &str) -> Line {
  match line.trim_end_matches(['\n', '\r']) {
    "" => Line::Empty,
    "quit" | "exit" => Line::Quit,
    expression => Line::Expression(expression),
  }
}

/// Connects and interleaves lines from standard input with response frames
/// from the server until `quit`, `exit`, end of input or a signal.
pub fn run(arguments: &ClientArguments, lifecycle: &signal::Lifecycle) -> anyhow::Result<()> {
  let port = net::resolve_port(&arguments.port)?;
  let stream = net::connect(&arguments.ipaddress, port)?;
  session(&stream, arguments.time, lifecycle)
}

fn session(stream: &TcpStream, timing: bool, lifecycle: &signal::Lifecycle) -> anyhow::Result<()> {
  let stdin = io::stdin();
  let mut input = io::BufReader::new(stdin.lock());
  let mut socket = stream;
  // Departure time of the request in flight, for --time.
  let mut sent = None;

  while !lifecycle.shutdown() {
    let mut descriptors = [
      PollFd::new(stdin.as_fd(), PollFlags::POLLIN),
      PollFd::new(stream.as_fd(), PollFlags::POLLIN),
    ];
    match nix::poll::poll(&mut descriptors, TICK) {
      Ok(0) => continue,
      Ok(_) => (),
      Err(nix::errno::Errno::EINTR) => continue,
      Err(error) => Err(error).context("poll")?,
    }
    let ready = |index: usize| {
      descriptors[index]
        .revents()
        .unwrap_or(PollFlags::empty())
        .intersects(PollFlags::POLLIN | PollFlags::POLLHUP)
    };

    if ready(0) {
      // One line per readiness, plus whatever the reader already buffered
      // past the line it was woken for.
      loop {
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
          return Ok(());
        }
        match classify(&line) {
          Line::Empty => (),
          Line::Quit => return Ok(()),
          Line::Expression(expression) => {
            sent = Some(time::Instant::now());
            wire::write_frame(&mut socket, expression.as_bytes())?;
          }
        }
        if input.buffer().is_empty() {
          break;
        }
      }
    }

    if ready(1) {
      match wire::read_frame(&mut socket)? {
        Some(payload) => {
          if let Some(departed) = sent.take() {
            if timing {
              eprintln!("time: {:.6} sec", departed.elapsed().as_secs_f64());
            }
          }
          let mut stdout = io::stdout().lock();
          stdout.write_all(&payload)?;
          stdout.write_all(b"\n")?;
          stdout.flush()?;
        }
        None => {
          log::info!("server closed the connection");
          return Ok(());
        }
      }
    }
  }
  Ok(())
}
