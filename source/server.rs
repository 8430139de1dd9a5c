use crate::{eval, format, net, signal, wire, ServerArguments};
use anyhow::Context as _;
use nix::poll::{PollFd, PollFlags};
use std::{
  io::{self, Read as _, Write},
  net::{SocketAddr, TcpStream},
  os::fd::AsFd as _,
  thread, time,
};

// How long a worker blocks in a read before re-checking the shutdown flag.
const READ_TIMEOUT: time::Duration = time::Duration::from_secs(1);
// Accept-loop tick, in milliseconds; bounds how stale the flag can get.
const ACCEPT_TIMEOUT: u16 = 1000;

/// Binds the listener and serves until shutdown is requested. Each accepted
/// connection gets a detached worker that owns its socket for the session's
/// lifetime.
pub fn run(arguments: &ServerArguments, lifecycle: &signal::Lifecycle) -> anyhow::Result<()> {
  let port = net::resolve_port(&arguments.port)?;
  let digits = format::clamp_digits(arguments.digit);
  let listener = net::listen(port)?;
  listener.set_nonblocking(true)?;
  log::info!("listening on port {port}, {digits} significant digit(s)");

  while !lifecycle.shutdown() {
    let mut descriptors = [PollFd::new(listener.as_fd(), PollFlags::POLLIN)];
    match nix::poll::poll(&mut descriptors, ACCEPT_TIMEOUT) {
      // Timeout; go re-check the flag.
      Ok(0) => continue,
      Ok(_) => (),
      // A signal interrupted the wait, same thing.
      Err(nix::errno::Errno::EINTR) => continue,
      Err(error) => Err(error).context("poll")?,
    }
    match listener.accept() {
      Ok((stream, peer)) => spawn(stream, peer, digits, lifecycle.clone()),
      // Someone else won the race for the connection.
      Err(error) if error.kind() == io::ErrorKind::WouldBlock => continue,
      Err(error) => log::error!("accept: {error}"),
    }
  }
  log::info!("no longer accepting connections");
  Ok(())
}

fn spawn(stream: TcpStream, peer: SocketAddr, digits: u32, lifecycle: signal::Lifecycle) {
  log::info!("connection from {peer}");
  let spawned = thread::Builder::new()
    .name(format!("session-{peer}"))
    .spawn(move || match session(&stream, digits, &lifecycle) {
      Ok(()) => log::info!("{peer} done"),
      Err(error) => log::warn!("{peer}: {error:#}"),
    });
  if let Err(error) = spawned {
    log::error!("couldn't spawn a worker for {peer}: {error}");
  }
}

/// One request/response loop. Every request gets a fresh evaluation; errors
/// inside an expression only ever cost that request, while frame-level
/// damage ends the session.
fn session(
  stream: &TcpStream,
  digits: u32,
  lifecycle: &signal::Lifecycle,
) -> anyhow::Result<()> {
  // Accepted sockets may inherit the listener's non-blocking mode on some
  // systems; the workers want blocking reads with a timeout.
  stream.set_nonblocking(false)?;
  stream.set_read_timeout(Some(READ_TIMEOUT))?;
  let mut stream = Interruptible { stream, lifecycle };
  loop {
    let request = match wire::read_frame(&mut stream) {
      Ok(Some(request)) => request,
      // The peer closed between frames.
      Ok(None) => return Ok(()),
      Err(error) if error.kind() == io::ErrorKind::TimedOut && lifecycle.shutdown() => {
        return Ok(())
      }
      Err(error) => return Err(error.into()),
    };
    let response = eval::answer(&request, digits);
    wire::write_frame(&mut stream, response.as_bytes())?;
  }
}

// Turns the socket's read timeout into cooperative cancellation: timeouts
// loop back into the read unless shutdown was requested meanwhile.
struct Interruptible<'a> {
  stream: &'a TcpStream,
  lifecycle: &'a signal::Lifecycle,
}

impl io::Read for Interruptible<'_> {
  fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
    loop {
      match self.stream.read(buffer) {
        Err(error)
          if matches!(
            error.kind(),
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
          ) =>
        {
          if self.lifecycle.shutdown() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "shutting down"));
          }
        }
        result => return result,
      }
    }
  }
}

impl io::Write for Interruptible<'_> {
  fn write(&mut self, buffer: &[u8]) -> io::Result<usize> {
    self.stream.write(buffer)
  }

  fn flush(&mut self) -> io::Result<()> {
    self.stream.flush()
  }
}
