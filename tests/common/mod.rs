use std::{net, thread, time};

/// One in-process server plus the knobs the tests poke at.
pub struct Runner {
  port: u16,
  lifecycle: reckon::signal::Lifecycle,
  server: Option<thread::JoinHandle<anyhow::Result<()>>>,
}

impl Runner {
  pub fn connect(&self) -> net::TcpStream {
    net::TcpStream::connect(("127.0.0.1", self.port)).unwrap()
  }

  /// One request/response round trip on an established connection.
  pub fn request(&self, stream: &mut net::TcpStream, expression: &str) -> String {
    reckon::wire::write_frame(stream, expression.as_bytes()).unwrap();
    let payload = reckon::wire::read_frame(stream).unwrap().unwrap();
    String::from_utf8(payload).unwrap()
  }
}

impl Drop for Runner {
  fn drop(&mut self) {
    self.lifecycle.request_shutdown();
    if let Some(server) = self.server.take() {
      server.join().unwrap().unwrap();
    }
  }
}

pub fn setup<B>(body: B)
where
  B: FnOnce(&Runner),
{
  let port = portpicker::pick_unused_port().unwrap();
  let lifecycle = reckon::signal::Lifecycle::new();
  let arguments = reckon::ServerArguments {
    port: port.to_string(),
    digit: 12,
    debug: false,
  };
  let server = {
    let lifecycle = lifecycle.clone();
    thread::spawn(move || reckon::server::run(&arguments, &lifecycle))
  };
  log::debug!("waiting for the server to be ready...");
  while let Err(error) = net::TcpStream::connect(("127.0.0.1", port)) {
    log::trace!("error while waiting for the server to be ready: {error}");
    thread::sleep(time::Duration::from_millis(50));
  }
  log::debug!("server ready");
  let runner = Runner {
    port,
    lifecycle,
    server: Some(server),
  };
  body(&runner);
}
