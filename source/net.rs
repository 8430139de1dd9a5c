use anyhow::Context as _;
use nix::sys::socket::{self, sockopt, AddressFamily, Backlog, SockFlag, SockType, SockaddrIn};
use std::{
  fs, net,
  net::ToSocketAddrs as _,
  os::fd::AsRawFd as _,
};

/// Turns a port argument into a number: either a decimal port or a tcp
/// service name from /etc/services. 0 and 65535 are out of range.
pub fn resolve_port(spec: &str) -> anyhow::Result<u16> {
  if spec.bytes().all(|byte| byte.is_ascii_digit()) {
    let port: u32 = spec.parse().with_context(|| format!("invalid port {spec}"))?;
    anyhow::ensure!((1..=65534).contains(&port), "port {port} out of range");
    return Ok(port as u16);
  }
  let services = fs::read_to_string("/etc/services").context("/etc/services")?;
  service_port(&services, spec).with_context(|| format!("unknown service {spec}"))
}

fn service_port(services: &str, name: &str) -> anyhow::Result<u16> {
  for line in services.lines() {
    let line = line.split('#').next().unwrap_or("");
    let mut fields = line.split_whitespace();
    let service = match fields.next() {
      Some(service) => service,
      None => continue,
    };
    let (port, protocol) = match fields.next().and_then(|field| field.split_once('/')) {
      Some(split) => split,
      None => continue,
    };
    if protocol == "tcp" && (service == name || fields.any(|alias| alias == name)) {
      return Ok(port.parse()?);
    }
  }
  anyhow::bail!("no tcp entry")
}

/// Listening socket on INADDR_ANY with address-reuse enabled before the bind
/// and the longest backlog the system offers.
pub fn listen(port: u16) -> anyhow::Result<net::TcpListener> {
  let socket = socket::socket(AddressFamily::Inet, SockType::Stream, SockFlag::empty(), None)?;
  socket::setsockopt(&socket, sockopt::ReuseAddr, &true)?;
  socket::bind(socket.as_raw_fd(), &SockaddrIn::new(0, 0, 0, 0, port))
    .with_context(|| format!("couldn't bind port {port}"))?;
  socket::listen(&socket, Backlog::MAXCONN)?;
  Ok(net::TcpListener::from(socket))
}

/// Connects to the first address `host` resolves to.
pub fn connect(host: &str, port: u16) -> anyhow::Result<net::TcpStream> {
  let address = (host, port)
    .to_socket_addrs()?
    .next()
    .with_context(|| format!("couldn't resolve {host}:{port}"))?;
  log::debug!("connecting to {address:?}");
  net::TcpStream::connect(address).with_context(|| format!("couldn't connect to {address}"))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn numeric_ports() {
    assert_eq!(12345, resolve_port("12345").unwrap());
    assert_eq!(1, resolve_port("1").unwrap());
    assert_eq!(65534, resolve_port("65534").unwrap());
    assert!(resolve_port("0").is_err());
    assert!(resolve_port("65535").is_err());
    assert!(resolve_port("123456789").is_err());
  }

  #[test]
  fn service_names() {
    let services = "# comment\n\
                    http  80/tcp  www   # hypertext\n\
                    ntp   123/udp\n\
                    smtp  25/tcp  mail\n";
    assert_eq!(80, service_port(services, "http").unwrap());
    assert_eq!(80, service_port(services, "www").unwrap());
    assert_eq!(25, service_port(services, "mail").unwrap());
    // udp entries don't count.
    assert!(service_port(services, "ntp").is_err());
    assert!(service_port(services, "gopher").is_err());
  }
}
