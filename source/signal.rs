use signal_hook::{consts, flag};
use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

/// Cooperative lifecycle flags. Only signal handlers (or tests) write; the
/// accept loop, the workers and the client loop poll between frames.
#[derive(Clone, Debug, Default)]
pub struct Lifecycle {
  shutdown: Arc<AtomicBool>,
  reload: Arc<AtomicBool>,
}

impl Lifecycle {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn shutdown(&self) -> bool {
    self.shutdown.load(Ordering::Relaxed)
  }

  pub fn reload(&self) -> bool {
    self.reload.load(Ordering::Relaxed)
  }

  pub fn request_shutdown(&self) {
    self.shutdown.store(true, Ordering::Relaxed);
  }

  /// Server handlers: INT, TERM and QUIT stop the accept loop; HUP stops it
  /// and marks the process for re-execution. SIGALRM, SIGUSR1/2 and
  /// SIGTT{IN,OU} must not keep their disruptive default disposition, so
  /// they are pointed at a flag nobody reads. SIGPIPE is already ignored by
  /// the Rust runtime and a failed send surfaces as a plain I/O error.
  pub fn install_server(&self) -> anyhow::Result<()> {
    for signal in [consts::SIGINT, consts::SIGTERM, consts::SIGQUIT, consts::SIGHUP] {
      flag::register(signal, Arc::clone(&self.shutdown))?;
    }
    flag::register(consts::SIGHUP, Arc::clone(&self.reload))?;
    let ignored = Arc::new(AtomicBool::new(false));
    for signal in [
      consts::SIGALRM,
      consts::SIGUSR1,
      consts::SIGUSR2,
      consts::SIGTTIN,
      consts::SIGTTOU,
    ] {
      flag::register(signal, Arc::clone(&ignored))?;
    }
    Ok(())
  }

  /// Client handlers: INT, TERM and QUIT end the session.
  pub fn install_client(&self) -> anyhow::Result<()> {
    for signal in [consts::SIGINT, consts::SIGTERM, consts::SIGQUIT] {
      flag::register(signal, Arc::clone(&self.shutdown))?;
    }
    Ok(())
  }
}
