// A networked calculator: `reckond` serves IEEE-754 evaluations of infix
// expressions over a small length-framed TCP protocol, `reckon` is the
// interactive client. Requests are independent; the only session state is
// the TCP stream itself.

pub mod client;
pub mod eval;
pub mod format;
mod func;
pub mod net;
pub mod server;
pub mod signal;
pub mod wire;

#[derive(clap::Args, Debug)]
#[group(skip)]
pub struct ServerArguments {
  #[arg(
    short = 'p',
    long = "port",
    help = "Port number or service name",
    default_value_t = String::from("12345")
  )]
  pub port: String,
  #[arg(
    short = 'd',
    long = "digit",
    help = "Significant digits of the results",
    default_value_t = format::DEFAULT_DIGITS as i64
  )]
  pub digit: i64,
  #[arg(short = 'g', long = "debug", help = "Log frames", default_value_t = false)]
  pub debug: bool,
}

#[derive(clap::Args, Debug)]
#[group(skip)]
pub struct ClientArguments {
  #[arg(
    short = 'i',
    long = "ipaddress",
    help = "Server host name or address",
    default_value_t = String::from("127.0.0.1")
  )]
  pub ipaddress: String,
  #[arg(
    short = 'p',
    long = "port",
    help = "Port number or service name",
    default_value_t = String::from("12345")
  )]
  pub port: String,
  #[arg(
    short = 't',
    long = "time",
    help = "Print per-request timing on stderr",
    default_value_t = false
  )]
  pub time: bool,
  #[arg(short = 'g', long = "debug", help = "Log frames", default_value_t = false)]
  pub debug: bool,
}
