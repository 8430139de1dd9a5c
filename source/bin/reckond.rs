use clap::Parser as _;
use std::{env, os::unix::process::CommandExt as _, path, process};

#[derive(clap::Parser)]
#[command(version, about = "Expression evaluation server")]
struct Arguments {
  #[clap(flatten)]
  arguments: reckon::ServerArguments,
  #[arg(long = "log-directory", help = "Also log to a file under this directory")]
  log_directory: Option<String>,
  #[clap(flatten)]
  verbose: clap_verbosity_flag::Verbosity<clap_verbosity_flag::InfoLevel>,
}

fn main() -> anyhow::Result<()> {
  let arguments = Arguments::parse();

  let threshold = if arguments.arguments.debug {
    log::LevelFilter::Debug
  } else {
    arguments.verbose.log_level_filter()
  };
  init_logging(threshold, &arguments.log_directory)?;

  let lifecycle = reckon::signal::Lifecycle::new();
  lifecycle.install_server()?;

  reckon::server::run(&arguments.arguments, &lifecycle)?;

  if lifecycle.reload() {
    // Serve again with a fresh image, original arguments and environment.
    let mut argv = env::args_os();
    let program = argv.next().unwrap_or_else(|| "reckond".into());
    log::info!("re-executing {program:?}");
    // exec only ever returns on failure.
    return Err(process::Command::new(program).args(argv).exec().into());
  }
  Ok(())
}

fn init_logging(threshold: log::LevelFilter, directory: &Option<String>) -> anyhow::Result<()> {
  let encoder = Box::new(log4rs::encode::pattern::PatternEncoder::new(
    "{d(%F %T)} {l} {t} - {m}{n}",
  ));
  let mut config = log4rs::config::Config::builder().appender(
    log4rs::config::Appender::builder()
      .filter(Box::new(log4rs::filter::threshold::ThresholdFilter::new(
        threshold,
      )))
      .build(
        "console",
        Box::new(
          log4rs::append::console::ConsoleAppender::builder()
            .encoder(encoder.clone())
            .build(),
        ),
      ),
  );
  let mut root = log4rs::config::Root::builder().appender("console");
  if let Some(directory) = directory {
    config = config.appender(
      log4rs::config::Appender::builder()
        .filter(Box::new(log4rs::filter::threshold::ThresholdFilter::new(
          log::LevelFilter::Trace,
        )))
        .build(
          "file",
          Box::new(
            log4rs::append::file::FileAppender::builder()
              .encoder(encoder)
              .build(path::Path::new(directory).join("reckond.log"))?,
          ),
        ),
    );
    root = root.appender("file");
  }
  log4rs::init_config(config.build(root.build(log::LevelFilter::Trace))?)?;
  Ok(())
}
