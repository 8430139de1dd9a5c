use clap::Parser as _;

#[derive(clap::Parser)]
#[command(version, about = "Interactive client for the expression evaluation server")]
struct Arguments {
  #[clap(flatten)]
  arguments: reckon::ClientArguments,
  #[clap(flatten)]
  verbose: clap_verbosity_flag::Verbosity<clap_verbosity_flag::WarnLevel>,
}

fn main() -> anyhow::Result<()> {
  let arguments = Arguments::parse();

  let threshold = if arguments.arguments.debug {
    log::LevelFilter::Debug
  } else {
    arguments.verbose.log_level_filter()
  };
  log4rs::init_config(
    log4rs::config::Config::builder()
      .appender(
        log4rs::config::Appender::builder()
          .filter(Box::new(log4rs::filter::threshold::ThresholdFilter::new(
            threshold,
          )))
          .build(
            "console",
            Box::new(
              log4rs::append::console::ConsoleAppender::builder()
                .encoder(Box::new(log4rs::encode::pattern::PatternEncoder::new(
                  "{d(%F %T)} {l} {t} - {m}{n}",
                )))
                .build(),
            ),
          ),
      )
      .build(
        log4rs::config::Root::builder()
          .appender("console")
          .build(log::LevelFilter::Trace),
      )?,
  )?;

  let lifecycle = reckon::signal::Lifecycle::new();
  lifecycle.install_client()?;

  reckon::client::run(&arguments.arguments, &lifecycle)
}
