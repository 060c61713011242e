use {
  super::*,
  tracing_subscriber::{fmt, prelude::*, EnvFilter},
};

/// Installs a stderr subscriber. `RUST_LOG` wins over `verbose` when set.
pub(crate) fn init(verbose: bool) -> Result {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
    EnvFilter::new(if verbose { "debug" } else { "info" })
  });

  tracing_subscriber::registry()
    .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
    .with(filter)
    .try_init()
    .context("failed to initialize logger")?;

  Ok(())
}
