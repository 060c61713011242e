use super::*;

#[derive(Debug, Parser)]
#[clap(version, about = "Identify the dish in a photo")]
pub(crate) struct Arguments {
  #[clap(short, long, global = true, help = "Enable debug logging")]
  verbose: bool,
  #[clap(short, long, global = true, help = "Read settings from a JSON file")]
  config: Option<PathBuf>,
  #[clap(subcommand)]
  subcommand: Subcommand,
}

impl Arguments {
  pub(crate) fn run(self) -> Result {
    logging::init(self.verbose)?;

    let config = match &self.config {
      Some(path) => Config::load(path).with_context(|| {
        format!("failed to load settings from {}", path.display())
      })?,
      None => Config::default(),
    };

    self.subcommand.run(config)
  }
}
