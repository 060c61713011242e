use super::*;

#[derive(Debug, Parser)]
pub(crate) struct InitModel {
  #[clap(short, long, default_value = "model.json")]
  output: PathBuf,
  #[clap(long, default_value_t = DEFAULT_INPUT_SIZE)]
  input_size: u32,
  #[clap(long, default_value_t = DEFAULT_OUTPUT_SIZE)]
  output_size: usize,
  #[clap(long, default_value = "16")]
  hidden: usize,
}

impl InitModel {
  pub(crate) fn run(self) -> Result {
    if self.input_size == 0 || self.output_size == 0 || self.hidden == 0 {
      bail!("model dimensions must be at least 1");
    }

    let network = Network::new(NetworkConfig::random(
      self.input_size,
      self.hidden,
      self.output_size,
    ));

    network
      .save_weights(&self.output)
      .context("failed to save model")?;

    info!(
      inputs = network.input_len(),
      hidden = self.hidden,
      outputs = network.output_len(),
      "initialized model"
    );

    println!("Saved model to {}", self.output.display());

    Ok(())
  }
}
