use super::*;

/// Dense two-layer classifier reading raw RGB bytes and emitting one quantized
/// confidence per class.
#[derive(Clone, Debug)]
pub(crate) struct Network {
  config: NetworkConfig,
}

impl Network {
  pub(crate) fn new(config: NetworkConfig) -> Self {
    Self { config }
  }

  pub(crate) fn forward(&self, input: ArrayView1<f64>) -> Array1<f64> {
    let hidden = self.config.weight_input_hidden.dot(&input).mapv(relu);
    self.config.weight_hidden_output.dot(&hidden).mapv(sigmoid)
  }

  pub(crate) fn save_weights(&self, path: &Path) -> Result {
    let serializable_config: SerializableNetworkConfig =
      self.config.clone().into();

    let file = File::create(path).context("failed to create model file")?;

    serde_json::to_writer(file, &serializable_config)
      .context("failed to serialize model weights")?;

    Ok(())
  }

  pub(crate) fn load_weights(path: &Path) -> Result<Self, Error> {
    let file = File::open(path).map_err(|error| {
      Error::Provision(format!("failed to open {}: {error}", path.display()))
    })?;

    let serializable_config: SerializableNetworkConfig =
      serde_json::from_reader(BufReader::new(file)).map_err(|error| {
        Error::Provision(format!(
          "failed to deserialize {}: {error}",
          path.display()
        ))
      })?;

    let network = Self::new(NetworkConfig::try_from(serializable_config)?);

    debug!(
      path = %path.display(),
      inputs = network.input_len(),
      outputs = network.output_len(),
      "loaded model weights"
    );

    Ok(network)
  }
}

impl Engine for Network {
  fn input_len(&self) -> usize {
    self.config.weight_input_hidden.ncols()
  }

  fn output_len(&self) -> usize {
    self.config.weight_hidden_output.nrows()
  }

  fn run(&self, input: &[u8], output: &mut [u8]) -> Result<(), Error> {
    if input.len() != self.input_len() || output.len() != self.output_len() {
      return Err(Error::Inference(format!(
        "tensor shape mismatch: got {}->{}, model is {}->{}",
        input.len(),
        output.len(),
        self.input_len(),
        self.output_len()
      )));
    }

    let input = input.iter().copied().map(dequantize).collect::<Array1<f64>>();

    let probabilities = self.forward(input.view());

    for (slot, &probability) in output.iter_mut().zip(probabilities.iter()) {
      *slot = quantize(probability);
    }

    Ok(())
  }
}
