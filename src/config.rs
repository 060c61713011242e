use super::*;

pub(crate) const DEFAULT_INPUT_SIZE: u32 = 192;
pub(crate) const DEFAULT_OUTPUT_SIZE: usize = 2024;
pub(crate) const DEFAULT_MODEL_NAME: &str = "Dish-Identifier";

/// On-disk form of a model artifact. Unknown fields, such as a training
/// learning rate, are ignored.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SerializableNetworkConfig {
  weight_input_hidden: Vec<f64>,
  weight_hidden_output: Vec<f64>,
  input_hidden_shape: (usize, usize),
  hidden_output_shape: (usize, usize),
}

#[derive(Clone, Debug)]
pub(crate) struct NetworkConfig {
  pub(crate) weight_input_hidden: Array2<f64>,
  pub(crate) weight_hidden_output: Array2<f64>,
}

impl NetworkConfig {
  pub(crate) fn random(
    input_size: u32,
    hidden: usize,
    output_size: usize,
  ) -> Self {
    let input_len = input_len(input_size);

    Self {
      weight_input_hidden: Array2::random(
        (hidden, input_len),
        Uniform::new(-0.1, 0.1),
      ),
      weight_hidden_output: Array2::random(
        (output_size, hidden),
        Uniform::new(-0.1, 0.1),
      ),
    }
  }
}

impl From<NetworkConfig> for SerializableNetworkConfig {
  fn from(config: NetworkConfig) -> Self {
    Self {
      input_hidden_shape: config.weight_input_hidden.dim(),
      hidden_output_shape: config.weight_hidden_output.dim(),
      weight_input_hidden: config
        .weight_input_hidden
        .into_raw_vec_and_offset()
        .0,
      weight_hidden_output: config
        .weight_hidden_output
        .into_raw_vec_and_offset()
        .0,
    }
  }
}

impl TryFrom<SerializableNetworkConfig> for NetworkConfig {
  type Error = Error;

  fn try_from(config: SerializableNetworkConfig) -> Result<Self, Error> {
    let (hidden, _) = config.input_hidden_shape;
    let (_, hidden_in) = config.hidden_output_shape;

    if hidden != hidden_in {
      return Err(Error::Provision(format!(
        "hidden layer mismatch: input layer has {hidden} units, \
         output layer expects {hidden_in}"
      )));
    }

    let shape_error = |error: ndarray::ShapeError| {
      Error::Provision(format!("malformed weight matrix: {error}"))
    };

    Ok(Self {
      weight_input_hidden: Array2::from_shape_vec(
        config.input_hidden_shape,
        config.weight_input_hidden,
      )
      .map_err(shape_error)?,
      weight_hidden_output: Array2::from_shape_vec(
        config.hidden_output_shape,
        config.weight_hidden_output,
      )
      .map_err(shape_error)?,
    })
  }
}

/// Length of a preprocessed buffer for a square input of `input_size`.
pub(crate) fn input_len(input_size: u32) -> usize {
  let edge = input_size as usize;
  edge * edge * 3
}

/// Runtime settings, read from an optional JSON file and overridden by flags.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Config {
  pub(crate) input_size: u32,
  pub(crate) output_size: usize,
  pub(crate) labels: PathBuf,
  pub(crate) model_name: String,
  pub(crate) registry: Option<PathBuf>,
  pub(crate) cache: PathBuf,
  pub(crate) bundled_model: Option<PathBuf>,
  pub(crate) require_wifi: bool,
  pub(crate) download_type: DownloadType,
  pub(crate) score_interpretation: ScoreInterpretation,
  pub(crate) strict_labels: bool,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      input_size: DEFAULT_INPUT_SIZE,
      output_size: DEFAULT_OUTPUT_SIZE,
      labels: PathBuf::from("food_names.csv"),
      model_name: DEFAULT_MODEL_NAME.into(),
      registry: None,
      cache: PathBuf::from(".dish-id/models"),
      bundled_model: None,
      require_wifi: true,
      download_type: DownloadType::LocalModelUpdateInBackground,
      score_interpretation: ScoreInterpretation::Signed,
      strict_labels: false,
    }
  }
}

impl Config {
  pub(crate) fn load(path: &Path) -> Result<Self, Error> {
    let file = File::open(path)?;
    let config: Self = serde_json::from_reader(BufReader::new(file))?;
    config.validate()?;
    Ok(config)
  }

  pub(crate) fn validate(&self) -> Result<(), Error> {
    if self.input_size == 0 {
      return Err(Error::Config("input_size must be at least 1".into()));
    }

    if self.output_size == 0 {
      return Err(Error::Config("output_size must be at least 1".into()));
    }

    Ok(())
  }

  pub(crate) fn conditions(&self) -> DownloadConditions {
    let conditions = DownloadConditions::default();

    if self.require_wifi {
      conditions.require_wifi()
    } else {
      conditions
    }
  }

  /// Where the model comes from: the registry when one is configured, the
  /// bundled asset otherwise, or the registry backed by the bundled asset.
  pub(crate) fn model_source(&self) -> Result<ModelSource, Error> {
    let remote = self.registry.as_ref().map(|registry| ModelSource::Remote {
      name: self.model_name.clone(),
      registry: registry.clone(),
      cache: self.cache.clone(),
      download_type: self.download_type,
      conditions: self.conditions(),
    });

    match (remote, &self.bundled_model) {
      (Some(remote), Some(bundled)) => Ok(ModelSource::RemoteWithFallback {
        remote: Box::new(remote),
        bundled: bundled.clone(),
      }),
      (Some(remote), None) => Ok(remote),
      (None, Some(bundled)) => Ok(ModelSource::Bundled(bundled.clone())),
      (None, None) => Err(Error::Config(
        "no model source: set a registry or a bundled model".into(),
      )),
    }
  }
}
