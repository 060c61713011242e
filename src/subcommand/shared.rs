use super::*;

/// Flags shared by every subcommand that runs the pipeline. Each one
/// overrides the matching settings file value.
#[derive(Debug, Args)]
pub(crate) struct ModelArguments {
  #[clap(short, long, help = "Bundled model artifact")]
  model: Option<PathBuf>,
  #[clap(long, help = "Registry directory to download the model from")]
  registry: Option<PathBuf>,
  #[clap(long, help = "Directory holding downloaded models")]
  cache: Option<PathBuf>,
  #[clap(long, help = "Name of the model in the registry")]
  model_name: Option<String>,
  #[clap(short, long, help = "Comma-delimited label resource")]
  labels: Option<PathBuf>,
  #[clap(long, value_enum, default_value = "wifi")]
  network: Connectivity,
  #[clap(long, help = "Allow downloads over cellular connections")]
  allow_cellular: bool,
  #[clap(long, help = "Rank scores as unsigned bytes")]
  unsigned: bool,
  #[clap(long, help = "Require one label per model output")]
  strict_labels: bool,
}

impl ModelArguments {
  fn apply(&self, config: &mut Config) {
    if let Some(model) = &self.model {
      config.bundled_model = Some(model.clone());
    }

    if let Some(registry) = &self.registry {
      config.registry = Some(registry.clone());
    }

    if let Some(cache) = &self.cache {
      config.cache = cache.clone();
    }

    if let Some(model_name) = &self.model_name {
      config.model_name = model_name.clone();
    }

    if let Some(labels) = &self.labels {
      config.labels = labels.clone();
    }

    if self.allow_cellular {
      config.require_wifi = false;
    }

    if self.unsigned {
      config.score_interpretation = ScoreInterpretation::Unsigned;
    }

    if self.strict_labels {
      config.strict_labels = true;
    }
  }

  /// Starts provisioning in the background, loads labels meanwhile, and
  /// waits for provisioning to settle before handing back the pipeline.
  pub(crate) fn pipeline(&self, mut config: Config) -> Result<Pipeline> {
    self.apply(&mut config);

    config.validate()?;

    let source = config.model_source()?;

    debug!(?source, "provisioning model");

    let model = ModelSlot::new();

    let provisioning = Provisioner::new(Arc::new(FixedNetwork(self.network)))
      .spawn(model.clone(), source);

    let labels = LabelTable::load(&config.labels);

    if provisioning.join().is_err() {
      model.settle();
      bail!("model provisioning panicked");
    }

    debug!(state = ?model.state(), "provisioning settled");

    let pipeline = labels
      .with_context(|| {
        format!("failed to load labels from {}", config.labels.display())
      })
      .and_then(|labels| {
        Ok(Pipeline::new(&config, labels, model.clone())?)
      });

    if pipeline.is_err() {
      model.settle();
    }

    pipeline
  }
}
