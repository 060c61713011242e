use super::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum Connectivity {
  Wifi,
  Cellular,
  Offline,
}

pub(crate) trait NetworkMonitor: Send + Sync {
  fn connectivity(&self) -> Connectivity;
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct FixedNetwork(pub(crate) Connectivity);

impl NetworkMonitor for FixedNetwork {
  fn connectivity(&self) -> Connectivity {
    self.0
  }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct DownloadConditions {
  wifi: bool,
}

impl DownloadConditions {
  pub(crate) fn require_wifi(mut self) -> Self {
    self.wifi = true;
    self
  }

  pub(crate) fn wifi_required(&self) -> bool {
    self.wifi
  }

  pub(crate) fn permits(&self, connectivity: Connectivity) -> bool {
    match connectivity {
      Connectivity::Wifi => true,
      Connectivity::Cellular => !self.wifi,
      Connectivity::Offline => false,
    }
  }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum DownloadType {
  /// Cached copy if present, otherwise download.
  LocalModel,
  /// Cached copy if present and refresh it in the background, otherwise
  /// download.
  #[default]
  LocalModelUpdateInBackground,
  /// Download when permitted, falling back to the cached copy.
  LatestModel,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct CustomModel {
  pub(crate) name: String,
  pub(crate) file: PathBuf,
}

#[derive(Debug)]
pub(crate) struct Download {
  pub(crate) model: CustomModel,
  /// Pending refresh of the cached copy, if one was started.
  pub(crate) refresh: Option<JoinHandle<Result<CustomModel, Error>>>,
}

/// Fetches named models from a registry directory into a local cache.
#[derive(Clone)]
pub(crate) struct Downloader {
  registry: PathBuf,
  cache: PathBuf,
  network: Arc<dyn NetworkMonitor>,
}

impl Downloader {
  pub(crate) fn new(
    registry: impl Into<PathBuf>,
    cache: impl Into<PathBuf>,
    network: Arc<dyn NetworkMonitor>,
  ) -> Self {
    Self {
      registry: registry.into(),
      cache: cache.into(),
      network,
    }
  }

  fn cached(&self, name: &str) -> Option<CustomModel> {
    let file = self.cache.join(format!("{name}.json"));

    file.is_file().then(|| CustomModel {
      name: name.into(),
      file,
    })
  }

  pub(crate) fn get_model(
    &self,
    name: &str,
    download_type: DownloadType,
    conditions: DownloadConditions,
  ) -> Result<Download, Error> {
    let connectivity = self.network.connectivity();
    let permitted = conditions.permits(connectivity);
    let cached = self.cached(name);

    debug!(
      model = name,
      ?download_type,
      ?connectivity,
      wifi_required = conditions.wifi_required(),
      permitted,
      cached = cached.is_some(),
      "resolving model"
    );

    let model = match (download_type, cached) {
      (DownloadType::LocalModel, Some(model)) => model,
      (DownloadType::LocalModelUpdateInBackground, Some(model)) => {
        let refresh = permitted.then(|| self.refresh(name));

        return Ok(Download { model, refresh });
      }
      (DownloadType::LatestModel, Some(model)) if !permitted => {
        warn!(
          model = name,
          ?connectivity,
          "download conditions not met, using cached model"
        );
        model
      }
      (_, _) if !permitted => {
        return Err(Error::Provision(format!(
          "download conditions not met for `{name}` ({connectivity:?}) \
           and no cached copy exists"
        )));
      }
      (_, _) => self.download(name)?,
    };

    Ok(Download {
      model,
      refresh: None,
    })
  }

  fn refresh(&self, name: &str) -> JoinHandle<Result<CustomModel, Error>> {
    let downloader = self.clone();
    let name = name.to_owned();

    thread::spawn(move || {
      downloader.download(&name).inspect_err(|error| {
        error!(model = %name, %error, "background model refresh failed");
      })
    })
  }

  /// Copies the registry's artifact into the cache through a temporary file,
  /// so the cached copy is either the old or the new model.
  pub(crate) fn download(&self, name: &str) -> Result<CustomModel, Error> {
    let source = self.registry.join(format!("{name}.json"));

    if !source.is_file() {
      return Err(Error::Provision(format!(
        "model `{name}` not found in registry {}",
        self.registry.display()
      )));
    }

    fs::create_dir_all(&self.cache)?;

    let file = self.cache.join(format!("{name}.json"));
    let partial = self.cache.join(format!("{name}.json.partial"));

    let bytes = fs::copy(&source, &partial)
      .and_then(|bytes| fs::rename(&partial, &file).map(|()| bytes))
      .inspect_err(|_| {
        let _ = fs::remove_file(&partial);
      })?;

    info!(model = name, bytes, path = %file.display(), "downloaded model");

    Ok(CustomModel {
      name: name.into(),
      file,
    })
  }
}
