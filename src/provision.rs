use super::*;

/// Where a model artifact is obtained from.
#[derive(Clone, Debug)]
pub(crate) enum ModelSource {
  Bundled(PathBuf),
  Remote {
    name: String,
    registry: PathBuf,
    cache: PathBuf,
    download_type: DownloadType,
    conditions: DownloadConditions,
  },
  RemoteWithFallback {
    remote: Box<ModelSource>,
    bundled: PathBuf,
  },
}

#[derive(Clone, Default)]
pub(crate) enum ModelState {
  #[default]
  Unprovisioned,
  Provisioning,
  Ready(Arc<dyn Engine>),
  Failed(String),
}

impl fmt::Debug for ModelState {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    match self {
      Self::Unprovisioned => f.write_str("Unprovisioned"),
      Self::Provisioning => f.write_str("Provisioning"),
      Self::Ready(engine) => write!(
        f,
        "Ready({} -> {})",
        engine.input_len(),
        engine.output_len()
      ),
      Self::Failed(reason) => f.debug_tuple("Failed").field(reason).finish(),
    }
  }
}

type Refresh = JoinHandle<Result<CustomModel, Error>>;

/// Holder of the provisioning result. Inference reads the engine through it
/// and gets `ModelNotReady` until a provisioning attempt has succeeded.
#[derive(Clone, Debug, Default)]
pub(crate) struct ModelSlot {
  state: Arc<RwLock<ModelState>>,
  refreshes: Arc<Mutex<Vec<Refresh>>>,
}

impl ModelSlot {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  #[cfg(test)]
  pub(crate) fn ready(engine: Arc<dyn Engine>) -> Self {
    let slot = Self::new();
    slot.fulfil(engine);
    slot
  }

  pub(crate) fn state(&self) -> ModelState {
    self.read().clone()
  }

  pub(crate) fn begin(&self) {
    let mut state = self.write();

    // A ready engine keeps serving while a replacement is fetched.
    if !matches!(*state, ModelState::Ready(_)) {
      *state = ModelState::Provisioning;
    }
  }

  pub(crate) fn fulfil(&self, engine: Arc<dyn Engine>) {
    *self.write() = ModelState::Ready(engine);
  }

  pub(crate) fn fail(&self, reason: String) {
    let mut state = self.write();

    if !matches!(*state, ModelState::Ready(_)) {
      *state = ModelState::Failed(reason);
    }
  }

  pub(crate) fn engine(&self) -> Option<Arc<dyn Engine>> {
    match &*self.read() {
      ModelState::Ready(engine) => Some(engine.clone()),
      _ => None,
    }
  }

  pub(crate) fn track_refresh(&self, refresh: Refresh) {
    self.refreshes().push(refresh);
  }

  /// Blocks until every background refresh started for this slot has
  /// finished, returning the errors of those that failed.
  pub(crate) fn wait_for_refreshes(&self) -> Vec<Error> {
    let pending = mem::take(&mut *self.refreshes());

    pending
      .into_iter()
      .filter_map(|refresh| match refresh.join() {
        Ok(Ok(model)) => {
          debug!(model = %model.name, "background refresh finished");
          None
        }
        Ok(Err(error)) => Some(error),
        Err(_) => {
          Some(Error::Provision("background refresh panicked".into()))
        }
      })
      .collect()
  }

  /// Waits for pending refreshes. The engine already loaded stays in place
  /// whatever their outcome.
  pub(crate) fn settle(&self) {
    let failed = self.wait_for_refreshes().len();

    if failed > 0 {
      warn!(failed, "cached model kept after failed refresh");
    }
  }

  fn refreshes(&self) -> MutexGuard<'_, Vec<Refresh>> {
    self.refreshes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  fn read(&self) -> std::sync::RwLockReadGuard<'_, ModelState> {
    self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  fn write(&self) -> std::sync::RwLockWriteGuard<'_, ModelState> {
    self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
  }
}

pub(crate) struct Provisioner {
  network: Arc<dyn NetworkMonitor>,
}

impl Provisioner {
  pub(crate) fn new(network: Arc<dyn NetworkMonitor>) -> Self {
    Self { network }
  }

  /// Obtains and loads the artifact, publishing the outcome to `slot`.
  /// Failures are logged and leave the slot without an engine.
  pub(crate) fn provision(
    &self,
    slot: &ModelSlot,
    source: &ModelSource,
  ) -> Result<(), Error> {
    slot.begin();

    match self.load(slot, source) {
      Ok(network) => {
        info!(
          inputs = network.input_len(),
          outputs = network.output_len(),
          "model ready"
        );
        slot.fulfil(Arc::new(network));
        Ok(())
      }
      Err(error) => {
        error!(%error, "model provisioning failed");
        slot.fail(error.to_string());
        Err(error)
      }
    }
  }

  pub(crate) fn spawn(
    self,
    slot: ModelSlot,
    source: ModelSource,
  ) -> JoinHandle<Result<(), Error>> {
    slot.begin();
    thread::spawn(move || self.provision(&slot, &source))
  }

  fn load(
    &self,
    slot: &ModelSlot,
    source: &ModelSource,
  ) -> Result<Network, Error> {
    match source {
      ModelSource::Bundled(path) => {
        debug!(path = %path.display(), "loading bundled model");
        Network::load_weights(path)
      }
      ModelSource::Remote {
        name,
        registry,
        cache,
        download_type,
        conditions,
      } => {
        let download =
          Downloader::new(registry, cache, self.network.clone())
            .get_model(name, *download_type, *conditions)?;

        if let Some(refresh) = download.refresh {
          debug!(model = %name, "refreshing cached model in the background");
          slot.track_refresh(refresh);
        }

        debug!(
          model = %download.model.name,
          path = %download.model.file.display(),
          "model file"
        );

        Network::load_weights(&download.model.file)
      }
      ModelSource::RemoteWithFallback { remote, bundled } => {
        self.load(slot, remote).or_else(|error| {
          warn!(
            %error,
            path = %bundled.display(),
            "falling back to bundled model"
          );
          Network::load_weights(bundled)
        })
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use {super::*, crate::classifier::tests::FixedEngine, tempdir::TempDir};

  fn write_model(path: &Path, input_size: u32, output_size: usize) {
    Network::new(NetworkConfig::random(input_size, 3, output_size))
      .save_weights(path)
      .unwrap();
  }

  fn provisioner(connectivity: Connectivity) -> Provisioner {
    Provisioner::new(Arc::new(FixedNetwork(connectivity)))
  }

  #[test]
  fn unprovisioned_is_not_ready() {
    let slot = ModelSlot::new();

    assert!(matches!(slot.state(), ModelState::Unprovisioned));
    assert!(slot.engine().is_none());
  }

  #[test]
  fn bundled_model_becomes_ready() {
    let dir = TempDir::new("provision").unwrap();
    let path = dir.path().join("model.json");
    write_model(&path, 2, 5);

    let slot = ModelSlot::new();

    provisioner(Connectivity::Offline)
      .provision(&slot, &ModelSource::Bundled(path))
      .unwrap();

    let engine = slot.engine().unwrap();

    assert_eq!(engine.input_len(), 12);
    assert_eq!(engine.output_len(), 5);
  }

  #[test]
  fn failure_leaves_slot_not_ready() {
    let dir = TempDir::new("provision").unwrap();
    let slot = ModelSlot::new();

    let result = provisioner(Connectivity::Wifi).provision(
      &slot,
      &ModelSource::Bundled(dir.path().join("missing.json")),
    );

    assert!(matches!(result, Err(Error::Provision(_))));
    assert!(matches!(slot.state(), ModelState::Failed(_)));
    assert!(slot.engine().is_none());
  }

  #[test]
  fn later_success_recovers() {
    let dir = TempDir::new("provision").unwrap();
    let path = dir.path().join("model.json");
    let slot = ModelSlot::new();
    let source = ModelSource::Bundled(path.clone());

    assert!(provisioner(Connectivity::Wifi).provision(&slot, &source).is_err());

    write_model(&path, 1, 4);

    provisioner(Connectivity::Wifi).provision(&slot, &source).unwrap();

    assert!(slot.engine().is_some());
  }

  #[test]
  fn ready_engine_survives_failed_refresh() {
    let dir = TempDir::new("provision").unwrap();
    let slot = ModelSlot::ready(Arc::new(FixedEngine::peaked(3, 2, 0, 9)));

    let _ = provisioner(Connectivity::Wifi).provision(
      &slot,
      &ModelSource::Bundled(dir.path().join("missing.json")),
    );

    assert_eq!(slot.engine().unwrap().output_len(), 2);
  }

  #[test]
  fn remote_model_downloaded_into_cache() {
    let dir = TempDir::new("provision").unwrap();
    let registry = dir.path().join("registry");
    let cache = dir.path().join("cache");

    fs::create_dir_all(&registry).unwrap();
    write_model(&registry.join("Dish-Identifier.json"), 2, 6);

    let slot = ModelSlot::new();

    let source = ModelSource::Remote {
      name: "Dish-Identifier".into(),
      registry,
      cache: cache.clone(),
      download_type: DownloadType::LocalModelUpdateInBackground,
      conditions: DownloadConditions::default().require_wifi(),
    };

    provisioner(Connectivity::Wifi)
      .provision(&slot, &source)
      .unwrap();

    assert!(cache.join("Dish-Identifier.json").is_file());
    assert_eq!(slot.engine().unwrap().output_len(), 6);
  }

  fn cached_remote(dir: &TempDir) -> (ModelSource, PathBuf, PathBuf) {
    let registry = dir.path().join("registry");
    let cache = dir.path().join("cache");

    fs::create_dir_all(&registry).unwrap();
    fs::create_dir_all(&cache).unwrap();
    write_model(&cache.join("Dish-Identifier.json"), 1, 2);

    let source = ModelSource::Remote {
      name: "Dish-Identifier".into(),
      registry: registry.clone(),
      cache: cache.clone(),
      download_type: DownloadType::LocalModelUpdateInBackground,
      conditions: DownloadConditions::default().require_wifi(),
    };

    (source, registry, cache)
  }

  #[test]
  fn background_refresh_updates_cache() {
    let dir = TempDir::new("provision").unwrap();
    let (source, registry, cache) = cached_remote(&dir);
    write_model(&registry.join("Dish-Identifier.json"), 1, 7);

    let slot = ModelSlot::new();

    provisioner(Connectivity::Wifi)
      .provision(&slot, &source)
      .unwrap();

    assert!(slot.engine().is_some());
    assert!(slot.wait_for_refreshes().is_empty());
    assert_eq!(
      fs::read(cache.join("Dish-Identifier.json")).unwrap(),
      fs::read(registry.join("Dish-Identifier.json")).unwrap()
    );
    assert!(slot.wait_for_refreshes().is_empty());
  }

  #[test]
  fn failed_background_refresh_is_reported() {
    let dir = TempDir::new("provision").unwrap();
    let (source, _, cache) = cached_remote(&dir);

    let slot = ModelSlot::new();

    provisioner(Connectivity::Wifi)
      .provision(&slot, &source)
      .unwrap();

    let errors = slot.wait_for_refreshes();

    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], Error::Provision(_)));
    assert_eq!(slot.engine().unwrap().output_len(), 2);
    assert!(!cache.join("Dish-Identifier.json.partial").exists());
  }

  #[test]
  fn remote_falls_back_to_bundled() {
    let dir = TempDir::new("provision").unwrap();
    let bundled = dir.path().join("bundled.json");
    write_model(&bundled, 1, 3);

    let slot = ModelSlot::new();

    let source = ModelSource::RemoteWithFallback {
      remote: Box::new(ModelSource::Remote {
        name: "Dish-Identifier".into(),
        registry: dir.path().join("registry"),
        cache: dir.path().join("cache"),
        download_type: DownloadType::LatestModel,
        conditions: DownloadConditions::default().require_wifi(),
      }),
      bundled,
    };

    provisioner(Connectivity::Cellular)
      .provision(&slot, &source)
      .unwrap();

    assert_eq!(slot.engine().unwrap().output_len(), 3);
  }

  #[test]
  fn spawned_provisioning_completes() {
    let dir = TempDir::new("provision").unwrap();
    let path = dir.path().join("model.json");
    write_model(&path, 1, 2);

    let slot = ModelSlot::new();

    let handle = provisioner(Connectivity::Wifi)
      .spawn(slot.clone(), ModelSource::Bundled(path));

    handle.join().unwrap().unwrap();

    assert!(matches!(slot.state(), ModelState::Ready(_)));
  }
}
