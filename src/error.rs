use {
  std::{fmt::Display, path::Path},
  thiserror::Error as ThisError,
};

/// Failures surfaced by the capture-to-prediction pipeline.
#[derive(Debug, ThisError)]
pub(crate) enum Error {
  #[error("invalid image: {0}")]
  InvalidImage(String),
  #[error("model not ready")]
  ModelNotReady,
  #[error("inference failed: {0}")]
  Inference(String),
  #[error("model produced an empty output buffer")]
  EmptyOutput,
  #[error("class index {index} has no label (table holds {len})")]
  LabelIndexOutOfRange { index: usize, len: usize },
  #[error(
    "malformed label row on line {line}: \
     expected at least 2 fields, found {fields}"
  )]
  MalformedRow { line: u64, fields: usize },
  #[error(
    "label table holds {labels} labels but the model emits {outputs} classes"
  )]
  LabelCountMismatch { labels: usize, outputs: usize },
  #[error("model provisioning failed: {0}")]
  Provision(String),
  #[error("invalid configuration: {0}")]
  Config(String),
  #[error(transparent)]
  Io(#[from] std::io::Error),
  #[error(transparent)]
  Csv(#[from] csv::Error),
  #[error(transparent)]
  Json(#[from] serde_json::Error),
}

impl Error {
  pub(crate) fn invalid_image(path: &Path, reason: impl Display) -> Self {
    Self::InvalidImage(format!("{}: {reason}", path.display()))
  }
}
