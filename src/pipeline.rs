use super::*;

/// Image in, food label out.
#[derive(Debug)]
pub(crate) struct Pipeline {
  input_size: u32,
  classifier: Classifier,
  interpretation: ScoreInterpretation,
  labels: LabelTable,
  model: ModelSlot,
}

impl Pipeline {
  pub(crate) fn new(
    config: &Config,
    labels: LabelTable,
    model: ModelSlot,
  ) -> Result<Self, Error> {
    config.validate()?;

    if let Err(error) = labels.ensure_covers(config.output_size) {
      if config.strict_labels {
        return Err(error);
      }

      warn!(%error, "some class indices will have no label");
    }

    Ok(Self {
      input_size: config.input_size,
      classifier: Classifier::new(config.output_size),
      interpretation: config.score_interpretation,
      labels,
      model,
    })
  }

  pub(crate) fn is_ready(&self) -> bool {
    self.model.engine().is_some()
  }

  /// Waits for background work on the model to finish.
  pub(crate) fn finish(&self) {
    self.model.settle();
  }

  pub(crate) fn predict_path(&self, path: &Path) -> Result<Prediction, Error> {
    self.predict_image(&preprocess::load(path)?)
  }

  pub(crate) fn predict_image(
    &self,
    image: &DynamicImage,
  ) -> Result<Prediction, Error> {
    let engine = self.model.engine();

    let input = preprocess::preprocess(image, self.input_size)?;

    let output = self.classifier.invoke(engine.as_deref(), &input)?;

    let selection = prediction::select(&output, self.interpretation)?;

    debug!("{}", selection.diagnostic());

    selection.resolve(&self.labels)
  }
}

#[cfg(test)]
mod tests {
  use {
    super::*,
    crate::{classifier::tests::FixedEngine, prediction::Selection},
    image::{Rgb, RgbImage},
  };

  const INPUT_SIZE: u32 = 8;
  const OUTPUT_SIZE: usize = 50;

  fn config() -> Config {
    Config {
      input_size: INPUT_SIZE,
      output_size: OUTPUT_SIZE,
      ..Default::default()
    }
  }

  fn labels() -> LabelTable {
    let text = (0..OUTPUT_SIZE).fold(String::from("id,name\n"), |text, i| {
      text + &format!("{i},dish {i}\n")
    });

    LabelTable::parse(&text).unwrap()
  }

  fn photo() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(
      300,
      300,
      Rgb([180, 90, 40]),
    ))
  }

  fn stub(peak: usize, high: u8) -> ModelSlot {
    ModelSlot::ready(Arc::new(FixedEngine::peaked(
      input_len(INPUT_SIZE),
      OUTPUT_SIZE,
      peak,
      high,
    )))
  }

  #[test]
  fn end_to_end_with_stub_engine() {
    let pipeline = Pipeline::new(&config(), labels(), stub(42, 100)).unwrap();

    let prediction = pipeline.predict_image(&photo()).unwrap();

    assert_eq!(prediction.selection, Selection { index: 42, score: 100 });
    assert_eq!(prediction.label, "dish 42");
    assert_eq!(prediction.to_string(), "Predicted food: dish 42");
  }

  #[test]
  fn repeated_predictions_agree() {
    let pipeline = Pipeline::new(&config(), labels(), stub(7, 64)).unwrap();

    let first = pipeline.predict_image(&photo()).unwrap();
    let second = pipeline.predict_image(&photo()).unwrap();

    assert_eq!(first, second);
  }

  #[test]
  fn repeated_predictions_agree_with_network() {
    let model = ModelSlot::ready(Arc::new(Network::new(NetworkConfig::random(
      INPUT_SIZE,
      16,
      OUTPUT_SIZE,
    ))));

    let pipeline = Pipeline::new(&config(), labels(), model).unwrap();

    let first = pipeline.predict_image(&photo()).unwrap();
    let second = pipeline.predict_image(&photo()).unwrap();

    assert_eq!(first.index(), second.index());
    assert_eq!(first.label, second.label);
  }

  #[test]
  fn unprovisioned_model_yields_no_prediction() {
    let pipeline =
      Pipeline::new(&config(), labels(), ModelSlot::new()).unwrap();

    assert!(!pipeline.is_ready());
    assert!(matches!(
      pipeline.predict_image(&photo()),
      Err(Error::ModelNotReady)
    ));
  }

  #[test]
  fn model_provisioned_after_pipeline_built() {
    let model = ModelSlot::new();
    let pipeline = Pipeline::new(&config(), labels(), model.clone()).unwrap();

    assert!(pipeline.predict_image(&photo()).is_err());

    model.fulfil(Arc::new(FixedEngine::peaked(
      input_len(INPUT_SIZE),
      OUTPUT_SIZE,
      3,
      20,
    )));

    assert_eq!(pipeline.predict_image(&photo()).unwrap().index(), 3);
  }

  #[test]
  fn signed_quirk_changes_winner() {
    let mut scores = vec![10; OUTPUT_SIZE];
    scores[5] = 200;
    scores[9] = 60;

    let model = ModelSlot::ready(Arc::new(FixedEngine {
      input_len: input_len(INPUT_SIZE),
      scores,
    }));

    let signed = Pipeline::new(&config(), labels(), model.clone()).unwrap();

    assert_eq!(signed.predict_image(&photo()).unwrap().index(), 9);

    let unsigned = Pipeline::new(
      &Config {
        score_interpretation: ScoreInterpretation::Unsigned,
        ..config()
      },
      labels(),
      model,
    )
    .unwrap();

    assert_eq!(unsigned.predict_image(&photo()).unwrap().index(), 5);
  }

  #[test]
  fn short_label_table() {
    let labels = LabelTable::parse("id,name\n0,Apple\n").unwrap();

    let pipeline =
      Pipeline::new(&config(), labels.clone(), stub(42, 100)).unwrap();

    assert!(matches!(
      pipeline.predict_image(&photo()),
      Err(Error::LabelIndexOutOfRange { index: 42, len: 1 })
    ));

    let strict = Config {
      strict_labels: true,
      ..config()
    };

    assert!(matches!(
      Pipeline::new(&strict, labels, stub(42, 100)),
      Err(Error::LabelCountMismatch { .. })
    ));
  }

  #[test]
  fn zero_output_size_rejected() {
    let model = ModelSlot::ready(Arc::new(FixedEngine {
      input_len: input_len(INPUT_SIZE),
      scores: Vec::new(),
    }));

    let config = Config {
      output_size: 0,
      ..config()
    };

    assert!(matches!(
      Pipeline::new(&config, labels(), model),
      Err(Error::Config(_))
    ));
  }
}
