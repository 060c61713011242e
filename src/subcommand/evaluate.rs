use super::*;

#[derive(Debug, Parser)]
pub(crate) struct Evaluate {
  #[clap(
    long,
    help = "CSV of `image,class_index` rows; paths are relative to the manifest"
  )]
  manifest: PathBuf,
  #[clap(long, help = "Evaluate a random subset of this many images")]
  sample: Option<usize>,
  #[clap(flatten)]
  model: ModelArguments,
}

#[derive(Debug, Default)]
struct Tally {
  correct: usize,
  wrong: usize,
  failed: usize,
}

impl Tally {
  fn record(mut self, outcome: Option<bool>) -> Self {
    match outcome {
      Some(true) => self.correct += 1,
      Some(false) => self.wrong += 1,
      None => self.failed += 1,
    }
    self
  }

  fn merge(self, other: Self) -> Self {
    Self {
      correct: self.correct + other.correct,
      wrong: self.wrong + other.wrong,
      failed: self.failed + other.failed,
    }
  }

  fn accuracy(&self) -> f64 {
    let evaluated = self.correct + self.wrong;

    if evaluated == 0 {
      0.0
    } else {
      self.correct as f64 / evaluated as f64
    }
  }
}

impl Evaluate {
  pub(crate) fn run(self, config: Config) -> Result {
    let mut samples = Self::read_manifest(&self.manifest)
      .with_context(|| format!("failed to read {}", self.manifest.display()))?;

    if let Some(sample) = self.sample {
      samples.shuffle(&mut rand::thread_rng());
      samples.truncate(sample);
    }

    let pipeline = self.model.pipeline(config)?;

    if !pipeline.is_ready() {
      pipeline.finish();
      bail!("model unavailable");
    }

    info!(images = samples.len(), "evaluating");

    let progress_bar = ProgressBar::new(samples.len() as u64);

    progress_bar.set_style(
      ProgressStyle::default_bar()
        .template(
          "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} Images {msg}",
        )?
        .progress_chars("=>-"),
    );

    let tally = samples
      .par_iter()
      .map(|(path, expected)| {
        let outcome = match pipeline.predict_path(path) {
          Ok(prediction) => Some(prediction.index() == *expected),
          Err(error) => {
            warn!(path = %path.display(), %error, "prediction failed");
            None
          }
        };

        progress_bar.inc(1);

        outcome
      })
      .fold(Tally::default, Tally::record)
      .reduce(Tally::default, Tally::merge);

    progress_bar.finish_with_message("Evaluation complete");

    pipeline.finish();

    println!("Correct: {}", tally.correct);
    println!("Wrong: {}", tally.wrong);
    println!("Failed: {}", tally.failed);
    println!("Accuracy: {:.2}%", tally.accuracy() * 100.0);

    Ok(())
  }

  fn read_manifest(path: &Path) -> Result<Vec<(PathBuf, usize)>> {
    let root = path.parent().unwrap_or(Path::new("")).to_path_buf();

    let mut reader = csv::ReaderBuilder::new()
      .has_headers(true)
      .trim(csv::Trim::All)
      .from_path(path)?;

    reader
      .deserialize::<(PathBuf, usize)>()
      .map(|row| -> Result<(PathBuf, usize)> {
        let (image, class_index) = row?;
        Ok((root.join(image), class_index))
      })
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use {super::*, approx::assert_relative_eq, tempdir::TempDir};

  #[test]
  fn manifest_paths_resolve_against_manifest() {
    let dir = TempDir::new("evaluate").unwrap();
    let manifest = dir.path().join("manifest.csv");

    fs::write(&manifest, "image,class_index\nramen.png,3\n/abs/pho.jpg, 8\n")
      .unwrap();

    let samples = Evaluate::read_manifest(&manifest).unwrap();

    assert_eq!(
      samples,
      [
        (dir.path().join("ramen.png"), 3),
        (PathBuf::from("/abs/pho.jpg"), 8)
      ]
    );
  }

  #[test]
  fn manifest_rejects_bad_index() {
    let dir = TempDir::new("evaluate").unwrap();
    let manifest = dir.path().join("manifest.csv");

    fs::write(&manifest, "image,class_index\nramen.png,three\n").unwrap();

    assert!(Evaluate::read_manifest(&manifest).is_err());
  }

  #[test]
  fn tally_accuracy_ignores_failures() {
    let tally = [Some(true), Some(false), None, Some(true)]
      .into_iter()
      .fold(Tally::default(), Tally::record);

    assert_eq!((tally.correct, tally.wrong, tally.failed), (2, 1, 1));
    assert_relative_eq!(tally.accuracy(), 2.0 / 3.0);
    assert_relative_eq!(Tally::default().accuracy(), 0.0);
  }
}
