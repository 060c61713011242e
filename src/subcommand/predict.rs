use super::*;

#[derive(Debug, Parser)]
pub(crate) struct Predict {
  #[clap(short, long)]
  image: PathBuf,
  #[clap(flatten)]
  model: ModelArguments,
}

impl Predict {
  pub(crate) fn run(self, config: Config) -> Result {
    let pipeline = self.model.pipeline(config)?;

    let prediction = pipeline.predict_path(&self.image);

    pipeline.finish();

    let prediction = match prediction {
      Ok(prediction) => prediction,
      Err(Error::ModelNotReady) => bail!("model unavailable"),
      Err(error) => return Err(error.into()),
    };

    println!("{}", prediction.selection.diagnostic());
    println!("{prediction}");

    Ok(())
  }
}
