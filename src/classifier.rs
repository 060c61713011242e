use super::*;

/// A loaded inference engine. Implementations must not carry state between
/// calls to `run`.
pub(crate) trait Engine: Send + Sync {
  fn input_len(&self) -> usize;

  fn output_len(&self) -> usize;

  fn run(&self, input: &[u8], output: &mut [u8]) -> Result<(), Error>;
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Classifier {
  output_size: usize,
}

impl Classifier {
  pub(crate) fn new(output_size: usize) -> Self {
    Self { output_size }
  }

  pub(crate) fn invoke(
    &self,
    engine: Option<&dyn Engine>,
    input: &[u8],
  ) -> Result<Vec<u8>, Error> {
    let engine = engine.ok_or(Error::ModelNotReady)?;

    if input.len() != engine.input_len() {
      return Err(Error::Inference(format!(
        "input buffer holds {} bytes, model expects {}",
        input.len(),
        engine.input_len()
      )));
    }

    if engine.output_len() != self.output_size {
      return Err(Error::Inference(format!(
        "model emits {} classes, expected {}",
        engine.output_len(),
        self.output_size
      )));
    }

    let mut output = vec![0; self.output_size];

    engine.run(input, &mut output)?;

    Ok(output)
  }
}
