use super::*;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ScoreInterpretation {
  /// Two's complement, so bytes above 127 rank below zero.
  #[default]
  Signed,
  Unsigned,
}

impl ScoreInterpretation {
  fn read(self, byte: u8) -> i16 {
    match self {
      Self::Signed => byte as i8 as i16,
      Self::Unsigned => byte as i16,
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Selection {
  pub(crate) index: usize,
  pub(crate) score: i16,
}

impl Selection {
  pub(crate) fn diagnostic(&self) -> String {
    format!(
      "Index of max value: {}, Max value: {}",
      self.index, self.score
    )
  }

  pub(crate) fn resolve(
    self,
    labels: &LabelTable,
  ) -> Result<Prediction, Error> {
    Ok(Prediction {
      label: labels.get(self.index)?.to_owned(),
      selection: self,
    })
  }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Prediction {
  pub(crate) selection: Selection,
  pub(crate) label: String,
}

impl Prediction {
  pub(crate) fn index(&self) -> usize {
    self.selection.index
  }
}

impl Display for Prediction {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    write!(f, "Predicted food: {}", self.label)
  }
}

/// Picks the highest score, leftmost on ties.
pub(crate) fn select(
  output: &[u8],
  interpretation: ScoreInterpretation,
) -> Result<Selection, Error> {
  argmax(output.iter().map(|&byte| interpretation.read(byte)))
    .map(|(index, score)| Selection { index, score })
    .ok_or(Error::EmptyOutput)
}
