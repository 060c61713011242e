use super::*;

/// Class-index to food-name mapping, loaded once and read-only afterwards.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct LabelTable {
  labels: Vec<String>,
}

impl LabelTable {
  pub(crate) fn load(path: &Path) -> Result<Self, Error> {
    let table = Self::parse(&fs::read_to_string(path)?)?;

    if table.is_empty() {
      warn!(path = %path.display(), "label table has no labels");
    }

    info!(
      path = %path.display(),
      labels = table.len(),
      "loaded label table"
    );

    Ok(table)
  }

  pub(crate) fn parse(text: &str) -> Result<Self, Error> {
    Self::from_reader(text.as_bytes())
  }

  /// Reads a comma-delimited resource whose first line is a header. The
  /// second field of every following line is a label, in class-index order.
  pub(crate) fn from_reader<R: Read>(reader: R) -> Result<Self, Error> {
    let mut reader = csv::ReaderBuilder::new()
      .has_headers(true)
      .flexible(true)
      .from_reader(reader);

    let mut labels = Vec::new();

    for result in reader.records() {
      let record = result?;

      let Some(label) = record.get(1) else {
        return Err(Error::MalformedRow {
          line: record.position().map(|p| p.line()).unwrap_or_default(),
          fields: record.len(),
        });
      };

      labels.push(label.to_owned());
    }

    Ok(Self { labels })
  }

  pub(crate) fn get(&self, index: usize) -> Result<&str, Error> {
    self
      .labels
      .get(index)
      .map(String::as_str)
      .ok_or(Error::LabelIndexOutOfRange {
        index,
        len: self.labels.len(),
      })
  }

  pub(crate) fn len(&self) -> usize {
    self.labels.len()
  }

  pub(crate) fn is_empty(&self) -> bool {
    self.labels.is_empty()
  }

  pub(crate) fn ensure_covers(&self, output_size: usize) -> Result<(), Error> {
    if self.labels.len() == output_size {
      Ok(())
    } else {
      Err(Error::LabelCountMismatch {
        labels: self.labels.len(),
        outputs: output_size,
      })
    }
  }
}
