/// Index of the first maximum. Later elements must be strictly greater to
/// displace an earlier one.
pub(crate) fn argmax<T, I>(values: I) -> Option<(usize, T)>
where
  T: PartialOrd + Copy,
  I: IntoIterator<Item = T>,
{
  values
    .into_iter()
    .enumerate()
    .fold(None, |best, (index, value)| match best {
      Some((_, max)) if value <= max => best,
      _ => Some((index, value)),
    })
}

pub(crate) fn relu(x: f64) -> f64 {
  x.max(0.0)
}

pub(crate) fn sigmoid(x: f64) -> f64 {
  1.0 / (1.0 + (-x).exp())
}

/// Maps a raw channel intensity onto [0, 1].
pub(crate) fn dequantize(byte: u8) -> f64 {
  byte as f64 / 255.0
}

/// Maps a probability onto the 0-255 byte range, saturating outside [0, 1].
pub(crate) fn quantize(x: f64) -> u8 {
  (x.clamp(0.0, 1.0) * 255.0).round() as u8
}
