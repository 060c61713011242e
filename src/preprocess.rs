use super::*;

pub(crate) fn decode(bytes: &[u8]) -> Result<DynamicImage, Error> {
  image::load_from_memory(bytes)
    .map_err(|error| Error::InvalidImage(error.to_string()))
}

pub(crate) fn load(path: &Path) -> Result<DynamicImage, Error> {
  let bytes =
    fs::read(path).map_err(|error| Error::invalid_image(path, error))?;

  decode(&bytes).map_err(|error| match error {
    Error::InvalidImage(reason) => Error::invalid_image(path, reason),
    other => other,
  })
}

/// Squashes `image` to `input_size` x `input_size` and flattens it into
/// row-major RGB bytes. Aspect ratio is not preserved and intensities are left
/// unnormalized.
pub(crate) fn preprocess(
  image: &DynamicImage,
  input_size: u32,
) -> Result<Vec<u8>, Error> {
  let (width, height) = (image.width(), image.height());

  if width == 0 || height == 0 {
    return Err(Error::InvalidImage(format!(
      "image has no pixels ({width}x{height})"
    )));
  }

  if input_size == 0 {
    return Err(Error::Config("input_size must be at least 1".into()));
  }

  let rgb = image.to_rgb8();

  let resized = image::imageops::resize(
    &rgb,
    input_size,
    input_size,
    FilterType::Triangle,
  );

  let buffer = resized
    .pixels()
    .flat_map(|pixel| pixel.0)
    .collect::<Vec<u8>>();

  debug_assert_eq!(buffer.len(), input_len(input_size));

  Ok(buffer)
}
