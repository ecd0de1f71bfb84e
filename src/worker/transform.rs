//! Pixel transforms applied by workers

use std::io::Cursor;
use std::sync::Arc;

use bytes::Bytes;
use image::{ImageFormat, RgbaImage};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("transform did not finish: {0}")]
    Aborted(String),
}

/// A pure function from input bytes to output bytes
pub type Transform = Arc<dyn Fn(&[u8]) -> Result<Vec<u8>, TransformError> + Send + Sync>;

pub fn default_transform() -> Transform {
    Arc::new(swap_red_green)
}

/// Swap the red and green channel of every pixel and make it fully opaque
pub fn swap_red_green(input: &[u8]) -> Result<Vec<u8>, TransformError> {
    let decoded = image::load_from_memory_with_format(input, ImageFormat::Png)
        .map_err(TransformError::Decode)?;

    let mut pixels: RgbaImage = decoded.to_rgba8();
    for pixel in pixels.pixels_mut() {
        let [red, green, blue, _] = pixel.0;
        pixel.0 = [green, red, blue, u8::MAX];
    }

    let mut output = Vec::new();
    pixels
        .write_to(&mut Cursor::new(&mut output), ImageFormat::Png)
        .map_err(TransformError::Encode)?;
    Ok(output)
}

/// Run `transform` on the blocking pool
pub(crate) async fn apply(transform: &Transform, input: Bytes) -> Result<Vec<u8>, TransformError> {
    let transform = Arc::clone(transform);
    tokio::task::spawn_blocking(move || transform(input.as_ref()))
        .await
        .map_err(|e| TransformError::Aborted(e.to_string()))?
}
