//! Frame payload decoding.

use image::RgbImage;

use crate::util::{Error, Result};

/// Turns an encoded frame payload into a color image.
pub trait FrameDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<RgbImage>;
}

impl<F> FrameDecoder for F
where
    F: Fn(&[u8]) -> Result<RgbImage>,
{
    fn decode(&self, bytes: &[u8]) -> Result<RgbImage> {
        self(bytes)
    }
}

/// Decoder for compressed images (PNG, JPEG) backed by the `image` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageDecoder;

impl FrameDecoder for ImageDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<RgbImage> {
        if bytes.is_empty() {
            return Err(Error::Decode("empty payload".into()));
        }
        let image = image::load_from_memory(bytes)
            .map_err(|e| Error::Decode(e.to_string()))?
            .to_rgb8();
        if image.width() == 0 || image.height() == 0 {
            return Err(Error::Decode("image has no pixels".into()));
        }
        Ok(image)
    }
}
