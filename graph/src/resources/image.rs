use keepsake_core::color::Color8;

use crate::Reflect;
use crate::codec::{DecodeError, EncodeError, LoadContext, Persist, SaveContext};

const BYTES_PER_PIXEL: usize = 4;

/// An RGBA8 image.
///
/// Stored as `width`, `height`, then the pixel bytes with a `u64` length.
#[derive(Debug, Clone, Default, PartialEq, Reflect)]
pub struct Image {
    width: u32,
    height: u32,
    #[reflect(skip)]
    pixels: Vec<u8>,
}

impl Image {
    /// A transparent black image.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * BYTES_PER_PIXEL],
        }
    }

    /// Wrap existing RGBA8 bytes. `None` if the length does not match.
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        (pixels.len() == width as usize * height as usize * BYTES_PER_PIXEL).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color8> {
        let i = self.index(x, y)?;
        Some(bytemuck::pod_read_unaligned(&self.pixels[i..i + BYTES_PER_PIXEL]))
    }

    /// Returns `false` if the coordinate is outside the image.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color8) -> bool {
        let Some(i) = self.index(x, y) else {
            return false;
        };
        self.pixels[i..i + BYTES_PER_PIXEL].copy_from_slice(bytemuck::bytes_of(&color));
        true
    }
}

impl Persist for Image {
    fn save(&self, ctx: &mut SaveContext<'_>) -> Result<(), EncodeError> {
        ctx.write_fields(self)?;
        ctx.writer().write_bytes(&self.pixels);
        Ok(())
    }

    fn load(&mut self, ctx: &mut LoadContext<'_>) -> Result<(), DecodeError> {
        ctx.read_fields(self)?;
        let pixels = ctx.reader().read_bytes()?;
        let expected = self.width as usize * self.height as usize * BYTES_PER_PIXEL;
        if pixels.len() != expected {
            return Err(DecodeError::Invalid(format!(
                "{}x{} image has {} pixel bytes, expected {expected}",
                self.width,
                self.height,
                pixels.len()
            )));
        }
        self.pixels = pixels;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_image_is_zeroed() {
        let image = Image::new(2, 3);
        assert_eq!(image.pixels().len(), 24);
        assert_eq!(image.pixel(1, 2), Some(Color8::new(0, 0, 0, 0)));
        assert_eq!(image.pixel(2, 0), None);
    }

    #[test]
    fn set_and_get_pixel() {
        let mut image = Image::new(2, 2);
        let red = Color8::new(255, 0, 0, 255);

        assert!(image.set_pixel(1, 1, red));
        assert!(!image.set_pixel(5, 0, red));

        assert_eq!(image.pixel(1, 1), Some(red));
        assert_eq!(&image.pixels()[12..16], &[255, 0, 0, 255]);
    }

    #[test]
    fn from_rgba8_checks_length() {
        assert!(Image::from_rgba8(1, 1, vec![1, 2, 3, 4]).is_some());
        assert!(Image::from_rgba8(1, 1, vec![1, 2, 3]).is_none());
    }
}
