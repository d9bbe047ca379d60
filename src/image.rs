//! In-memory icon images.
//!
//! Every backend wants the pixels in a slightly different layout, so the icon keeps one
//! canonical RGBA8 buffer and converts on demand.

use crate::error::{Error, Result};
use std::fmt;
use std::io::Cursor;

/// An RGBA8 image, row-major, 4 bytes per pixel.
#[derive(Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl Image {
    /// Creates an image from raw RGBA pixel data.
    ///
    /// Fails if either dimension is zero or `rgba.len()` is not `width * height * 4`.
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidImage(format!(
                "invalid image dimensions: {width}x{height}"
            )));
        }

        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(Error::InvalidImage(format!(
                "image data size mismatch: expected {expected}, got {}",
                rgba.len()
            )));
        }

        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    /// Creates an image filled with a single RGBA colour.
    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Result<Self> {
        let pixels = width as usize * height as usize;
        Self::from_rgba(width, height, color.repeat(pixels))
    }

    /// Decodes a PNG file held in memory.
    ///
    /// Palette, greyscale and 16-bit images are normalised to RGBA8.
    pub fn from_png_bytes(bytes: &[u8]) -> Result<Self> {
        let mut decoder = png::Decoder::new(Cursor::new(bytes));
        decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
        let mut reader = decoder.read_info()?;
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf)?;
        buf.truncate(info.buffer_size());

        let rgba = match info.color_type {
            png::ColorType::Rgba => buf,
            png::ColorType::Rgb => buf
                .chunks_exact(3)
                .flat_map(|px| [px[0], px[1], px[2], 0xff])
                .collect(),
            png::ColorType::GrayscaleAlpha => buf
                .chunks_exact(2)
                .flat_map(|px| [px[0], px[0], px[0], px[1]])
                .collect(),
            png::ColorType::Grayscale => buf.iter().flat_map(|&v| [v, v, v, 0xff]).collect(),
            png::ColorType::Indexed => {
                return Err(Error::InvalidImage(
                    "palette image was not expanded".to_string(),
                ));
            }
        };

        Self::from_rgba(info.width, info.height, rgba)
    }

    /// Reads and decodes a PNG file from disk.
    pub fn from_png_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_png_bytes(&bytes)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// The raw RGBA bytes.
    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    pub fn into_rgba(self) -> Vec<u8> {
        self.rgba
    }

    /// The pixels as ARGB32 in network byte order, the layout StatusNotifierItem pixmaps use.
    pub fn to_argb(&self) -> Vec<u8> {
        let mut argb = self.rgba.clone();
        for pixel in argb.chunks_exact_mut(4) {
            pixel.rotate_right(1);
        }
        argb
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_png(width: u32, height: u32, color: png::ColorType, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, width, height);
            encoder.set_color(color);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(data).unwrap();
        }
        out
    }

    #[test]
    fn rejects_size_mismatch() {
        let err = Image::from_rgba(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(err, Error::InvalidImage(_)));
    }

    #[test]
    fn rejects_empty_dimensions() {
        assert!(Image::from_rgba(0, 4, Vec::new()).is_err());
        assert!(Image::solid(4, 0, [0; 4]).is_err());
    }

    #[test]
    fn argb_moves_alpha_first() {
        let image = Image::from_rgba(2, 1, vec![1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        assert_eq!(image.to_argb(), [4, 1, 2, 3, 8, 5, 6, 7]);
        // the canonical buffer is untouched
        assert_eq!(image.rgba(), [1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn decodes_rgba_png() {
        let pixels = [0x10, 0x20, 0x30, 0x40, 0x50, 0x60, 0x70, 0x80];
        let bytes = encode_png(2, 1, png::ColorType::Rgba, &pixels);

        let image = Image::from_png_bytes(&bytes).unwrap();
        assert_eq!((image.width(), image.height()), (2, 1));
        assert_eq!(image.rgba(), pixels);
    }

    #[test]
    fn rgb_png_becomes_opaque() {
        let bytes = encode_png(1, 1, png::ColorType::Rgb, &[9, 8, 7]);
        let image = Image::from_png_bytes(&bytes).unwrap();
        assert_eq!(image.rgba(), [9, 8, 7, 0xff]);
    }

    #[test]
    fn grayscale_png_is_expanded() {
        let bytes = encode_png(2, 1, png::ColorType::GrayscaleAlpha, &[100, 50, 200, 255]);
        let image = Image::from_png_bytes(&bytes).unwrap();
        assert_eq!(image.rgba(), [100, 100, 100, 50, 200, 200, 200, 255]);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = Image::from_png_bytes(b"not a png").unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Image::from_png_file("/nonexistent/icon.png").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
