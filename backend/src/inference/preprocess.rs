use std::io::Cursor;

use image::imageops::FilterType;
use image::{ImageReader, RgbImage};
use tch::Tensor;

/// Input edge length the classifier was trained on.
pub const INPUT_SIZE: u32 = 224;

#[derive(Debug, thiserror::Error)]
pub enum PreprocessError {
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("failed to read image bytes: {0}")]
    Read(#[from] std::io::Error),
}

/// Converts raw uploaded bytes into the batch-of-one tensor the model
/// expects: shape (1, 224, 224, 3), RGB channel order, values in [0, 1].
pub fn preprocess(raw: &[u8]) -> Result<Tensor, PreprocessError> {
    let pixels = normalized_pixels(raw)?;
    let tensor =
        Tensor::from_slice(&pixels).view([1, INPUT_SIZE as i64, INPUT_SIZE as i64, 3]);
    Ok(tensor)
}

/// Channels-last f32 pixel buffer, scaled to [0, 1].
///
/// Decoding yields RGB order; grayscale inputs are replicated to three
/// channels and alpha channels dropped before the stretch resize.
pub fn normalized_pixels(raw: &[u8]) -> Result<Vec<f32>, PreprocessError> {
    let decoded = ImageReader::new(Cursor::new(raw))
        .with_guessed_format()?
        .decode()?;
    let rgb: RgbImage = decoded.to_rgb8();
    let resized = image::imageops::resize(&rgb, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);
    Ok(resized
        .into_raw()
        .into_iter()
        .map(|v| v as f32 / 255.0)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, ImageFormat, Rgb, RgbaImage};

    fn encode_png(image: DynamicImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn garbage_bytes_fail_with_decode_error() {
        let result = normalized_pixels(b"definitely not an image");
        assert!(matches!(result, Err(PreprocessError::Decode(_))));
    }

    #[test]
    fn empty_bytes_fail_with_decode_error() {
        let result = normalized_pixels(&[]);
        assert!(matches!(result, Err(PreprocessError::Decode(_))));
    }

    #[test]
    fn grayscale_input_expands_to_three_channels() {
        let gray = GrayImage::from_pixel(64, 48, image::Luma([200u8]));
        let pixels = normalized_pixels(&encode_png(DynamicImage::ImageLuma8(gray))).unwrap();
        assert_eq!(pixels.len(), (INPUT_SIZE * INPUT_SIZE * 3) as usize);
        // Every channel carries the replicated gray value.
        for chunk in pixels.chunks(3) {
            assert_eq!(chunk[0], chunk[1]);
            assert_eq!(chunk[1], chunk[2]);
        }
    }

    #[test]
    fn rgba_input_drops_alpha() {
        let rgba = RgbaImage::from_pixel(300, 200, image::Rgba([10, 20, 30, 5]));
        let pixels = normalized_pixels(&encode_png(DynamicImage::ImageRgba8(rgba))).unwrap();
        assert_eq!(pixels.len(), (INPUT_SIZE * INPUT_SIZE * 3) as usize);
    }

    #[test]
    fn already_sized_rgb_input_is_scaled_by_255() {
        let rgb = RgbImage::from_pixel(INPUT_SIZE, INPUT_SIZE, Rgb([128, 64, 255]));
        let pixels = normalized_pixels(&encode_png(DynamicImage::ImageRgb8(rgb))).unwrap();
        for chunk in pixels.chunks(3) {
            assert!((chunk[0] - 128.0 / 255.0).abs() < 1e-3);
            assert!((chunk[1] - 64.0 / 255.0).abs() < 1e-3);
            assert!((chunk[2] - 1.0).abs() < 1e-3);
        }
    }

    #[test]
    fn preprocessing_is_deterministic() {
        let rgb = RgbImage::from_fn(90, 60, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 7]));
        let bytes = encode_png(DynamicImage::ImageRgb8(rgb));
        let first = normalized_pixels(&bytes).unwrap();
        let second = normalized_pixels(&bytes).unwrap();
        assert_eq!(first, second);
    }
}
