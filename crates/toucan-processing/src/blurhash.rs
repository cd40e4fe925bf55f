//! BlurHash placeholder encoding.
//!
//! A hash is a base-83 string: one size-flag character, one quantised
//! maximum-AC character, four DC characters, then two characters per AC
//! component. Total length is `4 + 2 * components_x * components_y`.

use image::{DynamicImage, GenericImageView};
use std::f64::consts::PI;
use toucan_core::blurhash::BASE83_ALPHABET;

pub use toucan_core::blurhash::is_valid_blurhash as is_valid;

/// Component grid used for photo placeholders
pub const PLACEHOLDER_COMPONENTS_X: u32 = 4;
pub const PLACEHOLDER_COMPONENTS_Y: u32 = 3;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BlurhashError {
    #[error("BlurHash components must be between 1 and 9, got {0}x{1}")]
    InvalidComponents(u32, u32),

    #[error("Pixel buffer of {actual} bytes does not match {width}x{height} RGBA")]
    PixelBufferMismatch {
        actual: usize,
        width: u32,
        height: u32,
    },

    #[error("Cannot hash an empty image")]
    EmptyImage,
}

fn encode83(value: u64, length: u32, out: &mut String) {
    for i in 1..=length {
        let digit = (value / 83u64.pow(length - i)) % 83;
        out.push(BASE83_ALPHABET[digit as usize] as char);
    }
}

fn srgb_to_linear(value: u8) -> f64 {
    let v = value as f64 / 255.0;
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(value: f64) -> u64 {
    let v = value.clamp(0.0, 1.0);
    if v <= 0.003_130_8 {
        (v * 12.92 * 255.0 + 0.5) as u64
    } else {
        ((1.055 * v.powf(1.0 / 2.4) - 0.055) * 255.0 + 0.5) as u64
    }
}

fn sign_pow(value: f64, exp: f64) -> f64 {
    value.abs().powf(exp).copysign(value)
}

fn basis_factor(pixels: &[u8], width: u32, height: u32, cx: u32, cy: u32) -> [f64; 3] {
    let normalisation = if cx == 0 && cy == 0 { 1.0 } else { 2.0 };
    let mut r = 0.0;
    let mut g = 0.0;
    let mut b = 0.0;

    for y in 0..height {
        let basis_y = (PI * cy as f64 * y as f64 / height as f64).cos();
        for x in 0..width {
            let basis = normalisation * (PI * cx as f64 * x as f64 / width as f64).cos() * basis_y;
            let idx = 4 * (y as usize * width as usize + x as usize);
            r += basis * srgb_to_linear(pixels[idx]);
            g += basis * srgb_to_linear(pixels[idx + 1]);
            b += basis * srgb_to_linear(pixels[idx + 2]);
        }
    }

    let scale = 1.0 / (width as f64 * height as f64);
    [r * scale, g * scale, b * scale]
}

fn encode_dc(value: [f64; 3]) -> u64 {
    (linear_to_srgb(value[0]) << 16) + (linear_to_srgb(value[1]) << 8) + linear_to_srgb(value[2])
}

fn encode_ac(value: [f64; 3], maximum_value: f64) -> u64 {
    let quant = |v: f64| -> u64 {
        (sign_pow(v / maximum_value, 0.5) * 9.0 + 9.5)
            .floor()
            .clamp(0.0, 18.0) as u64
    };
    quant(value[0]) * 19 * 19 + quant(value[1]) * 19 + quant(value[2])
}

/// Encode an RGBA8 pixel buffer into a BlurHash string
pub fn encode(
    pixels: &[u8],
    width: u32,
    height: u32,
    components_x: u32,
    components_y: u32,
) -> Result<String, BlurhashError> {
    if !(1..=9).contains(&components_x) || !(1..=9).contains(&components_y) {
        return Err(BlurhashError::InvalidComponents(components_x, components_y));
    }
    if width == 0 || height == 0 {
        return Err(BlurhashError::EmptyImage);
    }
    if pixels.len() != width as usize * height as usize * 4 {
        return Err(BlurhashError::PixelBufferMismatch {
            actual: pixels.len(),
            width,
            height,
        });
    }

    let mut factors = Vec::with_capacity((components_x * components_y) as usize);
    for cy in 0..components_y {
        for cx in 0..components_x {
            factors.push(basis_factor(pixels, width, height, cx, cy));
        }
    }

    let dc = factors[0];
    let ac = &factors[1..];

    let mut hash = String::with_capacity(4 + 2 * factors.len());
    encode83(((components_x - 1) + (components_y - 1) * 9) as u64, 1, &mut hash);

    let maximum_value = if ac.is_empty() {
        encode83(0, 1, &mut hash);
        1.0
    } else {
        let actual_max = ac
            .iter()
            .flat_map(|c| c.iter())
            .fold(0.0_f64, |acc, v| acc.max(v.abs()));
        let quantised_max = (actual_max * 166.0 - 0.5).floor().clamp(0.0, 82.0) as u64;
        encode83(quantised_max, 1, &mut hash);
        (quantised_max as f64 + 1.0) / 166.0
    };

    encode83(encode_dc(dc), 4, &mut hash);
    for component in ac {
        encode83(encode_ac(*component, maximum_value), 2, &mut hash);
    }

    Ok(hash)
}

/// Encode an image after shrinking it to fit within `max_dimension` pixels
pub fn encode_image(
    img: &DynamicImage,
    max_dimension: u32,
    components_x: u32,
    components_y: u32,
) -> Result<String, BlurhashError> {
    let (width, height) = img.dimensions();
    let small = if width > max_dimension || height > max_dimension {
        img.thumbnail(max_dimension, max_dimension)
    } else {
        img.clone()
    };
    let rgba = small.to_rgba8();
    encode(
        rgba.as_raw(),
        rgba.width(),
        rgba.height(),
        components_x,
        components_y,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn solid(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba(color))
    }

    #[test]
    fn test_white_image_hash() {
        let img = solid(32, 32, [255, 255, 255, 255]);
        let hash = encode(img.as_raw(), 32, 32, 4, 3).unwrap();
        // odd cosine terms do not sum to zero over a flat 32px row
        assert_eq!(hash, "L9TSUA~qfQ~q~qoffQoffQfQfQfQ");
        assert!(is_valid(&hash));
    }

    #[test]
    fn test_black_image_hash() {
        let img = solid(16, 8, [0, 0, 0, 255]);
        let hash = encode(img.as_raw(), 16, 8, 4, 3).unwrap();
        assert_eq!(hash, format!("L00000{}", "fQ".repeat(11)));
    }

    #[test]
    fn test_reference_values() {
        // DC only: flag 0, max 0, then 0xFF0000 in four base-83 digits
        let red = solid(2, 2, [255, 0, 0, 255]);
        assert_eq!(encode(red.as_raw(), 2, 2, 1, 1).unwrap(), "00TI:j");

        // 0x808080
        let grey = solid(2, 2, [128, 128, 128, 255]);
        assert_eq!(encode(grey.as_raw(), 2, 2, 1, 1).unwrap(), "00Eyb[");

        // white|black: DC is linear 0.5 (sRGB 0xBCBCBC), the single AC term
        // is 1.0 which saturates the quantised maximum (82, '~') and maps to
        // quantised 18 per channel
        let mut split = RgbaImage::new(2, 1);
        split.put_pixel(0, 0, Rgba([255, 255, 255, 255]));
        split.put_pixel(1, 0, Rgba([0, 0, 0, 255]));
        assert_eq!(encode(split.as_raw(), 2, 1, 2, 1).unwrap(), "1~Lqe9~q");
    }

    #[test]
    fn test_length_matches_components() {
        let mut img = RgbaImage::new(20, 10);
        for (x, y, px) in img.enumerate_pixels_mut() {
            *px = Rgba([(x * 12) as u8, (y * 25) as u8, 128, 255]);
        }
        for (cx, cy) in [(1, 1), (4, 3), (9, 9), (2, 7)] {
            let hash = encode(img.as_raw(), 20, 10, cx, cy).unwrap();
            assert_eq!(hash.len() as u32, 4 + 2 * cx * cy);
            assert!(is_valid(&hash), "{}", hash);
        }
    }

    #[test]
    fn test_gradient_has_ac_energy() {
        let mut img = RgbaImage::new(32, 32);
        for (x, _, px) in img.enumerate_pixels_mut() {
            let v = (x * 8) as u8;
            *px = Rgba([v, v, v, 255]);
        }
        let hash = encode(img.as_raw(), 32, 32, 4, 3).unwrap();
        // quantised maximum is non-zero for a horizontal gradient
        assert_ne!(&hash[1..2], "0");
    }

    #[test]
    fn test_rejects_bad_arguments() {
        let img = solid(2, 2, [1, 1, 1, 255]);
        assert_eq!(
            encode(img.as_raw(), 2, 2, 0, 3),
            Err(BlurhashError::InvalidComponents(0, 3))
        );
        assert_eq!(
            encode(img.as_raw(), 2, 2, 4, 10),
            Err(BlurhashError::InvalidComponents(4, 10))
        );
        assert!(matches!(
            encode(&img.as_raw()[..8], 2, 2, 4, 3),
            Err(BlurhashError::PixelBufferMismatch { .. })
        ));
        assert_eq!(encode(&[], 0, 0, 4, 3), Err(BlurhashError::EmptyImage));
    }

    #[test]
    fn test_encode_image_downscales() {
        let img = DynamicImage::ImageRgba8(solid(400, 300, [255, 255, 255, 255]));
        let hash = encode_image(&img, 32, 4, 3).unwrap();
        // hashed at 32x24, so the vertical terms differ from the square case
        assert_eq!(hash, "LDTSUA_3fQ_3~qoffQoffQfQfQfQ");
    }
}
