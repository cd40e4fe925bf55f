//! Size-capped image compression.
//!
//! Inputs already under the byte budget with no resize requested are returned
//! untouched. Everything else is decoded, optionally resized, and re-encoded
//! with progressively lower quality and dimensions until it fits the budget
//! or the iteration limit is reached.

use bytes::Bytes;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use img_parts::jpeg::Jpeg;
use img_parts::ImageEXIF;
use std::io::Cursor;

use crate::error::ProcessingError;
use crate::orientation;

const DEFAULT_MAX_SIZE_BYTES: usize = 5 * 1024 * 1024;
const DEFAULT_QUALITY: f32 = 0.9;
const DEFAULT_MAX_ITERATIONS: u32 = 3;
const QUALITY_STEP: f32 = 0.9;
const DIMENSION_STEP: f32 = 0.9;
const MIN_QUALITY: f32 = 0.1;

/// Output format for compressed images
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
}

impl OutputFormat {
    pub fn to_mime_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::WebP => "image/webp",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::WebP => "webp",
        }
    }

    /// Encodable counterpart of a decoded format, if any
    pub fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Jpeg => Some(OutputFormat::Jpeg),
            ImageFormat::Png => Some(OutputFormat::Png),
            ImageFormat::WebP => Some(OutputFormat::WebP),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompressionOptions {
    /// Byte budget for the output
    pub max_size_bytes: usize,
    /// Longest edge of the output; `None` keeps the input dimensions
    pub max_width_or_height: Option<u32>,
    /// Output format; `None` keeps the input format (JPEG when it cannot be encoded)
    pub output_format: Option<OutputFormat>,
    /// Starting quality in 0.0..=1.0 for lossy formats
    pub initial_quality: f32,
    /// Carry the input EXIF block over to JPEG output
    pub preserve_exif: bool,
    /// Maximum number of encode attempts
    pub max_iterations: u32,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self {
            max_size_bytes: DEFAULT_MAX_SIZE_BYTES,
            max_width_or_height: None,
            output_format: None,
            initial_quality: DEFAULT_QUALITY,
            preserve_exif: true,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl CompressionOptions {
    pub fn with_max_size_bytes(mut self, max_size_bytes: usize) -> Self {
        self.max_size_bytes = max_size_bytes;
        self
    }

    pub fn with_max_dimension(mut self, max_width_or_height: u32) -> Self {
        self.max_width_or_height = Some(max_width_or_height);
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn with_quality(mut self, quality: f32) -> Self {
        self.initial_quality = quality;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn strip_exif(mut self) -> Self {
        self.preserve_exif = false;
        self
    }

    pub fn validate(&self) -> Result<(), ProcessingError> {
        if self.max_size_bytes == 0 {
            return Err(ProcessingError::InvalidOptions(
                "max_size_bytes must be positive".to_string(),
            ));
        }
        if self.max_width_or_height == Some(0) {
            return Err(ProcessingError::InvalidOptions(
                "max_width_or_height must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.initial_quality) {
            return Err(ProcessingError::InvalidOptions(format!(
                "quality must be between 0 and 1, got {}",
                self.initial_quality
            )));
        }
        if self.max_iterations == 0 {
            return Err(ProcessingError::InvalidOptions(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Result of a compression run
#[derive(Debug, Clone)]
pub struct CompressedImage {
    pub data: Bytes,
    /// Format of `data`; `None` when the input was returned untouched
    pub format: Option<OutputFormat>,
    pub dimensions: Option<(u32, u32)>,
    pub iterations: u32,
}

impl CompressedImage {
    fn passthrough(data: Bytes) -> Self {
        Self {
            data,
            format: None,
            dimensions: None,
            iterations: 0,
        }
    }

    pub fn is_passthrough(&self) -> bool {
        self.format.is_none()
    }

    /// MIME type of the output, falling back to the input's when untouched
    pub fn content_type<'a>(&self, input_content_type: &'a str) -> &'a str {
        match self.format {
            Some(format) => format.to_mime_type(),
            None => input_content_type,
        }
    }
}

/// Compress on the blocking thread pool
pub async fn compress(
    data: Bytes,
    options: CompressionOptions,
) -> Result<CompressedImage, ProcessingError> {
    if options.max_width_or_height.is_none() && data.len() <= options.max_size_bytes {
        return Ok(CompressedImage::passthrough(data));
    }
    tokio::task::spawn_blocking(move || compress_blocking(&data, &options)).await?
}

/// Synchronous compression; see the module docs for the algorithm
pub fn compress_blocking(
    data: &Bytes,
    options: &CompressionOptions,
) -> Result<CompressedImage, ProcessingError> {
    options.validate()?;

    if options.max_width_or_height.is_none() && data.len() <= options.max_size_bytes {
        return Ok(CompressedImage::passthrough(data.clone()));
    }

    let start = std::time::Instant::now();
    let input_format = image::guess_format(data)?;
    let mut img = image::load_from_memory_with_format(data, input_format)?;

    let output_format = options
        .output_format
        .or_else(|| OutputFormat::from_image_format(input_format))
        .unwrap_or(OutputFormat::Jpeg);

    let exif = if options.preserve_exif {
        read_jpeg_exif(data)
    } else {
        img = orientation::apply_exif_orientation(img, data);
        None
    };

    if let Some(max_dimension) = options.max_width_or_height {
        img = fit_within(img, max_dimension);
    }

    let mut quality = options.initial_quality;
    let mut encoded = encode(&img, output_format, quality)?;
    let mut iterations = 1;

    while encoded.len() > options.max_size_bytes && iterations < options.max_iterations {
        quality = (quality * QUALITY_STEP).max(MIN_QUALITY);
        img = scale_down(img, DIMENSION_STEP);
        encoded = encode(&img, output_format, quality)?;
        iterations += 1;
    }

    if encoded.len() > options.max_size_bytes {
        tracing::warn!(
            size_bytes = encoded.len(),
            max_size_bytes = options.max_size_bytes,
            iterations,
            "Compressed image still exceeds size budget"
        );
    }

    let data = match (exif, output_format) {
        (Some(exif), OutputFormat::Jpeg) => attach_jpeg_exif(encoded, exif)?,
        _ => encoded,
    };

    tracing::debug!(
        output_bytes = data.len(),
        output_format = output_format.to_mime_type(),
        iterations,
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Image compressed"
    );

    Ok(CompressedImage {
        data,
        format: Some(output_format),
        dimensions: Some(img.dimensions()),
        iterations,
    })
}

/// Shrink so neither edge exceeds `max_dimension`; never upscales
pub fn fit_within(img: DynamicImage, max_dimension: u32) -> DynamicImage {
    let (width, height) = img.dimensions();
    if width <= max_dimension && height <= max_dimension {
        return img;
    }
    img.resize(max_dimension, max_dimension, FilterType::Lanczos3)
}

fn scale_down(img: DynamicImage, factor: f32) -> DynamicImage {
    let (width, height) = img.dimensions();
    let new_width = ((width as f32 * factor) as u32).max(1);
    let new_height = ((height as f32 * factor) as u32).max(1);
    if (new_width, new_height) == (width, height) {
        return img;
    }
    img.resize_exact(new_width, new_height, FilterType::Triangle)
}

fn encode(
    img: &DynamicImage,
    format: OutputFormat,
    quality: f32,
) -> Result<Bytes, ProcessingError> {
    match format {
        OutputFormat::Jpeg => encode_jpeg(img, quality),
        OutputFormat::Png => encode_png(img),
        OutputFormat::WebP => Ok(encode_webp(img, quality)),
    }
}

/// JPEG via mozjpeg
fn encode_jpeg(img: &DynamicImage, quality: f32) -> Result<Bytes, ProcessingError> {
    let rgb_img = img.to_rgb8();
    let (width, height) = rgb_img.dimensions();

    let mut comp = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_RGB);
    comp.set_size(width as usize, height as usize);
    comp.set_quality((quality * 100.0).clamp(1.0, 100.0));
    comp.set_progressive_mode();
    comp.set_optimize_coding(true);

    let encode_err = |e: std::io::Error| ProcessingError::Encode(e.to_string());
    let mut comp = comp.start_compress(Vec::new()).map_err(encode_err)?;
    comp.write_scanlines(&rgb_img).map_err(encode_err)?;
    let jpeg_data = comp.finish().map_err(encode_err)?;

    Ok(Bytes::from(jpeg_data))
}

fn encode_png(img: &DynamicImage) -> Result<Bytes, ProcessingError> {
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
    Ok(Bytes::from(buffer))
}

fn encode_webp(img: &DynamicImage, quality: f32) -> Bytes {
    let (width, height) = img.dimensions();
    let rgba_img = img.to_rgba8();
    let encoder = webp::Encoder::from_rgba(&rgba_img, width, height);
    let webp_data = encoder.encode((quality * 100.0).clamp(0.0, 100.0));
    Bytes::copy_from_slice(&webp_data)
}

fn read_jpeg_exif(data: &[u8]) -> Option<img_parts::Bytes> {
    Jpeg::from_bytes(img_parts::Bytes::copy_from_slice(data))
        .ok()
        .and_then(|jpeg| jpeg.exif())
}

fn attach_jpeg_exif(encoded: Bytes, exif: img_parts::Bytes) -> Result<Bytes, ProcessingError> {
    let mut jpeg = Jpeg::from_bytes(img_parts::Bytes::copy_from_slice(&encoded))
        .map_err(|e| ProcessingError::Encode(format!("Failed to reparse JPEG: {}", e)))?;
    jpeg.set_exif(Some(exif));
    Ok(Bytes::from(jpeg.encoder().bytes().to_vec()))
}
