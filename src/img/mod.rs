//! Image format detection and resizing.

mod resizer;

use async_trait::async_trait;
use image::imageops::FilterType;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};

pub use resizer::ImageResizer;

#[derive(Error, Debug)]
pub enum ImgError {
    #[error("unsupported image format")]
    UnsupportedFormat,
    #[error("image codec error: {0}")]
    Codec(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("resize worker failed: {0}")]
    Worker(String),
}

/// Image formats the preview pipeline knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Jpeg,
    Png,
    Gif,
    Tiff,
    Bmp,
}

impl Format {
    /// Accepts extensions with or without the leading dot, in any case.
    pub fn from_extension(ext: &str) -> Result<Self, ImgError> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Ok(Format::Jpeg),
            "png" => Ok(Format::Png),
            "gif" => Ok(Format::Gif),
            "tif" | "tiff" => Ok(Format::Tiff),
            "bmp" => Ok(Format::Bmp),
            _ => Err(ImgError::UnsupportedFormat),
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            Format::Jpeg => "image/jpeg",
            Format::Png => "image/png",
            Format::Gif => "image/gif",
            Format::Tiff => "image/tiff",
            Format::Bmp => "image/bmp",
        }
    }

    pub(crate) fn image_format(self) -> image::ImageFormat {
        match self {
            Format::Jpeg => image::ImageFormat::Jpeg,
            Format::Png => image::ImageFormat::Png,
            Format::Gif => image::ImageFormat::Gif,
            Format::Tiff => image::ImageFormat::Tiff,
            Format::Bmp => image::ImageFormat::Bmp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeMode {
    /// Scale down to fit inside the box, keeping the aspect ratio.
    #[default]
    Fit,
    /// Scale and crop so the box is fully covered.
    Fill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quality {
    Low,
    #[default]
    Medium,
    High,
}

impl Quality {
    pub(crate) fn filter(self) -> FilterType {
        match self {
            Quality::Low => FilterType::Nearest,
            Quality::Medium => FilterType::Triangle,
            Quality::High => FilterType::Lanczos3,
        }
    }

    pub(crate) fn jpeg_quality(self) -> u8 {
        match self {
            Quality::Low => 70,
            Quality::Medium => 80,
            Quality::High => 90,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResizeOptions {
    pub mode: ResizeMode,
    pub quality: Quality,
    /// Output format; `None` keeps the source format.
    pub format: Option<Format>,
}

impl ResizeOptions {
    pub fn with_mode(mut self, mode: ResizeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }
}

/// Transform collaborator. Implementations are shared by all requests and
/// must tolerate concurrent calls.
#[async_trait]
pub trait ImageService: Send + Sync {
    fn format_from_extension(&self, ext: &str) -> Result<Format, ImgError>;

    /// Reads the whole of `input`, writes the resized image to `output`.
    async fn resize(
        &self,
        input: &mut (dyn AsyncRead + Send + Unpin),
        width: u32,
        height: u32,
        output: &mut (dyn AsyncWrite + Send + Unpin),
        options: ResizeOptions,
    ) -> Result<(), ImgError>;
}
