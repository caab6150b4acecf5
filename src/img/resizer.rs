use std::io::Cursor;

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Semaphore;
use tracing::debug;

use super::{Format, ImageService, ImgError, Quality, ResizeMode, ResizeOptions};

/// [`ImageService`] backed by the `image` crate. Decoding and encoding run
/// on the blocking pool, at most `workers` at a time.
pub struct ImageResizer {
    permits: Semaphore,
}

impl ImageResizer {
    pub fn new(workers: usize) -> Self {
        Self {
            permits: Semaphore::new(workers.max(1)),
        }
    }
}

#[async_trait]
impl ImageService for ImageResizer {
    fn format_from_extension(&self, ext: &str) -> Result<Format, ImgError> {
        Format::from_extension(ext)
    }

    async fn resize(
        &self,
        input: &mut (dyn AsyncRead + Send + Unpin),
        width: u32,
        height: u32,
        output: &mut (dyn AsyncWrite + Send + Unpin),
        options: ResizeOptions,
    ) -> Result<(), ImgError> {
        let mut data = Vec::new();
        input.read_to_end(&mut data).await?;

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| ImgError::Worker(e.to_string()))?;

        let encoded = tokio::task::spawn_blocking(move || resize_image(&data, width, height, options))
            .await
            .map_err(|e| ImgError::Worker(e.to_string()))??;

        output.write_all(&encoded).await?;
        output.flush().await?;
        Ok(())
    }
}

fn resize_image(data: &[u8], width: u32, height: u32, options: ResizeOptions) -> Result<Vec<u8>, ImgError> {
    let source_format = image::guess_format(data)?;
    let img = image::load_from_memory_with_format(data, source_format)?;
    debug!(
        source_width = img.width(),
        source_height = img.height(),
        width,
        height,
        mode = ?options.mode,
        "resizing image"
    );

    let filter = options.quality.filter();
    let resized = match options.mode {
        // never upscale
        ResizeMode::Fit if img.width() <= width && img.height() <= height => img,
        ResizeMode::Fit => img.resize(width, height, filter),
        ResizeMode::Fill => img.resize_to_fill(width, height, filter),
    };

    let target = options
        .format
        .map(Format::image_format)
        .unwrap_or(source_format);
    encode(&resized, target, options.quality)
}

fn encode(img: &DynamicImage, format: ImageFormat, quality: Quality) -> Result<Vec<u8>, ImgError> {
    let mut buf = Vec::new();
    match format {
        ImageFormat::Jpeg => {
            let rgb = img.to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality.jpeg_quality());
            encoder.encode_image(&rgb)?;
        }
        other => img.write_to(&mut Cursor::new(&mut buf), other)?,
    }
    Ok(buf)
}
