use std::sync::Arc;

use tracing::debug;

use crate::files::FileDescriptor;
use crate::img::{Format, ImageService, Quality, ResizeMode, ResizeOptions};
use crate::{PreviewError, PreviewSize, Result};

pub const BIG_DIMENSION: u32 = 1080;
pub const THUMB_DIMENSION: u32 = 128;

/// Which size classes may be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderPolicy {
    pub enable_thumbnails: bool,
    pub resize_preview: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTarget {
    pub width: u32,
    pub height: u32,
    pub options: ResizeOptions,
}

impl RenderTarget {
    /// Fixed geometry and encoding of a size class, whether or not it is
    /// currently enabled.
    pub fn for_size(size: PreviewSize) -> Self {
        match size {
            PreviewSize::Big => RenderTarget {
                width: BIG_DIMENSION,
                height: BIG_DIMENSION,
                options: ResizeOptions::default()
                    .with_mode(ResizeMode::Fit)
                    .with_quality(Quality::Medium),
            },
            PreviewSize::Thumb => RenderTarget {
                width: THUMB_DIMENSION,
                height: THUMB_DIMENSION,
                options: ResizeOptions::default()
                    .with_mode(ResizeMode::Fill)
                    .with_quality(Quality::Low)
                    .with_format(Format::Jpeg),
            },
        }
    }

    /// MIME type of the rendition produced from a `source` image.
    pub fn content_type(&self, source: Format) -> &'static str {
        self.options.format.unwrap_or(source).mime()
    }
}

impl RenderPolicy {
    pub fn enabled(&self, size: PreviewSize) -> bool {
        match size {
            PreviewSize::Big => self.resize_preview,
            PreviewSize::Thumb => self.enable_thumbnails,
        }
    }

    pub fn target(&self, size: PreviewSize) -> Result<RenderTarget> {
        if !self.enabled(size) {
            return Err(PreviewError::Disabled(size));
        }
        Ok(RenderTarget::for_size(size))
    }
}

/// Produces the in-memory rendition of one file for one size class.
pub struct PreviewRenderer {
    images: Arc<dyn ImageService>,
    policy: RenderPolicy,
}

impl PreviewRenderer {
    pub fn new(images: Arc<dyn ImageService>, policy: RenderPolicy) -> Self {
        Self { images, policy }
    }

    /// Renders `file`, whose extension names `source`. Sizes without a
    /// forced format are encoded as `source`, matching the advertised type.
    pub async fn render(
        &self,
        file: &FileDescriptor,
        size: PreviewSize,
        source: Format,
    ) -> Result<Vec<u8>> {
        let target = self.policy.target(size)?;
        let options = match target.options.format {
            Some(_) => target.options,
            None => target.options.with_format(source),
        };

        // dropped on every return below, closing the source
        let mut reader = file.open().await?;
        let mut buf = Vec::new();
        self.images
            .resize(&mut *reader, target.width, target.height, &mut buf, options)
            .await?;

        debug!(path = %file.path, %size, bytes = buf.len(), "rendered preview");
        Ok(buf)
    }
}
