use std::sync::Arc;

use rocket::http::Status;
use tracing::{debug, info};

use super::freshness::{http_date, Freshness, Validators};
use super::key::preview_cache_key;
use super::renderer::{PreviewRenderer, RenderPolicy, RenderTarget};
use super::response::{content_disposition, PreviewResponse};
use super::writer::{CacheWriter, WriterConfig};
use crate::cache::FileCache;
use crate::files::{FileDescriptor, FileOptions, FileResolver};
use crate::img::{Format, ImageService, ImgError};
use crate::{FileKind, FileTypeDetector, PreviewError, PreviewSettings, PreviewSize, Result, User};

/// One preview request, already authenticated.
#[derive(Debug, Clone)]
pub struct PreviewRequest {
    pub user: User,
    /// Raw size token from the route.
    pub size: String,
    pub path: String,
    pub inline: bool,
    pub validators: Validators,
}

impl PreviewRequest {
    pub fn new(user: User, size: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            user,
            size: size.into(),
            path: path.into(),
            inline: false,
            validators: Validators::default(),
        }
    }

    pub fn with_validators(mut self, validators: Validators) -> Self {
        self.validators = validators;
        self
    }

    pub fn with_inline(mut self, inline: bool) -> Self {
        self.inline = inline;
        self
    }
}

pub struct PreviewHandler {
    resolver: Arc<dyn FileResolver>,
    images: Arc<dyn ImageService>,
    cache: Arc<dyn FileCache>,
    renderer: PreviewRenderer,
    writer: CacheWriter,
    read_header: bool,
}

impl PreviewHandler {
    /// Must be called inside a tokio runtime: spawns the cache writer pool.
    pub fn new(
        resolver: Arc<dyn FileResolver>,
        images: Arc<dyn ImageService>,
        cache: Arc<dyn FileCache>,
        settings: &PreviewSettings,
    ) -> Self {
        let policy = RenderPolicy {
            enable_thumbnails: settings.enable_thumbnails,
            resize_preview: settings.resize_preview,
        };
        let writer = CacheWriter::spawn(
            Arc::clone(&cache),
            WriterConfig {
                workers: settings.store_workers,
                queue: settings.store_queue,
                timeout: settings.store_timeout(),
            },
        );

        Self {
            renderer: PreviewRenderer::new(Arc::clone(&images), policy),
            resolver,
            images,
            cache,
            writer,
            read_header: settings.type_detection_by_header,
        }
    }

    pub fn writer(&self) -> &CacheWriter {
        &self.writer
    }

    pub async fn handle(&self, request: PreviewRequest) -> Result<PreviewResponse> {
        if !request.user.perm.download {
            debug!(user = %request.user.username, path = %request.path, "download not permitted");
            return Ok(PreviewResponse::empty(Status::Forbidden));
        }

        let size: PreviewSize = request.size.parse()?;

        let file = self
            .resolver
            .resolve(FileOptions {
                user: &request.user,
                path: &request.path,
                read_header: self.read_header,
            })
            .await?;

        let disposition = content_disposition(&file.name, request.inline);

        let response = match file.kind {
            FileKind::Image => self.image_preview(&request.validators, &file, size).await?,
            kind => return Err(PreviewError::NotImplemented(kind)),
        };
        Ok(response.with_header("Content-Disposition", disposition))
    }

    async fn image_preview(
        &self,
        validators: &Validators,
        file: &FileDescriptor,
        size: PreviewSize,
    ) -> Result<PreviewResponse> {
        let format = match self.images.format_from_extension(&file.extension) {
            Ok(Format::Gif) | Err(ImgError::UnsupportedFormat) => return self.raw(file).await,
            Ok(format) => format,
            Err(e) => return Err(e.into()),
        };

        let freshness = Freshness::check(validators, file.modified_unix(), file.size);
        if freshness.fresh {
            debug!(path = %file.path, %size, "preview not modified");
            return Ok(PreviewResponse::empty(Status::NotModified).with_headers(freshness.headers()));
        }

        // cached entries of a disabled size are still served, with the
        // encoding of their size class
        let content_type = RenderTarget::for_size(size).content_type(format);

        let key = preview_cache_key(&file.path, file.modified_unix(), size);
        if let Some(cached) = self.cache.load(&key).await? {
            debug!(path = %file.path, %size, %key, "preview cache hit");
            return Ok(PreviewResponse::bytes(cached)
                .with_headers(freshness.headers())
                .with_header("Content-Type", content_type));
        }

        let rendered = self.renderer.render(file, size, format).await?;
        info!(path = %file.path, %size, bytes = rendered.len(), "preview rendered");
        self.writer.submit(key, rendered.clone());

        Ok(PreviewResponse::bytes(rendered)
            .with_headers(freshness.headers())
            .with_header("Content-Type", content_type))
    }

    async fn raw(&self, file: &FileDescriptor) -> Result<PreviewResponse> {
        debug!(path = %file.path, "serving original file");
        let content_type = FileTypeDetector::mime_from_name(&file.name)
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let reader = file.open().await?;

        Ok(PreviewResponse::stream(reader)
            .with_header("Content-Type", content_type)
            .with_header("Last-Modified", http_date(file.modified_unix())))
    }

    /// Stops accepting cache writes and waits for queued ones.
    pub async fn shutdown(self) {
        self.writer.shutdown().await;
    }
}
