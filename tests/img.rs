#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use file_preview::img::{
        Format, ImageResizer, ImageService, ImgError, Quality, ResizeMode, ResizeOptions,
    };
    use image::{DynamicImage, ImageFormat, RgbImage};

    fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), format)
            .unwrap();
        buf
    }

    async fn resize(source: &[u8], width: u32, height: u32, options: ResizeOptions) -> Result<Vec<u8>, ImgError> {
        let resizer = ImageResizer::new(2);
        let mut input = source;
        let mut output = Vec::new();
        resizer
            .resize(&mut input, width, height, &mut output, options)
            .await?;
        Ok(output)
    }

    fn thumb() -> ResizeOptions {
        ResizeOptions::default()
            .with_mode(ResizeMode::Fill)
            .with_quality(Quality::Low)
            .with_format(Format::Jpeg)
    }

    #[tokio::test]
    async fn test_thumbnail_is_square_jpeg() {
        let source = encoded(300, 200, ImageFormat::Png);
        let out = resize(&source, 128, 128, thumb()).await.unwrap();

        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Jpeg);
        let img = image::load_from_memory(&out).unwrap();
        assert_eq!((img.width(), img.height()), (128, 128));
    }

    #[tokio::test]
    async fn test_fit_keeps_aspect_ratio_and_format() {
        let source = encoded(2000, 1000, ImageFormat::Png);
        let out = resize(&source, 1080, 1080, ResizeOptions::default()).await.unwrap();

        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Png);
        let img = image::load_from_memory(&out).unwrap();
        assert_eq!((img.width(), img.height()), (1080, 540));
    }

    #[tokio::test]
    async fn test_fit_never_upscales() {
        let source = encoded(64, 48, ImageFormat::Bmp);
        let out = resize(&source, 1080, 1080, ResizeOptions::default()).await.unwrap();

        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Bmp);
        let img = image::load_from_memory(&out).unwrap();
        assert_eq!((img.width(), img.height()), (64, 48));
    }

    #[tokio::test]
    async fn test_requested_format_wins_over_source_bytes() {
        // PNG content stored under a .jpg name is re-encoded as JPEG
        let source = encoded(200, 100, ImageFormat::Png);
        let options = ResizeOptions::default().with_format(Format::Jpeg);
        let out = resize(&source, 1080, 1080, options).await.unwrap();

        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Jpeg);
        let img = image::load_from_memory(&out).unwrap();
        assert_eq!((img.width(), img.height()), (200, 100));
    }

    #[tokio::test]
    async fn test_jpeg_quality_affects_size() {
        let source = encoded(512, 512, ImageFormat::Png);
        let options = ResizeOptions::default().with_format(Format::Jpeg);

        let low = resize(&source, 512, 512, options.with_quality(Quality::Low)).await.unwrap();
        let high = resize(&source, 512, 512, options.with_quality(Quality::High)).await.unwrap();
        assert!(low.len() < high.len(), "low {} >= high {}", low.len(), high.len());
    }

    #[tokio::test]
    async fn test_garbage_input_is_an_error() {
        let err = resize(b"definitely not an image", 128, 128, thumb()).await.unwrap_err();
        assert!(matches!(err, ImgError::Codec(_)), "{err}");
    }

    #[test]
    fn test_format_from_extension() {
        let resizer = ImageResizer::new(1);
        for (ext, format) in [
            (".jpg", Format::Jpeg),
            (".JPEG", Format::Jpeg),
            ("png", Format::Png),
            (".gif", Format::Gif),
            (".tif", Format::Tiff),
            (".bmp", Format::Bmp),
        ] {
            assert_eq!(resizer.format_from_extension(ext).unwrap(), format, "{ext}");
        }

        for ext in ["", ".svg", ".webp", ".heic", ".txt"] {
            assert!(matches!(
                resizer.format_from_extension(ext),
                Err(ImgError::UnsupportedFormat)
            ));
        }
    }
}
