use crate::utils::error::FundusError;
use crate::Result;
use axum::body::Bytes;
use base64::Engine;
use image::{DynamicImage, GenericImageView, ImageFormat};

/// 上传图像最大字节数
pub const MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

pub struct ImageLoader;

impl ImageLoader {
    /// 从base64字符串加载图像
    pub fn from_base64(base64_data: &str) -> Result<DynamicImage> {
        // 检测并移除可能的数据URL前缀 (data:image/xxx;base64,)
        let base64_clean = if base64_data.starts_with("data:") {
            base64_data.split(',').nth(1).unwrap_or(base64_data)
        } else {
            base64_data
        };

        // 解码base64
        let image_bytes = base64::engine::general_purpose::STANDARD
            .decode(base64_clean)
            .map_err(FundusError::Base64)?;

        Self::decode(&image_bytes)
    }

    /// 从字节流加载图像
    pub fn from_bytes(bytes: Bytes) -> Result<DynamicImage> {
        Self::decode(&bytes)
    }

    fn decode(bytes: &[u8]) -> Result<DynamicImage> {
        // 检查文件大小
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(FundusError::FileTooLarge(bytes.len(), MAX_IMAGE_BYTES));
        }

        // 仅接受JPEG/PNG上传
        match Self::detect_format(bytes) {
            Some(format) if Self::is_supported_format(format) => {}
            Some(format) => {
                return Err(FundusError::UnsupportedFormat(format!("{:?}", format)));
            }
            None => {
                return Err(FundusError::InvalidInput(
                    "Unrecognized image data".to_string()
                ));
            }
        }

        let image = image::load_from_memory(bytes)
            .map_err(FundusError::ImageDecode)?;

        Self::validate_dimensions(&image)?;

        Ok(image)
    }

    /// 检测图像格式
    pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
        image::guess_format(bytes).ok()
    }

    /// 验证图像格式是否支持
    pub fn is_supported_format(format: ImageFormat) -> bool {
        matches!(format, ImageFormat::Png | ImageFormat::Jpeg)
    }

    /// 验证图像尺寸
    pub fn validate_dimensions(image: &DynamicImage) -> Result<()> {
        let (width, height) = image.dimensions();

        if width < 16 || height < 16 {
            return Err(FundusError::InvalidInput(
                format!("Image too small: {}x{}, minimum 16x16", width, height)
            ));
        }

        if width > 8192 || height > 8192 {
            return Err(FundusError::InvalidInput(
                format!("Image too large: {}x{}, maximum 8192x8192", width, height)
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(width, height, Rgb([120u8, 80, 40]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn load_png_from_bytes() {
        let bytes = png_bytes(64, 48);
        let image = ImageLoader::from_bytes(Bytes::from(bytes)).unwrap();
        assert_eq!(image.dimensions(), (64, 48));
    }

    #[test]
    fn load_base64_with_data_url_prefix() {
        let bytes = png_bytes(32, 32);
        let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
        let data_url = format!("data:image/png;base64,{}", encoded);

        let image = ImageLoader::from_base64(&data_url).unwrap();
        assert_eq!(image.dimensions(), (32, 32));

        // 无前缀的裸base64同样有效
        let image = ImageLoader::from_base64(&encoded).unwrap();
        assert_eq!(image.dimensions(), (32, 32));
    }

    #[test]
    fn corrupt_base64_fails() {
        let err = ImageLoader::from_base64("!!! not base64 !!!").unwrap_err();
        assert!(matches!(err, FundusError::Base64(_)));
    }

    #[test]
    fn garbage_bytes_fail() {
        let err = ImageLoader::from_bytes(Bytes::from_static(b"not an image")).unwrap_err();
        assert!(matches!(
            err,
            FundusError::InvalidInput(_) | FundusError::UnsupportedFormat(_)
        ));
    }

    #[test]
    fn tiny_image_rejected() {
        let bytes = png_bytes(8, 8);
        let err = ImageLoader::from_bytes(Bytes::from(bytes)).unwrap_err();
        assert!(matches!(err, FundusError::InvalidInput(_)));
    }

    #[test]
    fn supported_formats() {
        assert!(ImageLoader::is_supported_format(ImageFormat::Png));
        assert!(ImageLoader::is_supported_format(ImageFormat::Jpeg));
        assert!(!ImageLoader::is_supported_format(ImageFormat::Gif));
        assert!(!ImageLoader::is_supported_format(ImageFormat::Bmp));
    }
}
