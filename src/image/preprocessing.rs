use crate::Result;
use image::{imageops::FilterType, DynamicImage};
use ndarray::Array4;

/// 模型输入的空间分辨率
pub const INPUT_WIDTH: u32 = 224;
pub const INPUT_HEIGHT: u32 = 224;

/// 训练管线使用的ImageNet通道统计量，必须与导出模型严格一致
pub const CHANNEL_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const CHANNEL_STD: [f32; 3] = [0.229, 0.224, 0.225];

pub struct ImagePreprocessor;

impl ImagePreprocessor {
    /// 将任意分辨率的RGB图像转换为模型输入张量
    ///
    /// 非等比拉伸到224x224（无letterbox），缩放到[0,1]后按通道归一化，
    /// 输出NHWC形状 (1, 224, 224, 3)。
    pub fn preprocess(image: &DynamicImage) -> Result<Array4<f32>> {
        let resized = image.resize_exact(INPUT_WIDTH, INPUT_HEIGHT, FilterType::Triangle);
        let rgb = resized.to_rgb8();

        let mut tensor = Array4::<f32>::zeros((
            1,
            INPUT_HEIGHT as usize,
            INPUT_WIDTH as usize,
            3,
        ));

        for (x, y, pixel) in rgb.enumerate_pixels() {
            for c in 0..3 {
                let value = pixel.0[c] as f32 / 255.0;
                tensor[[0, y as usize, x as usize, c]] =
                    (value - CHANNEL_MEAN[c]) / CHANNEL_STD[c];
            }
        }

        Ok(tensor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use image::{ImageBuffer, Rgb};

    fn solid_image(width: u32, height: u32, rgb: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_pixel(width, height, Rgb(rgb)))
    }

    #[test]
    fn output_shape_is_fixed_for_any_resolution() {
        for (w, h) in [(64, 48), (224, 224), (500, 300), (1024, 1024), (17, 333)] {
            let tensor = ImagePreprocessor::preprocess(&solid_image(w, h, [0, 0, 0])).unwrap();
            assert_eq!(tensor.shape(), &[1, 224, 224, 3]);
        }
    }

    #[test]
    fn white_image_normalizes_per_channel() {
        let tensor = ImagePreprocessor::preprocess(&solid_image(100, 100, [255, 255, 255])).unwrap();

        for c in 0..3 {
            let expected = (1.0 - CHANNEL_MEAN[c]) / CHANNEL_STD[c];
            assert_relative_eq!(tensor[[0, 0, 0, c]], expected, epsilon = 1e-5);
            assert_relative_eq!(tensor[[0, 223, 223, c]], expected, epsilon = 1e-5);
        }
    }

    #[test]
    fn black_image_normalizes_per_channel() {
        let tensor = ImagePreprocessor::preprocess(&solid_image(100, 100, [0, 0, 0])).unwrap();

        for c in 0..3 {
            let expected = -CHANNEL_MEAN[c] / CHANNEL_STD[c];
            assert_relative_eq!(tensor[[0, 112, 112, c]], expected, epsilon = 1e-5);
        }
    }

    #[test]
    fn values_stay_in_normalized_range() {
        let tensor = ImagePreprocessor::preprocess(&solid_image(320, 240, [37, 150, 240])).unwrap();

        // [0,1]归一化后的理论界限
        let lower = -CHANNEL_MEAN
            .iter()
            .zip(CHANNEL_STD.iter())
            .map(|(m, s)| m / s)
            .fold(f32::NEG_INFINITY, f32::max);
        let upper = CHANNEL_MEAN
            .iter()
            .zip(CHANNEL_STD.iter())
            .map(|(m, s)| (1.0 - m) / s)
            .fold(f32::NEG_INFINITY, f32::max);

        for &v in tensor.iter() {
            assert!(v >= -lower - 1e-4 && v <= upper + 1e-4, "value {} out of range", v);
        }
    }

    #[test]
    fn preprocessing_is_deterministic() {
        let image = solid_image(321, 123, [12, 200, 99]);
        let a = ImagePreprocessor::preprocess(&image).unwrap();
        let b = ImagePreprocessor::preprocess(&image).unwrap();
        assert_eq!(a, b);
    }
}
