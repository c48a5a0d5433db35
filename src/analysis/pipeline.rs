use crate::{
    analysis::{AnalysisResult, ModelInfo},
    image::{ImageLoader, ImagePreprocessor},
    models::{get_catalog, get_classifier},
    Result,
};
use image::DynamicImage;
use std::time::Instant;

/// 图像分析流水线：解码 -> 预处理 -> 推理 -> 结果呈现
pub struct AnalysisPipeline;

impl AnalysisPipeline {
    /// 处理base64图像
    pub async fn process_base64(base64_data: &str) -> Result<AnalysisResult> {
        let start_time = Instant::now();

        let image = ImageLoader::from_base64(base64_data)?;

        Self::process_image(image, start_time).await
    }

    /// 处理字节流图像
    pub async fn process_bytes(bytes: axum::body::Bytes) -> Result<AnalysisResult> {
        let start_time = Instant::now();

        let image = ImageLoader::from_bytes(bytes)?;

        Self::process_image(image, start_time).await
    }

    /// 核心分析流水线
    async fn process_image(image: DynamicImage, start_time: Instant) -> Result<AnalysisResult> {
        let input_tensor = ImagePreprocessor::preprocess(&image)?;

        let classifier = get_classifier()?;
        let catalog = get_catalog()?;

        let inference_start = Instant::now();
        let probabilities = classifier.predict(input_tensor)?;
        let inference_time = inference_start.elapsed();

        let total_time = start_time.elapsed();

        let result = AnalysisResult::from_probabilities(
            &catalog,
            &probabilities,
            total_time.as_secs_f32(),
        )?
        .with_model_info(ModelInfo {
            model_name: catalog.model_name().to_string(),
            test_accuracy: catalog.test_accuracy(),
        });

        tracing::info!(
            "Analysis completed: condition={}, confidence={:.2}%, inference_time={:.3}s, total_time={:.3}s",
            result.condition,
            result.confidence,
            inference_time.as_secs_f32(),
            total_time.as_secs_f32()
        );

        Ok(result)
    }
}
