use crate::{
    analysis::{AnalysisPipeline, AnalysisResult},
    utils::error::FundusError,
    web::extractors::{Validate, ValidatedJson},
    Config, Result,
};
use axum::{
    extract::{Multipart, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// JSON请求体（base64模式）
#[derive(Debug, Deserialize)]
pub struct PredictJsonRequest {
    /// Base64编码的图像数据，允许带data URL前缀
    pub image: String,
}

impl Validate for PredictJsonRequest {
    type Error = String;

    fn validate(&self) -> std::result::Result<(), Self::Error> {
        if self.image.trim().is_empty() {
            return Err("Image data cannot be empty".to_string());
        }

        Ok(())
    }
}

/// JSON响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    pub timestamp: String,
    pub request_id: String,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
            request_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn error(code: String, message: String) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError { code, message }),
            timestamp: chrono::Utc::now().to_rfc3339(),
            request_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// JSON base64上传处理器
pub async fn predict_json_handler(
    State(_config): State<Config>,
    ValidatedJson(request): ValidatedJson<PredictJsonRequest>,
) -> Result<Json<ApiResponse<AnalysisResult>>> {
    let start_time = Instant::now();
    let request_id = uuid::Uuid::new_v4().to_string();

    tracing::info!("Processing JSON predict request: request_id={}", request_id);

    let result = AnalysisPipeline::process_base64(&request.image).await?;

    tracing::info!(
        "JSON predict completed: request_id={}, condition={}, time={:.3}s",
        request_id,
        result.condition,
        start_time.elapsed().as_secs_f32()
    );

    Ok(Json(ApiResponse::success(result)))
}

/// Multipart文件上传处理器
pub async fn predict_upload_handler(
    State(_config): State<Config>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<AnalysisResult>>> {
    let start_time = Instant::now();
    let request_id = uuid::Uuid::new_v4().to_string();

    tracing::info!("Processing multipart predict request: request_id={}", request_id);

    let mut image_data: Option<axum::body::Bytes> = None;

    // 解析multipart数据
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        FundusError::InvalidInput(format!("Failed to read multipart field: {}", e))
    })? {
        let field_name = field.name().unwrap_or("unknown").to_string();

        match field_name.as_str() {
            "file" => {
                // 验证内容类型
                if let Some(content_type) = field.content_type() {
                    if !content_type.starts_with("image/") {
                        return Err(FundusError::UnsupportedFormat(content_type.to_string()));
                    }
                }

                // 读取文件数据
                let data = field.bytes().await.map_err(|e| {
                    FundusError::InvalidInput(format!("Failed to read file data: {}", e))
                })?;

                if data.is_empty() {
                    return Err(FundusError::InvalidInput("Empty file".to_string()));
                }

                tracing::debug!("Received file: {} bytes", data.len());
                image_data = Some(data);
            }
            _ => {
                tracing::debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    // 验证必需的图像数据
    let image_data = image_data.ok_or_else(|| {
        FundusError::InvalidInput("No image file provided".to_string())
    })?;

    let result = AnalysisPipeline::process_bytes(image_data).await?;

    tracing::info!(
        "Upload predict completed: request_id={}, condition={}, confidence={:.2}%, time={:.3}s",
        request_id,
        result.condition,
        result.confidence,
        start_time.elapsed().as_secs_f32()
    );

    Ok(Json(ApiResponse::success(result)))
}
