use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FundusError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Class metadata invalid: {0}")]
    Metadata(String),

    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File too large: {0} bytes, max allowed: {1} bytes")]
    FileTooLarge(usize, usize),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Image decode error: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("ORT error: {0}")]
    Ort(#[from] ort::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl FundusError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            FundusError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            FundusError::FileTooLarge(_, _) => StatusCode::PAYLOAD_TOO_LARGE,
            FundusError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            FundusError::Base64(_) => StatusCode::BAD_REQUEST,
            FundusError::Json(_) => StatusCode::BAD_REQUEST,
            FundusError::ImageDecode(_) => StatusCode::BAD_REQUEST,
            FundusError::ModelLoad(_) => StatusCode::SERVICE_UNAVAILABLE,
            FundusError::Metadata(_) => StatusCode::SERVICE_UNAVAILABLE,
            FundusError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            FundusError::ModelLoad(_) => "MODEL_LOAD_ERROR",
            FundusError::Metadata(_) => "METADATA_ERROR",
            FundusError::ImageProcessing(_) => "IMAGE_PROCESSING_ERROR",
            FundusError::Inference(_) => "INFERENCE_ERROR",
            FundusError::InvalidInput(_) => "INVALID_INPUT",
            FundusError::FileTooLarge(_, _) => "FILE_TOO_LARGE",
            FundusError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            FundusError::Config(_) => "CONFIG_ERROR",
            FundusError::Io(_) => "IO_ERROR",
            FundusError::Json(_) => "JSON_ERROR",
            FundusError::Base64(_) => "BASE64_DECODE_ERROR",
            FundusError::ImageDecode(_) => "IMAGE_DECODE_ERROR",
            FundusError::Ort(_) => "ORT_ERROR",
            FundusError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for FundusError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        });

        tracing::error!("Request failed: {} ({})", self, status);

        (status, axum::Json(error_response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_failures_map_to_client_errors() {
        assert_eq!(
            FundusError::InvalidInput("empty".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            FundusError::FileTooLarge(100, 10).status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            FundusError::UnsupportedFormat("image/gif".into()).status_code(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
    }

    #[test]
    fn startup_failures_map_to_service_unavailable() {
        assert_eq!(
            FundusError::ModelLoad("missing".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            FundusError::Metadata("no classes".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            FundusError::Metadata("no classes".into()).error_code(),
            "METADATA_ERROR"
        );
    }
}
