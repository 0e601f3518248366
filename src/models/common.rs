use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 统一错误响应里的 error 字段
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    #[schema(example = "VALIDATION_ERROR")]
    pub code: String,
    #[schema(example = "Invalid email address")]
    pub message: String,
}
