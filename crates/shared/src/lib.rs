//! # Userhub 共有ユーティリティ
//!
//! このクレートは、Userhub の各クレートで使用される共通ユーティリティを提供する。
//!
//! ## 設計方針
//!
//! - ビジネスロジックを含まない純粋なユーティリティのみを配置
//! - axum に依存しない（`IntoResponse` 変換は各サービスの責務）
//! - トレーシング関連は `observability` feature の背後に置く

pub mod api_response;
pub mod error_response;
pub mod health;
#[cfg(feature = "observability")]
pub mod observability;
pub mod paginated_response;

pub use api_response::ApiResponse;
pub use error_response::ErrorResponse;
pub use health::{
    CheckStatus,
    HealthResponse,
    ReadinessChecks,
    ReadinessResponse,
    ReadinessStatus,
};
pub use paginated_response::PaginatedResponse;
