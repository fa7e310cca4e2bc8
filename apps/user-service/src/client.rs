//! # 外部 API クライアント
//!
//! Auth Service など外部サービスとの通信を担当する。

pub mod auth_service;

pub use auth_service::{
    AuthServiceError,
    AuthServiceTokenValidator,
    TokenValidator,
    ValidateTokenResponse,
};
