//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各ハンドラはサブモジュールに配置
//! - 親モジュール（この `handler.rs`）で re-export し、フラットな API を提供
//! - ハンドラは薄く保ち、ビジネスロジックはユースケース層に委譲
//! - 認証が必要なハンドラは `Extension<Identity>` で呼び出し元を受け取る

pub mod card;
pub mod health;
pub mod user;

pub use card::{CardState, create_card, delete_card, get_card, list_cards, list_my_cards};
pub use health::{ReadinessState, health_check, readiness_check};
use serde::Deserialize;
pub use user::{
    UserState,
    create_user,
    delete_user,
    get_user,
    get_user_by_email,
    get_user_with_cards,
    list_users,
    update_user,
};
use userhub_domain::page::PageRequest;

/// ページングのクエリパラメータ
///
/// `page` はゼロ始まり。`size` は 1〜100 に丸める。
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl PageQuery {
    pub fn into_request(self) -> PageRequest {
        PageRequest::new(self.page, self.size)
    }
}
