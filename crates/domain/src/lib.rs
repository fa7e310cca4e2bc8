//! # Userhub ドメイン層
//!
//! ユーザーとカードを管理するためのドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **エンティティ**: 一意の識別子を持つオブジェクト（[`user::User`],
//!   [`card::Card`]）
//! - **値オブジェクト**: 生成時に検証される不変オブジェクト（[`user::Email`],
//!   [`card::CardNumber`] など）
//! - **呼び出し元**: リクエスト境界で一度だけ生成される [`identity::Identity`]
//! - **ドメインエラー**: ビジネスルール違反を表現するエラー型
//!
//! ## 依存関係の方向
//!
//! ```text
//! user-service → infra → domain
//! ```
//!
//! ドメイン層はインフラ層（DB、Redis、外部サービス）に一切依存しない。
//!
//! ## モジュール構成
//!
//! - [`error`] - ドメイン層で発生するエラーの定義
//! - [`clock`] - 現在時刻の抽象化
//! - [`user`] - ユーザーエンティティと値オブジェクト
//! - [`card`] - カードエンティティと値オブジェクト
//! - [`identity`] - 認証済み呼び出し元とロール
//! - [`page`] - オフセットベースのページング
//!
//! ## 使用例
//!
//! ```rust
//! use userhub_domain::{DomainError, user::Email};
//!
//! let email = Email::new("tom@example.com").unwrap();
//! assert_eq!(email.as_str(), "tom@example.com");
//!
//! let error = Email::new("invalid").unwrap_err();
//! assert!(matches!(error, DomainError::Validation(_)));
//! ```

#[macro_use]
mod macros;

pub mod card;
pub mod clock;
pub mod error;
pub mod identity;
pub mod page;
pub mod user;

pub use error::DomainError;
