//! # ユースケース層
//!
//! User Service のビジネスロジックを実装する。
//!
//! ## 設計方針
//!
//! - **依存性注入**: リポジトリ・キャッシュを `Arc<dyn Trait>` で外部から注入
//! - **明示的な呼び出し元**: 認証済みの [`Identity`](userhub_domain::identity::Identity)
//!   を各メソッドの引数で受け取る
//! - **薄いハンドラ**: ハンドラは薄く保ち、ロジックはユースケースに集約
//!
//! ## モジュール構成
//!
//! - `access`: 本人または管理者のアクセス判定
//! - `user`: ユーザー管理（キャッシュの読み書き・無効化を含む）
//! - `card`: カード管理

pub mod access;
pub mod card;
pub mod user;

pub use access::AccessGate;
pub use card::{CardInput, CardUseCaseImpl};
pub use user::{UserInput, UserUseCaseImpl, UserWithCards};
