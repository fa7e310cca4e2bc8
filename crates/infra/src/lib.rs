//! # Userhub インフラ層
//!
//! 外部システムとの接続・通信を担当するインフラストラクチャ層。
//!
//! ## 責務
//!
//! - **データベース接続**: PostgreSQL への接続プール、マイグレーション、トランザクション
//! - **キャッシュ**: Redis を使ったユーザー読み取りキャッシュ
//! - **リポジトリ実装**: ユーザー・カードの永続化
//!
//! ## 依存関係
//!
//! ```text
//! user-service → infra → domain
//! ```
//!
//! ## モジュール構成
//!
//! - [`db`] - PostgreSQL 接続管理とトランザクション
//! - [`redis`] - Redis 接続管理
//! - [`cache`] - 世代付きユーザーキャッシュ
//! - [`error`] - インフラ層エラー定義
//! - [`repository`] - リポジトリ実装
//! - `mock` - テスト用インメモリ実装（`test-utils` feature）
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use userhub_infra::{db, redis};
//!
//! async fn setup() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = db::create_pool("postgres://localhost/userhub").await?;
//!     db::run_migrations(&pool).await?;
//!
//!     let redis = redis::create_connection_manager("redis://localhost").await?;
//!
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod db;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod redis;
pub mod repository;

pub use cache::{NoopUserCache, RedisUserCache, UserCache, UserCacheKey};
pub use error::InfraError;
