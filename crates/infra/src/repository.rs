//! # リポジトリ実装
//!
//! ユースケース層が依存するリポジトリトレイトと、その PostgreSQL 実装を提供する。
//!
//! ## 設計方針
//!
//! - **依存性逆転**: ユースケース層はトレイト（`Arc<dyn UserRepository>` など）にのみ依存
//! - **データベース抽象化**: sqlx を使用し、PostgreSQL 固有の処理をカプセル化
//! - **テスタビリティ**: `test-utils` feature でインメモリ実装（[`crate::mock`]）を提供

pub mod card_repository;
pub mod user_repository;

pub use card_repository::{CardRepository, PostgresCardRepository};
pub use user_repository::{PostgresUserRepository, UserRepository};
