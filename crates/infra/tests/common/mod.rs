//! テスト共通フィクスチャ
//!
//! DB を使用する統合テストで共通利用するエンティティ生成ヘルパー。
//! Rust の統合テスト規約に従い `tests/common/mod.rs` に配置。

// 各テストファイルが独立したクレートとしてコンパイルされるため、
// 使用しない関数に dead_code 警告が出る。モジュール全体で抑制する。
#![allow(dead_code)]

use chrono::NaiveDate;
use sqlx::PgPool;
use userhub_domain::{
    card::{Card, CardId, CardNumber, ExpirationDate, HolderName},
    user::{BirthDate, Email, Surname, User, UserId, UserName},
};
use userhub_infra::{
    db::{PgTransactionManager, TransactionManager},
    repository::{PostgresUserRepository, UserRepository},
};

/// デフォルト値で User を作成
pub fn create_test_user(email: &str) -> User {
    User::new(
        UserId::new(),
        UserName::new("Tom").unwrap(),
        Surname::new("Ripley").unwrap(),
        BirthDate::from_db(NaiveDate::from_ymd_opt(1990, 1, 1).unwrap()),
        Email::new(email).unwrap(),
    )
}

/// デフォルト値で Card を作成
pub fn create_test_card(user_id: &UserId, number: &str) -> Card {
    Card::new(
        CardId::new(),
        user_id.clone(),
        CardNumber::new(number).unwrap(),
        HolderName::new("Tom Ripley").unwrap(),
        ExpirationDate::new("12/25").unwrap(),
    )
}

/// ユーザーを挿入してコミットする
pub async fn insert_user(pool: &PgPool, user: &User) {
    let tx_manager = PgTransactionManager::new(pool.clone());
    let repo = PostgresUserRepository::new(pool.clone());
    let mut tx = tx_manager.begin().await.unwrap();
    repo.insert(&mut tx, user).await.unwrap();
    tx.commit().await.unwrap();
}
