//! # UserRepository
//!
//! ユーザー情報の永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **書き込みは TxContext 必須**: `insert` / `update` / `delete` は
//!   トランザクション内でのみ実行できる
//! - **一意性**: `users.email` の UNIQUE 制約が最終的な保証。違反は
//!   [`InfraError::as_unique_violation`] で識別できる
//! - **カスケード削除**: `card_info.user_id` の `ON DELETE CASCADE` により、
//!   ユーザー削除と同じトランザクションで所有カードも削除される

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use userhub_domain::{
    page::{Page, PageRequest},
    user::{BirthDate, Email, Surname, User, UserId, UserName},
};
use uuid::Uuid;

use crate::{db::TxContext, error::InfraError};

/// ユーザーリポジトリトレイト
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// ユーザーを挿入する
    async fn insert(&self, tx: &mut TxContext, user: &User) -> Result<(), InfraError>;

    /// ユーザーの全フィールドを上書きする
    ///
    /// 対象が存在しなかった場合は `false` を返す。
    async fn update(&self, tx: &mut TxContext, user: &User) -> Result<bool, InfraError>;

    /// ユーザーを削除する（所有カードはカスケード削除）
    ///
    /// 対象が存在しなかった場合は `false` を返す。
    async fn delete(&self, tx: &mut TxContext, id: &UserId) -> Result<bool, InfraError>;

    /// ID でユーザーを検索
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, InfraError>;

    /// メールアドレスでユーザーを検索
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, InfraError>;

    /// ユーザー一覧を ID 順に 1 ページ分取得
    async fn find_page(&self, request: PageRequest) -> Result<Page<User>, InfraError>;
}

/// `users` テーブルの行
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id:         Uuid,
    name:       String,
    surname:    String,
    birth_date: NaiveDate,
    email:      String,
}

impl TryFrom<UserRow> for User {
    type Error = InfraError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User::from_db(
            UserId::from_uuid(row.id),
            UserName::new(row.name).map_err(|e| InfraError::corrupt_row("users", e))?,
            Surname::new(row.surname).map_err(|e| InfraError::corrupt_row("users", e))?,
            BirthDate::from_db(row.birth_date),
            Email::new(row.email).map_err(|e| InfraError::corrupt_row("users", e))?,
        ))
    }
}

/// PostgreSQL 実装の UserRepository
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// 新しいリポジトリインスタンスを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(id = %user.id()))]
    async fn insert(&self, tx: &mut TxContext, user: &User) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, surname, birth_date, email)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user.id().as_uuid())
        .bind(user.name().as_str())
        .bind(user.surname().as_str())
        .bind(user.birth_date().as_date())
        .bind(user.email().as_str())
        .execute(tx.conn()?)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(id = %user.id()))]
    async fn update(&self, tx: &mut TxContext, user: &User) -> Result<bool, InfraError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = $2, surname = $3, birth_date = $4, email = $5
            WHERE id = $1
            "#,
        )
        .bind(user.id().as_uuid())
        .bind(user.name().as_str())
        .bind(user.surname().as_str())
        .bind(user.birth_date().as_date())
        .bind(user.email().as_str())
        .execute(tx.conn()?)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn delete(&self, tx: &mut TxContext, id: &UserId) -> Result<bool, InfraError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .execute(tx.conn()?)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, InfraError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, surname, birth_date, email
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, InfraError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, surname, birth_date, email
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(page = request.page(), size = request.size()))]
    async fn find_page(&self, request: PageRequest) -> Result<Page<User>, InfraError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, surname, birth_date, email
            FROM users
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(request.limit())
        .bind(request.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        let users = rows
            .into_iter()
            .map(User::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(users, request, total.max(0) as u64))
    }
}
