//! # CardRepository
//!
//! カード情報（`card_info` テーブル）の永続化を担当するリポジトリ。
//!
//! カードは作成と削除のみで、更新操作は持たない。
//! `card_info.number` の UNIQUE 制約がカード番号の一意性を保証する。

use async_trait::async_trait;
use sqlx::PgPool;
use userhub_domain::{
    card::{Card, CardId, CardNumber, ExpirationDate, HolderName},
    page::{Page, PageRequest},
    user::UserId,
};
use uuid::Uuid;

use crate::{db::TxContext, error::InfraError};

/// カードリポジトリトレイト
#[async_trait]
pub trait CardRepository: Send + Sync {
    /// カードを挿入する
    async fn insert(&self, tx: &mut TxContext, card: &Card) -> Result<(), InfraError>;

    /// カードを削除する
    ///
    /// 対象が存在しなかった場合は `false` を返す。
    async fn delete(&self, tx: &mut TxContext, id: &CardId) -> Result<bool, InfraError>;

    /// ID でカードを検索
    async fn find_by_id(&self, id: &CardId) -> Result<Option<Card>, InfraError>;

    /// カード番号でカードを検索
    async fn find_by_number(&self, number: &CardNumber) -> Result<Option<Card>, InfraError>;

    /// ユーザーが所有する全カードを取得
    async fn find_all_by_user_id(&self, user_id: &UserId) -> Result<Vec<Card>, InfraError>;

    /// ユーザーが所有するカードを ID 順に 1 ページ分取得
    async fn find_page_by_user_id(
        &self,
        user_id: &UserId,
        request: PageRequest,
    ) -> Result<Page<Card>, InfraError>;

    /// 全カードを ID 順に 1 ページ分取得
    async fn find_page(&self, request: PageRequest) -> Result<Page<Card>, InfraError>;
}

/// `card_info` テーブルの行
#[derive(Debug, sqlx::FromRow)]
struct CardRow {
    id:              Uuid,
    user_id:         Uuid,
    number:          String,
    holder:          String,
    expiration_date: String,
}

impl TryFrom<CardRow> for Card {
    type Error = InfraError;

    fn try_from(row: CardRow) -> Result<Self, Self::Error> {
        Ok(Card::from_db(
            CardId::from_uuid(row.id),
            UserId::from_uuid(row.user_id),
            CardNumber::new(row.number).map_err(|e| InfraError::corrupt_row("card_info", e))?,
            HolderName::new(row.holder).map_err(|e| InfraError::corrupt_row("card_info", e))?,
            ExpirationDate::new(row.expiration_date)
                .map_err(|e| InfraError::corrupt_row("card_info", e))?,
        ))
    }
}

fn into_cards(rows: Vec<CardRow>) -> Result<Vec<Card>, InfraError> {
    rows.into_iter().map(Card::try_from).collect()
}

/// PostgreSQL 実装の CardRepository
#[derive(Debug, Clone)]
pub struct PostgresCardRepository {
    pool: PgPool,
}

impl PostgresCardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CardRepository for PostgresCardRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(id = %card.id()))]
    async fn insert(&self, tx: &mut TxContext, card: &Card) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            INSERT INTO card_info (id, user_id, number, holder, expiration_date)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(card.id().as_uuid())
        .bind(card.user_id().as_uuid())
        .bind(card.number().as_str())
        .bind(card.holder().as_str())
        .bind(card.expiration_date().as_str())
        .execute(tx.conn()?)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn delete(&self, tx: &mut TxContext, id: &CardId) -> Result<bool, InfraError> {
        let result = sqlx::query("DELETE FROM card_info WHERE id = $1")
            .bind(id.as_uuid())
            .execute(tx.conn()?)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn find_by_id(&self, id: &CardId) -> Result<Option<Card>, InfraError> {
        let row = sqlx::query_as::<_, CardRow>(
            r#"
            SELECT id, user_id, number, holder, expiration_date
            FROM card_info
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Card::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_by_number(&self, number: &CardNumber) -> Result<Option<Card>, InfraError> {
        let row = sqlx::query_as::<_, CardRow>(
            r#"
            SELECT id, user_id, number, holder, expiration_date
            FROM card_info
            WHERE number = $1
            "#,
        )
        .bind(number.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Card::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%user_id))]
    async fn find_all_by_user_id(&self, user_id: &UserId) -> Result<Vec<Card>, InfraError> {
        let rows = sqlx::query_as::<_, CardRow>(
            r#"
            SELECT id, user_id, number, holder, expiration_date
            FROM card_info
            WHERE user_id = $1
            ORDER BY id
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        into_cards(rows)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%user_id))]
    async fn find_page_by_user_id(
        &self,
        user_id: &UserId,
        request: PageRequest,
    ) -> Result<Page<Card>, InfraError> {
        let rows = sqlx::query_as::<_, CardRow>(
            r#"
            SELECT id, user_id, number, holder, expiration_date
            FROM card_info
            WHERE user_id = $1
            ORDER BY id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(request.limit())
        .bind(request.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM card_info WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .fetch_one(&self.pool)
            .await?;

        Ok(Page::new(into_cards(rows)?, request, total.max(0) as u64))
    }

    #[tracing::instrument(skip_all, level = "debug", fields(page = request.page(), size = request.size()))]
    async fn find_page(&self, request: PageRequest) -> Result<Page<Card>, InfraError> {
        let rows = sqlx::query_as::<_, CardRow>(
            r#"
            SELECT id, user_id, number, holder, expiration_date
            FROM card_info
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(request.limit())
        .bind(request.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM card_info")
            .fetch_one(&self.pool)
            .await?;

        Ok(Page::new(into_cards(rows)?, request, total.max(0) as u64))
    }
}
