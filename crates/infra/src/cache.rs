//! # ユーザー読み取りキャッシュ
//!
//! ユーザーの ID 検索・メールアドレス検索・一覧ページの結果をキャッシュする。
//!
//! ## 世代（generation）による一括無効化
//!
//! キャッシュキーは世代カウンタで名前空間化する。読み取り側はストアに触れる前に
//! 世代を取得し、その世代のキーに書き戻す。ユーザーの書き込み後は世代を
//! `INCR` で進めるため、古い世代のエントリは一度に到達不能になる（TTL で消える）。
//!
//! これにより、書き込み前のデータを読んだリクエストが無効化の後で
//! キャッシュを再投入しても、新しい世代の読み取りには影響しない。
//!
//! ## Redis キー設計
//!
//! | キー | 値 | TTL |
//! |-----|-----|-----|
//! | `userhub:users:gen` | 世代カウンタ（整数） | なし |
//! | `userhub:users:{gen}:id:{uuid}` | User (JSON) | 設定値（既定 600 秒） |
//! | `userhub:users:{gen}:email:{email}` | User (JSON) | 設定値 |
//! | `userhub:users:{gen}:page:{page}_{size}` | Page&lt;User&gt; (JSON) | 設定値 |

use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};
use userhub_domain::{
    page::PageRequest,
    user::{Email, UserId},
};

use crate::InfraError;

/// 世代カウンタのキー
const GENERATION_KEY: &str = "userhub:users:gen";

/// キャッシュ対象の読み取り
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCacheKey {
    /// ID による単一取得
    ById(UserId),
    /// メールアドレスによる単一取得
    ByEmail(Email),
    /// 一覧の 1 ページ
    Page(PageRequest),
}

impl UserCacheKey {
    /// 世代付きの Redis キーを生成する
    pub fn to_key(&self, generation: u64) -> String {
        match self {
            Self::ById(id) => format!("userhub:users:{generation}:id:{id}"),
            Self::ByEmail(email) => format!("userhub:users:{generation}:email:{email}"),
            Self::Page(page) => format!(
                "userhub:users:{generation}:page:{}_{}",
                page.page(),
                page.size()
            ),
        }
    }
}

/// ユーザー読み取りキャッシュ
///
/// 値は JSON 文字列で受け渡す（型付けはユースケース層で行う）。
#[async_trait]
pub trait UserCache: Send + Sync {
    /// 現在の世代を取得する（未初期化なら 0）
    async fn generation(&self) -> Result<u64, InfraError>;

    /// 指定世代のエントリを取得する
    async fn get(&self, generation: u64, key: &UserCacheKey)
    -> Result<Option<String>, InfraError>;

    /// 指定世代のエントリを保存する
    async fn put(&self, generation: u64, key: &UserCacheKey, value: String)
    -> Result<(), InfraError>;

    /// 全エントリを無効化する（世代を進める）
    async fn evict_all(&self) -> Result<(), InfraError>;

    /// 疎通確認（Readiness Check 用）
    async fn ping(&self) -> Result<(), InfraError>;
}

/// Redis を使用したユーザーキャッシュ
pub struct RedisUserCache {
    conn: ConnectionManager,
    ttl:  Duration,
}

impl RedisUserCache {
    pub fn new(conn: ConnectionManager, ttl: Duration) -> Self {
        Self { conn, ttl }
    }
}

#[async_trait]
impl UserCache for RedisUserCache {
    async fn generation(&self) -> Result<u64, InfraError> {
        let mut conn = self.conn.clone();
        let generation: Option<u64> = conn.get(GENERATION_KEY).await?;
        Ok(generation.unwrap_or(0))
    }

    async fn get(
        &self,
        generation: u64,
        key: &UserCacheKey,
    ) -> Result<Option<String>, InfraError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key.to_key(generation)).await?;
        Ok(value)
    }

    async fn put(
        &self,
        generation: u64,
        key: &UserCacheKey,
        value: String,
    ) -> Result<(), InfraError> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(key.to_key(generation), value, self.ttl.as_secs())
            .await?;
        Ok(())
    }

    async fn evict_all(&self) -> Result<(), InfraError> {
        let mut conn = self.conn.clone();
        let generation: u64 = conn.incr(GENERATION_KEY, 1).await?;
        tracing::debug!(generation, "ユーザーキャッシュの世代を更新");
        Ok(())
    }

    async fn ping(&self) -> Result<(), InfraError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

/// キャッシュを使わない実装（`CACHE_BACKEND=noop`）
///
/// 常にミスし、保存と無効化は何もしない。
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopUserCache;

#[async_trait]
impl UserCache for NoopUserCache {
    async fn generation(&self) -> Result<u64, InfraError> {
        Ok(0)
    }

    async fn get(
        &self,
        _generation: u64,
        _key: &UserCacheKey,
    ) -> Result<Option<String>, InfraError> {
        Ok(None)
    }

    async fn put(
        &self,
        _generation: u64,
        _key: &UserCacheKey,
        _value: String,
    ) -> Result<(), InfraError> {
        Ok(())
    }

    async fn evict_all(&self) -> Result<(), InfraError> {
        Ok(())
    }

    async fn ping(&self) -> Result<(), InfraError> {
        Ok(())
    }
}
