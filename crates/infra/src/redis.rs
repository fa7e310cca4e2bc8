//! # Redis 接続管理
//!
//! ユーザー読み取りキャッシュ（[`crate::cache::RedisUserCache`]）が使う
//! Redis への接続を管理する。
//!
//! ## ConnectionManager vs Connection
//!
//! | 方式 | 特徴 | 用途 |
//! |------|------|------|
//! | `Connection` | 単一接続、手動管理 | 短期間の処理 |
//! | `ConnectionManager` | 自動再接続、Clone 可能 | 長期稼働アプリ |

use redis::{Client, aio::ConnectionManager};

/// Redis 接続マネージャを作成する
///
/// アプリケーション起動時に一度だけ呼び出し、作成したマネージャを
/// アプリケーション全体で共有する。
///
/// # 引数
///
/// * `redis_url` - Redis 接続 URL
///   - 形式: `redis://[[username:]password@]host[:port][/database]`
///   - TLS: `rediss://` スキームで TLS 接続
///
/// # エラー
///
/// - URL パースエラー: 不正な URL 形式
/// - 接続エラー: Redis サーバーに接続できない
pub async fn create_connection_manager(
    redis_url: &str,
) -> Result<ConnectionManager, redis::RedisError> {
    let client = Client::open(redis_url)?;
    ConnectionManager::new(client).await
}
