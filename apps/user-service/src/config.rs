//! # User Service 設定
//!
//! 環境変数から User Service サーバーの設定を読み込む。
//!
//! 必須変数の欠落や値の形式不正は [`ConfigError`] として返し、
//! 起動処理（`main`）で報告する。

use std::{env, str::FromStr, time::Duration};

use thiserror::Error;

/// 設定読み込みエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// 必須の環境変数が未設定
    #[error("{0} が設定されていません（.env を確認してください）")]
    Missing(&'static str),

    /// 環境変数の値が不正
    #[error("{name} の値が不正です: {value}")]
    Invalid { name: &'static str, value: String },
}

/// ユーザーキャッシュのバックエンド
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum CacheBackend {
    /// Redis による世代付きキャッシュ
    Redis,
    /// キャッシュしない（常にストアを読む）
    Noop,
}

/// キャッシュ設定
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub backend:   CacheBackend,
    /// Redis 接続 URL（backend=redis の場合に使用）
    pub redis_url: String,
    /// エントリの有効期限
    pub ttl:       Duration,
}

/// User Service サーバーの設定
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// バインドアドレス
    pub host: String,
    /// ポート番号
    pub port: u16,
    /// データベース接続 URL
    pub database_url: String,
    /// Auth Service の URL
    pub auth_service_url: String,
    /// キャッシュ設定
    pub cache: CacheConfig,
}

impl ServiceConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 任意の参照関数から設定を読み込む
    ///
    /// テストでプロセス環境変数を書き換えずに済むよう、参照先を差し替えられる。
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &'static str, default: &str| {
            lookup(name).unwrap_or_else(|| default.to_string())
        };
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));

        let ttl_seconds: u64 = parse("CACHE_TTL_SECONDS", var("CACHE_TTL_SECONDS", "600"))?;

        Ok(Self {
            host: var("USER_SERVICE_HOST", "0.0.0.0"),
            port: parse("USER_SERVICE_PORT", required("USER_SERVICE_PORT")?)?,
            database_url: required("DATABASE_URL")?,
            auth_service_url: var("AUTH_SERVICE_URL", "http://localhost:8080"),
            cache: CacheConfig {
                backend:   parse("CACHE_BACKEND", var("CACHE_BACKEND", "redis"))?,
                redis_url: var("REDIS_URL", "redis://localhost:6379"),
                ttl:       Duration::from_secs(ttl_seconds),
            },
        })
    }
}

fn parse<T: FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}
