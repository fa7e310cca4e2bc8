//! # User Service ライブラリ
//!
//! ユーザーとカードを管理する REST API サーバーのコアモジュール。
//!
//! ## モジュール構成
//!
//! - `app_builder`: DI とルーター構築
//! - `client`: 外部 API クライアント（Auth Service）
//! - `config`: 環境変数からの設定読み込み
//! - `error`: エラー定義と HTTP レスポンスへの変換
//! - `extract`: Problem Details で拒否するエクストラクタ
//! - `handler`: HTTP ハンドラ
//! - `middleware`: 認証ミドルウェア
//! - `usecase`: ビジネスロジック（アクセス制御・キャッシュ無効化を含む）

pub mod app_builder;
pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod handler;
pub mod middleware;
pub mod usecase;
