//! # ミドルウェア
//!
//! User Service 用のミドルウェアを提供する。

mod authn;

pub use authn::{AuthnState, require_authentication};
