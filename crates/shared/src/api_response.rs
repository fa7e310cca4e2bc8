//! # API レスポンスエンベロープ
//!
//! 単一のユーザー・カードを返すエンドポイントは `{ "data": T }` で包む。
//! 一覧は [`PaginatedResponse`](crate::PaginatedResponse) を使う。

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}
