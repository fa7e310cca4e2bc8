//! # ページネーション付きレスポンス
//!
//! オフセットベース（ゼロ始まりのページ番号）のページネーションに対応した
//! API レスポンス型。

use serde::{Deserialize, Serialize};

/// ページネーション付きレスポンス
///
/// `ApiResponse<T>` が単一データ用であるのに対し、
/// `PaginatedResponse<T>` はリスト + ページ情報の形式。
///
/// ## JSON 形式
///
/// ```json
/// {
///   "data": [...],
///   "page": 0,
///   "size": 20,
///   "total_elements": 42,
///   "total_pages": 3
/// }
/// ```
///
/// `page` が `total_pages` 以上の場合、`data` は空配列になる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data:           Vec<T>,
    pub page:           u32,
    pub size:           u32,
    pub total_elements: u64,
    pub total_pages:    u64,
}

impl<T> PaginatedResponse<T> {
    /// 総ページ数を要素数とページサイズから計算して作成する
    pub fn new(data: Vec<T>, page: u32, size: u32, total_elements: u64) -> Self {
        let total_pages = if size == 0 {
            0
        } else {
            total_elements.div_ceil(u64::from(size))
        };
        Self {
            data,
            page,
            size,
            total_elements,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_serializeでページ情報を含むjson形状にする() {
        let response = PaginatedResponse::new(vec!["a", "b"], 1, 2, 5);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "data": ["a", "b"],
                "page": 1,
                "size": 2,
                "total_elements": 5,
                "total_pages": 3
            })
        );
    }

    #[test]
    fn test_要素が0件なら総ページ数も0() {
        let response: PaginatedResponse<String> = PaginatedResponse::new(vec![], 0, 20, 0);

        assert_eq!(response.total_pages, 0);
    }
}
