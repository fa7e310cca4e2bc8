//! # ページング
//!
//! ゼロ始まりのページ番号とページサイズによるオフセットページング。
//!
//! | 項目 | 既定値 | 範囲 |
//! |------|--------|------|
//! | `page` | 0 | 0 以上 |
//! | `size` | 20 | 1〜100（範囲外は丸める） |

use serde::{Deserialize, Serialize};

/// ページ要求
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    page: u32,
    size: u32,
}

impl PageRequest {
    pub const DEFAULT_SIZE: u32 = 20;
    pub const MAX_SIZE: u32 = 100;

    /// ページ要求を作成する
    ///
    /// 未指定の値は既定値を使う。`size` は 1〜[`Self::MAX_SIZE`] に丸める。
    pub fn new(page: Option<u32>, size: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(0),
            size: size
                .unwrap_or(Self::DEFAULT_SIZE)
                .clamp(1, Self::MAX_SIZE),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// SQL の OFFSET 値
    pub fn offset(&self) -> i64 {
        i64::from(self.page) * i64::from(self.size)
    }

    /// SQL の LIMIT 値
    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// ページング結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items:          Vec<T>,
    pub page:           u32,
    pub size:           u32,
    pub total_elements: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_elements: u64) -> Self {
        Self {
            items,
            page: request.page(),
            size: request.size(),
            total_elements,
        }
    }

    /// 総ページ数（要素が 0 件なら 0）
    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            return 0;
        }
        self.total_elements.div_ceil(u64::from(self.size))
    }

    /// 要素を変換した新しいページを返す
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items:          self.items.into_iter().map(f).collect(),
            page:           self.page,
            size:           self.size,
            total_elements: self.total_elements,
        }
    }
}
