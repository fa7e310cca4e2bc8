//! # カード
//!
//! ユーザーが所有する支払いカード情報を定義する。
//!
//! ## 設計方針
//!
//! - カード番号はシステム全体で一意（`card_info.number` の UNIQUE 制約）
//! - カード番号と名義は個人情報のため、`Debug` 出力をマスクする
//! - カードは作成と削除のみ。更新操作は存在しない

use serde::{Deserialize, Serialize};

use crate::{DomainError, user::UserId};

define_uuid_id! {
    /// カード ID
    pub struct CardId;
}

define_validated_string! {
    /// カード名義
    pub struct HolderName {
        label: "カード名義",
        max_length: 100,
        pii: true,
    }
}

/// カード番号（16 桁の数字）
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardNumber(String);

impl CardNumber {
    /// 桁数
    pub const LENGTH: usize = 16;

    /// カード番号を作成する
    ///
    /// 前後の空白は除去する。ちょうど 16 桁の ASCII 数字のみを受け付ける。
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_string();

        if value.is_empty() {
            return Err(DomainError::Validation("カード番号は必須です".to_string()));
        }

        if value.len() != Self::LENGTH || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DomainError::Validation(
                "カード番号は16桁の数字である必要があります".to_string(),
            ));
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 末尾 4 桁を残してマスクした表現
    pub fn masked(&self) -> String {
        let (head, tail) = self.0.split_at(Self::LENGTH - 4);
        format!("{}{}", "*".repeat(head.len()), tail)
    }
}

impl std::fmt::Debug for CardNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("CardNumber").field(&self.masked()).finish()
    }
}

/// 有効期限（`MM/YY` 形式）
///
/// 月は 01〜12。年の範囲や期限切れは検証しない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpirationDate(String);

impl ExpirationDate {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_string();

        if value.is_empty() {
            return Err(DomainError::Validation("有効期限は必須です".to_string()));
        }

        if !Self::is_valid_format(&value) {
            return Err(DomainError::Validation(
                "有効期限は MM/YY 形式である必要があります".to_string(),
            ));
        }

        Ok(Self(value))
    }

    fn is_valid_format(value: &str) -> bool {
        let bytes = value.as_bytes();
        if bytes.len() != 5 || bytes[2] != b'/' {
            return false;
        }
        if ![0, 1, 3, 4].iter().all(|&i| bytes[i].is_ascii_digit()) {
            return false;
        }
        matches!((bytes[0], bytes[1]), (b'0', b'1'..=b'9') | (b'1', b'0'..=b'2'))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// カードエンティティ
///
/// # 不変条件
///
/// - `number` はシステム全体で一意
/// - `user_id` の指すユーザーが存在する（外部キー制約）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    id:              CardId,
    user_id:         UserId,
    number:          CardNumber,
    holder:          HolderName,
    expiration_date: ExpirationDate,
}

impl Card {
    /// 新しいカードを作成する
    pub fn new(
        id: CardId,
        user_id: UserId,
        number: CardNumber,
        holder: HolderName,
        expiration_date: ExpirationDate,
    ) -> Self {
        Self {
            id,
            user_id,
            number,
            holder,
            expiration_date,
        }
    }

    /// 既存のデータからカードを復元する（データベースから取得時）
    pub fn from_db(
        id: CardId,
        user_id: UserId,
        number: CardNumber,
        holder: HolderName,
        expiration_date: ExpirationDate,
    ) -> Self {
        Self::new(id, user_id, number, holder, expiration_date)
    }

    pub fn id(&self) -> &CardId {
        &self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn number(&self) -> &CardNumber {
        &self.number
    }

    pub fn holder(&self) -> &HolderName {
        &self.holder
    }

    pub fn expiration_date(&self) -> &ExpirationDate {
        &self.expiration_date
    }
}
