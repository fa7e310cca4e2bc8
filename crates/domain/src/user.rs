//! # ユーザー
//!
//! ユーザーエンティティとそれに関連する値オブジェクトを定義する。
//!
//! ## 設計方針
//!
//! - **Newtype パターン**: UserId は UUID をラップし、型安全性を確保
//! - **不変性**: フィールドは非公開、変更は `with_*` メソッドで新しいインスタンスを返す
//! - **バリデーション**: 値オブジェクトの生成時に検証ロジックを実行
//!
//! ## 使用例
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use chrono::NaiveDate;
//! use userhub_domain::user::{BirthDate, Email, Surname, User, UserId, UserName};
//!
//! let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
//! let user = User::new(
//!     UserId::new(),
//!     UserName::new("Tom")?,
//!     Surname::new("Ripley")?,
//!     BirthDate::new(NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(), today)?,
//!     Email::new("tom@example.com")?,
//! );
//!
//! assert_eq!(user.email().as_str(), "tom@example.com");
//! # Ok(())
//! # }
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::DomainError;

define_uuid_id! {
    /// ユーザー ID（一意識別子）
    ///
    /// UUID v7 を使用し、生成順にソート可能。
    pub struct UserId;
}

define_validated_string! {
    /// 名前
    pub struct UserName {
        label: "名前",
        max_length: 100,
    }
}

define_validated_string! {
    /// 姓
    pub struct Surname {
        label: "姓",
        max_length: 100,
    }
}

/// メールアドレス（値オブジェクト）
///
/// 生成時にバリデーションを実行し、不正な値の作成を防ぐ。
/// システム全体で一意（`users.email` の UNIQUE 制約）。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// メールアドレスを作成する
    ///
    /// # バリデーション
    ///
    /// - 空文字列ではない
    /// - `local@domain` の形式で、どちらも空でない
    /// - 空白を含まない
    /// - 最大 255 文字
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_string();

        if value.is_empty() {
            return Err(DomainError::Validation(
                "メールアドレスは必須です".to_string(),
            ));
        }

        let Some((local, domain)) = value.split_once('@') else {
            return Err(DomainError::Validation(
                "メールアドレスの形式が不正です".to_string(),
            ));
        };

        if local.is_empty()
            || domain.is_empty()
            || domain.contains('@')
            || value.chars().any(char::is_whitespace)
        {
            return Err(DomainError::Validation(
                "メールアドレスの形式が不正です".to_string(),
            ));
        }

        if value.len() > 255 {
            return Err(DomainError::Validation(
                "メールアドレスは255文字以内である必要があります".to_string(),
            ));
        }

        Ok(Self(value))
    }

    /// 文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 所有権を持つ文字列に変換する
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 生年月日（値オブジェクト）
///
/// # 不変条件
///
/// - 生成時点の日付より厳密に過去であること
///
/// 「今日」は呼び出し元から注入する（[`crate::clock::Clock::today`]）。
/// DB から復元する場合は [`BirthDate::from_db`] を使い、再検証しない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BirthDate(NaiveDate);

impl BirthDate {
    pub fn new(value: NaiveDate, today: NaiveDate) -> Result<Self, DomainError> {
        if value >= today {
            return Err(DomainError::Validation(
                "生年月日は過去の日付（YYYY-MM-DD）である必要があります".to_string(),
            ));
        }
        Ok(Self(value))
    }

    /// 永続化済みの値から復元する
    pub fn from_db(value: NaiveDate) -> Self {
        Self(value)
    }

    pub fn as_date(&self) -> NaiveDate {
        self.0
    }
}

/// ユーザーエンティティ
///
/// # 不変条件
///
/// - `email` はシステム全体で一意
/// - `birth_date` は過去の日付
///
/// 所有カードはエンティティに含めない。カードは `Card::user_id` で
/// ユーザーを参照し、ユーザー削除時に DB の外部キー制約でカスケード削除される。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    id:         UserId,
    name:       UserName,
    surname:    Surname,
    birth_date: BirthDate,
    email:      Email,
}

impl User {
    /// 新しいユーザーを作成する
    pub fn new(
        id: UserId,
        name: UserName,
        surname: Surname,
        birth_date: BirthDate,
        email: Email,
    ) -> Self {
        Self {
            id,
            name,
            surname,
            birth_date,
            email,
        }
    }

    /// 既存のデータからユーザーを復元する（データベースから取得時）
    pub fn from_db(
        id: UserId,
        name: UserName,
        surname: Surname,
        birth_date: BirthDate,
        email: Email,
    ) -> Self {
        Self::new(id, name, surname, birth_date, email)
    }

    // Getter メソッド

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn name(&self) -> &UserName {
        &self.name
    }

    pub fn surname(&self) -> &Surname {
        &self.surname
    }

    pub fn birth_date(&self) -> BirthDate {
        self.birth_date
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    // ビジネスロジックメソッド

    /// 変更可能なフィールド（名前、姓、生年月日、メールアドレス）を
    /// すべて上書きした新しいインスタンスを返す
    pub fn with_profile(self, profile: UserProfile) -> Self {
        Self {
            name: profile.name,
            surname: profile.surname,
            birth_date: profile.birth_date,
            email: profile.email,
            ..self
        }
    }

    /// メールアドレスが変更されるか判定する
    pub fn is_email_changed_to(&self, email: &Email) -> bool {
        &self.email != email
    }
}

/// ユーザーの変更可能フィールド一式
///
/// 作成・更新の両方で使う検証済み入力。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub name:       UserName,
    pub surname:    Surname,
    pub birth_date: BirthDate,
    pub email:      Email,
}

impl UserProfile {
    /// プロフィールから新しいユーザーを作成する
    pub fn into_user(self, id: UserId) -> User {
        User::new(id, self.name, self.surname, self.birth_date, self.email)
    }
}
