//! # ドメイン層エラー定義
//!
//! 値オブジェクトやエンティティの生成時に検出されるビジネスルール違反を表現する。
//!
//! 存在確認・重複・認可のエラーはリポジトリやアクセス制御が絡むため、
//! ユースケース層（`CoreError`）で表現する。ドメイン層が返すのは入力値の
//! 検証失敗のみ。
//!
//! | エラー種別 | HTTP ステータス | 用途 |
//! |-----------|----------------|------|
//! | `Validation` | 400 Bad Request | 入力値の検証失敗 |
//!
//! ## 使用例
//!
//! ```rust
//! use userhub_domain::DomainError;
//!
//! fn validate_holder(holder: &str) -> Result<(), DomainError> {
//!     if holder.trim().is_empty() {
//!         return Err(DomainError::Validation("カード名義は必須です".to_string()));
//!     }
//!     Ok(())
//! }
//!
//! assert!(validate_holder("  ").is_err());
//! ```

use thiserror::Error;

/// ドメイン層で発生するエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// 入力値がビジネスルールに違反している場合に使用する。
    ///
    /// # 例
    ///
    /// - 必須フィールドが未入力
    /// - 文字数制限の超過
    /// - 不正なフォーマット（カード番号、有効期限、メールアドレス）
    /// - 未来の生年月日
    #[error("バリデーションエラー: {0}")]
    Validation(String),
}

impl DomainError {
    /// エラーメッセージ本体を取得する（プレフィックスなし）
    pub fn message(&self) -> &str {
        match self {
            DomainError::Validation(msg) => msg,
        }
    }
}
