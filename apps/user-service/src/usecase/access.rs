//! # アクセス制御
//!
//! 呼び出し元がユーザー・カードを操作できるかを判定する。
//!
//! ## ルール
//!
//! - 管理者（`ROLE_ADMIN`）はすべてのユーザーにアクセスできる
//! - それ以外は自分自身（トークンの主体と同じメールアドレスのユーザー）のみ
//! - 主体に対応するユーザーが存在しない呼び出し元は、誰にもアクセスできない
//!
//! 判定は副作用を持たず、ユースケースは書き込みの前に必ず判定を行う。

use std::sync::Arc;

use userhub_domain::{identity::Identity, user::UserId};
use userhub_infra::repository::UserRepository;

use crate::error::CoreError;

const ACCESS_DENIED: &str = "この操作を実行する権限がありません";

/// アクセス制御ゲート
pub struct AccessGate {
    user_repository: Arc<dyn UserRepository>,
}

impl AccessGate {
    pub fn new(user_repository: Arc<dyn UserRepository>) -> Self {
        Self { user_repository }
    }

    pub fn is_admin(&self, identity: &Identity) -> bool {
        identity.is_admin()
    }

    /// 呼び出し元自身のユーザー ID
    ///
    /// トークンの主体と同じメールアドレスのユーザーを引く。
    pub async fn caller_id(&self, identity: &Identity) -> Result<Option<UserId>, CoreError> {
        let caller = self
            .user_repository
            .find_by_email(identity.subject())
            .await?;
        Ok(caller.map(|user| user.id().clone()))
    }

    /// 呼び出し元が対象ユーザーにアクセスできるか
    ///
    /// 管理者は主体の引き当てを行わずに許可する。
    pub async fn has_access(
        &self,
        identity: &Identity,
        target_user_id: &UserId,
    ) -> Result<bool, CoreError> {
        if self.is_admin(identity) {
            return Ok(true);
        }
        let caller_id = self.caller_id(identity).await?;
        Ok(caller_id.as_ref() == Some(target_user_id))
    }

    /// アクセスできなければ [`CoreError::Forbidden`] を返す
    pub async fn ensure_access(
        &self,
        identity: &Identity,
        target_user_id: &UserId,
    ) -> Result<(), CoreError> {
        if self.has_access(identity, target_user_id).await? {
            Ok(())
        } else {
            tracing::info!(%target_user_id, "アクセスを拒否しました");
            Err(CoreError::Forbidden(ACCESS_DENIED.to_string()))
        }
    }

    /// 管理者でなければ [`CoreError::Forbidden`] を返す
    pub fn ensure_admin(&self, identity: &Identity) -> Result<(), CoreError> {
        if self.is_admin(identity) {
            Ok(())
        } else {
            Err(CoreError::Forbidden(ACCESS_DENIED.to_string()))
        }
    }
}
