//! # ユーザー管理ユースケース
//!
//! ユーザーの作成・取得・更新・削除と、読み取りキャッシュの管理を行う。
//!
//! ## キャッシュ方針
//!
//! - ID・メールアドレスによる単一取得と一覧ページをキャッシュする
//! - ユーザーの作成・更新・削除はコミット後にキャッシュ全体を無効化する
//! - カード付き取得はキャッシュしない（カードの書き込みで古くなるため）
//!
//! 読み取りは、ストアを読む前に世代を取得し、その世代で書き戻す。
//! 無効化は世代を進めるため、無効化より前に読んだ値が新しい世代に
//! 書き戻されることはない。
//!
//! キャッシュ障害でリクエストを失敗させない。読み取り側の障害は `warn` で
//! ログに残してストアを読む。無効化に失敗した場合は `error` でログに残し、
//! 以後の読み取りは無効化を再試行する。再試行が成功するまではキャッシュを
//! 使わずストアを直接読むため、書き込み前の値が返ることはない。

use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use chrono::NaiveDate;
use serde::{Serialize, de::DeserializeOwned};
use userhub_domain::{
    DomainError,
    card::Card,
    clock::Clock,
    identity::Identity,
    page::{Page, PageRequest},
    user::{BirthDate, Email, Surname, User, UserId, UserName, UserProfile},
};
use userhub_infra::{
    UserCache,
    UserCacheKey,
    db::TransactionManager,
    repository::{CardRepository, UserRepository},
};

use crate::{error::CoreError, usecase::access::AccessGate};

const USER_NOT_FOUND: &str = "ユーザーが見つかりません";
const EMAIL_ALREADY_USED: &str = "このメールアドレスは既に使用されています";

/// ユーザー作成・更新の入力
#[derive(Debug, Clone)]
pub struct UserInput {
    pub name:       String,
    pub surname:    String,
    pub birth_date: NaiveDate,
    pub email:      String,
}

impl UserInput {
    /// 検証済みのプロフィールに変換する
    ///
    /// `today` より前の日付のみ生年月日として受け付ける。
    pub fn validate(self, today: NaiveDate) -> Result<UserProfile, DomainError> {
        Ok(UserProfile {
            name:       UserName::new(self.name)?,
            surname:    Surname::new(self.surname)?,
            birth_date: BirthDate::new(self.birth_date, today)?,
            email:      Email::new(self.email)?,
        })
    }
}

/// 所有カード付きのユーザー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserWithCards {
    pub user:  User,
    pub cards: Vec<Card>,
}

/// ユーザー管理ユースケース
pub struct UserUseCaseImpl {
    user_repository: Arc<dyn UserRepository>,
    card_repository: Arc<dyn CardRepository>,
    tx_manager: Arc<dyn TransactionManager>,
    cache: Arc<dyn UserCache>,
    access: Arc<AccessGate>,
    clock: Arc<dyn Clock>,
    /// 無効化に失敗し、まだ成功していない書き込みがある
    eviction_pending: AtomicBool,
}

impl UserUseCaseImpl {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        card_repository: Arc<dyn CardRepository>,
        tx_manager: Arc<dyn TransactionManager>,
        cache: Arc<dyn UserCache>,
        access: Arc<AccessGate>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            user_repository,
            card_repository,
            tx_manager,
            cache,
            access,
            clock,
            eviction_pending: AtomicBool::new(false),
        }
    }

    /// ユーザーを作成する
    ///
    /// 1. 入力の検証
    /// 2. メールアドレスの重複チェック
    /// 3. users テーブルに挿入（UNIQUE 制約違反も重複として扱う）
    /// 4. キャッシュの無効化
    #[tracing::instrument(skip_all)]
    pub async fn create(&self, input: UserInput) -> Result<User, CoreError> {
        let profile = input.validate(self.clock.today())?;

        if self
            .user_repository
            .find_by_email(&profile.email)
            .await?
            .is_some()
        {
            return Err(CoreError::Conflict(EMAIL_ALREADY_USED.to_string()));
        }

        let user = profile.into_user(UserId::new());

        let mut tx = self.tx_manager.begin().await?;
        self.user_repository
            .insert(&mut tx, &user)
            .await
            .map_err(|e| CoreError::from_unique_violation(e, EMAIL_ALREADY_USED))?;
        tx.commit().await?;

        self.evict_all().await;
        tracing::info!(user_id = %user.id(), "ユーザーを作成しました");

        Ok(user)
    }

    /// ID でユーザーを取得する
    #[tracing::instrument(skip_all, fields(%id))]
    pub async fn get_by_id(&self, identity: &Identity, id: &UserId) -> Result<User, CoreError> {
        self.access.ensure_access(identity, id).await?;

        self.read_through(UserCacheKey::ById(id.clone()), || {
            self.user_repository.find_by_id(id)
        })
        .await?
        .ok_or_else(|| CoreError::NotFound(USER_NOT_FOUND.to_string()))
    }

    /// メールアドレスでユーザーを取得する
    ///
    /// 見つかったユーザーの ID に対してアクセス判定を行う。
    #[tracing::instrument(skip_all)]
    pub async fn get_by_email(&self, identity: &Identity, email: &str) -> Result<User, CoreError> {
        let email = Email::new(email)?;

        let user = self
            .read_through(UserCacheKey::ByEmail(email.clone()), || {
                self.user_repository.find_by_email(&email)
            })
            .await?
            .ok_or_else(|| CoreError::NotFound(USER_NOT_FOUND.to_string()))?;

        self.access.ensure_access(identity, user.id()).await?;
        Ok(user)
    }

    /// ユーザーを更新する
    ///
    /// 名前・姓・生年月日・メールアドレスをすべて上書きする。
    /// メールアドレスを変更する場合、他のユーザーが使用中なら重複エラー。
    #[tracing::instrument(skip_all, fields(%id))]
    pub async fn update(
        &self,
        identity: &Identity,
        id: &UserId,
        input: UserInput,
    ) -> Result<User, CoreError> {
        let profile = input.validate(self.clock.today())?;
        self.access.ensure_access(identity, id).await?;

        let existing = self
            .user_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| CoreError::NotFound(USER_NOT_FOUND.to_string()))?;

        if existing.is_email_changed_to(&profile.email)
            && let Some(owner) = self.user_repository.find_by_email(&profile.email).await?
            && owner.id() != id
        {
            return Err(CoreError::Conflict(EMAIL_ALREADY_USED.to_string()));
        }

        let updated = existing.with_profile(profile);

        let mut tx = self.tx_manager.begin().await?;
        let found = self
            .user_repository
            .update(&mut tx, &updated)
            .await
            .map_err(|e| CoreError::from_unique_violation(e, EMAIL_ALREADY_USED))?;
        if !found {
            return Err(CoreError::NotFound(USER_NOT_FOUND.to_string()));
        }
        tx.commit().await?;

        self.evict_all().await;
        tracing::info!("ユーザーを更新しました");

        Ok(updated)
    }

    /// ユーザーを削除する
    ///
    /// 所有カードは同じトランザクション内でカスケード削除される。
    #[tracing::instrument(skip_all, fields(%id))]
    pub async fn delete_by_id(&self, identity: &Identity, id: &UserId) -> Result<(), CoreError> {
        self.access.ensure_access(identity, id).await?;

        let mut tx = self.tx_manager.begin().await?;
        if !self.user_repository.delete(&mut tx, id).await? {
            return Err(CoreError::NotFound(USER_NOT_FOUND.to_string()));
        }
        tx.commit().await?;

        self.evict_all().await;
        tracing::info!("ユーザーを削除しました");

        Ok(())
    }

    /// ユーザー一覧を取得する（管理者のみ）
    #[tracing::instrument(skip_all, fields(page = request.page(), size = request.size()))]
    pub async fn get_all(
        &self,
        identity: &Identity,
        request: PageRequest,
    ) -> Result<Page<User>, CoreError> {
        self.access.ensure_admin(identity)?;

        self.read_through(UserCacheKey::Page(request), || async move {
            self.user_repository.find_page(request).await.map(Some)
        })
        .await?
        .ok_or_else(|| CoreError::Internal("ユーザー一覧を取得できませんでした".to_string()))
    }

    /// 所有カード付きでユーザーを取得する
    #[tracing::instrument(skip_all, fields(%id))]
    pub async fn get_with_cards(
        &self,
        identity: &Identity,
        id: &UserId,
    ) -> Result<UserWithCards, CoreError> {
        self.access.ensure_access(identity, id).await?;

        let user = self
            .user_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| CoreError::NotFound(USER_NOT_FOUND.to_string()))?;
        let cards = self.card_repository.find_all_by_user_id(id).await?;

        Ok(UserWithCards { user, cards })
    }

    /// キャッシュを経由してストアを読む
    ///
    /// `None`（未検出）はキャッシュしない。
    async fn read_through<T, F, Fut>(&self, key: UserCacheKey, load: F) -> Result<Option<T>, CoreError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, userhub_infra::InfraError>>,
    {
        if !self.retry_pending_eviction().await {
            tracing::warn!("キャッシュの無効化が完了していません。ストアを直接読みます");
            return Ok(load().await?);
        }

        let generation = match self.cache.generation().await {
            Ok(generation) => Some(generation),
            Err(e) => {
                tracing::warn!(error = %e, "キャッシュの世代を取得できません。ストアを直接読みます");
                None
            }
        };

        if let Some(generation) = generation {
            match self.cache.get(generation, &key).await {
                Ok(Some(json)) => match serde_json::from_str::<T>(&json) {
                    Ok(value) => {
                        tracing::debug!(generation, "キャッシュヒット");
                        return Ok(Some(value));
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "キャッシュ値を復元できません。ストアを読みます");
                    }
                },
                Ok(None) => tracing::debug!(generation, "キャッシュミス"),
                Err(e) => {
                    tracing::warn!(error = %e, "キャッシュを読めません。ストアを直接読みます");
                }
            }
        }

        let value = load().await?;

        if let (Some(generation), Some(found)) = (generation, value.as_ref()) {
            match serde_json::to_string(found) {
                Ok(json) => {
                    if let Err(e) = self.cache.put(generation, &key, json).await {
                        tracing::warn!(error = %e, "キャッシュに書き込めません");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "キャッシュ値をシリアライズできません"),
            }
        }

        Ok(value)
    }

    /// キャッシュ全体を無効化する
    ///
    /// 失敗した場合は保留状態にし、次の読み取りで再試行させる。
    async fn evict_all(&self) {
        if let Err(e) = self.cache.evict_all().await {
            self.eviction_pending.store(true, Ordering::SeqCst);
            tracing::error!(
                error.category = "infrastructure",
                error.kind = "cache",
                "キャッシュの無効化に失敗しました（読み取りはストアを直接参照します）: {}",
                e
            );
        }
    }

    /// 保留中の無効化を再試行する
    ///
    /// キャッシュを使ってよい状態なら `true` を返す。
    /// フラグは無効化の前に下ろすため、並行する書き込みの失敗を取りこぼさない。
    async fn retry_pending_eviction(&self) -> bool {
        if !self.eviction_pending.swap(false, Ordering::SeqCst) {
            return true;
        }

        match self.cache.evict_all().await {
            Ok(()) => {
                tracing::info!("保留中のキャッシュ無効化が完了しました");
                true
            }
            Err(e) => {
                self.eviction_pending.store(true, Ordering::SeqCst);
                tracing::warn!(error = %e, "キャッシュの無効化を再試行できません");
                false
            }
        }
    }
}
