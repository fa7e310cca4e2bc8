//! # テスト用モック
//!
//! ユースケーステストで使用するインメモリのリポジトリ・キャッシュ・
//! トランザクションマネージャ。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! userhub-infra = { workspace = true, features = ["test-utils"] }
//! ```
//!
//! ユーザーとカードのリポジトリは [`MockStore`] を共有し、PostgreSQL の
//! 一意制約とカスケード削除を再現する。

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use userhub_domain::{
    card::{Card, CardId, CardNumber},
    page::{Page, PageRequest},
    user::{Email, User, UserId},
};

use crate::{
    cache::{UserCache, UserCacheKey},
    db::{TransactionManager, TxContext},
    error::InfraError,
    repository::{CardRepository, UserRepository},
};

// ===== MockStore =====

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    cards: Vec<Card>,
}

/// ユーザーとカードのインメモリテーブル
#[derive(Clone, Default)]
pub struct MockStore {
    tables: Arc<Mutex<Tables>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_repository(&self) -> MockUserRepository {
        MockUserRepository {
            store: self.clone(),
        }
    }

    pub fn card_repository(&self) -> MockCardRepository {
        MockCardRepository {
            store: self.clone(),
        }
    }

    /// 保存済みユーザー数
    pub fn user_count(&self) -> usize {
        self.tables.lock().unwrap().users.len()
    }

    /// 保存済みカード数
    pub fn card_count(&self) -> usize {
        self.tables.lock().unwrap().cards.len()
    }
}

fn paginate<T: Clone>(items: &[T], request: PageRequest) -> Page<T> {
    let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(request.limit()).unwrap_or(usize::MAX);
    let slice = items
        .iter()
        .skip(offset)
        .take(limit)
        .cloned()
        .collect();
    Page::new(slice, request, items.len() as u64)
}

// ===== MockUserRepository =====

#[derive(Clone)]
pub struct MockUserRepository {
    store: MockStore,
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn insert(&self, _tx: &mut TxContext, user: &User) -> Result<(), InfraError> {
        let mut tables = self.store.tables.lock().unwrap();
        if tables.users.iter().any(|u| u.email() == user.email()) {
            return Err(InfraError::unique_violation("users_email_key"));
        }
        tables.users.push(user.clone());
        Ok(())
    }

    async fn update(&self, _tx: &mut TxContext, user: &User) -> Result<bool, InfraError> {
        let mut tables = self.store.tables.lock().unwrap();
        if tables
            .users
            .iter()
            .any(|u| u.id() != user.id() && u.email() == user.email())
        {
            return Err(InfraError::unique_violation("users_email_key"));
        }
        match tables.users.iter_mut().find(|u| u.id() == user.id()) {
            Some(existing) => {
                *existing = user.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, _tx: &mut TxContext, id: &UserId) -> Result<bool, InfraError> {
        let mut tables = self.store.tables.lock().unwrap();
        let before = tables.users.len();
        tables.users.retain(|u| u.id() != id);
        let deleted = tables.users.len() != before;
        if deleted {
            // ON DELETE CASCADE
            tables.cards.retain(|c| c.user_id() != id);
        }
        Ok(deleted)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, InfraError> {
        let tables = self.store.tables.lock().unwrap();
        Ok(tables.users.iter().find(|u| u.id() == id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, InfraError> {
        let tables = self.store.tables.lock().unwrap();
        Ok(tables.users.iter().find(|u| u.email() == email).cloned())
    }

    async fn find_page(&self, request: PageRequest) -> Result<Page<User>, InfraError> {
        let tables = self.store.tables.lock().unwrap();
        let mut users = tables.users.clone();
        users.sort_by_key(|u| *u.id().as_uuid());
        Ok(paginate(&users, request))
    }
}

// ===== MockCardRepository =====

#[derive(Clone)]
pub struct MockCardRepository {
    store: MockStore,
}

impl MockCardRepository {
    fn sorted_cards(&self, filter: impl Fn(&Card) -> bool) -> Vec<Card> {
        let tables = self.store.tables.lock().unwrap();
        let mut cards: Vec<Card> = tables.cards.iter().filter(|&c| filter(c)).cloned().collect();
        cards.sort_by_key(|c| *c.id().as_uuid());
        cards
    }
}

#[async_trait]
impl CardRepository for MockCardRepository {
    async fn insert(&self, _tx: &mut TxContext, card: &Card) -> Result<(), InfraError> {
        let mut tables = self.store.tables.lock().unwrap();
        if tables.cards.iter().any(|c| c.number() == card.number()) {
            return Err(InfraError::unique_violation("card_info_number_key"));
        }
        if !tables.users.iter().any(|u| u.id() == card.user_id()) {
            return Err(InfraError::unexpected(
                "外部キー制約違反: card_info_user_id_fkey",
            ));
        }
        tables.cards.push(card.clone());
        Ok(())
    }

    async fn delete(&self, _tx: &mut TxContext, id: &CardId) -> Result<bool, InfraError> {
        let mut tables = self.store.tables.lock().unwrap();
        let before = tables.cards.len();
        tables.cards.retain(|c| c.id() != id);
        Ok(tables.cards.len() != before)
    }

    async fn find_by_id(&self, id: &CardId) -> Result<Option<Card>, InfraError> {
        let tables = self.store.tables.lock().unwrap();
        Ok(tables.cards.iter().find(|c| c.id() == id).cloned())
    }

    async fn find_by_number(&self, number: &CardNumber) -> Result<Option<Card>, InfraError> {
        let tables = self.store.tables.lock().unwrap();
        Ok(tables.cards.iter().find(|c| c.number() == number).cloned())
    }

    async fn find_all_by_user_id(&self, user_id: &UserId) -> Result<Vec<Card>, InfraError> {
        Ok(self.sorted_cards(|c| c.user_id() == user_id))
    }

    async fn find_page_by_user_id(
        &self,
        user_id: &UserId,
        request: PageRequest,
    ) -> Result<Page<Card>, InfraError> {
        let cards = self.sorted_cards(|c| c.user_id() == user_id);
        Ok(paginate(&cards, request))
    }

    async fn find_page(&self, request: PageRequest) -> Result<Page<Card>, InfraError> {
        let cards = self.sorted_cards(|_| true);
        Ok(paginate(&cards, request))
    }
}

// ===== MockTransactionManager =====

/// 常に [`TxContext::mock`] を返すトランザクションマネージャ
#[derive(Clone, Default)]
pub struct MockTransactionManager;

#[async_trait]
impl TransactionManager for MockTransactionManager {
    async fn begin(&self) -> Result<TxContext, InfraError> {
        Ok(TxContext::mock())
    }
}

// ===== InMemoryUserCache =====

#[derive(Default)]
struct CacheState {
    generation: u64,
    entries:    HashMap<String, String>,
    failing:    bool,
    evictions:  usize,
}

/// Redis の世代付きキャッシュを再現するインメモリ実装
///
/// `set_failing(true)` で全操作をエラーにでき、キャッシュ障害時の
/// フォールバックを検証できる。
#[derive(Clone, Default)]
pub struct InMemoryUserCache {
    state: Arc<Mutex<CacheState>>,
}

impl InMemoryUserCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.state.lock().unwrap().failing = failing;
    }

    /// `evict_all` が成功した回数
    pub fn evictions(&self) -> usize {
        self.state.lock().unwrap().evictions
    }

    /// 指定キーが現在の世代で保存されているか
    pub fn contains(&self, key: &UserCacheKey) -> bool {
        let state = self.state.lock().unwrap();
        state.entries.contains_key(&key.to_key(state.generation))
    }

    fn check(state: &CacheState) -> Result<(), InfraError> {
        if state.failing {
            return Err(InfraError::unexpected("キャッシュ障害（テスト用）"));
        }
        Ok(())
    }
}

#[async_trait]
impl UserCache for InMemoryUserCache {
    async fn generation(&self) -> Result<u64, InfraError> {
        let state = self.state.lock().unwrap();
        Self::check(&state)?;
        Ok(state.generation)
    }

    async fn get(
        &self,
        generation: u64,
        key: &UserCacheKey,
    ) -> Result<Option<String>, InfraError> {
        let state = self.state.lock().unwrap();
        Self::check(&state)?;
        Ok(state.entries.get(&key.to_key(generation)).cloned())
    }

    async fn put(
        &self,
        generation: u64,
        key: &UserCacheKey,
        value: String,
    ) -> Result<(), InfraError> {
        let mut state = self.state.lock().unwrap();
        Self::check(&state)?;
        state.entries.insert(key.to_key(generation), value);
        Ok(())
    }

    async fn evict_all(&self) -> Result<(), InfraError> {
        let mut state = self.state.lock().unwrap();
        Self::check(&state)?;
        state.generation += 1;
        state.evictions += 1;
        Ok(())
    }

    async fn ping(&self) -> Result<(), InfraError> {
        let state = self.state.lock().unwrap();
        Self::check(&state)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use userhub_domain::{
        card::{ExpirationDate, HolderName},
        user::{BirthDate, Surname, UserName},
    };

    use super::*;

    fn user(email: &str) -> User {
        User::new(
            UserId::new(),
            UserName::new("Tom").unwrap(),
            Surname::new("Ripley").unwrap(),
            BirthDate::from_db(NaiveDate::from_ymd_opt(1990, 1, 1).unwrap()),
            Email::new(email).unwrap(),
        )
    }

    fn card(user_id: &UserId, number: &str) -> Card {
        Card::new(
            CardId::new(),
            user_id.clone(),
            CardNumber::new(number).unwrap(),
            HolderName::new("TOM RIPLEY").unwrap(),
            ExpirationDate::new("12/30").unwrap(),
        )
    }

    #[tokio::test]
    async fn test_ユーザー削除で所有カードもカスケード削除される() {
        let store = MockStore::new();
        let users = store.user_repository();
        let cards = store.card_repository();
        let mut tx = TxContext::mock();
        let tom = user("tom@example.com");
        let other = user("other@example.com");
        users.insert(&mut tx, &tom).await.unwrap();
        users.insert(&mut tx, &other).await.unwrap();
        cards.insert(&mut tx, &card(tom.id(), "1111222233334444")).await.unwrap();
        cards.insert(&mut tx, &card(other.id(), "5555666677778888")).await.unwrap();

        let deleted = users.delete(&mut tx, tom.id()).await.unwrap();

        assert!(deleted);
        assert_eq!(store.card_count(), 1);
        assert!(cards.find_all_by_user_id(tom.id()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_重複メールアドレスの挿入は一意制約違反になる() {
        let store = MockStore::new();
        let users = store.user_repository();
        let mut tx = TxContext::mock();
        users.insert(&mut tx, &user("tom@example.com")).await.unwrap();

        let err = users
            .insert(&mut tx, &user("tom@example.com"))
            .await
            .unwrap_err();

        assert_eq!(err.as_unique_violation(), Some("users_email_key"));
        assert_eq!(store.user_count(), 1);
    }

    #[tokio::test]
    async fn test_世代を進めると古いエントリは見えなくなる() {
        let cache = InMemoryUserCache::new();
        let key = UserCacheKey::Page(PageRequest::default());
        let generation = cache.generation().await.unwrap();
        cache.put(generation, &key, "[]".to_string()).await.unwrap();

        cache.evict_all().await.unwrap();

        let current = cache.generation().await.unwrap();
        assert_eq!(current, generation + 1);
        assert!(cache.get(current, &key).await.unwrap().is_none());
        assert_eq!(cache.evictions(), 1);
    }
}
