//! # カード管理ユースケース
//!
//! カードの作成・取得・削除を行う。カードの読み取りはキャッシュしない。
//! カードの書き込みはユーザーキャッシュに影響しない（キャッシュされる
//! ユーザーの値はカードを含まない）。

use std::sync::Arc;

use userhub_domain::{
    card::{Card, CardId, CardNumber, ExpirationDate, HolderName},
    identity::Identity,
    page::{Page, PageRequest},
    user::UserId,
};
use userhub_infra::{
    db::TransactionManager,
    repository::{CardRepository, UserRepository},
};
use uuid::Uuid;

use crate::{error::CoreError, usecase::access::AccessGate};

const CARD_NOT_FOUND: &str = "カードが見つかりません";
const CARD_NUMBER_ALREADY_USED: &str = "このカード番号は既に登録されています";

/// カード作成の入力
#[derive(Debug, Clone)]
pub struct CardInput {
    pub user_id:         Uuid,
    pub number:          String,
    pub holder:          String,
    pub expiration_date: String,
}

/// カード管理ユースケース
pub struct CardUseCaseImpl {
    card_repository: Arc<dyn CardRepository>,
    user_repository: Arc<dyn UserRepository>,
    tx_manager:      Arc<dyn TransactionManager>,
    access:          Arc<AccessGate>,
}

impl CardUseCaseImpl {
    pub fn new(
        card_repository: Arc<dyn CardRepository>,
        user_repository: Arc<dyn UserRepository>,
        tx_manager: Arc<dyn TransactionManager>,
        access: Arc<AccessGate>,
    ) -> Self {
        Self {
            card_repository,
            user_repository,
            tx_manager,
            access,
        }
    }

    /// カードを作成する
    ///
    /// 1. 入力の検証（カード番号 16 桁、名義、有効期限 MM/YY）
    /// 2. 所有者へのアクセス判定
    /// 3. 所有者の存在確認
    /// 4. カード番号の重複チェック
    /// 5. card_info テーブルに挿入（UNIQUE 制約違反も重複として扱う）
    #[tracing::instrument(skip_all, fields(user_id = %input.user_id))]
    pub async fn create(&self, identity: &Identity, input: CardInput) -> Result<Card, CoreError> {
        let number = CardNumber::new(input.number)?;
        let holder = HolderName::new(input.holder)?;
        let expiration_date = ExpirationDate::new(input.expiration_date)?;
        let user_id = UserId::from_uuid(input.user_id);

        self.access.ensure_access(identity, &user_id).await?;

        if self.user_repository.find_by_id(&user_id).await?.is_none() {
            return Err(CoreError::NotFound("ユーザーが見つかりません".to_string()));
        }

        if self
            .card_repository
            .find_by_number(&number)
            .await?
            .is_some()
        {
            return Err(CoreError::Conflict(CARD_NUMBER_ALREADY_USED.to_string()));
        }

        let card = Card::new(CardId::new(), user_id, number, holder, expiration_date);

        let mut tx = self.tx_manager.begin().await?;
        self.card_repository
            .insert(&mut tx, &card)
            .await
            .map_err(|e| CoreError::from_unique_violation(e, CARD_NUMBER_ALREADY_USED))?;
        tx.commit().await?;

        tracing::info!(card_id = %card.id(), "カードを作成しました");
        Ok(card)
    }

    /// ID でカードを取得する
    ///
    /// 所有者へのアクセス権がなければ拒否する。
    #[tracing::instrument(skip_all, fields(%id))]
    pub async fn get_by_id(&self, identity: &Identity, id: &CardId) -> Result<Card, CoreError> {
        let card = self.find_card(id).await?;
        self.access.ensure_access(identity, card.user_id()).await?;
        Ok(card)
    }

    /// 呼び出し元自身のカードを取得する
    #[tracing::instrument(skip_all, fields(page = request.page(), size = request.size()))]
    pub async fn get_mine(
        &self,
        identity: &Identity,
        request: PageRequest,
    ) -> Result<Page<Card>, CoreError> {
        let caller_id = self
            .access
            .caller_id(identity)
            .await?
            .ok_or_else(|| CoreError::NotFound("ユーザーが見つかりません".to_string()))?;

        Ok(self
            .card_repository
            .find_page_by_user_id(&caller_id, request)
            .await?)
    }

    /// 全カードを取得する（管理者のみ）
    #[tracing::instrument(skip_all, fields(page = request.page(), size = request.size()))]
    pub async fn get_all(
        &self,
        identity: &Identity,
        request: PageRequest,
    ) -> Result<Page<Card>, CoreError> {
        self.access.ensure_admin(identity)?;
        Ok(self.card_repository.find_page(request).await?)
    }

    /// カードを削除する
    #[tracing::instrument(skip_all, fields(%id))]
    pub async fn delete(&self, identity: &Identity, id: &CardId) -> Result<(), CoreError> {
        let card = self.find_card(id).await?;
        self.access.ensure_access(identity, card.user_id()).await?;

        let mut tx = self.tx_manager.begin().await?;
        if !self.card_repository.delete(&mut tx, id).await? {
            return Err(CoreError::NotFound(CARD_NOT_FOUND.to_string()));
        }
        tx.commit().await?;

        tracing::info!("カードを削除しました");
        Ok(())
    }

    async fn find_card(&self, id: &CardId) -> Result<Card, CoreError> {
        self.card_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| CoreError::NotFound(CARD_NOT_FOUND.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};
    use userhub_domain::{
        identity::Role,
        user::{BirthDate, Email, Surname, User, UserName},
    };
    use userhub_infra::mock::{MockStore, MockTransactionManager};

    use super::*;

    struct Sut {
        usecase: CardUseCaseImpl,
        store:   MockStore,
    }

    #[fixture]
    fn sut() -> Sut {
        let store = MockStore::new();
        let user_repository: Arc<dyn UserRepository> = Arc::new(store.user_repository());
        let usecase = CardUseCaseImpl::new(
            Arc::new(store.card_repository()),
            user_repository.clone(),
            Arc::new(MockTransactionManager),
            Arc::new(AccessGate::new(user_repository)),
        );
        Sut { usecase, store }
    }

    async fn insert_user(store: &MockStore, email: &str) -> UserId {
        let user = User::new(
            UserId::new(),
            UserName::new("Tom").unwrap(),
            Surname::new("Ripley").unwrap(),
            BirthDate::from_db(NaiveDate::from_ymd_opt(1990, 1, 1).unwrap()),
            Email::new(email).unwrap(),
        );
        let mut tx = MockTransactionManager.begin().await.unwrap();
        store
            .user_repository()
            .insert(&mut tx, &user)
            .await
            .unwrap();
        user.id().clone()
    }

    fn identity(email: &str, role: &str) -> Identity {
        Identity::new(
            Email::new(email).unwrap(),
            vec![Role::parse(role).unwrap()],
        )
    }

    fn card_input(user_id: &UserId, number: &str) -> CardInput {
        CardInput {
            user_id:         *user_id.as_uuid(),
            number:          number.to_string(),
            holder:          "Tom Ripley".to_string(),
            expiration_date: "12/25".to_string(),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn test_本人は自分のカードを作成できる(sut: Sut) {
        let tom_id = insert_user(&sut.store, "tom@example.com").await;

        let card = sut
            .usecase
            .create(
                &identity("tom@example.com", "ROLE_USER"),
                card_input(&tom_id, "1234567812345678"),
            )
            .await
            .unwrap();

        assert_eq!(card.user_id(), &tom_id);
        assert_eq!(card.number().as_str(), "1234567812345678");
        assert_eq!(sut.store.card_count(), 1);
    }

    #[rstest]
    #[case::桁不足("123456781234567")]
    #[case::英字混在("12345678abcd5678")]
    #[tokio::test]
    async fn test_16桁の数字でないカード番号は保存前に検証エラー(
        sut: Sut,
        #[case] number: &str,
    ) {
        // 所有者が存在しなくても検証が先に失敗する
        let result = sut
            .usecase
            .create(
                &identity("admin@example.com", "ROLE_ADMIN"),
                card_input(&UserId::new(), number),
            )
            .await;

        assert!(matches!(result, Err(CoreError::Validation(_))));
        assert_eq!(sut.store.card_count(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn test_他人名義のカードは作成できない(sut: Sut) {
        let tom_id = insert_user(&sut.store, "tom@example.com").await;
        insert_user(&sut.store, "dickie@example.com").await;

        let result = sut
            .usecase
            .create(
                &identity("dickie@example.com", "ROLE_USER"),
                card_input(&tom_id, "1234567812345678"),
            )
            .await;

        assert!(matches!(result, Err(CoreError::Forbidden(_))));
        assert_eq!(sut.store.card_count(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn test_存在しないユーザーへのカード作成はnot_found(sut: Sut) {
        let result = sut
            .usecase
            .create(
                &identity("admin@example.com", "ROLE_ADMIN"),
                card_input(&UserId::new(), "1234567812345678"),
            )
            .await;

        assert!(matches!(result, Err(CoreError::NotFound(_))));
    }

    #[rstest]
    #[tokio::test]
    async fn test_登録済みのカード番号は重複エラー(sut: Sut) {
        let tom_id = insert_user(&sut.store, "tom@example.com").await;
        let admin = identity("admin@example.com", "ROLE_ADMIN");
        sut.usecase
            .create(&admin, card_input(&tom_id, "1234567812345678"))
            .await
            .unwrap();

        let result = sut
            .usecase
            .create(&admin, card_input(&tom_id, "1234567812345678"))
            .await;

        assert!(matches!(result, Err(CoreError::Conflict(_))));
        assert_eq!(sut.store.card_count(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn test_カード取得は所有者本人と管理者のみ(sut: Sut) {
        let tom_id = insert_user(&sut.store, "tom@example.com").await;
        insert_user(&sut.store, "dickie@example.com").await;
        let tom = identity("tom@example.com", "ROLE_USER");
        let card = sut
            .usecase
            .create(&tom, card_input(&tom_id, "1234567812345678"))
            .await
            .unwrap();

        let own = sut.usecase.get_by_id(&tom, card.id()).await.unwrap();
        let admin = sut
            .usecase
            .get_by_id(&identity("admin@example.com", "ROLE_ADMIN"), card.id())
            .await
            .unwrap();
        let other = sut
            .usecase
            .get_by_id(&identity("dickie@example.com", "ROLE_USER"), card.id())
            .await;

        assert_eq!(own, card);
        assert_eq!(admin, card);
        assert!(matches!(other, Err(CoreError::Forbidden(_))));
    }

    #[rstest]
    #[tokio::test]
    async fn test_自分のカード一覧は自分のカードだけを返す(sut: Sut) {
        let tom_id = insert_user(&sut.store, "tom@example.com").await;
        let dickie_id = insert_user(&sut.store, "dickie@example.com").await;
        let admin = identity("admin@example.com", "ROLE_ADMIN");
        sut.usecase
            .create(&admin, card_input(&tom_id, "1111222233334444"))
            .await
            .unwrap();
        sut.usecase
            .create(&admin, card_input(&dickie_id, "5555666677778888"))
            .await
            .unwrap();

        let page = sut
            .usecase
            .get_mine(
                &identity("tom@example.com", "ROLE_USER"),
                PageRequest::default(),
            )
            .await
            .unwrap();

        assert_eq!(page.total_elements, 1);
        assert_eq!(page.items[0].user_id(), &tom_id);
    }

    #[rstest]
    #[tokio::test]
    async fn test_ユーザー登録のない呼び出し元の自分のカード一覧はnot_found(sut: Sut) {
        let result = sut
            .usecase
            .get_mine(
                &identity("ghost@example.com", "ROLE_USER"),
                PageRequest::default(),
            )
            .await;

        assert!(matches!(result, Err(CoreError::NotFound(_))));
    }

    #[rstest]
    #[tokio::test]
    async fn test_全カード一覧は管理者のみ(sut: Sut) {
        let tom_id = insert_user(&sut.store, "tom@example.com").await;
        let admin = identity("admin@example.com", "ROLE_ADMIN");
        sut.usecase
            .create(&admin, card_input(&tom_id, "1111222233334444"))
            .await
            .unwrap();

        let page = sut
            .usecase
            .get_all(&admin, PageRequest::default())
            .await
            .unwrap();
        let denied = sut
            .usecase
            .get_all(
                &identity("tom@example.com", "ROLE_USER"),
                PageRequest::default(),
            )
            .await;

        assert_eq!(page.total_elements, 1);
        assert!(matches!(denied, Err(CoreError::Forbidden(_))));
    }

    #[rstest]
    #[tokio::test]
    async fn test_他人のカードは削除できない(sut: Sut) {
        let tom_id = insert_user(&sut.store, "tom@example.com").await;
        insert_user(&sut.store, "dickie@example.com").await;
        let tom = identity("tom@example.com", "ROLE_USER");
        let card = sut
            .usecase
            .create(&tom, card_input(&tom_id, "1234567812345678"))
            .await
            .unwrap();

        let denied = sut
            .usecase
            .delete(&identity("dickie@example.com", "ROLE_USER"), card.id())
            .await;
        assert!(matches!(denied, Err(CoreError::Forbidden(_))));
        assert_eq!(sut.store.card_count(), 1);

        sut.usecase.delete(&tom, card.id()).await.unwrap();
        assert_eq!(sut.store.card_count(), 0);

        let missing = sut.usecase.get_by_id(&tom, card.id()).await;
        assert!(matches!(missing, Err(CoreError::NotFound(_))));
    }
}
