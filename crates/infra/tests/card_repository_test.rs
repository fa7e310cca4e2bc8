//! CardRepository 統合テスト
//!
//! 実行方法:
//! ```bash
//! DATABASE_URL=postgres://localhost/userhub \
//!     cargo test -p userhub-infra --test card_repository_test -- --ignored
//! ```

mod common;

use common::{create_test_card, create_test_user, insert_user};
use pretty_assertions::assert_eq;
use sqlx::PgPool;
use userhub_domain::{card::CardNumber, page::PageRequest};
use userhub_infra::{
    db::{PgTransactionManager, TransactionManager},
    repository::{CardRepository, PostgresCardRepository},
};

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要"]
async fn test_挿入したカードをidと番号で取得できる(pool: PgPool) {
    let user = create_test_user("tom@example.com");
    insert_user(&pool, &user).await;
    let tx_manager = PgTransactionManager::new(pool.clone());
    let repo = PostgresCardRepository::new(pool);
    let card = create_test_card(user.id(), "1234567812345678");

    let mut tx = tx_manager.begin().await.unwrap();
    repo.insert(&mut tx, &card).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(repo.find_by_id(card.id()).await.unwrap(), Some(card.clone()));
    assert_eq!(
        repo.find_by_number(&CardNumber::new("1234567812345678").unwrap())
            .await
            .unwrap(),
        Some(card)
    );
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要"]
async fn test_重複カード番号の挿入は一意制約違反になる(pool: PgPool) {
    let user = create_test_user("tom@example.com");
    insert_user(&pool, &user).await;
    let tx_manager = PgTransactionManager::new(pool.clone());
    let repo = PostgresCardRepository::new(pool);
    let mut tx = tx_manager.begin().await.unwrap();
    repo.insert(&mut tx, &create_test_card(user.id(), "1234567812345678"))
        .await
        .unwrap();

    let err = repo
        .insert(&mut tx, &create_test_card(user.id(), "1234567812345678"))
        .await
        .unwrap_err();

    assert_eq!(err.as_unique_violation(), Some("card_info_number_key"));
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要"]
async fn test_所有者ごとのページは他人のカードを含まない(pool: PgPool) {
    let tom = create_test_user("tom@example.com");
    let other = create_test_user("other@example.com");
    insert_user(&pool, &tom).await;
    insert_user(&pool, &other).await;
    let tx_manager = PgTransactionManager::new(pool.clone());
    let repo = PostgresCardRepository::new(pool);
    let mut tx = tx_manager.begin().await.unwrap();
    repo.insert(&mut tx, &create_test_card(tom.id(), "1111222233334444"))
        .await
        .unwrap();
    repo.insert(&mut tx, &create_test_card(other.id(), "5555666677778888"))
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let mine = repo
        .find_page_by_user_id(tom.id(), PageRequest::default())
        .await
        .unwrap();
    let all = repo.find_page(PageRequest::default()).await.unwrap();

    assert_eq!(mine.total_elements, 1);
    assert_eq!(mine.items[0].user_id(), tom.id());
    assert_eq!(all.total_elements, 2);
}
