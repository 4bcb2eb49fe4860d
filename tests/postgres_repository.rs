use offers_api::db::pg_repositories;
use offers_api::models::CreateComment;
use offers_api::repository::PersistenceError;
use offers_api::services::{CommentService, OfferService, ServiceError, UserService};
use offers_api::test_support::{TestDatabase, TestDatabaseError, sample_offer, sample_user};

async fn provision(test_name: &str) -> Option<TestDatabase> {
    match TestDatabase::new_from_env().await {
        Ok(db) => Some(db),
        Err(TestDatabaseError::MissingUrl) => {
            eprintln!("skipping {test_name}: TEST_DATABASE_URL not set");
            None
        }
        Err(err) => panic!("failed to provision test database: {err:?}"),
    }
}

#[tokio::test]
async fn find_or_create_and_offers_round_trip_through_postgres() {
    let Some(test_db) = provision("postgres round trip").await else {
        return;
    };
    let repositories = pg_repositories(test_db.pool_clone());
    let users = UserService::new(repositories.users.clone());
    let offers = OfferService::new(repositories.offers.clone());

    let first = users
        .find_or_create(sample_user("keks@example.com"), "s1")
        .await
        .expect("create user");
    let again = users
        .find_or_create(sample_user("KEKS@example.com"), "s1")
        .await
        .expect("find user");
    assert_eq!(first.id, again.id);

    let created = offers
        .create(sample_offer(), first.id)
        .await
        .expect("create offer");
    let fetched = offers
        .find_by_id(created.id)
        .await
        .expect("find offer")
        .expect("offer exists");
    assert_eq!(fetched.title, created.title);
    assert_eq!(fetched.goods, vec!["Breakfast", "Washer", "Wi-Fi"]);
    assert_eq!(fetched.location, created.location);
    assert_eq!(fetched.user_id, first.id);

    let (page, total) = offers.find(1, 10).await.expect("list");
    assert_eq!(total, 1);
    assert_eq!(page.len(), 1);

    test_db.close().await.expect("failed to drop test database");
}

#[tokio::test]
async fn comments_bump_count_and_unknown_authors_are_rejected() {
    let Some(test_db) = provision("postgres comments").await else {
        return;
    };
    let repositories = pg_repositories(test_db.pool_clone());
    let users = UserService::new(repositories.users.clone());
    let offers = OfferService::new(repositories.offers.clone());
    let comments = CommentService::new(repositories.comments.clone(), repositories.offers.clone());

    let user = users
        .create(sample_user("keks@example.com"), "s1")
        .await
        .expect("create user");
    let offer = offers.create(sample_offer(), user.id).await.expect("offer");

    comments
        .create(
            CreateComment {
                text: "Lovely canal view".into(),
                rating: 5,
            },
            offer.id,
            user.id,
        )
        .await
        .expect("comment");
    let refreshed = offers
        .find_by_id(offer.id)
        .await
        .expect("find")
        .expect("offer exists");
    assert_eq!(refreshed.comment_count, 1);

    let err = offers.create(sample_offer(), 9_999).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Persistence(PersistenceError::Rejected(_))
    ));

    test_db.close().await.expect("failed to drop test database");
}
