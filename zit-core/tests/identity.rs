//! Bearer-token identity resolution and account operations.

mod common;

use common::{fast_auth, migrated_db};
use zit_core::auth::{self, token};
use zit_core::models::{Password, Username};
use zit_core::repos::{TokenRepo, User, UserRepo};
use zit_core::{AuthConfig, AuthError, DatabaseAccessor, DbError};

const PASSWORD: &str = "Gr33n!wave";

async fn register(db: &DatabaseAccessor, name: &str) -> User {
    auth::register_user(
        db,
        &fast_auth(),
        &Username::new(name).unwrap(),
        &Password::new(PASSWORD).unwrap(),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn issued_token_resolves_to_its_user() {
    let db = migrated_db().await;
    let user = register(&db, "operator").await;

    let issued = auth::issue_access_token(&db, &fast_auth(), &user).await.unwrap();
    assert_eq!(issued.access_token.len(), token::TOKEN_LEN);

    let resolved = auth::fetch_user_from_access_token(&db, &issued.access_token)
        .await
        .unwrap();
    assert_eq!(resolved, user);
}

#[tokio::test]
async fn only_the_digest_is_stored() {
    let db = migrated_db().await;
    let user = register(&db, "digest").await;
    let issued = auth::issue_access_token(&db, &fast_auth(), &user).await.unwrap();

    let stored: Vec<String> = db
        .scalars("SELECT token_hash FROM access_tokens")
        .await
        .unwrap();
    assert_eq!(stored, vec![token::digest(&issued.access_token)]);
}

#[tokio::test]
async fn token_of_deleted_user_is_rejected() {
    let db = migrated_db().await;
    let user = register(&db, "leaver").await;
    let issued = auth::issue_access_token(&db, &fast_auth(), &user).await.unwrap();

    UserRepo::new(&db).delete(user.id).await.unwrap();

    let err = auth::fetch_user_from_access_token(&db, &issued.access_token)
        .await
        .unwrap_err();
    // The user's tokens went with it.
    assert!(matches!(err, AuthError::UnknownToken));
    assert!(err.is_credential_failure());
}

#[tokio::test]
async fn unknown_and_malformed_tokens_are_rejected() {
    let db = migrated_db().await;

    assert!(matches!(
        auth::fetch_user_from_access_token(&db, &token::generate()).await,
        Err(AuthError::UnknownToken)
    ));
    assert!(matches!(
        auth::fetch_user_from_access_token(&db, "not-a-token").await,
        Err(AuthError::MalformedToken)
    ));
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let db = migrated_db().await;
    let user = register(&db, "sleepy").await;
    let already_expired = AuthConfig {
        token_ttl_minutes: -1,
        ..fast_auth()
    };
    let issued = auth::issue_access_token(&db, &already_expired, &user)
        .await
        .unwrap();

    assert!(matches!(
        auth::fetch_user_from_access_token(&db, &issued.access_token).await,
        Err(AuthError::TokenExpired)
    ));

    let purged = TokenRepo::new(&db)
        .delete_expired(chrono::Utc::now().timestamp())
        .await
        .unwrap();
    assert_eq!(purged, 1);
}

#[tokio::test]
async fn issuing_a_token_purges_expired_ones() {
    let db = migrated_db().await;
    let user = register(&db, "renewer").await;
    let already_expired = AuthConfig {
        token_ttl_minutes: -1,
        ..fast_auth()
    };
    let stale = auth::issue_access_token(&db, &already_expired, &user)
        .await
        .unwrap();
    let fresh = auth::issue_access_token(&db, &fast_auth(), &user).await.unwrap();

    let stored: Vec<String> = db
        .scalars("SELECT token_hash FROM access_tokens")
        .await
        .unwrap();
    assert_eq!(stored, vec![token::digest(&fresh.access_token)]);
    assert!(matches!(
        auth::fetch_user_from_access_token(&db, &stale.access_token).await,
        Err(AuthError::UnknownToken)
    ));
}

#[tokio::test]
async fn optional_identity() {
    let db = migrated_db().await;
    let user = register(&db, "maybe").await;
    let issued = auth::issue_access_token(&db, &fast_auth(), &user).await.unwrap();

    assert_eq!(auth::fetch_optional_user(&db, None).await.unwrap(), None);
    assert_eq!(
        auth::fetch_optional_user(&db, Some(&issued.access_token))
            .await
            .unwrap(),
        Some(user)
    );

    // An invalid credential fails exactly as on the required path.
    let bogus = token::generate();
    let optional = auth::fetch_optional_user(&db, Some(&bogus)).await.unwrap_err();
    let required = auth::fetch_user_from_access_token(&db, &bogus)
        .await
        .unwrap_err();
    assert_eq!(optional.to_string(), required.to_string());
    assert!(matches!(optional, AuthError::UnknownToken));
}

#[tokio::test]
async fn authenticate_checks_password() {
    let db = migrated_db().await;
    let user = register(&db, "login").await;

    assert_eq!(auth::authenticate(&db, "login", PASSWORD).await.unwrap(), user);
    assert!(matches!(
        auth::authenticate(&db, "login", "Wr0ng!pass").await,
        Err(AuthError::InvalidCredentials)
    ));
    assert!(matches!(
        auth::authenticate(&db, "nobody", PASSWORD).await,
        Err(AuthError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn duplicate_username_is_a_conflict() {
    let db = migrated_db().await;
    register(&db, "taken").await;

    let err = auth::register_user(
        &db,
        &fast_auth(),
        &Username::new("taken").unwrap(),
        &Password::new(PASSWORD).unwrap(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AuthError::Db(DbError::Conflict(_))));
}

#[tokio::test]
async fn revoked_token_stops_working() {
    let db = migrated_db().await;
    let user = register(&db, "logout").await;
    let issued = auth::issue_access_token(&db, &fast_auth(), &user).await.unwrap();

    assert!(auth::revoke_access_token(&db, &issued.access_token).await.unwrap());
    assert!(!auth::revoke_access_token(&db, &issued.access_token).await.unwrap());
    assert!(matches!(
        auth::fetch_user_from_access_token(&db, &issued.access_token).await,
        Err(AuthError::UnknownToken)
    ));
}
