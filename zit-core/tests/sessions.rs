//! Session lifecycle through the accessor, against SQLite.

mod common;

use std::sync::Arc;

use common::{description, migrated_db, project_name};
use tokio::sync::{oneshot, Barrier};
use zit_core::repos::ProjectRepo;
use zit_core::{DatabaseAccessor, DatabaseConfig, DbError};

async fn project_names(db: &DatabaseAccessor) -> Vec<String> {
    db.scalars("SELECT name FROM projects ORDER BY name")
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_sessions_are_isolated() {
    let test_db = migrated_db().await;
    let barrier = Arc::new(Barrier::new(2));

    let spawn = || {
        let db = test_db.shared();
        let barrier = Arc::clone(&barrier);
        tokio::spawn(async move {
            db.session(|session| {
                let db = Arc::clone(&db);
                async move {
                    // Both sessions are open past this point.
                    barrier.wait().await;
                    let current = db.get_current_session().expect("session registered");
                    assert_eq!(current, session);
                    barrier.wait().await;
                    Ok::<_, DbError>(session.id())
                }
            })
            .await
        })
    };

    let a = spawn();
    let b = spawn();
    let a = a.await.unwrap().unwrap();
    let b = b.await.unwrap().unwrap();

    assert_ne!(a, b);
    assert_eq!(test_db.active_sessions(), 0);
}

#[tokio::test]
async fn session_commits_and_clears_registry() {
    let test_db = migrated_db().await;
    let db: &DatabaseAccessor = &test_db;

    let kept = db
        .session(|session| async move {
            assert_eq!(db.get_current_session(), Some(session.clone()));
            ProjectRepo::new(db).create(&project_name("Grid A"), &description("")).await?;
            Ok::<_, DbError>(session)
        })
        .await
        .unwrap();

    assert!(db.get_current_session().is_none());
    assert!(kept.is_closed().await);
    assert!(matches!(
        kept.execute("SELECT 1").await,
        Err(DbError::SessionClosed { .. })
    ));
    assert_eq!(project_names(db).await, vec!["Grid A"]);

    let fresh = db
        .session(|session| async move { Ok::<_, DbError>(session) })
        .await
        .unwrap();
    assert_ne!(fresh, kept);
}

#[tokio::test]
async fn failed_session_rolls_back_and_returns_the_error() {
    let test_db = migrated_db().await;
    let db: &DatabaseAccessor = &test_db;

    let err = db
        .session(|_| async move {
            ProjectRepo::new(db).create(&project_name("Doomed"), &description("")).await?;
            Err::<(), _>(DbError::Conflict("caller gave up".into()))
        })
        .await
        .unwrap_err();

    assert!(matches!(err, DbError::Conflict(ref msg) if msg == "caller gave up"));
    assert!(db.get_current_session().is_none());
    assert!(project_names(db).await.is_empty());
}

#[tokio::test]
async fn joined_sessions_in_one_task_commit_independently() {
    let test_db = migrated_db().await;
    let db: &DatabaseAccessor = &test_db;
    let (b_open_tx, b_open_rx) = oneshot::channel();
    let (a_wrote_tx, a_wrote_rx) = oneshot::channel();

    let a = db.session(|own| async move {
        // B's scope is open from here on.
        b_open_rx.await.unwrap();
        assert_eq!(db.get_current_session(), Some(own));
        ProjectRepo::new(db).create(&project_name("From A"), &description("")).await?;
        let _ = a_wrote_tx.send(());
        Ok::<_, DbError>(())
    });
    let b = db.session(|own| async move {
        let _ = b_open_tx.send(());
        a_wrote_rx.await.unwrap();
        assert_eq!(db.get_current_session(), Some(own));
        Err::<(), _>(DbError::Conflict("b gave up".into()))
    });

    let (a, b) = tokio::join!(a, b);
    assert!(a.is_ok());
    assert!(matches!(b, Err(DbError::Conflict(_))));
    assert_eq!(db.active_sessions(), 0);
    assert_eq!(project_names(db).await, vec!["From A"]);
}

#[tokio::test]
async fn nested_transaction_rolls_back_only_inner_work() {
    let test_db = migrated_db().await;
    let db: &DatabaseAccessor = &test_db;

    db.session(|outer| async move {
        ProjectRepo::new(db).create(&project_name("Outer"), &description("")).await?;

        let inner = db
            .transaction(|inner| {
                let outer = outer.clone();
                async move {
                    assert_eq!(inner, outer);
                    assert_eq!(inner.depth().await, 1);
                    ProjectRepo::new(db).create(&project_name("Inner"), &description("")).await?;
                    Err::<(), _>(DbError::Conflict("inner failed".into()))
                }
            })
            .await;
        assert!(inner.is_err());
        assert_eq!(outer.depth().await, 0);

        // The outer transaction is still usable.
        ProjectRepo::new(db).create(&project_name("After"), &description("")).await?;
        Ok::<_, DbError>(())
    })
    .await
    .unwrap();

    assert_eq!(project_names(db).await, vec!["After", "Outer"]);
}

#[tokio::test]
async fn nested_transaction_success_is_kept() {
    let test_db = migrated_db().await;
    let db: &DatabaseAccessor = &test_db;

    db.session(|_| async move {
        db.transaction(|_| async move {
            ProjectRepo::new(db).create(&project_name("Nested"), &description("")).await
        })
        .await?;
        Ok::<_, DbError>(())
    })
    .await
    .unwrap();

    assert_eq!(project_names(db).await, vec!["Nested"]);
}

#[tokio::test]
async fn transaction_without_session_opens_one() {
    let test_db = migrated_db().await;
    let db: &DatabaseAccessor = &test_db;

    let err = db
        .transaction(|session| async move {
            assert_eq!(db.get_current_session(), Some(session));
            ProjectRepo::new(db).create(&project_name("Gone"), &description("")).await?;
            Err::<(), _>(DbError::NoRows)
        })
        .await
        .unwrap_err();

    assert!(matches!(err, DbError::NoRows));
    assert!(project_names(db).await.is_empty());
}

#[tokio::test]
async fn single_session_reuses_active_session() {
    let test_db = migrated_db().await;
    let db: &DatabaseAccessor = &test_db;

    db.session(|outer| async move {
        let reused = db
            .single_session(|inner| async move { Ok::<_, DbError>(inner) })
            .await?;
        assert_eq!(reused, outer);
        Ok::<_, DbError>(())
    })
    .await
    .unwrap();

    // Without an active session it opens and commits its own.
    let own = db
        .single_session(|session| async move { Ok::<_, DbError>(session) })
        .await
        .unwrap();
    assert!(own.is_closed().await);
}

#[tokio::test]
async fn nested_session_shadows_and_restores() {
    let test_db = migrated_db().await;
    let db: &DatabaseAccessor = &test_db;

    db.session(|outer| async move {
        let inner = db
            .session(|inner| async move {
                assert_eq!(db.get_current_session(), Some(inner.clone()));
                Ok::<_, DbError>(inner)
            })
            .await?;
        assert_ne!(inner, outer);
        assert_eq!(db.get_current_session(), Some(outer));
        Ok::<_, DbError>(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn row_shape_helpers() {
    let test_db = migrated_db().await;
    let db: &DatabaseAccessor = &test_db;
    let projects = ProjectRepo::new(db);
    projects.create(&project_name("A"), &description("")).await.unwrap();
    projects.create(&project_name("B"), &description("")).await.unwrap();

    let many = "SELECT id FROM projects";
    let none = "SELECT id FROM projects WHERE name = 'missing'";
    let single = "SELECT id FROM projects WHERE name = 'A'";

    assert!(matches!(db.one(many).await, Err(DbError::MultipleRows)));
    assert!(matches!(db.one(none).await, Err(DbError::NoRows)));
    assert!(db.one(single).await.is_ok());

    assert!(matches!(db.one_or_none(many).await, Err(DbError::MultipleRows)));
    assert!(db.one_or_none(none).await.unwrap().is_none());
    assert!(db.one_or_none(single).await.unwrap().is_some());

    assert!(db.first(many).await.unwrap().is_some());
    assert!(db.first(none).await.unwrap().is_none());

    assert_eq!(db.all(many).await.unwrap().len(), 2);
    assert_eq!(
        db.scalar::<i64, _>("SELECT COUNT(*) FROM projects").await.unwrap(),
        Some(2)
    );
    assert_eq!(db.scalar::<i64, _>(none).await.unwrap(), None);
    assert_eq!(project_names(db).await, vec!["A", "B"]);

    // Each helper call outside a scope used its own short-lived session.
    assert_eq!(db.active_sessions(), 0);
}

#[tokio::test]
async fn cancelled_session_is_rolled_back_and_unregistered() {
    let test_db = migrated_db().await;
    let (written_tx, written_rx) = oneshot::channel();

    let task = {
        let db = test_db.shared();
        tokio::spawn(async move {
            db.session(|_| {
                let db = Arc::clone(&db);
                async move {
                    ProjectRepo::new(&db)
                        .create(&project_name("Never committed"), &description(""))
                        .await?;
                    let _ = written_tx.send(());
                    std::future::pending::<()>().await;
                    Ok::<_, DbError>(())
                }
            })
            .await
        })
    };

    written_rx.await.unwrap();
    assert_eq!(test_db.active_sessions(), 1);

    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());

    assert_eq!(test_db.active_sessions(), 0);
    assert!(project_names(&test_db).await.is_empty());
}

#[tokio::test]
async fn cancelled_nested_transaction_is_rolled_back_before_next_statement() {
    let test_db = migrated_db().await;
    let db: &DatabaseAccessor = &test_db;

    db.session(|session| async move {
        let (written_tx, written_rx) = oneshot::channel();
        let nested = db.transaction(|_| async move {
            ProjectRepo::new(db)
                .create(&project_name("Abandoned"), &description(""))
                .await?;
            let _ = written_tx.send(());
            std::future::pending::<()>().await;
            Ok::<_, DbError>(())
        });

        tokio::select! {
            _ = nested => panic!("nested transaction should not finish"),
            _ = written_rx => {}
        }

        ProjectRepo::new(db).create(&project_name("Kept"), &description("")).await?;
        assert_eq!(session.depth().await, 0);
        Ok::<_, DbError>(())
    })
    .await
    .unwrap();

    assert_eq!(project_names(db).await, vec!["Kept"]);
}

#[tokio::test]
async fn disconnect_then_use_fails() {
    let test_db = migrated_db().await;
    test_db.disconnect().await;

    assert!(matches!(
        test_db.all("SELECT 1").await,
        Err(DbError::NotConnected)
    ));
}

#[tokio::test]
#[ignore = "requires database"]
async fn postgres_session_roundtrip() {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
    let db = DatabaseAccessor::new(DatabaseConfig {
        url: Some(url),
        ..DatabaseConfig::default()
    });
    db.connect().await.expect("connect postgres");
    zit_core::db::migrations::run(&db).await.expect("migrations");

    let value = db
        .session(|_| async { db.scalar::<i64, _>("SELECT 1::BIGINT").await })
        .await
        .expect("query");
    assert_eq!(value, Some(1));
    db.disconnect().await;
}
