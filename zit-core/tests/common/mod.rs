//! Shared fixtures: a migrated throw-away SQLite database per test.

#![allow(dead_code)]

use std::ops::Deref;
use std::sync::Arc;

use tempfile::TempDir;
use zit_core::db::migrations;
use zit_core::models::{Description, IntersectionName, ProjectName};
use zit_core::{AuthConfig, DatabaseAccessor, DatabaseConfig};

/// Connected, migrated accessor. The database file lives as long as this.
pub struct TestDb {
    db: Arc<DatabaseAccessor>,
    _dir: TempDir,
}

impl TestDb {
    pub fn shared(&self) -> Arc<DatabaseAccessor> {
        Arc::clone(&self.db)
    }
}

impl Deref for TestDb {
    type Target = DatabaseAccessor;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

pub async fn migrated_db() -> TestDb {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = DatabaseAccessor::new(DatabaseConfig::sqlite(dir.path().join("zit.db")));
    db.connect().await.expect("connect sqlite");
    migrations::run(&db).await.expect("migrations");
    TestDb {
        db: Arc::new(db),
        _dir: dir,
    }
}

/// Cheapest bcrypt cost, so auth tests stay fast.
pub fn fast_auth() -> AuthConfig {
    AuthConfig {
        bcrypt_cost: 4,
        ..AuthConfig::default()
    }
}

pub fn project_name(name: &str) -> ProjectName {
    ProjectName::new(name).expect("valid project name")
}

pub fn intersection_name(name: &str) -> IntersectionName {
    IntersectionName::new(name).expect("valid intersection name")
}

pub fn description(text: &str) -> Description {
    Description::new(text).expect("valid description")
}
