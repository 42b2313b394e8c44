//! Database accessor: owns the pool and hands out scoped sessions.
//!
//! Scoped acquisition is explicit. Callers pass the unit of work as a
//! closure:
//!
//! ```ignore
//! let project = db
//!     .transaction(|_session| async move {
//!         let project = ProjectRepo::new(&db).create(&name, &description).await?;
//!         IntersectionRepo::new(&db).create(project.id, 1, &junction).await?;
//!         Ok::<_, DbError>(project)
//!     })
//!     .await?;
//! ```
//!
//! Query helpers (`one`, `all`, ...) join the session of the enclosing
//! scope when one is active, so repository calls inside the closure share
//! its transaction.

use std::future::Future;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use sqlx::any::{AnyConnectOptions, AnyPoolOptions, AnyQueryResult, AnyRow};
use sqlx::{Any, AnyPool, ConnectOptions, Decode, Execute, Row, Type};

use super::migrations::Dialect;
use super::registry::SessionRegistry;
use super::rows;
use super::session::Session;
use crate::config::DatabaseConfig;
use crate::error::{DbError, DbResult};

/// Owns the connection pool and the session registry.
pub struct DatabaseAccessor {
    config: DatabaseConfig,
    pool: RwLock<Option<AnyPool>>,
    sessions: SessionRegistry,
    next_session_id: AtomicU64,
}

impl std::fmt::Debug for DatabaseAccessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseAccessor")
            .field("connected", &self.is_connected())
            .field("max_connections", &self.config.max_connections())
            .finish()
    }
}

impl DatabaseAccessor {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            pool: RwLock::new(None),
            sessions: SessionRegistry::new(),
            next_session_id: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// SQL dialect of the configured URL.
    pub fn dialect(&self) -> Option<Dialect> {
        Dialect::from_url(&self.config.url())
    }

    pub fn is_connected(&self) -> bool {
        self.pool
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Build the connection pool.
    ///
    /// Calling this on an already connected accessor replaces the pool
    /// without draining the old one; that is a caller error and is logged.
    pub async fn connect(&self) -> DbResult<()> {
        sqlx::any::install_default_drivers();

        let mut options = AnyConnectOptions::from_str(&self.config.url())?;
        if !self.config.echo {
            options = options.disable_statement_logging();
        }

        let pool = AnyPoolOptions::new()
            .max_connections(self.config.max_connections())
            .acquire_timeout(self.config.acquire_timeout())
            .connect_with(options)
            .await?;

        let previous = self
            .pool
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(pool);
        if previous.is_some() {
            tracing::warn!("connect() called twice; previous pool replaced without draining");
        }

        tracing::info!(
            dialect = ?self.dialect(),
            max_connections = self.config.max_connections(),
            "database pool ready"
        );
        Ok(())
    }

    /// Close the pool. No-op if never connected.
    pub async fn disconnect(&self) {
        let pool = self
            .pool
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(pool) = pool {
            pool.close().await;
            tracing::info!("database pool closed");
        }
    }

    /// The pool, or [`DbError::NotConnected`] before `connect()`.
    pub fn pool(&self) -> DbResult<AnyPool> {
        self.pool
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(DbError::NotConnected)
    }

    /// Innermost session of the enclosing `session()` scope.
    pub fn get_current_session(&self) -> Option<Session> {
        self.sessions.current()
    }

    async fn open_session(&self) -> DbResult<Session> {
        let pool = self.pool()?;
        let tx = pool.begin().await?;
        let id = self.next_session_id.fetch_add(1, Ordering::Relaxed);

        if self.config.echo_pool {
            tracing::debug!(
                session = id,
                pool_size = pool.size(),
                idle = pool.num_idle(),
                "session checked out"
            );
        }
        Ok(Session::new(id, tx, self.config.echo_pool))
    }

    /// Run `f` in a new session that is current for the future `f` returns.
    ///
    /// The binding belongs to that future, not to the task polling it:
    /// sibling scopes joined in one task each see their own session.
    ///
    /// On `Ok` the session commits and the connection goes back to the pool.
    /// On `Err` the session is rolled back and the error returned unchanged.
    /// If the returned future is dropped early, the transaction is rolled
    /// back as it is dropped.
    pub async fn session<F, Fut, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(Session) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<DbError>,
    {
        let session = self.open_session().await?;
        let mut scope = SessionScope {
            session: session.clone(),
            finished: false,
        };

        match self.sessions.scope(session.clone(), f).await {
            Ok(value) => {
                let committed = session.commit().await;
                scope.finished = true;
                drop(scope);
                committed?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = session.rollback().await {
                    tracing::warn!(
                        session = session.id(),
                        error = %rollback_err,
                        "rollback after failed unit of work also failed"
                    );
                }
                scope.finished = true;
                Err(err)
            }
        }
    }

    /// Reuse the enclosing session if there is one, otherwise behave
    /// like [`DatabaseAccessor::session`].
    pub async fn single_session<F, Fut, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(Session) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<DbError>,
    {
        match self.get_current_session() {
            Some(session) => f(session).await,
            None => self.session(f).await,
        }
    }

    /// Run `f` transactionally.
    ///
    /// Inside an active session this opens a savepoint: `Ok` keeps the work,
    /// `Err` undoes only the work since the savepoint and the outer session
    /// carries on. Without an active session it opens a new session whose
    /// top-level transaction encloses `f`.
    pub async fn transaction<F, Fut, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(Session) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<DbError>,
    {
        let Some(session) = self.get_current_session() else {
            return self.session(f).await;
        };

        let savepoint = session.begin_nested().await?;
        let mut scope = SavepointScope {
            session: session.clone(),
            name: Some(savepoint.clone()),
        };

        match f(session.clone()).await {
            Ok(value) => {
                session.release(&savepoint).await?;
                scope.name = None;
                Ok(value)
            }
            Err(err) => {
                match session.rollback_to(&savepoint).await {
                    Ok(()) => scope.name = None,
                    Err(rollback_err) => tracing::warn!(
                        session = session.id(),
                        savepoint = %savepoint,
                        error = %rollback_err,
                        "rollback to savepoint failed"
                    ),
                }
                Err(err)
            }
        }
    }

    /// Run a statement that returns no rows of interest.
    pub async fn execute<'q, E>(&self, query: E) -> DbResult<AnyQueryResult>
    where
        E: 'q + Execute<'q, Any>,
    {
        match self.get_current_session() {
            Some(session) => session.execute(query).await,
            None => {
                self.session(|session| async move { session.execute(query).await })
                    .await
            }
        }
    }

    /// Every row.
    pub async fn all<'q, E>(&self, query: E) -> DbResult<Vec<AnyRow>>
    where
        E: 'q + Execute<'q, Any>,
    {
        match self.get_current_session() {
            Some(session) => session.fetch_all(query).await,
            None => {
                self.session(|session| async move { session.fetch_all(query).await })
                    .await
            }
        }
    }

    /// First row or `None`; additional rows are ignored.
    pub async fn first<'q, E>(&self, query: E) -> DbResult<Option<AnyRow>>
    where
        E: 'q + Execute<'q, Any>,
    {
        match self.get_current_session() {
            Some(session) => session.fetch_optional(query).await,
            None => {
                self.session(|session| async move { session.fetch_optional(query).await })
                    .await
            }
        }
    }

    /// Exactly one row; [`DbError::NoRows`] or [`DbError::MultipleRows`]
    /// otherwise.
    pub async fn one<'q, E>(&self, query: E) -> DbResult<AnyRow>
    where
        E: 'q + Execute<'q, Any>,
    {
        rows::exactly_one(self.all(query).await?)
    }

    /// Zero or one row; [`DbError::MultipleRows`] otherwise.
    pub async fn one_or_none<'q, E>(&self, query: E) -> DbResult<Option<AnyRow>>
    where
        E: 'q + Execute<'q, Any>,
    {
        rows::at_most_one(self.all(query).await?)
    }

    /// First column of the first row.
    pub async fn scalar<'q, T, E>(&self, query: E) -> DbResult<Option<T>>
    where
        E: 'q + Execute<'q, Any>,
        T: for<'r> Decode<'r, Any> + Type<Any>,
    {
        match self.first(query).await? {
            Some(row) => Ok(Some(row.try_get::<T, _>(0)?)),
            None => Ok(None),
        }
    }

    /// First column of every row.
    pub async fn scalars<'q, T, E>(&self, query: E) -> DbResult<Vec<T>>
    where
        E: 'q + Execute<'q, Any>,
        T: for<'r> Decode<'r, Any> + Type<Any>,
    {
        self.all(query)
            .await?
            .iter()
            .map(|row| row.try_get::<T, _>(0).map_err(DbError::from))
            .collect()
    }

    /// Number of `session()` scopes currently running.
    pub fn active_sessions(&self) -> usize {
        self.sessions.active_scopes()
    }
}

/// Owner-side state of a `session()` scope. Dropping it before `finished`
/// is set means the future was cancelled.
struct SessionScope {
    session: Session,
    finished: bool,
}

impl Drop for SessionScope {
    fn drop(&mut self) {
        if !self.finished {
            self.session.abort();
        }
    }
}

/// Savepoint still owed a rollback while `name` is set.
struct SavepointScope {
    session: Session,
    name: Option<String>,
}

impl Drop for SavepointScope {
    fn drop(&mut self) {
        if let Some(name) = self.name.take() {
            self.session.abandon_savepoint(name);
        }
    }
}
