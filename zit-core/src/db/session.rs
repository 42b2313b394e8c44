//! Session handle: one pooled connection with an open top-level
//! transaction, plus savepoint bookkeeping for nested transactions.

use std::fmt;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use sqlx::any::{AnyQueryResult, AnyRow};
use sqlx::AnyConnection;
use sqlx::{Any, Execute, Executor, Transaction};
use tokio::sync::Mutex;

use crate::error::{DbError, DbResult};

/// Cloneable handle to a unit of work.
///
/// Clones share the same connection. Statements issued through any clone are
/// serialised. Once the owning scope has committed or rolled back, every
/// operation fails with [`DbError::SessionClosed`].
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    id: u64,
    echo: bool,
    state: Mutex<SessionState>,
    /// Savepoints whose scope was dropped before finishing. Rolled back
    /// before the next statement or commit. Kept outside the async mutex so
    /// `Drop` impls can push without awaiting.
    abandoned: StdMutex<Vec<String>>,
}

struct SessionState {
    tx: Option<Transaction<'static, Any>>,
    next_savepoint: u32,
    open_savepoints: Vec<String>,
}

impl SessionState {
    /// Connection for the next statement, after undoing abandoned savepoints.
    async fn connection(
        &mut self,
        id: u64,
        abandoned: &StdMutex<Vec<String>>,
    ) -> DbResult<&mut AnyConnection> {
        let tx = self.tx.as_mut().ok_or(DbError::SessionClosed { id })?;

        let pending: Vec<String> = std::mem::take(
            &mut *abandoned.lock().unwrap_or_else(PoisonError::into_inner),
        );
        // Innermost first, so each name is still live when it is reached.
        for name in pending.into_iter().rev() {
            if let Some(pos) = self.open_savepoints.iter().position(|s| *s == name) {
                tracing::debug!(session = id, savepoint = %name, "rolling back abandoned savepoint");
                control(&mut **tx, format!("ROLLBACK TO SAVEPOINT {name}")).await?;
                control(&mut **tx, format!("RELEASE SAVEPOINT {name}")).await?;
                self.open_savepoints.truncate(pos);
            }
        }

        Ok(&mut **tx)
    }
}

/// Run a transaction-control statement.
async fn control(conn: &mut AnyConnection, statement: String) -> DbResult<()> {
    conn.execute(statement.as_str()).await?;
    Ok(())
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").field("id", &self.inner.id).finish()
    }
}

impl PartialEq for Session {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Session {}

impl Session {
    pub(crate) fn new(id: u64, tx: Transaction<'static, Any>, echo: bool) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                id,
                echo,
                state: Mutex::new(SessionState {
                    tx: Some(tx),
                    next_savepoint: 0,
                    open_savepoints: Vec::new(),
                }),
                abandoned: StdMutex::new(Vec::new()),
            }),
        }
    }

    /// Process-unique id, stable across clones.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// True once the owning scope has committed or rolled back.
    pub async fn is_closed(&self) -> bool {
        self.inner.state.lock().await.tx.is_none()
    }

    /// Current savepoint nesting depth.
    pub async fn depth(&self) -> usize {
        self.inner.state.lock().await.open_savepoints.len()
    }

    pub async fn execute<'q, E>(&self, query: E) -> DbResult<AnyQueryResult>
    where
        E: 'q + Execute<'q, Any>,
    {
        let mut state = self.inner.state.lock().await;
        let conn = state.connection(self.inner.id, &self.inner.abandoned).await?;
        Ok(conn.execute(query).await?)
    }

    pub async fn fetch_all<'q, E>(&self, query: E) -> DbResult<Vec<AnyRow>>
    where
        E: 'q + Execute<'q, Any>,
    {
        let mut state = self.inner.state.lock().await;
        let conn = state.connection(self.inner.id, &self.inner.abandoned).await?;
        Ok(conn.fetch_all(query).await?)
    }

    pub async fn fetch_optional<'q, E>(&self, query: E) -> DbResult<Option<AnyRow>>
    where
        E: 'q + Execute<'q, Any>,
    {
        let mut state = self.inner.state.lock().await;
        let conn = state.connection(self.inner.id, &self.inner.abandoned).await?;
        Ok(conn.fetch_optional(query).await?)
    }

    /// Open a savepoint and return its name.
    pub(crate) async fn begin_nested(&self) -> DbResult<String> {
        let mut state = self.inner.state.lock().await;
        let name = format!("zit_sp_{}", state.next_savepoint);
        state.next_savepoint += 1;

        let conn = state.connection(self.inner.id, &self.inner.abandoned).await?;
        control(conn, format!("SAVEPOINT {name}")).await?;
        state.open_savepoints.push(name.clone());

        if self.inner.echo {
            tracing::debug!(session = self.inner.id, savepoint = %name, "savepoint opened");
        }
        Ok(name)
    }

    /// Keep the work done since `name`.
    pub(crate) async fn release(&self, name: &str) -> DbResult<()> {
        let mut state = self.inner.state.lock().await;
        let conn = state.connection(self.inner.id, &self.inner.abandoned).await?;
        control(conn, format!("RELEASE SAVEPOINT {name}")).await?;
        if let Some(pos) = state.open_savepoints.iter().position(|s| s == name) {
            state.open_savepoints.truncate(pos);
        }

        if self.inner.echo {
            tracing::debug!(session = self.inner.id, savepoint = %name, "savepoint released");
        }
        Ok(())
    }

    /// Undo the work done since `name`; the enclosing transaction stays open.
    pub(crate) async fn rollback_to(&self, name: &str) -> DbResult<()> {
        let mut state = self.inner.state.lock().await;
        let conn = state.connection(self.inner.id, &self.inner.abandoned).await?;
        control(&mut *conn, format!("ROLLBACK TO SAVEPOINT {name}")).await?;
        control(conn, format!("RELEASE SAVEPOINT {name}")).await?;
        if let Some(pos) = state.open_savepoints.iter().position(|s| s == name) {
            state.open_savepoints.truncate(pos);
        }

        if self.inner.echo {
            tracing::debug!(session = self.inner.id, savepoint = %name, "savepoint rolled back");
        }
        Ok(())
    }

    /// Schedule a rollback to `name` for the next statement. Used when a
    /// nested scope is dropped without finishing.
    pub(crate) fn abandon_savepoint(&self, name: String) {
        self.inner
            .abandoned
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(name);
    }

    pub(crate) async fn commit(&self) -> DbResult<()> {
        let mut state = self.inner.state.lock().await;
        // Flush abandoned savepoints so their work is not committed.
        state.connection(self.inner.id, &self.inner.abandoned).await?;
        let tx = state
            .tx
            .take()
            .ok_or(DbError::SessionClosed { id: self.inner.id })?;
        state.open_savepoints.clear();
        tx.commit().await?;

        if self.inner.echo {
            tracing::debug!(session = self.inner.id, "session committed");
        }
        Ok(())
    }

    pub(crate) async fn rollback(&self) -> DbResult<()> {
        let mut state = self.inner.state.lock().await;
        state.open_savepoints.clear();
        let Some(tx) = state.tx.take() else {
            return Ok(());
        };
        tx.rollback().await?;

        if self.inner.echo {
            tracing::debug!(session = self.inner.id, "session rolled back");
        }
        Ok(())
    }

    /// Drop the transaction without awaiting. sqlx rolls it back and
    /// returns the connection to the pool. No-op if a statement currently
    /// holds the lock; the transaction is then dropped with the last clone.
    pub(crate) fn abort(&self) {
        if let Ok(mut state) = self.inner.state.try_lock() {
            if state.tx.take().is_some() {
                tracing::debug!(session = self.inner.id, "session aborted before completion");
            }
            state.open_savepoints.clear();
        }
    }
}
