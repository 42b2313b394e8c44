//! Future-scoped session registry.
//!
//! Active sessions live in a tokio task-local stack that is installed around
//! the future doing the work, so the binding follows that future rather than
//! the task polling it. Two scopes driven concurrently by one task
//! (`join!`, `select!`) each see only their own session, and a spawned task
//! starts with none.

use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use super::session::Session;

tokio::task_local! {
    static SCOPES: Vec<(u64, Session)>;
}

static NEXT_OWNER: AtomicU64 = AtomicU64::new(1);

/// Session scopes opened by one accessor.
///
/// Each registry has its own owner id, so scopes from two accessors nested
/// in the same future do not see each other's sessions.
#[derive(Debug)]
pub struct SessionRegistry {
    owner: u64,
    active: AtomicUsize,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self {
            owner: NEXT_OWNER.fetch_add(1, Ordering::Relaxed),
            active: AtomicUsize::new(0),
        }
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Innermost session of this registry visible to the running future.
    pub fn current(&self) -> Option<Session> {
        SCOPES
            .try_with(|stack| {
                stack
                    .iter()
                    .rev()
                    .find(|(owner, _)| *owner == self.owner)
                    .map(|(_, session)| session.clone())
            })
            .ok()
            .flatten()
    }

    /// Run `f(session)` with `session` as the current one.
    ///
    /// The binding ends when the returned future completes or is dropped.
    pub async fn scope<F, Fut>(&self, session: Session, f: F) -> Fut::Output
    where
        F: FnOnce(Session) -> Fut,
        Fut: Future,
    {
        let mut stack = SCOPES.try_with(Clone::clone).unwrap_or_default();
        stack.push((self.owner, session.clone()));

        let _active = ActiveScope::enter(&self.active);
        SCOPES.scope(stack, async move { f(session).await }).await
    }

    /// Number of scopes of this registry that are currently open.
    pub fn active_scopes(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }
}

struct ActiveScope<'a>(&'a AtomicUsize);

impl<'a> ActiveScope<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for ActiveScope<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}
