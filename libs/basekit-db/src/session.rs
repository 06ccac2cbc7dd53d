//! Scoped units of work over the shared connection pool.
//!
//! A [`Session`] owns at most one open transaction. It begins lazily on the
//! first statement, is committed explicitly (the repository does it when an
//! operation's `commit` flag is set), and is rolled back when the session is
//! closed, finished with an error, or dropped.
//!
//! Sessions are passed explicitly as `&mut Session`; several repository calls
//! share one unit of work by borrowing the same session:
//!
//! ```ignore
//! let mut session = sessions.acquire();
//! let res = async {
//!     let user = users.on(&mut session).create(data, WriteOptions::staged()).await?;
//!     posts.on(&mut session).create(post_for(&user), WriteOptions::staged()).await?;
//!     session.commit().await
//! }
//! .await;
//! session.finish(res).await?;
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use sea_orm::{ConnectionTrait, DatabaseConnection, DatabaseTransaction, TransactionTrait};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::{DbConfig, connect};
use crate::error::{RepoError, Result};

/// Factory for sessions over one process-wide pool.
#[derive(Clone)]
pub struct SessionManager {
    conn: DatabaseConnection,
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("backend", &self.conn.get_database_backend())
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    #[must_use]
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Create the pool described by `cfg`.
    ///
    /// # Errors
    /// `Config` for an invalid DSN, `Db` when the store is unreachable.
    pub async fn connect(cfg: &DbConfig) -> Result<Self> {
        Ok(Self::new(connect(cfg).await?))
    }

    /// Start a unit of work. No connection is taken until the first statement.
    #[must_use]
    pub fn acquire(&self) -> Session {
        Session {
            id: Uuid::new_v4(),
            conn: self.conn.clone(),
            tx: None,
        }
    }

    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Run `f` in a fresh session.
    ///
    /// The session is rolled back if `f` fails and released on every path.
    /// Nothing is committed implicitly.
    ///
    /// # Errors
    /// Whatever `f` returns.
    pub async fn scope<F, T, E>(&self, f: F) -> std::result::Result<T, E>
    where
        F: for<'a> FnOnce(
                &'a mut Session,
            )
                -> Pin<Box<dyn Future<Output = std::result::Result<T, E>> + Send + 'a>>
            + Send,
    {
        let mut session = self.acquire();
        let res = f(&mut session).await;
        if res.is_err() {
            session.rollback_quietly().await;
        }
        session.close().await;
        res
    }

    /// Like [`scope`](Self::scope), but commits when `f` succeeds.
    ///
    /// # Errors
    /// Whatever `f` returns, or the commit failure.
    pub async fn atomic<F, T, E>(&self, f: F) -> std::result::Result<T, E>
    where
        E: From<RepoError>,
        F: for<'a> FnOnce(
                &'a mut Session,
            )
                -> Pin<Box<dyn Future<Output = std::result::Result<T, E>> + Send + 'a>>
            + Send,
    {
        let mut session = self.acquire();
        let res = match f(&mut session).await {
            Ok(v) => session.commit().await.map(|()| v).map_err(E::from),
            Err(e) => Err(e),
        };
        if res.is_err() {
            session.rollback_quietly().await;
        }
        session.close().await;
        res
    }
}

/// One unit of work. See the module docs.
pub struct Session {
    id: Uuid,
    conn: DatabaseConnection,
    tx: Option<DatabaseTransaction>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("in_transaction", &self.tx.is_some())
            .finish_non_exhaustive()
    }
}

impl Session {
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.tx.is_some()
    }

    /// The open transaction, beginning one if needed.
    ///
    /// # Errors
    /// `Db` if the pool cannot hand out a connection.
    pub async fn txn(&mut self) -> Result<&DatabaseTransaction> {
        let tx = match self.tx.take() {
            Some(tx) => tx,
            None => {
                let tx = self.conn.begin().await?;
                debug!(session_id = %self.id, "transaction started");
                tx
            }
        };
        Ok(self.tx.insert(tx))
    }

    /// Commit staged work. A no-op when nothing was executed.
    ///
    /// # Errors
    /// `Db` or `Constraint` when the store rejects the commit.
    pub async fn commit(&mut self) -> Result<()> {
        if let Some(tx) = self.tx.take() {
            tx.commit().await?;
            debug!(session_id = %self.id, "transaction committed");
        }
        Ok(())
    }

    /// Discard staged work.
    ///
    /// # Errors
    /// `Db` when the rollback cannot be delivered.
    pub async fn rollback(&mut self) -> Result<()> {
        if let Some(tx) = self.tx.take() {
            tx.rollback().await?;
            debug!(session_id = %self.id, "transaction rolled back");
        }
        Ok(())
    }

    async fn rollback_quietly(&mut self) {
        if let Err(e) = self.rollback().await {
            warn!(session_id = %self.id, error = %e, "rollback failed");
        }
    }

    /// Release the session. Uncommitted work is discarded.
    pub async fn close(mut self) {
        self.rollback_quietly().await;
        debug!(session_id = %self.id, "session closed");
    }

    /// Close the session after an operation, rolling back first if it failed.
    ///
    /// # Errors
    /// Returns `res` unchanged.
    pub async fn finish<T>(self, res: Result<T>) -> Result<T> {
        if let Err(e) = &res {
            debug!(session_id = %self.id, error = %e, "operation failed");
        }
        self.close().await;
        res
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // The transaction's own Drop issues the rollback.
        if self.tx.is_some() {
            debug!(session_id = %self.id, "session dropped with an open transaction");
        }
    }
}
