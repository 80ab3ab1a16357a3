mod error;
pub mod repository;
pub mod schema;
pub mod statement;
pub mod systems;
pub mod value;

pub use error::StoreError;

use crate::{Error, config::StoreConfig, error::ErrorOrigin};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::{
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

/// Busy timeout for handles opened without a [`StoreConfig`].
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

///
/// Db
///
/// Shared handle to one SQLite database.
///
/// Clones share a connection. Handles opened separately on the same file,
/// in this process or another, each hold their own connection; the database
/// serializes their writers, so no write is lost between them. The handle
/// is passed explicitly into each repository call; nothing in the crate
/// keeps an ambient connection.
///

#[derive(Clone, Debug)]
pub struct Db {
    conn: Arc<Mutex<Connection>>,
    busy_timeout: Duration,
}

impl Db {
    /// Private database that lives as long as the handle and its clones.
    pub fn in_memory() -> Result<Self, Error> {
        Self::configure(Connection::open_in_memory()?, DEFAULT_BUSY_TIMEOUT, false)
    }

    /// Open or create the database file at `path`.
    pub fn open(path: &Path) -> Result<Self, Error> {
        Self::configure(Connection::open(path)?, DEFAULT_BUSY_TIMEOUT, true)
    }

    pub fn open_with(config: &StoreConfig) -> Result<Self, Error> {
        Self::configure(Connection::open(&config.path)?, config.busy_timeout(), true)
    }

    fn configure(conn: Connection, busy_timeout: Duration, file: bool) -> Result<Self, Error> {
        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        if file {
            // WAL lets readers proceed while another process commits.
            let _mode: String =
                conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
            conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            busy_timeout,
        })
    }

    /// How long a write waits for another handle's transaction.
    #[must_use]
    pub const fn busy_timeout(&self) -> Duration {
        self.busy_timeout
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.conn
            .lock()
            .map_err(|_| Error::internal(ErrorOrigin::Store, "connection lock poisoned"))
    }

    /// Run `f` against the database outside any write transaction.
    pub fn read<R>(&self, f: impl FnOnce(&Connection) -> Result<R, Error>) -> Result<R, Error> {
        let conn = self.lock()?;

        f(&conn)
    }

    /// Run `f` in an immediate write transaction. On `Ok` every change is
    /// committed; on `Err` every change made inside `f` is rolled back.
    ///
    /// The transaction takes the database write lock on entry, so reads
    /// inside `f` see every commit made by any other handle.
    pub fn write<R>(
        &self,
        f: impl FnOnce(&Transaction<'_>) -> Result<R, Error>,
    ) -> Result<R, Error> {
        let mut conn = self.lock()?;

        Self::transact(&mut conn, f)
    }

    /// [`Db::write`], waiting at most `wait` for another writer to finish.
    pub fn write_within<R>(
        &self,
        wait: Duration,
        f: impl FnOnce(&Transaction<'_>) -> Result<R, Error>,
    ) -> Result<R, Error> {
        let mut conn = self.lock()?;

        conn.busy_timeout(wait)?;
        let out = Self::transact(&mut conn, f);
        conn.busy_timeout(self.busy_timeout)?;

        out
    }

    fn transact<R>(
        conn: &mut Connection,
        f: impl FnOnce(&Transaction<'_>) -> Result<R, Error>,
    ) -> Result<R, Error> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = f(&tx)?;
        tx.commit()?;

        Ok(out)
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::schema::{Schema, setup},
        error::ErrorClass,
        test_support::TempDb,
    };
    use rusqlite::{OptionalExtension, params};

    fn insert_ordinal(tx: &Transaction<'_>, prefix: &str, ordinal: i64) -> Result<(), Error> {
        tx.execute(
            "INSERT INTO label_ordinals (prefix, last_ordinal) VALUES (?1, ?2)",
            params![prefix, ordinal],
        )?;

        Ok(())
    }

    fn ordinal(db: &Db, prefix: &str) -> Option<i64> {
        db.read(|conn| {
            Ok(conn
                .query_row(
                    "SELECT last_ordinal FROM label_ordinals WHERE prefix = ?1",
                    [prefix],
                    |row| row.get(0),
                )
                .optional()?)
        })
        .unwrap()
    }

    #[test]
    fn failed_write_rolls_back_every_change() {
        let db = Db::in_memory().unwrap();
        setup(&db, &Schema::standard()).unwrap();

        let err = db
            .write(|tx| {
                insert_ordinal(tx, "2.2.8.", 1)?;
                insert_ordinal(tx, "2.2.8.", 2)
            })
            .unwrap_err();
        assert_eq!(err.class, ErrorClass::DuplicateField);
        assert_eq!(ordinal(&db, "2.2.8."), None);
    }

    #[test]
    fn separate_handles_see_each_others_commits() {
        let file = TempDb::new("handles");
        let first = Db::open(file.path()).unwrap();
        setup(&first, &Schema::standard()).unwrap();

        let second = Db::open(file.path()).unwrap();
        second.write(|tx| insert_ordinal(tx, "2.2.8.", 1)).unwrap();
        assert_eq!(ordinal(&first, "2.2.8."), Some(1));

        // Committing through the first handle keeps the second handle's row.
        first.write(|tx| insert_ordinal(tx, "2.0.4.", 1)).unwrap();
        let reopened = Db::open(file.path()).unwrap();
        assert_eq!(ordinal(&reopened, "2.2.8."), Some(1));
        assert_eq!(ordinal(&reopened, "2.0.4."), Some(1));
    }

    #[test]
    fn blocked_writers_time_out() {
        let file = TempDb::new("busy");
        let holder = Db::open(file.path()).unwrap();
        setup(&holder, &Schema::standard()).unwrap();
        let waiter = Db::open(file.path()).unwrap();

        let err = holder
            .write(|_| waiter.write_within(Duration::from_millis(20), |_| Ok(())))
            .unwrap_err();
        assert_eq!(err.class, ErrorClass::Timeout);

        // The original busy timeout is restored afterwards.
        waiter.write(|tx| insert_ordinal(tx, "2.2.8.", 1)).unwrap();
    }
}
