use std::cell::Cell;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use rusqlite::OpenFlags;

use crate::binder::Params;
use crate::error::SqliteExecError;
use crate::rows::Row;
use crate::statement::Statement;
use crate::transaction::Transaction;

/// Options for opening a database file.
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    pub readonly: bool,
    pub file_must_exist: bool,
    pub busy_timeout: Option<Duration>,
}

impl OpenOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }

    #[must_use]
    pub fn file_must_exist(mut self, file_must_exist: bool) -> Self {
        self.file_must_exist = file_must_exist;
        self
    }

    #[must_use]
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = Some(timeout);
        self
    }
}

/// One connection to an embedded database.
///
/// A connection exclusively owns its prepared statements: [`prepare`]
/// returns a [`Statement`] borrowing this connection, so statements cannot
/// outlive it and [`close`] cannot be called while any are alive. Connections
/// are fully independent of each other — each carries its own statements,
/// cursors, and transaction state.
///
/// [`prepare`]: Database::prepare
/// [`close`]: Database::close
pub struct Database {
    conn: rusqlite::Connection,
    name: String,
    readonly: bool,
    default_safe_integers: Cell<bool>,
    savepoint_depth: Cell<u32>,
}

impl Database {
    /// Open (creating if necessary) a database file.
    ///
    /// # Errors
    ///
    /// [`SqliteExecError::Sqlite`] if the engine cannot open the file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SqliteExecError> {
        Self::open_with(path, &OpenOptions::default())
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    ///
    /// [`SqliteExecError::Sqlite`] if the engine cannot allocate the
    /// connection.
    pub fn open_in_memory() -> Result<Self, SqliteExecError> {
        let conn = rusqlite::Connection::open_in_memory()?;
        Ok(Self::from_connection(conn, ":memory:".to_owned(), false))
    }

    /// Open a database file with explicit [`OpenOptions`].
    ///
    /// # Errors
    ///
    /// [`SqliteExecError::Sqlite`] if the engine cannot open the file — e.g.
    /// `file_must_exist` with a missing file, or writing through `readonly`.
    pub fn open_with<P: AsRef<Path>>(
        path: P,
        options: &OpenOptions,
    ) -> Result<Self, SqliteExecError> {
        let mut flags = OpenFlags::SQLITE_OPEN_NO_MUTEX | OpenFlags::SQLITE_OPEN_URI;
        if options.readonly {
            flags |= OpenFlags::SQLITE_OPEN_READ_ONLY;
        } else if options.file_must_exist {
            flags |= OpenFlags::SQLITE_OPEN_READ_WRITE;
        } else {
            flags |= OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE;
        }

        let name = path.as_ref().display().to_string();
        let conn = rusqlite::Connection::open_with_flags(path, flags)?;
        if let Some(timeout) = options.busy_timeout {
            conn.busy_timeout(timeout)?;
        }
        tracing::debug!(name = %name, readonly = options.readonly, "database opened");
        Ok(Self::from_connection(conn, name, options.readonly))
    }

    fn from_connection(conn: rusqlite::Connection, name: String, readonly: bool) -> Self {
        Self {
            conn,
            name,
            readonly,
            default_safe_integers: Cell::new(false),
            savepoint_depth: Cell::new(0),
        }
    }

    /// Compile a statement against this connection.
    ///
    /// # Errors
    ///
    /// [`SqliteExecError::Sqlite`] with the engine's diagnostic message and
    /// error code on malformed SQL; [`SqliteExecError::TypeError`] when the
    /// statement mixes placeholder styles.
    pub fn prepare(&self, sql: &str) -> Result<Statement<'_>, SqliteExecError> {
        Statement::prepare(self, sql)
    }

    /// Execute a batch of semicolon-separated statements, discarding rows.
    ///
    /// # Errors
    ///
    /// [`SqliteExecError::Sqlite`] on the first failing statement.
    pub fn exec(&self, sql: &str) -> Result<(), SqliteExecError> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    /// Run a `PRAGMA` and materialize whatever rows it produces.
    ///
    /// # Errors
    ///
    /// [`SqliteExecError::Sqlite`] for unknown pragmas or engine failures.
    pub fn pragma(&self, source: &str) -> Result<Vec<Row>, SqliteExecError> {
        let mut stmt = self.prepare(&format!("PRAGMA {source}"))?;
        if stmt.reader() {
            stmt.all(&Params::Empty)
        } else {
            stmt.run(&Params::Empty).map(|_| Vec::new())
        }
    }

    /// Wrap `func` in transaction semantics; see [`Transaction`].
    pub fn transaction<F>(&self, func: F) -> Transaction<'_, F> {
        Transaction::new(self, func)
    }

    /// True while a transaction (or savepoint stack) is open.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }

    /// Set the safe-integer default inherited by statements prepared after
    /// this call. Existing statements keep their own setting.
    pub fn default_safe_integers(&self, toggle: bool) -> &Self {
        self.default_safe_integers.set(toggle);
        self
    }

    pub(crate) fn default_safe_integers_enabled(&self) -> bool {
        self.default_safe_integers.get()
    }

    /// The path this connection was opened on, or `":memory:"`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True when the connection was opened read-only.
    #[must_use]
    pub fn readonly(&self) -> bool {
        self.readonly
    }

    /// Close the connection.
    ///
    /// Consumes the handle; the borrow checker guarantees no statements or
    /// cursors survive it.
    ///
    /// # Errors
    ///
    /// [`SqliteExecError::Sqlite`] if the engine reports a failure while
    /// closing.
    pub fn close(self) -> Result<(), SqliteExecError> {
        self.conn.close().map_err(|(_conn, e)| e.into())
    }

    pub(crate) fn connection(&self) -> &rusqlite::Connection {
        &self.conn
    }

    pub(crate) fn changes(&self) -> u64 {
        self.conn.changes()
    }

    pub(crate) fn last_insert_rowid(&self) -> i64 {
        self.conn.last_insert_rowid()
    }

    pub(crate) fn enter_savepoint(&self) -> u32 {
        let depth = self.savepoint_depth.get();
        self.savepoint_depth.set(depth + 1);
        depth
    }

    pub(crate) fn exit_savepoint(&self) {
        let depth = self.savepoint_depth.get();
        self.savepoint_depth.set(depth.saturating_sub(1));
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.name)
            .field("readonly", &self.readonly)
            .field("in_transaction", &self.in_transaction())
            .finish()
    }
}
