//! SQLite backend
//!
//! Each [`SqliteBackend::connect`] opens an independent connection to the
//! same database file, so the two racing sessions contend through SQLite's
//! file locks. SQLite transactions are always serializable; a writer that
//! loses the race gets `SQLITE_BUSY`, reported as [`ContentionKind::Busy`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::ErrorCode;
use tracing::debug;

use isoprobe_core::{
    Backend, Connection, ContentionKind, Error, IsolationLevel, Result, Statement, VALUE_COLUMN,
};

use crate::config::SqliteConfig;

const BACKEND: &str = "sqlite";

/// Backend opening connections to one SQLite file
#[derive(Debug, Clone)]
pub struct SqliteBackend {
    path: PathBuf,
    busy_timeout: Duration,
}

impl SqliteBackend {
    /// Backend for the database at `path`, failing fast on busy
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout: Duration::ZERO,
        }
    }

    /// Backend from configuration
    pub fn from_config(config: &SqliteConfig) -> Self {
        Self {
            path: config.path.clone(),
            busy_timeout: config.busy_timeout(),
        }
    }

    /// Set how long SQLite retries a busy lock before reporting contention
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Database file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Backend for SqliteBackend {
    type Conn = SqliteConnection;

    fn connect(&self) -> Result<SqliteConnection> {
        let conn = rusqlite::Connection::open(&self.path).map_err(map_err)?;
        conn.busy_timeout(self.busy_timeout).map_err(map_err)?;
        debug!(target: "isoprobe::sqlite", path = %self.path.display(), "Connection opened");
        Ok(SqliteConnection { conn })
    }

    fn name(&self) -> &'static str {
        BACKEND
    }
}

/// One SQLite session
#[derive(Debug)]
pub struct SqliteConnection {
    conn: rusqlite::Connection,
}

impl Connection for SqliteConnection {
    fn execute(&mut self, statement: &Statement) -> Result<u64> {
        if statement.is_query() {
            return Err(Error::UnsupportedStatement(format!(
                "query passed to execute: {}",
                statement
            )));
        }
        let sql = render(statement);
        let rows = self.conn.execute(&sql, []).map_err(map_err)?;
        Ok(rows as u64)
    }

    fn query_scalar(&mut self, statement: &Statement) -> Result<i64> {
        statement.require_query()?;
        let sql = render(statement);
        self.conn
            .query_row(&sql, [], |row| row.get::<_, i64>(0))
            .map_err(map_err)
    }

    fn begin(&mut self, isolation: Option<IsolationLevel>) -> Result<()> {
        match isolation {
            None | Some(IsolationLevel::Serializable) => {}
            Some(level) => {
                return Err(Error::UnsupportedIsolation {
                    level,
                    backend: BACKEND,
                })
            }
        }
        if self.in_transaction() {
            return Err(Error::TransactionActive);
        }
        self.conn.execute_batch("BEGIN DEFERRED").map_err(map_err)
    }

    fn commit(&mut self) -> Result<()> {
        if !self.in_transaction() {
            return Err(Error::NoActiveTransaction);
        }
        self.conn.execute_batch("COMMIT").map_err(map_err)
    }

    fn rollback(&mut self) -> Result<()> {
        if !self.in_transaction() {
            return Ok(());
        }
        self.conn.execute_batch("ROLLBACK").map_err(map_err)
    }

    fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }
}

/// SQLite spelling of `statement`
fn render(statement: &Statement) -> String {
    match statement {
        Statement::DropTableIfExists { table } => format!("DROP TABLE IF EXISTS {}", table),
        Statement::CreateTable { table } => {
            format!("CREATE TABLE {} ({} INTEGER)", table, VALUE_COLUMN)
        }
        // SQLite has no TRUNCATE; an unqualified DELETE uses the truncate optimization
        Statement::Truncate { table } => format!("DELETE FROM {}", table),
        Statement::InsertIfAbsent { table, value } => format!(
            "INSERT INTO {table} SELECT {value} WHERE NOT EXISTS \
             (SELECT * FROM {table} WHERE {col} = {value})",
            table = table,
            value = value,
            col = VALUE_COLUMN,
        ),
        Statement::CountEqual { table, value } => format!(
            "SELECT COUNT(*) FROM {} WHERE {} = {}",
            table, VALUE_COLUMN, value
        ),
    }
}

fn map_err(err: rusqlite::Error) -> Error {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if matches!(
                failure.code,
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
            ) =>
        {
            Error::contention(ContentionKind::Busy, err.to_string())
        }
        _ => Error::Database(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isoprobe_core::TableName;
    use tempfile::TempDir;

    static_assertions::assert_impl_all!(SqliteConnection: Send);

    fn setup() -> (TempDir, SqliteBackend) {
        let dir = tempfile::tempdir().unwrap();
        let backend = SqliteBackend::new(dir.path().join("probe.db"));
        let mut conn = backend.connect().unwrap();
        let t = TableName::default();
        conn.execute(&Statement::drop_table_if_exists(&t)).unwrap();
        conn.execute(&Statement::create_table(&t)).unwrap();
        (dir, backend)
    }

    #[test]
    fn test_render_statements() {
        let t = TableName::default();
        assert_eq!(
            render(&Statement::insert_probe(&t)),
            "INSERT INTO t SELECT 1 WHERE NOT EXISTS (SELECT * FROM t WHERE num = 1)"
        );
        assert_eq!(render(&Statement::truncate(&t)), "DELETE FROM t");
        assert_eq!(
            render(&Statement::count_probe(&t)),
            "SELECT COUNT(*) FROM t WHERE num = 1"
        );
    }

    #[test]
    fn test_conditional_insert_is_idempotent() {
        let (_dir, backend) = setup();
        let t = TableName::default();
        let mut conn = backend.connect().unwrap();
        assert_eq!(conn.execute(&Statement::insert_probe(&t)).unwrap(), 1);
        assert_eq!(conn.execute(&Statement::insert_probe(&t)).unwrap(), 0);
        assert_eq!(conn.query_scalar(&Statement::count_probe(&t)).unwrap(), 1);

        conn.execute(&Statement::truncate(&t)).unwrap();
        assert_eq!(conn.query_scalar(&Statement::count_probe(&t)).unwrap(), 0);
    }

    #[test]
    fn test_writer_conflict_reports_busy() {
        let (_dir, backend) = setup();
        let t = TableName::default();
        let mut first = backend.connect().unwrap();
        first.begin(None).unwrap();
        first.execute(&Statement::insert_probe(&t)).unwrap();

        let mut second = backend.connect().unwrap();
        let err = second.execute(&Statement::insert_probe(&t)).unwrap_err();
        assert_eq!(err.contention_kind(), Some(ContentionKind::Busy));

        first.commit().unwrap();
        assert_eq!(second.query_scalar(&Statement::count_probe(&t)).unwrap(), 1);
    }

    #[test]
    fn test_only_serializable_is_accepted() {
        let (_dir, backend) = setup();
        let mut conn = backend.connect().unwrap();
        assert!(matches!(
            conn.begin(Some(IsolationLevel::ReadCommitted)),
            Err(Error::UnsupportedIsolation { backend: "sqlite", .. })
        ));
        conn.begin(Some(IsolationLevel::Serializable)).unwrap();
        assert!(conn.in_transaction());
        conn.rollback().unwrap();
        assert!(!conn.in_transaction());
        conn.rollback().unwrap();
    }

    #[test]
    fn test_missing_table_is_database_error() {
        let dir = tempfile::tempdir().unwrap();
        let backend = SqliteBackend::new(dir.path().join("empty.db"));
        let mut conn = backend.connect().unwrap();
        let err = conn
            .query_scalar(&Statement::count_probe(&TableName::default()))
            .unwrap_err();
        assert!(matches!(err, Error::Database(_)));
    }
}
