//! The slice of the Recall `ukg.db` schema that extraction reads.
//!
//! Only three columns of `WindowCapture` are used; the real table carries
//! many more (window bounds, process ids, text hashes, ...).

/// Table holding one row per capture.
pub const WINDOW_CAPTURE_TABLE: &str = "WindowCapture";

/// Build the query selecting every row that carries a window title or an
/// image token.
///
/// Without `order_by_timestamp` rows come back in whatever order SQLite
/// scans the table, which for a rowid table is insertion order.
pub fn capture_query(order_by_timestamp: bool) -> String {
    let select = format!(
        "SELECT WindowTitle, TimeStamp, ImageToken FROM {} \
         WHERE (WindowTitle IS NOT NULL OR ImageToken IS NOT NULL)",
        WINDOW_CAPTURE_TABLE
    );
    if order_by_timestamp {
        format!("{} ORDER BY TimeStamp, rowid", select)
    } else {
        select
    }
}

/// Minimal `WindowCapture` definition with the column layout of a real
/// store, for building fixture databases.
pub const WINDOW_CAPTURE_FIXTURE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS WindowCapture (
        Id           INTEGER PRIMARY KEY AUTOINCREMENT,
        Name         TEXT,
        ImageToken   TEXT,
        IsForeground INTEGER,
        WindowId     INTEGER,
        WindowBounds TEXT,
        WindowTitle  TEXT,
        Properties   TEXT,
        TimeStamp    INTEGER,
        IsProcessed  INTEGER,
        TextHash     TEXT
    );
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_query_is_unordered_by_default() {
        let sql = capture_query(false);
        assert!(sql.contains("FROM WindowCapture"));
        assert!(sql.contains("WindowTitle IS NOT NULL OR ImageToken IS NOT NULL"));
        assert!(!sql.contains("ORDER BY"));
    }

    #[test]
    fn test_capture_query_ordered() {
        assert!(capture_query(true).ends_with("ORDER BY TimeStamp, rowid"));
    }

    #[test]
    fn test_fixture_schema_applies() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch(WINDOW_CAPTURE_FIXTURE_SQL).unwrap();
        conn.prepare(&capture_query(true)).unwrap();
    }
}
