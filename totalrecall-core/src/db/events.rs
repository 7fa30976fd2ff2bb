//! Capture event extraction
//!
//! Opens a copied `ukg.db` read-only and turns `WindowCapture` rows into two
//! ordered event sequences.

use crate::error::{Error, Result};
use crate::format::capture_time_from_millis;
use crate::types::{CaptureEvent, CaptureKind, CaptureTimeline};
use rusqlite::types::FromSql;
use rusqlite::{Connection, OpenFlags, Row};
use std::path::{Path, PathBuf};

use super::schema::capture_query;

/// How rows are read back.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryOptions {
    /// Sort by timestamp (then rowid) instead of table order
    pub order_by_timestamp: bool,
}

/// Read-only handle on a copied Recall database.
///
/// The connection is closed when the store is dropped.
pub struct EventStore {
    conn: Connection,
    path: PathBuf,
}

impl EventStore {
    /// Open an existing database for reading. Never creates the file.
    pub fn open_read_only(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        tracing::debug!(path = %path.display(), "Opened capture database");

        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Read every capture row into window and image event sequences.
    ///
    /// A row contributes one window event when its title is non-empty and one
    /// image event when its token is non-empty. Any undecodable row aborts
    /// the whole extraction.
    pub fn extract_events(&self, options: QueryOptions) -> Result<CaptureTimeline> {
        let mut stmt = self.conn.prepare(&capture_query(options.order_by_timestamp))?;
        let mut rows = stmt.query([])?;

        let mut timeline = CaptureTimeline::default();
        let mut row_index = 0usize;

        while let Some(row) = rows.next()? {
            row_index += 1;

            let title: Option<String> = decode_column(row, 0, row_index)?;
            let timestamp_ms: i64 = decode_column(row, 1, row_index)?;
            let token: Option<String> = decode_column(row, 2, row_index)?;

            let captured_at =
                capture_time_from_millis(timestamp_ms).ok_or_else(|| Error::RowDecode {
                    row: row_index,
                    message: format!("timestamp {} is out of range", timestamp_ms),
                })?;

            if let Some(title) = title.filter(|t| !t.is_empty()) {
                timeline.windows.push(CaptureEvent {
                    timestamp_ms,
                    captured_at,
                    kind: CaptureKind::WindowTitle,
                    payload: title,
                });
            }
            if let Some(token) = token.filter(|t| !t.is_empty()) {
                timeline.images.push(CaptureEvent {
                    timestamp_ms,
                    captured_at,
                    kind: CaptureKind::ImageToken,
                    payload: token,
                });
            }
        }

        tracing::info!(
            path = %self.path.display(),
            rows = row_index,
            windows = timeline.windows.len(),
            images = timeline.images.len(),
            "Extracted capture events"
        );

        Ok(timeline)
    }
}

/// Read one column, reporting type mismatches as row decode errors.
fn decode_column<T: FromSql>(row: &Row, column: usize, row_index: usize) -> Result<T> {
    row.get(column).map_err(|e| match e {
        rusqlite::Error::InvalidColumnType(_, name, ty) => Error::RowDecode {
            row: row_index,
            message: format!("column {} has unexpected type {}", name, ty),
        },
        rusqlite::Error::FromSqlConversionFailure(_, ty, err) => Error::RowDecode {
            row: row_index,
            message: format!("column {} ({}) could not be converted: {}", column, ty, err),
        },
        rusqlite::Error::IntegralValueOutOfRange(_, value) => Error::RowDecode {
            row: row_index,
            message: format!("column {} value {} is out of range", column, value),
        },
        other => Error::Query(other),
    })
}
