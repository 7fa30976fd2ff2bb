//! Core domain types for totalrecall
//!
//! These types describe one extraction: where the Recall store lives, where
//! the copy goes, and the capture events read back out of the copied database.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// File name of the Recall database inside the GUID folder.
pub const DATABASE_FILE_NAME: &str = "ukg.db";

/// Directory name of the image store inside the GUID folder.
pub const IMAGE_STORE_DIR_NAME: &str = "ImageStore";

/// File name of the generated report inside the extraction folder.
pub const REPORT_FILE_NAME: &str = "TotalRecall.txt";

/// Suffix appended to extraction folder names.
pub const EXTRACTION_FOLDER_SUFFIX: &str = "_Recall_Extraction";

// ============================================
// Source and target locations
// ============================================

/// One of the two artifacts that make up a Recall store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Artifact {
    /// The `ukg.db` SQLite database
    Database,
    /// The `ImageStore` directory of captured screenshots
    ImageStore,
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Artifact::Database => write!(f, "database"),
            Artifact::ImageStore => write!(f, "image store"),
        }
    }
}

/// A validated Recall store on disk.
///
/// All four paths existed when the location was resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    /// Per-user storage root (e.g. `...\CoreAIPlatform.00\UKP`)
    pub base_path: PathBuf,
    /// Name of the GUID folder discovered under `base_path`
    pub resolved_subfolder: String,
    /// Path to `ukg.db`
    pub database_path: PathBuf,
    /// Path to the `ImageStore` directory
    pub image_store_path: PathBuf,
}

impl SourceLocation {
    /// Full path of the GUID folder.
    pub fn recall_folder(&self) -> PathBuf {
        self.base_path.join(&self.resolved_subfolder)
    }
}

/// Output folder of a single extraction run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionTarget {
    /// Timestamp-named folder holding every artifact of the run
    pub root_folder: PathBuf,
    /// Copy of the database
    pub database_copy_path: PathBuf,
    /// Copy of the image store
    pub image_store_copy_path: PathBuf,
    /// Generated report
    pub report_path: PathBuf,
}

impl ExtractionTarget {
    /// Lay out the artifact paths under an existing root folder.
    pub fn under(root_folder: PathBuf) -> Self {
        Self {
            database_copy_path: root_folder.join(DATABASE_FILE_NAME),
            image_store_copy_path: root_folder.join(IMAGE_STORE_DIR_NAME),
            report_path: root_folder.join(REPORT_FILE_NAME),
            root_folder,
        }
    }
}

// ============================================
// Capture events
// ============================================

/// What a capture event recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureKind {
    /// Title of the foreground window
    WindowTitle,
    /// Token of a screenshot in the image store
    ImageToken,
}

/// A single row-derived capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureEvent {
    /// Raw `TimeStamp` column value (milliseconds since the Unix epoch)
    pub timestamp_ms: i64,
    /// Timestamp truncated to the second
    pub captured_at: DateTime<Utc>,
    pub kind: CaptureKind,
    /// Window title or image token
    pub payload: String,
}

/// Window and image events in database row order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureTimeline {
    pub windows: Vec<CaptureEvent>,
    pub images: Vec<CaptureEvent>,
}

impl CaptureTimeline {
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty() && self.images.is_empty()
    }
}

// ============================================
// Run statistics
// ============================================

/// Counters from copying artifacts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CopyStats {
    /// Regular files copied
    pub files: usize,
    /// Directories created (including the tree root)
    pub directories: usize,
    /// Bytes written across all files
    pub bytes: u64,
}

impl CopyStats {
    /// Fold another set of counters into this one.
    pub fn absorb(&mut self, other: CopyStats) {
        self.files += other.files;
        self.directories += other.directories;
        self.bytes += other.bytes;
    }
}

/// Counters from normalizing image names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeStats {
    /// Entries renamed with the `.jpg` suffix
    pub renamed: usize,
    /// Entries that already carried the suffix
    pub already_normalized: usize,
    /// Entries left alone because the suffixed name was taken
    pub collisions: usize,
}

/// Everything a successful run produced.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionSummary {
    pub source: SourceLocation,
    pub target: ExtractionTarget,
    pub copied: CopyStats,
    pub normalized: NormalizeStats,
    pub window_events: usize,
    pub image_events: usize,
}
