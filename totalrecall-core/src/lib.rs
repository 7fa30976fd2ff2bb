//! # totalrecall-core
//!
//! Core library for totalrecall - extraction of a Windows Recall activity store.
//!
//! This library provides:
//! - Store discovery under a user's profile (`source`)
//! - Copying and image name normalization (`extract`)
//! - Read-only capture queries over the copied database (`db`)
//! - The `TotalRecall.txt` timeline report (`report`)
//! - The end-to-end run (`pipeline`)
//! - Configuration management and logging infrastructure
//!
//! ## Architecture
//!
//! The source store is never opened as a database. It is copied byte for byte
//! into a fresh extraction folder and every later step works on that copy:
//! - **Source:** `ukg.db` + `ImageStore/` under the GUID folder (read only)
//! - **Extraction folder:** verbatim copies, images renamed to `*.jpg`
//! - **Report:** derived from the copied database
//!
//! ## Example
//!
//! ```rust,no_run
//! use totalrecall_core::pipeline::{Extractor, ExtractorSettings};
//! use totalrecall_core::source::{base_path_for_user, NoopGranter};
//! use totalrecall_core::Config;
//!
//! let config = Config::load().expect("failed to load config");
//! let base = base_path_for_user(&config.source.users_root, "alice").expect("bad username");
//! let extractor = Extractor::new(ExtractorSettings::from_config(&config, base), Box::new(NoopGranter));
//! let summary = extractor.run(true).expect("extraction failed");
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use error::{Error, Result};
pub use pipeline::{Extractor, ExtractorSettings, Stage};
pub use types::*;

// Public modules
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod format;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod source;
pub mod types;
