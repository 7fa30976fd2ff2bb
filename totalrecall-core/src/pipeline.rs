//! Extraction pipeline
//!
//! Sequences one run end to end:
//!
//! ```text
//! Idle ─► LocationResolved ─► TargetPrepared ─► Copied ─► Normalized
//!                                                              │
//!          Done ◄─ ReportWritten ◄─ Queried ◄──────────────────┘
//! ```
//!
//! Every step is fatal on failure. The error comes back wrapped in
//! [`Error::Stage`] naming the state that could not be reached, and the run
//! is over: nothing is retried and a partially populated extraction folder
//! is left on disk as-is. A new run always creates a new folder.

use crate::config::{Config, ReportTimezone};
use crate::db::{EventStore, QueryOptions};
use crate::error::{Error, Result};
use crate::extract::{self, DirectoryModes};
use crate::report;
use crate::source::{self, PermissionGranter, ResolveOptions};
use crate::types::{CopyStats, ExtractionSummary, ExtractionTarget, SourceLocation};
use chrono::Local;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// States of a single extraction run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    LocationResolved,
    TargetPrepared,
    Copied,
    Normalized,
    Queried,
    ReportWritten,
    Done,
}

impl fmt::Display for Stage {
    /// The action that moves the run into this state.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = match self {
            Stage::Idle => "start",
            Stage::LocationResolved => "resolve location",
            Stage::TargetPrepared => "prepare extraction folder",
            Stage::Copied => "copy artifacts",
            Stage::Normalized => "normalize images",
            Stage::Queried => "query database",
            Stage::ReportWritten => "write report",
            Stage::Done => "finish",
        };
        f.write_str(action)
    }
}

/// Parameters of an extraction run.
#[derive(Debug, Clone)]
pub struct ExtractorSettings {
    /// Store root, already derived from the username or given explicitly
    pub base_path: PathBuf,
    /// Parent of the extraction folder
    pub output_dir: PathBuf,
    pub resolve: ResolveOptions,
    pub query: QueryOptions,
    pub timezone: ReportTimezone,
}

impl ExtractorSettings {
    /// Settings from configuration for a store rooted at `base_path`.
    pub fn from_config(config: &Config, base_path: PathBuf) -> Self {
        Self {
            base_path,
            output_dir: config.extraction.output_dir.clone(),
            resolve: ResolveOptions {
                sort_subfolders: config.source.sort_subfolders,
            },
            query: QueryOptions {
                order_by_timestamp: config.report.order_by_timestamp,
            },
            timezone: config.report.timezone,
        }
    }
}

/// Runs the extraction pipeline.
///
/// ## Example
///
/// ```rust,no_run
/// use totalrecall_core::pipeline::{Extractor, ExtractorSettings};
/// use totalrecall_core::source::NoopGranter;
/// use totalrecall_core::Config;
///
/// let config = Config::load().expect("failed to load config");
/// let settings = ExtractorSettings::from_config(&config, "/mnt/c/Users/alice/AppData/Local/CoreAIPlatform.00/UKP".into());
/// let extractor = Extractor::new(settings, Box::new(NoopGranter));
///
/// let location = extractor.locate().expect("store not found");
/// let summary = extractor.extract(&location, true).expect("extraction failed");
/// println!("Report at {}", summary.target.report_path.display());
/// ```
pub struct Extractor {
    settings: ExtractorSettings,
    granter: Box<dyn PermissionGranter>,
}

impl Extractor {
    pub fn new(settings: ExtractorSettings, granter: Box<dyn PermissionGranter>) -> Self {
        Self { settings, granter }
    }

    /// Grant permissions on the base path, then resolve and validate the store.
    pub fn locate(&self) -> Result<SourceLocation> {
        let base_path = &self.settings.base_path;
        let in_stage = |e: Error| e.in_stage(Stage::LocationResolved);

        source::require_base_path(base_path).map_err(in_stage)?;
        self.granter.grant(base_path).map_err(in_stage)?;
        source::locate(base_path, self.settings.resolve).map_err(in_stage)
    }

    /// Copy, normalize, query and report on an already located store.
    pub fn extract(&self, location: &SourceLocation, confirmed: bool) -> Result<ExtractionSummary> {
        self.extract_with_progress(location, confirmed, |_| {})
    }

    /// Like [`Self::extract`], calling `on_stage` with each state the run
    /// reaches, starting from [`Stage::LocationResolved`] for the given
    /// `location`.
    ///
    /// An unconfirmed run returns [`Error::Aborted`] before touching the
    /// filesystem or reporting any state.
    pub fn extract_with_progress<F>(
        &self,
        location: &SourceLocation,
        confirmed: bool,
        mut on_stage: F,
    ) -> Result<ExtractionSummary>
    where
        F: FnMut(Stage),
    {
        if !confirmed {
            tracing::info!("Extraction declined by user");
            return Err(Error::Aborted);
        }
        on_stage(Stage::LocationResolved);

        let target = extract::create_target(&self.settings.output_dir, &Local::now())
            .map_err(|e| e.in_stage(Stage::TargetPrepared))?;
        on_stage(Stage::TargetPrepared);

        let (copied, directory_modes) =
            copy_artifacts(location, &target).map_err(|e| e.in_stage(Stage::Copied))?;
        on_stage(Stage::Copied);

        // Renames need the copied image store writable, whatever the source mode
        let normalized = extract::normalize(&target.image_store_copy_path)
            .and_then(|stats| directory_modes.apply().map(|()| stats))
            .map_err(|e| e.in_stage(Stage::Normalized))?;
        on_stage(Stage::Normalized);

        let timeline = EventStore::open_read_only(&target.database_copy_path)
            .and_then(|store| store.extract_events(self.settings.query))
            .map_err(|e| e.in_stage(Stage::Queried))?;
        on_stage(Stage::Queried);

        report::write(&target.report_path, &timeline, self.settings.timezone)
            .map_err(|e| e.in_stage(Stage::ReportWritten))?;
        on_stage(Stage::ReportWritten);

        let summary = ExtractionSummary {
            source: location.clone(),
            target,
            copied,
            normalized,
            window_events: timeline.windows.len(),
            image_events: timeline.images.len(),
        };

        tracing::info!(
            folder = %summary.target.root_folder.display(),
            files = summary.copied.files,
            windows = summary.window_events,
            images = summary.image_events,
            "Extraction complete"
        );
        on_stage(Stage::Done);

        Ok(summary)
    }

    /// Locate then extract in one go.
    pub fn run(&self, confirmed: bool) -> Result<ExtractionSummary> {
        let location = self.locate()?;
        self.extract(&location, confirmed)
    }
}

/// Copy the database (with sidecars) and the image store tree.
///
/// Image store directory modes are returned unapplied.
fn copy_artifacts(
    location: &SourceLocation,
    target: &ExtractionTarget,
) -> Result<(CopyStats, DirectoryModes)> {
    let mut stats = extract::copy_database(&location.database_path, &target.database_copy_path)?;
    let (tree, modes) =
        extract::copy_directory(&location.image_store_path, &target.image_store_copy_path)?;
    stats.absorb(tree);
    Ok((stats, modes))
}
