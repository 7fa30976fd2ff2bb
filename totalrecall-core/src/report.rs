//! The `TotalRecall.txt` timeline report
//!
//! ```text
//! Captured Windows:
//! [2023-11-14 22:13:20] Notepad
//!
//! Images Taken:
//! [2023-11-14 22:13:20] 6a4c...
//! ```

use crate::config::ReportTimezone;
use crate::error::Result;
use crate::format::format_capture_entry;
use crate::types::{CaptureEvent, CaptureTimeline};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub const WINDOWS_HEADER: &str = "Captured Windows:";
pub const IMAGES_HEADER: &str = "Images Taken:";

/// Render the report into any writer.
pub fn render<W: Write>(out: &mut W, timeline: &CaptureTimeline, timezone: ReportTimezone) -> Result<()> {
    writeln!(out, "{}", WINDOWS_HEADER)?;
    write_section(out, &timeline.windows, timezone)?;

    writeln!(out)?;
    writeln!(out, "{}", IMAGES_HEADER)?;
    write_section(out, &timeline.images, timezone)?;

    Ok(())
}

fn write_section<W: Write>(out: &mut W, events: &[CaptureEvent], timezone: ReportTimezone) -> Result<()> {
    for event in events {
        writeln!(out, "{}", format_capture_entry(event, timezone))?;
    }
    Ok(())
}

/// Create (or truncate) `path` and write the report to it.
pub fn write(path: &Path, timeline: &CaptureTimeline, timezone: ReportTimezone) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    render(&mut out, timeline, timezone)?;
    out.flush()?;

    if timeline.is_empty() {
        tracing::warn!(path = %path.display(), "No captures found; report has headers only");
    }
    tracing::info!(
        path = %path.display(),
        windows = timeline.windows.len(),
        images = timeline.images.len(),
        "Wrote report"
    );
    Ok(())
}
