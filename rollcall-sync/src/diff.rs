//! Dry-run unified diff support for `rollcall diff`.
//!
//! Both sides render the data region (row 2 onwards) one line per sheet row,
//! cells joined by tabs. Trailing empty cells and trailing blank rows are
//! dropped so a cleared tail does not show up as noise.

use similar::TextDiff;

use rollcall_core::{ConfigStore, DestinationId, DirectoryService, GroupLabel, SpreadsheetSink};
use rollcall_format::Row;

use crate::error::SyncError;
use crate::pipeline::{format_snapshot, prepare, resolve};
use crate::writer::{plan_layout, FIRST_DATA_ROW};

/// Difference between the sheet and what a forced sync would write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationDiff {
    pub destination: DestinationId,
    pub sheet: String,
    /// Empty when the sheet already matches.
    pub unified_diff: String,
}

impl DestinationDiff {
    pub fn is_empty(&self) -> bool {
        self.unified_diff.is_empty()
    }
}

/// Render what a sync would write and compare it to the sheet.
///
/// Skips the change gate entirely: no writes, no token persistence. When
/// every group is empty the diff is empty, matching the no-op run.
pub fn diff_destination(
    directory: &dyn DirectoryService,
    sink: &dyn SpreadsheetSink,
    config: &dyn ConfigStore,
    identity: Option<&str>,
) -> Result<DestinationDiff, SyncError> {
    let (settings, destination, quota_user) = resolve(sink, config, identity)?;
    let prepared = prepare(directory, sink, settings, destination, quota_user)?;
    let sheet = prepared.settings.sheet_name.clone();

    let formatted = format_snapshot(&prepared.snapshot);

    let current_values = sink.read_values(&prepared.destination.id, &sheet)?;
    let current = render_lines(
        current_values
            .iter()
            .skip(FIRST_DATA_ROW - 1)
            .map(|row| row.as_slice()),
    );
    // A run with zero rows leaves the sheet as it is.
    let planned = if formatted.iter().all(|(_, rows)| rows.is_empty()) {
        current.clone()
    } else {
        render_planned(&formatted)
    };

    let unified_diff = if current == planned {
        String::new()
    } else {
        let old_header = format!("a/{}/{sheet}", prepared.destination.id);
        let new_header = format!("b/{}/{sheet}", prepared.destination.id);
        TextDiff::from_lines(&current, &planned)
            .unified_diff()
            .header(&old_header, &new_header)
            .context_radius(3)
            .to_string()
    };

    Ok(DestinationDiff {
        destination: prepared.destination.id,
        sheet,
        unified_diff,
    })
}

/// The data region as a sync would leave it, blank separators included.
fn render_planned(formatted: &[(GroupLabel, Vec<Row>)]) -> String {
    let mut region: Vec<Vec<String>> = Vec::new();
    for ((_, rows), block) in formatted.iter().zip(plan_layout(formatted)) {
        if block.is_empty() {
            continue;
        }
        let offset = block.start_row - FIRST_DATA_ROW;
        region.resize(offset, Vec::new());
        region.extend(rows.iter().map(Row::cells));
    }
    render_lines(region.iter().map(Vec::as_slice))
}

fn render_lines<'a>(rows: impl Iterator<Item = &'a [String]>) -> String {
    let mut lines: Vec<String> = rows
        .map(|cells| {
            let used = cells
                .iter()
                .rposition(|c| !c.is_empty())
                .map_or(0, |i| i + 1);
            cells[..used].join("\t")
        })
        .collect();
    while lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    lines.iter().map(|l| format!("{l}\n")).collect()
}
