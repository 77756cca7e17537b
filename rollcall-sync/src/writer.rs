//! Sheet writer: destructive reset of the data region and sequential
//! block appends.
//!
//! ## Layout
//!
//! Row 1 holds the header; the first block starts at row 2. Each non-empty
//! block of `n` rows advances the cursor by `n + 2`. Empty blocks are never
//! written and do not move the cursor.
//!
//! ```text
//! row 1   header
//! row 2   Active block (1 row)
//! row 3   (blank)
//! row 4   (blank)
//! row 5   Guest block …
//! ```

use rollcall_core::{DestinationId, GroupLabel, ServiceError, SpreadsheetSink};
use rollcall_format::{Row, COLUMN_COUNT};

/// First data row; row 1 is the header.
pub const FIRST_DATA_ROW: usize = 2;

/// Rows the cursor advances past a block in addition to the block itself.
pub const BLOCK_SPACING: usize = 2;

/// Cursor position after writing `len` rows at `start`.
pub fn next_start_row(start: usize, len: usize) -> usize {
    if len == 0 {
        start
    } else {
        start + len + BLOCK_SPACING
    }
}

// ---------------------------------------------------------------------------
// Layout planning
// ---------------------------------------------------------------------------

/// Where one group's block lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedBlock {
    pub label: GroupLabel,
    pub start_row: usize,
    pub rows: usize,
}

impl PlannedBlock {
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Last row covered by the block, if it has any.
    pub fn end_row(&self) -> Option<usize> {
        (self.rows > 0).then(|| self.start_row + self.rows - 1)
    }
}

/// Compute every group's start row without touching the sheet.
///
/// Empty groups are included with the cursor position they would have used.
pub fn plan_layout(groups: &[(GroupLabel, Vec<Row>)]) -> Vec<PlannedBlock> {
    let mut cursor = FIRST_DATA_ROW;
    groups
        .iter()
        .map(|(label, rows)| {
            let block = PlannedBlock {
                label: *label,
                start_row: cursor,
                rows: rows.len(),
            };
            cursor = next_start_row(cursor, rows.len());
            block
        })
        .collect()
}

// ---------------------------------------------------------------------------
// SheetWriter
// ---------------------------------------------------------------------------

/// Writes row blocks into one sheet of one destination.
pub struct SheetWriter<'a> {
    sink: &'a mut dyn SpreadsheetSink,
    destination: DestinationId,
    sheet: String,
    cleared: bool,
}

impl<'a> SheetWriter<'a> {
    pub fn new(sink: &'a mut dyn SpreadsheetSink, destination: DestinationId, sheet: &str) -> Self {
        Self {
            sink,
            destination,
            sheet: sheet.to_string(),
            cleared: false,
        }
    }

    /// Clear content of rows `2..=last_row`, all columns.
    ///
    /// Runs at most once per writer; returns whether a clear was issued.
    pub fn clear_data_region(&mut self, last_row: usize) -> Result<bool, ServiceError> {
        if self.cleared || last_row < FIRST_DATA_ROW {
            return Ok(false);
        }
        let rows = last_row - FIRST_DATA_ROW + 1;
        self.sink.clear_content(
            &self.destination,
            &self.sheet,
            FIRST_DATA_ROW,
            1,
            rows,
            COLUMN_COUNT,
        )?;
        self.cleared = true;
        tracing::info!(
            "cleared rows {FIRST_DATA_ROW}..={last_row} of '{}' in {}",
            self.sheet,
            self.destination
        );
        Ok(true)
    }

    /// Write `rows` as one block at `(start_row, 1)`; returns the next cursor.
    pub fn write(&mut self, rows: &[Row], start_row: usize) -> Result<usize, ServiceError> {
        if rows.is_empty() {
            return Ok(start_row);
        }
        let values: Vec<Vec<String>> = rows.iter().map(Row::cells).collect();
        self.sink
            .write_block(&self.destination, &self.sheet, start_row, 1, &values)?;
        tracing::debug!("wrote {} rows at row {start_row}", rows.len());
        Ok(next_start_row(start_row, rows.len()))
    }

    pub fn cleared(&self) -> bool {
        self.cleared
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use rollcall_core::Person;
    use rollcall_format::format_group;
    use rstest::rstest;

    #[derive(Debug, PartialEq, Eq)]
    enum Call {
        Clear { row: usize, rows: usize, columns: usize },
        Write { row: usize, column: usize, height: usize, width: usize },
    }

    #[derive(Default)]
    struct RecordingSink {
        calls: Vec<Call>,
    }

    impl SpreadsheetSink for RecordingSink {
        fn resolve(&self, _: Option<&DestinationId>) -> Result<DestinationId, ServiceError> {
            Ok(DestinationId::from("sheet"))
        }

        fn last_modified(&self, _: &DestinationId) -> Result<DateTime<Utc>, ServiceError> {
            Ok(DateTime::<Utc>::UNIX_EPOCH)
        }

        fn last_row(&self, _: &DestinationId, _: &str) -> Result<usize, ServiceError> {
            Ok(0)
        }

        fn read_values(&self, _: &DestinationId, _: &str) -> Result<Vec<Vec<String>>, ServiceError> {
            Ok(Vec::new())
        }

        fn write_block(
            &mut self,
            _: &DestinationId,
            _: &str,
            row: usize,
            column: usize,
            values: &[Vec<String>],
        ) -> Result<(), ServiceError> {
            self.calls.push(Call::Write {
                row,
                column,
                height: values.len(),
                width: values.first().map(Vec::len).unwrap_or(0),
            });
            Ok(())
        }

        fn clear_content(
            &mut self,
            _: &DestinationId,
            _: &str,
            row: usize,
            _column: usize,
            rows: usize,
            columns: usize,
        ) -> Result<(), ServiceError> {
            self.calls.push(Call::Clear { row, rows, columns });
            Ok(())
        }

        fn rename(&mut self, _: &DestinationId, _: &str) -> Result<(), ServiceError> {
            Ok(())
        }
    }

    fn rows(n: usize, label: GroupLabel) -> Vec<Row> {
        format_group(&vec![Person::default(); n], label)
    }

    #[rstest]
    #[case(2, 0, 2)]
    #[case(2, 1, 5)]
    #[case(5, 3, 10)]
    fn cursor_arithmetic(#[case] start: usize, #[case] len: usize, #[case] expected: usize) {
        assert_eq!(next_start_row(start, len), expected);
    }

    #[test]
    fn layout_skips_empty_groups() {
        let plan = plan_layout(&[
            (GroupLabel::Active, rows(3, GroupLabel::Active)),
            (GroupLabel::Guest, Vec::new()),
            (GroupLabel::Student, rows(1, GroupLabel::Student)),
            (GroupLabel::Inactive, rows(2, GroupLabel::Inactive)),
        ]);
        let starts: Vec<usize> = plan.iter().map(|b| b.start_row).collect();
        assert_eq!(starts, vec![2, 7, 7, 10]);
        assert!(plan[1].is_empty());
        assert_eq!(plan[0].end_row(), Some(4));
        assert_eq!(plan[1].end_row(), None);
    }

    #[test]
    fn empty_write_is_a_no_op() {
        let mut sink = RecordingSink::default();
        let mut writer = SheetWriter::new(&mut sink, DestinationId::from("d"), "Contact List");
        assert_eq!(writer.write(&[], 7).expect("write"), 7);
        drop(writer);
        assert!(sink.calls.is_empty());
    }

    #[test]
    fn block_spans_seven_columns() {
        let mut sink = RecordingSink::default();
        let mut writer = SheetWriter::new(&mut sink, DestinationId::from("d"), "Contact List");
        let next = writer.write(&rows(2, GroupLabel::Guest), 2).expect("write");
        assert_eq!(next, 6);
        drop(writer);
        assert_eq!(
            sink.calls,
            vec![Call::Write {
                row: 2,
                column: 1,
                height: 2,
                width: COLUMN_COUNT
            }]
        );
    }

    #[test]
    fn clear_happens_once_and_spares_header() {
        let mut sink = RecordingSink::default();
        let mut writer = SheetWriter::new(&mut sink, DestinationId::from("d"), "Contact List");
        assert!(writer.clear_data_region(12).expect("clear"));
        assert!(!writer.clear_data_region(12).expect("second clear"));
        assert!(writer.cleared());
        drop(writer);
        assert_eq!(
            sink.calls,
            vec![Call::Clear {
                row: 2,
                rows: 11,
                columns: COLUMN_COUNT
            }]
        );
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    fn header_only_sheet_is_not_cleared(#[case] last_row: usize) {
        let mut sink = RecordingSink::default();
        let mut writer = SheetWriter::new(&mut sink, DestinationId::from("d"), "Contact List");
        assert!(!writer.clear_data_region(last_row).expect("clear"));
        drop(writer);
        assert!(sink.calls.is_empty());
    }
}
