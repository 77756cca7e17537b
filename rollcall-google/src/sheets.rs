//! Sheets API v4 values and properties, Drive API v3 modification time.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use rollcall_core::{DestinationId, ServiceError, SpreadsheetSink};

use crate::a1::{a1_range, quote_sheet};
use crate::client::{GoogleClient, DRIVE, SHEETS};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    modified_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

impl GoogleClient {
    fn values_url(&self, id: &DestinationId, range: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.endpoints.sheets,
            urlencoding::encode(id.as_str()),
            urlencoding::encode(range)
        )
    }

    fn get_values(&self, id: &DestinationId, sheet: &str) -> Result<Vec<Vec<String>>, ServiceError> {
        let range = quote_sheet(sheet);
        let req = self.request("GET", &self.values_url(id, &range), "");
        let body: ValueRange = self.decode(SHEETS, &range, req.call())?;
        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }
}

/// Cells come back as strings unless a formatted number slips through.
fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl SpreadsheetSink for GoogleClient {
    /// There is no "active" spreadsheet outside a bound script.
    fn resolve(&self, configured: Option<&DestinationId>) -> Result<DestinationId, ServiceError> {
        configured.cloned().ok_or(ServiceError::NoActiveDestination)
    }

    fn last_modified(&self, id: &DestinationId) -> Result<DateTime<Utc>, ServiceError> {
        let url = format!(
            "{}/drive/v3/files/{}",
            self.endpoints.drive,
            urlencoding::encode(id.as_str())
        );
        let req = self
            .request("GET", &url, "")
            .query("fields", "modifiedTime");
        let file: DriveFile = self.decode(DRIVE, id.as_str(), req.call())?;
        Ok(file.modified_time)
    }

    fn last_row(&self, id: &DestinationId, sheet: &str) -> Result<usize, ServiceError> {
        Ok(self
            .get_values(id, sheet)?
            .iter()
            .rposition(|row| row.iter().any(|c| !c.is_empty()))
            .map_or(0, |i| i + 1))
    }

    fn read_values(&self, id: &DestinationId, sheet: &str) -> Result<Vec<Vec<String>>, ServiceError> {
        self.get_values(id, sheet)
    }

    fn write_block(
        &mut self,
        id: &DestinationId,
        sheet: &str,
        row: usize,
        column: usize,
        values: &[Vec<String>],
    ) -> Result<(), ServiceError> {
        let width = values.iter().map(Vec::len).max().unwrap_or(0);
        let range = a1_range(sheet, row, column, values.len(), width);
        let req = self
            .request("PUT", &self.values_url(id, &range), "")
            .query("valueInputOption", "RAW");
        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": values,
        });
        let _: serde_json::Value = self.decode(SHEETS, &range, req.send_json(body))?;
        tracing::debug!("updated {range}");
        Ok(())
    }

    fn clear_content(
        &mut self,
        id: &DestinationId,
        sheet: &str,
        row: usize,
        column: usize,
        rows: usize,
        columns: usize,
    ) -> Result<(), ServiceError> {
        let range = a1_range(sheet, row, column, rows, columns);
        let url = format!("{}:clear", self.values_url(id, &range));
        let req = self.request("POST", &url, "");
        let _: serde_json::Value = self.decode(SHEETS, &range, req.send_json(json!({})))?;
        tracing::debug!("cleared {range}");
        Ok(())
    }

    fn rename(&mut self, id: &DestinationId, title: &str) -> Result<(), ServiceError> {
        let url = format!(
            "{}/v4/spreadsheets/{}:batchUpdate",
            self.endpoints.sheets,
            urlencoding::encode(id.as_str())
        );
        let body = json!({
            "requests": [{
                "updateSpreadsheetProperties": {
                    "properties": { "title": title },
                    "fields": "title",
                }
            }]
        });
        let req = self.request("POST", &url, "");
        let _: serde_json::Value = self.decode(SHEETS, id.as_str(), req.send_json(body))?;
        Ok(())
    }
}
