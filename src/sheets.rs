//! Google Sheets API client addressed by logical data rows.
//!
//! Every operation takes the spreadsheet URL as users copy it from the browser and
//! fails with `InvalidSheetUrl` before touching the network when no ID can be found.

use reqwest::Client;
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::a1::{self, RowSpan};
use crate::auth::Authenticator;
use crate::client::parse_json;
use crate::error::{GoogleError, Result};
use crate::models::{
    BatchUpdateValuesRequest, BatchUpdateValuesResponse, CellUpdate, SheetData, SheetInfo,
    SpreadsheetInfo, SpreadsheetResponse, UpdateValuesResponse, ValueRange,
};
use crate::url_parser::spreadsheet_id;

/// Base URL for Google Sheets API v4.
const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Values are parsed as if typed into the UI (numbers, dates, formulas).
const VALUE_INPUT_OPTION: &str = "USER_ENTERED";

const METADATA_FIELDS: &str =
    "properties.title,sheets.properties(sheetId,title,gridProperties(rowCount,columnCount))";

pub struct SheetsClient {
    auth: Authenticator,
    http: Client,
    base_url: String,
}

impl SheetsClient {
    pub fn new(auth: Authenticator) -> Self {
        Self {
            auth,
            http: Client::new(),
            base_url: SHEETS_API_BASE.to_string(),
        }
    }

    /// Point the client at a different API endpoint (emulators, test servers).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Spreadsheet title and the size of every tab.
    #[instrument(skip(self), level = "info")]
    pub async fn get_metadata(&self, url: &str) -> Result<SpreadsheetInfo> {
        let id = spreadsheet_id(url)?;
        let token = self.auth.get_access_token().await?;

        let response = self
            .http
            .get(format!("{}/{}", self.base_url, id))
            .bearer_auth(&token)
            .query(&[("fields", METADATA_FIELDS)])
            .send()
            .await?;

        let raw: SpreadsheetResponse = parse_json(response).await?;
        Ok(SpreadsheetInfo {
            spreadsheet_id: id,
            title: raw.properties.title,
            sheets: raw
                .sheets
                .into_iter()
                .map(|entry| SheetInfo::from(entry.properties))
                .collect(),
        })
    }

    /// Metadata of a single tab.
    pub async fn sheet(&self, url: &str, name: &str) -> Result<SheetInfo> {
        let info = self.get_metadata(url).await?;
        info.sheet(name).cloned().ok_or_else(|| GoogleError::SheetNotFound {
            spreadsheet: info.spreadsheet_id.clone(),
            sheet: name.to_string(),
        })
    }

    /// Raw values of an A1 range.
    #[instrument(skip(self), level = "info")]
    pub async fn get_values(&self, url: &str, range: &str) -> Result<ValueRange> {
        let id = spreadsheet_id(url)?;
        let token = self.auth.get_access_token().await?;

        let response = self
            .http
            .get(format!(
                "{}/{}/values/{}",
                self.base_url,
                id,
                urlencoding::encode(range)
            ))
            .bearer_auth(&token)
            .send()
            .await?;

        parse_json(response).await
    }

    /// Read a tab as a header row plus data rows, skipping `row_offset` rows
    /// between the header and the first data row.
    ///
    /// No metadata lookup is made first, so a missing tab surfaces as the
    /// remote [`GoogleError::ApiError`] rather than `SheetNotFound`. The same
    /// holds for the `update_*` writers; use [`sheet`](Self::sheet) to check a
    /// tab exists up front.
    pub async fn read_rows(&self, url: &str, sheet: &str, row_offset: u32) -> Result<SheetData> {
        let values = self.get_values(url, &a1::sheet_range(sheet)).await?.values;
        let mut rows = values.into_iter();

        let headers = rows
            .next()
            .unwrap_or_default()
            .into_iter()
            .map(|cell| match cell {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect();

        Ok(SheetData {
            headers,
            rows: rows.skip(row_offset as usize).collect(),
        })
    }

    /// Write one cell.
    #[instrument(skip(self), level = "info")]
    pub async fn update_cell(
        &self,
        url: &str,
        sheet: &str,
        data_row: u32,
        column: u32,
        value: Value,
        row_offset: u32,
    ) -> Result<UpdateValuesResponse> {
        let id = spreadsheet_id(url)?;
        let range = a1::cell_range(sheet, data_row, column, row_offset);
        self.put_values(&id, ValueRange::rows(range, vec![vec![value]]))
            .await
    }

    /// Write several individual cells in one batch request.
    #[instrument(skip(self, updates), fields(count = updates.len()), level = "info")]
    pub async fn update_cells(
        &self,
        url: &str,
        sheet: &str,
        updates: &[CellUpdate],
        row_offset: u32,
    ) -> Result<BatchUpdateValuesResponse> {
        let id = spreadsheet_id(url)?;
        if updates.is_empty() {
            return Err(GoogleError::InvalidArgument("no cells to update".to_string()));
        }

        let data = updates
            .iter()
            .map(|update| {
                ValueRange::rows(
                    a1::cell_range(sheet, update.data_row, update.column, row_offset),
                    vec![vec![update.value.clone()]],
                )
            })
            .collect();

        self.batch_update_values(&id, data).await
    }

    /// Write `values` left to right along one data row.
    #[instrument(skip(self, values), level = "info")]
    pub async fn update_row(
        &self,
        url: &str,
        sheet: &str,
        data_row: u32,
        start_column: u32,
        values: Vec<Value>,
        row_offset: u32,
    ) -> Result<UpdateValuesResponse> {
        let id = spreadsheet_id(url)?;
        let len = len_u32(values.len())?;
        let range = a1::row_range(sheet, data_row, start_column, len, row_offset)?;
        self.put_values(&id, ValueRange::rows(range, vec![values]))
            .await
    }

    /// Write `values` top to bottom down one column.
    #[instrument(skip(self, values), level = "info")]
    pub async fn update_column(
        &self,
        url: &str,
        sheet: &str,
        column: u32,
        start_data_row: u32,
        values: Vec<Value>,
        row_offset: u32,
    ) -> Result<UpdateValuesResponse> {
        let id = spreadsheet_id(url)?;
        let len = len_u32(values.len())?;
        let range = a1::column_range(sheet, column, start_data_row, len, row_offset)?;
        self.put_values(&id, ValueRange::columns(range, vec![values]))
            .await
    }

    /// Write a grid of rows anchored at a data cell. The rectangle is as wide as
    /// the longest row; shorter rows leave their trailing cells untouched.
    #[instrument(skip(self, grid), level = "info")]
    pub async fn update_range(
        &self,
        url: &str,
        sheet: &str,
        start_data_row: u32,
        start_column: u32,
        grid: Vec<Vec<Value>>,
        row_offset: u32,
    ) -> Result<UpdateValuesResponse> {
        let id = spreadsheet_id(url)?;
        let width = grid.iter().map(Vec::len).max().unwrap_or(0);
        let range = a1::rect_range(
            sheet,
            start_data_row,
            start_column,
            len_u32(grid.len())?,
            len_u32(width)?,
            row_offset,
        )?;
        self.put_values(&id, ValueRange::rows(range, grid)).await
    }

    /// Remove `count` data rows starting at `start_data_row`, shifting later rows up.
    #[instrument(skip(self), level = "info")]
    pub async fn delete_rows(
        &self,
        url: &str,
        sheet: &str,
        start_data_row: u32,
        count: u32,
        row_offset: u32,
    ) -> Result<RowSpan> {
        let span = RowSpan::data_rows(start_data_row, count, row_offset)?;
        let target = self.sheet(url, sheet).await?;
        let id = spreadsheet_id(url)?;
        let token = self.auth.get_access_token().await?;

        let body = json!({
            "requests": [{
                "deleteDimension": {
                    "range": {
                        "sheetId": target.sheet_id,
                        "dimension": "ROWS",
                        "startIndex": span.start_index,
                        "endIndex": span.end_index,
                    }
                }
            }]
        });

        let response = self
            .http
            .post(format!("{}/{}:batchUpdate", self.base_url, id))
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await?;
        let _: Value = parse_json(response).await?;

        info!(sheet, rows = span.row_count(), start_index = span.start_index, "deleted rows");
        Ok(span)
    }

    async fn put_values(
        &self,
        spreadsheet_id: &str,
        range: ValueRange,
    ) -> Result<UpdateValuesResponse> {
        let token = self.auth.get_access_token().await?;

        let response = self
            .http
            .put(format!(
                "{}/{}/values/{}",
                self.base_url,
                spreadsheet_id,
                urlencoding::encode(&range.range)
            ))
            .bearer_auth(&token)
            .query(&[("valueInputOption", VALUE_INPUT_OPTION)])
            .json(&range)
            .send()
            .await?;

        parse_json(response).await
    }

    async fn batch_update_values(
        &self,
        spreadsheet_id: &str,
        data: Vec<ValueRange>,
    ) -> Result<BatchUpdateValuesResponse> {
        let token = self.auth.get_access_token().await?;
        let body = BatchUpdateValuesRequest {
            value_input_option: VALUE_INPUT_OPTION,
            data,
        };

        let response = self
            .http
            .post(format!("{}/{}/values:batchUpdate", self.base_url, spreadsheet_id))
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await?;

        parse_json(response).await
    }
}

fn len_u32(len: usize) -> Result<u32> {
    u32::try_from(len)
        .map_err(|_| GoogleError::InvalidArgument(format!("too many values: {len}")))
}
