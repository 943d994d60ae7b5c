//! Google Sheets backend
//!
//! Talks to the Sheets v4 `values` endpoints and the Drive v3 file list with
//! a bearer token obtained elsewhere (service-account or user OAuth flow).

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};

use super::a1::{A1Range, column_letters, quote_sheet_name};
use super::gateway::{Grid, SheetGateway, ValueInput, WorkbookFile, trim_grid};
use crate::error::{InspectionError, Result};

const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

#[derive(Debug, Deserialize)]
struct ValueRangeResponse {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetResponse {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
    name: String,
}

/// Sheets API client bound to one access token
#[derive(Debug, Clone)]
pub struct GoogleSheetsGateway {
    http: Client,
    access_token: String,
}

impl GoogleSheetsGateway {
    pub fn new(access_token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(InspectionError::from)?;
        Ok(Self {
            http,
            access_token: access_token.into(),
        })
    }

    fn values_url(workbook: &str, qualified_range: &str) -> String {
        format!(
            "{}/{}/values/{}",
            SHEETS_BASE_URL,
            workbook,
            urlencoding::encode(qualified_range)
        )
    }

    /// Map a failed response onto the error taxonomy
    async fn check(response: reqwest::Response, sheet: Option<&str>) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::BAD_REQUEST && body.contains("Unable to parse range") {
            if let Some(sheet) = sheet {
                return Err(InspectionError::SheetNotFound(sheet.to_string()));
            }
        }
        Err(InspectionError::gateway(format!("{}: {}", status, body.trim())))
    }

    async fn fetch_values(
        &self,
        workbook: &str,
        sheet: &str,
        qualified_range: &str,
        major_dimension: &str,
    ) -> Result<Vec<Vec<String>>> {
        let url = Self::values_url(workbook, qualified_range);
        debug!("GET values {} ({})", qualified_range, major_dimension);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[
                ("majorDimension", major_dimension),
                ("valueRenderOption", "FORMATTED_VALUE"),
            ])
            .send()
            .await?;
        let response = Self::check(response, Some(sheet)).await?;
        let body: ValueRangeResponse = response.json().await?;

        Ok(body
            .values
            .into_iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect())
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

#[async_trait]
impl SheetGateway for GoogleSheetsGateway {
    async fn list_workbooks(&self) -> Result<Vec<WorkbookFile>> {
        let query = format!("mimeType='{}' and trashed=false", SPREADSHEET_MIME);
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .http
                .get(DRIVE_FILES_URL)
                .bearer_auth(&self.access_token)
                .query(&[
                    ("q", query.as_str()),
                    ("fields", "nextPageToken,files(id,name)"),
                    ("pageSize", "1000"),
                ]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = Self::check(request.send().await?, None).await?;
            let page: DriveFileList = response.json().await?;
            files.extend(page.files.into_iter().map(|f| WorkbookFile {
                id: f.id,
                name: f.name,
            }));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!("Drive listed {} spreadsheets", files.len());
        Ok(files)
    }

    async fn list_sheet_names(&self, workbook: &str) -> Result<Vec<String>> {
        let url = format!("{}/{}", SHEETS_BASE_URL, workbook);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[("fields", "sheets.properties.title")])
            .send()
            .await?;
        let response = Self::check(response, None).await?;
        let body: SpreadsheetResponse = response.json().await?;
        Ok(body.sheets.into_iter().map(|s| s.properties.title).collect())
    }

    async fn get_range(&self, workbook: &str, sheet: &str, range: &A1Range) -> Result<Grid> {
        let rows = self
            .fetch_values(workbook, sheet, &range.qualified(sheet), "ROWS")
            .await?;
        Ok(trim_grid(rows))
    }

    async fn get_column(&self, workbook: &str, sheet: &str, col: u32) -> Result<Vec<String>> {
        let letters = column_letters(col);
        let qualified = format!("{}!{}:{}", quote_sheet_name(sheet), letters, letters);
        let mut columns = self
            .fetch_values(workbook, sheet, &qualified, "COLUMNS")
            .await?;
        let mut column = if columns.is_empty() {
            Vec::new()
        } else {
            columns.swap_remove(0)
        };
        while column.last().is_some_and(|c| c.is_empty()) {
            column.pop();
        }
        Ok(column)
    }

    async fn write_range(
        &self,
        workbook: &str,
        sheet: &str,
        range: &A1Range,
        values: &[Vec<String>],
        input: ValueInput,
    ) -> Result<()> {
        let qualified = range.qualified(sheet);
        let url = Self::values_url(workbook, &qualified);
        debug!("PUT values {} ({} rows)", qualified, values.len());

        let response = self
            .http
            .put(&url)
            .bearer_auth(&self.access_token)
            .query(&[("valueInputOption", input.as_api_str())])
            .json(&json!({
                "range": qualified,
                "majorDimension": "ROWS",
                "values": values,
            }))
            .send()
            .await?;
        Self::check(response, Some(sheet)).await?;
        Ok(())
    }
}
