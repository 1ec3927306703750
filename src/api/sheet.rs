//! Implements the `Sheet` trait using the `sheets::Client` to interact with a Google sheet.

use crate::api::{split_qualified, Rows, Sheet, SheetRange, TokenProvider};
use crate::error::Res;
use crate::model::Cell;
use anyhow::Context;
use sheets::types::{
    BatchClearValuesRequest, BatchUpdateValuesRequest, DateTimeRenderOption, Dimension,
    Spreadsheet, ValueInputOption, ValueRange, ValueRenderOption,
};
use sheets::ClientError;
use std::collections::HashSet;
use tracing::{debug, trace};

/// Implements the `Sheet` trait against the Google Sheets API. It takes a `TokenProvider`, which
/// it asks for a fresh access token before every call.
pub(crate) struct GoogleSheet {
    token_provider: TokenProvider,
}

impl GoogleSheet {
    pub(crate) fn new(token_provider: TokenProvider) -> Self {
        Self { token_provider }
    }

    /// Creates a sheets client with an access token that is refreshed if needed.
    async fn client(&mut self) -> Res<sheets::Client> {
        let access_token = self.token_provider.token_with_refresh().await?;
        // The client id, secret, redirect and refresh token are only needed for the client's own
        // OAuth helpers, which we do not use.
        Ok(sheets::Client::new(
            String::new(),
            String::new(),
            String::new(),
            access_token.to_string(),
            String::new(),
        ))
    }
}

#[async_trait::async_trait]
impl Sheet for GoogleSheet {
    async fn sheet_names(&mut self, spreadsheet_id: &str) -> Res<Vec<String>> {
        trace!("sheet_names for {spreadsheet_id}");
        let response = self
            .client()
            .await?
            .spreadsheets()
            .get(spreadsheet_id, false, &[])
            .await
            .map_err(map_client_error)
            .context("Failed to read the spreadsheet metadata")?;
        Ok(sheet_titles(response.body))
    }

    async fn get_range(&mut self, spreadsheet_id: &str, range: &str) -> Res<Rows> {
        trace!("get_range {range}");
        let response = self
            .client()
            .await?
            .spreadsheets()
            .values_get(
                spreadsheet_id,
                range,
                DateTimeRenderOption::FormattedString,
                Dimension::Rows,
                ValueRenderOption::FormattedValue,
            )
            .await
            .map_err(map_client_error)
            .with_context(|| format!("Failed to read {range}"))?;
        Ok(to_rows(response.body.values))
    }

    async fn batch_get_ranges(
        &mut self,
        spreadsheet_id: &str,
        ranges: &[String],
    ) -> Res<Vec<(String, Rows)>> {
        trace!("batch_get_ranges {ranges:?}");
        // The API rejects the whole batch when one range names a missing sheet, so those ranges
        // are left out of the request and come back empty.
        let known: HashSet<String> = self.sheet_names(spreadsheet_id).await?.into_iter().collect();
        let present = present_ranges(ranges, &known)?;
        if present.is_empty() {
            return Ok(splice(ranges, &present, Vec::new()));
        }
        let response = self
            .client()
            .await?
            .spreadsheets()
            .values_batch_get(
                spreadsheet_id,
                DateTimeRenderOption::FormattedString,
                Dimension::Rows,
                &present,
                ValueRenderOption::FormattedValue,
            )
            .await
            .map_err(map_client_error)
            .with_context(|| format!("Failed to read {}", present.join(", ")))?;
        Ok(splice(ranges, &present, response.body.value_ranges))
    }

    async fn write_ranges(&mut self, spreadsheet_id: &str, data: &[SheetRange]) -> Res<()> {
        let value_ranges: Vec<ValueRange> = data
            .iter()
            .map(|sr| ValueRange {
                major_dimension: Some(Dimension::Rows),
                range: sr.range.clone(),
                values: sr.values.clone(),
            })
            .collect();
        let request = BatchUpdateValuesRequest {
            data: value_ranges,
            include_values_in_response: Some(false),
            response_date_time_render_option: None,
            response_value_render_option: None,
            value_input_option: Some(ValueInputOption::UserEntered),
        };
        self.client()
            .await?
            .spreadsheets()
            .values_batch_update(spreadsheet_id, &request)
            .await
            .map_err(map_client_error)
            .context("Failed to write ranges")?;
        Ok(())
    }

    async fn clear_ranges(&mut self, spreadsheet_id: &str, ranges: &[String]) -> Res<()> {
        let request = BatchClearValuesRequest {
            ranges: ranges.to_vec(),
        };
        self.client()
            .await?
            .spreadsheets()
            .values_batch_clear(spreadsheet_id, &request)
            .await
            .map_err(map_client_error)
            .with_context(|| format!("Failed to clear ranges: {ranges:?}"))?;
        Ok(())
    }
}

fn sheet_titles(spreadsheet: Spreadsheet) -> Vec<String> {
    spreadsheet
        .sheets
        .into_iter()
        .filter_map(|sheet| sheet.properties)
        .map(|properties| properties.title)
        .collect()
}

/// The ranges whose sheet is in `known`, in request order.
fn present_ranges(ranges: &[String], known: &HashSet<String>) -> Res<Vec<String>> {
    let mut present = Vec::with_capacity(ranges.len());
    for range in ranges {
        let (sheet, _) = split_qualified(range)?;
        if known.contains(&sheet) {
            present.push(range.clone());
        } else {
            debug!("'{range}' names a missing sheet and reads as empty");
        }
    }
    Ok(present)
}

/// Pairs every requested range with its rows. Value ranges come back in the order of `present`,
/// and a range that was not requested, or has no value range, is empty.
fn splice(
    ranges: &[String],
    present: &[String],
    value_ranges: Vec<ValueRange>,
) -> Vec<(String, Rows)> {
    let mut value_ranges = value_ranges.into_iter();
    ranges
        .iter()
        .map(|range| {
            let rows = if present.contains(range) {
                value_ranges
                    .next()
                    .map(|vr| to_rows(vr.values))
                    .unwrap_or_default()
            } else {
                Rows::default()
            };
            (range.clone(), rows)
        })
        .collect()
}

/// Formatted values always come back as strings, so numbers arrive as text like `Rp 25.000`.
fn to_rows(values: Vec<Vec<String>>) -> Rows {
    values
        .into_iter()
        .map(|row| row.into_iter().map(Cell::from).collect())
        .collect()
}

fn map_client_error(e: ClientError) -> anyhow::Error {
    let error_name = match &e {
        ClientError::EmptyRefreshToken => "EmptyRefreshToken".to_string(),
        ClientError::FromUtf8Error(inner) => format!("FromUtf8Error {inner}"),
        ClientError::UrlParserError(inner) => format!("UrlParserError {inner}"),
        ClientError::SerdeJsonError(inner) => format!("SerdeJsonError {inner}"),
        ClientError::ReqwestError(inner) => format!("ReqwestError {inner}"),
        ClientError::InvalidHeaderValue(inner) => format!("InvalidHeaderValue {inner}"),
        ClientError::ReqwestMiddleWareError(inner) => format!("ReqwestMiddleWareError {inner}"),
        ClientError::HttpError { .. } => "HttpError".to_string(),
        ClientError::Other(_) => "Other".to_string(),
    };
    anyhow::Error::new(e).context(error_name)
}
