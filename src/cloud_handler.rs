// src/cloud_handler.rs
use google_sheets4::{api::ValueRange, hyper, hyper_rustls, Sheets};
use log::{info, warn};
use serde_json::from_str;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use yup_oauth2::{ServiceAccountAuthenticator, ServiceAccountKey};

use crate::data_types::RawSheetData;
use crate::error::{Error, Result};

type Connector = hyper_rustls::HttpsConnector<hyper::client::HttpConnector>;

/// Authenticated session with the Google Sheets API.
///
/// Connect once, reuse for every fetch, drop on shutdown.
pub struct CloudHandler {
    hub: Sheets<Connector>,
}

impl CloudHandler {
    /// Builds an authenticated client from a service account key file.
    pub async fn connect(credentials_path: &Path) -> Result<Self> {
        let mut json = String::new();
        File::open(credentials_path)
            .and_then(|mut file| file.read_to_string(&mut json))
            .map_err(|err| {
                Error::Authentication(format!(
                    "cannot read credential file '{}': {err}",
                    credentials_path.display()
                ))
            })?;

        let service_account_key: ServiceAccountKey = from_str(&json).map_err(|err| {
            Error::Authentication(format!(
                "credential file '{}' is not a service account key: {err}",
                credentials_path.display()
            ))
        })?;

        let auth = ServiceAccountAuthenticator::builder(service_account_key)
            .build()
            .await
            .map_err(|err| Error::Authentication(err.to_string()))?;

        let hub = Sheets::new(
            hyper::Client::builder().build(
                hyper_rustls::HttpsConnectorBuilder::new()
                    .with_native_roots()
                    .https_only()
                    .enable_http1()
                    .build(),
            ),
            auth,
        );

        Ok(CloudHandler { hub })
    }

    /// Retrieves the requested columns of the requested worksheets.
    ///
    /// Worksheet names are trimmed; names that do not exist in the document
    /// are skipped with a warning. Worksheets fully gathered before a
    /// mid-fetch service error are kept and returned; the error only
    /// surfaces when nothing was gathered at all.
    pub async fn fetch_data(
        &self,
        sheet_id: &str,
        sheet_names: &[String],
        columns: &[u32],
    ) -> Result<RawSheetData> {
        let (_, spreadsheet) = self
            .hub
            .spreadsheets()
            .get(sheet_id)
            .doit()
            .await
            .map_err(|err| classify_api_error(sheet_id, err))?;

        let available: Vec<String> = spreadsheet
            .sheets
            .unwrap_or_default()
            .into_iter()
            .filter_map(|sheet| sheet.properties.and_then(|props| props.title))
            .collect();
        info!("Available sheets: {available:?}");

        let mut data = RawSheetData::new();
        'sheets: for name in resolve_sheet_names(sheet_names, &available) {
            let mut sheet_columns = Vec::with_capacity(columns.len());
            for &column in columns {
                let letter = column_letter(column)?;
                let range = format!("'{name}'!{letter}:{letter}");
                match self
                    .hub
                    .spreadsheets()
                    .values_get(sheet_id, &range)
                    .major_dimension("COLUMNS")
                    .doit()
                    .await
                {
                    Ok((_, values)) => sheet_columns.push(column_cells(values)),
                    Err(err) => {
                        let err = classify_api_error(sheet_id, err);
                        if data.is_empty() {
                            return Err(err);
                        }
                        warn!(
                            "Dropping worksheet '{name}' after a fetch error, \
                             keeping {} gathered worksheet(s): {err}",
                            data.len()
                        );
                        break 'sheets;
                    }
                }
            }
            info!(
                "Fetched worksheet '{name}': {} column(s), {} cell(s)",
                sheet_columns.len(),
                sheet_columns.iter().map(Vec::len).sum::<usize>()
            );
            data.insert(name.to_string(), sheet_columns);
        }
        Ok(data)
    }
}

/// Trims the requested names and keeps those present in the document,
/// preserving request order. Missing names are warned about and dropped.
fn resolve_sheet_names<'a>(requested: &'a [String], available: &[String]) -> Vec<&'a str> {
    let mut resolved = Vec::new();
    for name in requested {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        if available.iter().any(|title| title == name) {
            resolved.push(name);
        } else {
            warn!("Worksheet '{name}' not found in available sheets, skipping");
        }
    }
    resolved
}

/// Converts a 1-based column index to its A1 letter, e.g. 1 -> A, 27 -> AA.
fn column_letter(index: u32) -> Result<String> {
    if index == 0 {
        return Err(Error::Configuration(
            "columns are 1-based; 0 is not a valid column index".into(),
        ));
    }
    let mut letters = String::new();
    let mut index = index;
    while index > 0 {
        let rem = ((index - 1) % 26) as u8;
        letters.insert(0, (b'A' + rem) as char);
        index = (index - 1) / 26;
    }
    Ok(letters)
}

/// Flattens a single-column COLUMNS-major response to its cell texts.
fn column_cells(values: ValueRange) -> Vec<String> {
    values
        .values
        .unwrap_or_default()
        .into_iter()
        .next()
        .unwrap_or_default()
        .into_iter()
        .map(|cell| {
            cell.as_str()
                .map(str::to_string)
                .unwrap_or_else(|| cell.to_string())
        })
        .collect()
}

fn classify_api_error(sheet_id: &str, err: google_sheets4::Error) -> Error {
    use google_sheets4::Error as ApiError;
    match err {
        ApiError::Failure(response) => {
            classify_status(sheet_id, response.status().as_u16(), None)
        }
        ApiError::BadRequest(value) => {
            let code = value
                .get("error")
                .and_then(|error| error.get("code"))
                .and_then(|code| code.as_u64())
                .unwrap_or(400) as u16;
            let message = value
                .get("error")
                .and_then(|error| error.get("message"))
                .and_then(|message| message.as_str())
                .map(str::to_string);
            classify_status(sheet_id, code, message)
        }
        ApiError::MissingToken(err) => Error::Authentication(err.to_string()),
        ApiError::MissingAPIKey => Error::Authentication("no token available".into()),
        ApiError::HttpError(err) => Error::TransientService(err.to_string()),
        ApiError::Io(err) => Error::TransientService(err.to_string()),
        other => Error::Unexpected(other.to_string()),
    }
}

fn classify_status(sheet_id: &str, code: u16, message: Option<String>) -> Error {
    let detail = message.unwrap_or_else(|| format!("HTTP status {code}"));
    match code {
        404 => Error::DocumentNotFound(sheet_id.to_string()),
        401 | 403 => Error::Authentication(detail),
        429 => Error::TransientService(detail),
        code if code >= 500 => Error::TransientService(detail),
        _ => Error::Unexpected(detail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|text| text.to_string()).collect()
    }

    #[test]
    fn keeps_exactly_the_names_present_in_the_document() {
        let requested = names(&[" Sheet1 ", "Missing", "Totals", ""]);
        let available = names(&["Sheet1", "Totals", "Extra"]);
        let resolved = resolve_sheet_names(&requested, &available);
        assert_eq!(resolved, vec!["Sheet1", "Totals"]);
    }

    #[test]
    fn all_missing_names_resolve_to_nothing() {
        let requested = names(&["A", "B"]);
        let resolved = resolve_sheet_names(&requested, &names(&["C"]));
        assert!(resolved.is_empty());
    }

    #[test]
    fn column_letters_follow_spreadsheet_numbering() {
        assert_eq!(column_letter(1).unwrap(), "A");
        assert_eq!(column_letter(26).unwrap(), "Z");
        assert_eq!(column_letter(27).unwrap(), "AA");
        assert_eq!(column_letter(52).unwrap(), "AZ");
        assert_eq!(column_letter(703).unwrap(), "AAA");
        assert!(column_letter(0).is_err());
    }

    #[test]
    fn column_cells_stringifies_mixed_values() {
        let values = ValueRange {
            values: Some(vec![vec![json!("header"), json!(12), json!(3.5), json!("")]]),
            ..Default::default()
        };
        assert_eq!(column_cells(values), vec!["header", "12", "3.5", ""]);
    }

    #[test]
    fn column_cells_handles_empty_responses() {
        let values = ValueRange::default();
        assert!(column_cells(values).is_empty());
    }

    #[test]
    fn statuses_map_to_the_error_taxonomy() {
        assert!(matches!(
            classify_status("doc", 404, None),
            Error::DocumentNotFound(_)
        ));
        assert!(matches!(
            classify_status("doc", 403, None),
            Error::Authentication(_)
        ));
        assert!(matches!(
            classify_status("doc", 429, None),
            Error::TransientService(_)
        ));
        assert!(matches!(
            classify_status("doc", 503, None),
            Error::TransientService(_)
        ));
        assert!(matches!(
            classify_status("doc", 418, None),
            Error::Unexpected(_)
        ));
    }
}
