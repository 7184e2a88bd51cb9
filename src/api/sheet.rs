//! Implements the `Sheet` trait using the `sheets::Client` to interact with a Google sheet.

use crate::api::{Sheet, TokenProvider};
use crate::error::Res;
use anyhow::Context;
use sheets::types::{
    DateTimeRenderOption, Dimension, InsertDataOption, ValueInputOption, ValueRange,
    ValueRenderOption,
};
use sheets::ClientError;
use tracing::trace;

/// Implements the `Sheet` trait with the Google Sheets API. It holds a `TokenProvider` so that it
/// can refresh the access token before each call.
pub(super) struct GoogleSheet {
    spreadsheet_id: String,
    token_provider: TokenProvider,
    client: sheets::Client,
}

impl GoogleSheet {
    pub(super) async fn new(
        spreadsheet_id: impl Into<String>,
        mut token_provider: TokenProvider,
    ) -> Res<Self> {
        let client = create_sheets_client(&mut token_provider).await?;
        Ok(Self {
            spreadsheet_id: spreadsheet_id.into(),
            token_provider,
            client,
        })
    }

    /// Recreates the client in case the access token was refreshed.
    async fn refresh_client(&mut self) -> Res<()> {
        self.client = create_sheets_client(&mut self.token_provider).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Sheet for GoogleSheet {
    async fn get(&mut self, range: &str) -> Res<Vec<Vec<String>>> {
        trace!("get {range}");
        self.refresh_client().await?;
        let response = self
            .client
            .spreadsheets()
            .values_get(
                &self.spreadsheet_id,
                range,
                DateTimeRenderOption::FormattedString,
                Dimension::Rows,
                ValueRenderOption::FormattedValue,
            )
            .await
            .map_err(map_client_error)
            .with_context(|| format!("Failed to fetch {range} from the sheet"))?;
        Ok(response.body.values)
    }

    async fn append(&mut self, range: &str, values: &[Vec<String>]) -> Res<()> {
        trace!("append {} row(s) to {range}", values.len());
        self.refresh_client().await?;
        let body = ValueRange {
            major_dimension: Some(Dimension::Rows),
            range: range.to_string(),
            values: values.to_vec(),
        };
        self.client
            .spreadsheets()
            .values_append(
                &self.spreadsheet_id,
                range,
                false,
                InsertDataOption::InsertRows,
                DateTimeRenderOption::FormattedString,
                ValueRenderOption::FormattedValue,
                ValueInputOption::UserEntered,
                &body,
            )
            .await
            .map_err(map_client_error)
            .with_context(|| format!("Failed to append to {range}"))?;
        Ok(())
    }
}

/// Creates a new sheets client with a refreshed access token.
async fn create_sheets_client(token_provider: &mut TokenProvider) -> Res<sheets::Client> {
    let access_token = token_provider.token_with_refresh().await?;

    // The sheets crate wants client credentials and a refresh token, but API calls only need the
    // access token. Refreshing is handled by `TokenProvider`.
    Ok(sheets::Client::new(
        String::new(),
        String::new(),
        String::new(),
        access_token.to_string(),
        String::new(),
    ))
}

/// `ClientError` messages are not very descriptive on their own, so the variant name is added as
/// context.
fn map_client_error(e: ClientError) -> anyhow::Error {
    let error_name = match &e {
        ClientError::EmptyRefreshToken => "EmptyRefreshToken",
        ClientError::FromUtf8Error(_) => "FromUtf8Error",
        ClientError::UrlParserError(_) => "UrlParserError",
        ClientError::SerdeJsonError(_) => "SerdeJsonError",
        ClientError::ReqwestError(_) => "ReqwestError",
        ClientError::InvalidHeaderValue(_) => "InvalidHeaderValue",
        ClientError::ReqwestMiddleWareError(_) => "ReqwestMiddleWareError",
        ClientError::HttpError { .. } => "HttpError",
        ClientError::Other(_) => "Other",
    };
    anyhow::Error::new(e).context(format!("Google Sheets client error {error_name}"))
}
