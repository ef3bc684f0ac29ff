use super::SheetTransport;
use crate::config::SheetConfig;
use crate::error::{CmsError, Result};
use log::{error, warn};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Serialize)]
struct ValueUpdate {
    values: Vec<Vec<String>>,
}

/// Values API client for one spreadsheet
pub struct HttpSheetTransport {
    client: Client,
    base_url: String,
    sheet_id: String,
    api_key: String,
}

impl HttpSheetTransport {
    pub fn new(config: &SheetConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("component-cms/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(HttpSheetTransport {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            sheet_id: config.sheet_id.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// `{base}/{id}/values/{range}{suffix}` with the range percent-encoded
    pub fn values_url(&self, range: &str, suffix: &str) -> String {
        format!(
            "{}/{}/values/{}{}",
            self.base_url,
            urlencoding::encode(&self.sheet_id),
            urlencoding::encode(range),
            suffix
        )
    }
}

fn check_status(response: Response, operation: &'static str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        error!("{} request failed: {}", operation, status);
        Err(CmsError::Transport {
            operation,
            status: status.as_u16(),
        })
    }
}

fn cell_text(cell: Value) -> String {
    match cell {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl SheetTransport for HttpSheetTransport {
    async fn get_values(&self, range: &str) -> Result<Vec<Vec<String>>> {
        let response = self
            .client
            .get(self.values_url(range, ""))
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;
        let body = check_status(response, "load")?.text().await?;

        // A body that does not look like a value range means "no rows"
        let parsed: ValueRange = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("ignoring malformed values response for {}: {}", range, e);
                return Ok(Vec::new());
            }
        };

        Ok(parsed
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }

    async fn put_values(&self, range: &str, values: Vec<Vec<String>>) -> Result<()> {
        let response = self
            .client
            .put(self.values_url(range, ""))
            .query(&[("valueInputOption", "RAW"), ("key", self.api_key.as_str())])
            .json(&ValueUpdate { values })
            .send()
            .await?;
        check_status(response, "save")?;
        Ok(())
    }

    async fn clear_values(&self, range: &str) -> Result<()> {
        let response = self
            .client
            .post(self.values_url(range, ":clear"))
            .query(&[("key", self.api_key.as_str())])
            .json(&serde_json::json!({}))
            .send()
            .await?;
        check_status(response, "delete")?;
        Ok(())
    }
}
