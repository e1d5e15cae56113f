//! HTTP Administration Client
//!
//! reqwest-backed implementation of [`AdminClient`] against the engine's
//! administration API.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use crate::error::{Error, Result};

/// Acknowledgement body returned by every mutating admin call
#[derive(Debug, Deserialize)]
struct AckResponse {
    #[serde(default)]
    acknowledged: bool,
}

/// One row of the index catalog listing
#[derive(Debug, Deserialize)]
struct CatIndexRow {
    index: String,
}

/// Administration API client over HTTP
pub struct HttpAdminClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAdminClient {
    /// Create a client for the given API base URL
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Check status and the acknowledgement field of a mutating call
    async fn expect_ack(&self, call: &str, response: reqwest::Response) -> Result<()> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                call: call.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let ack: AckResponse = response.json().await?;
        if !ack.acknowledged {
            return Err(Error::NotAcknowledged(call.to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl super::AdminClient for HttpAdminClient {
    async fn register_repository(
        &self,
        repo: &str,
        location: &Path,
        readonly: bool,
    ) -> Result<()> {
        let call = format!("_snapshot/{}", repo);
        let body = json!({
            "type": "fs",
            "settings": {
                "location": location.display().to_string(),
                "readonly": readonly,
            }
        });

        let response = self
            .client
            .put(self.url(&call))
            .json(&body)
            .send()
            .await?;
        self.expect_ack(&call, response).await
    }

    async fn close_index(&self, index: &str) -> Result<()> {
        let call = format!("{}/_close", index);
        let response = self.client.post(self.url(&call)).send().await?;
        self.expect_ack(&call, response).await
    }

    async fn open_index(&self, index: &str) -> Result<()> {
        let call = format!("{}/_open", index);
        let response = self.client.post(self.url(&call)).send().await?;
        self.expect_ack(&call, response).await
    }

    async fn ilm_start(&self) -> Result<()> {
        let response = self.client.post(self.url("_ilm/start")).send().await?;
        self.expect_ack("_ilm/start", response).await
    }

    async fn ilm_stop(&self) -> Result<()> {
        let response = self.client.post(self.url("_ilm/stop")).send().await?;
        self.expect_ack("_ilm/stop", response).await
    }

    async fn delete_snapshot(&self, repo: &str, snapshot: &str) -> Result<()> {
        let call = format!("_snapshot/{}/{}", repo, snapshot);
        let response = self.client.delete(self.url(&call)).send().await?;
        self.expect_ack(&call, response).await
    }

    async fn list_indices(&self, pattern: &str) -> Result<Vec<String>> {
        let call = format!("_cat/indices/{}", pattern);
        let response = self
            .client
            .get(self.url(&call))
            .query(&[("format", "json"), ("expand_wildcards", "all")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                call,
                status: status.as_u16(),
                body,
            });
        }

        let rows: Vec<CatIndexRow> = response.json().await?;
        Ok(rows.into_iter().map(|row| row.index).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ack_body_parses() {
        let ack: AckResponse = serde_json::from_str(r#"{"acknowledged": true}"#).unwrap();
        assert!(ack.acknowledged);

        // A success body without the field counts as not acknowledged
        let ack: AckResponse = serde_json::from_str(r#"{"status": "ok"}"#).unwrap();
        assert!(!ack.acknowledged);
    }

    #[test]
    fn test_catalog_rows_parse() {
        let rows: Vec<CatIndexRow> = serde_json::from_str(
            r#"[{"index": "docs-2026", "health": "green"}, {"index": ".system-1"}]"#,
        )
        .unwrap();
        let names: Vec<String> = rows.into_iter().map(|r| r.index).collect();
        assert_eq!(names, vec!["docs-2026", ".system-1"]);
    }

    #[test]
    fn test_base_url_trailing_slash_is_normalized() {
        let client = HttpAdminClient::new("http://127.0.0.1:9200/").unwrap();
        assert_eq!(client.url("_ilm/start"), "http://127.0.0.1:9200/_ilm/start");
    }
}
