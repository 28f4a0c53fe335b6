//! [`RecordStore`] over a PostgREST endpoint.

use super::{RecordStore, Table};
use crate::error::PersistenceError;
use crate::utils::truncate_for_log;
use reqwest::Client;
use serde_json::Value;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};
use url::Url;

const PREFER_UPSERT: &str = "resolution=merge-duplicates,return=minimal";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_LOGGED_BODY: usize = 300;

/// Writes rows with `POST {base}/rest/v1/{table}`, authenticated with a
/// service key.
pub struct PostgrestStore {
    client: Client,
    /// Project URL, without the `/rest/v1` suffix.
    base: Url,
    /// Service role key, sent both as `apikey` and as bearer token.
    key: String,
}

impl fmt::Debug for PostgrestStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgrestStore")
            .field("base", &self.base.as_str())
            .field("key", &"<redacted>")
            .finish()
    }
}

impl PostgrestStore {
    /// Build the HTTP client.
    ///
    /// # Arguments
    ///
    /// * `base` - Project URL, e.g. `https://project.supabase.co`.
    /// * `key` - Service role key.
    ///
    /// # Returns
    ///
    /// [`PersistenceError::Http`] when the TLS backend cannot be set up.
    pub fn new(base: Url, key: impl Into<String>) -> Result<Self, PersistenceError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base,
            key: key.into(),
        })
    }

    fn endpoint(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base.as_str().trim_end_matches('/'), table.name())
    }
}

impl RecordStore for PostgrestStore {
    #[instrument(level = "debug", skip(self, row))]
    async fn upsert(
        &self,
        table: Table,
        row: &Value,
        on_conflict: Option<&str>,
    ) -> Result<(), PersistenceError> {
        let t0 = Instant::now();
        let mut request = self
            .client
            .post(self.endpoint(table))
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .header("Prefer", PREFER_UPSERT)
            .json(row);
        if let Some(columns) = on_conflict {
            request = request.query(&[("on_conflict", columns)]);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(%status, elapsed_ms = t0.elapsed().as_millis() as u64, "Upsert answered");
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(PersistenceError::Status {
            status,
            body: truncate_for_log(body.trim(), MAX_LOGGED_BODY),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{CannedResponse, serve_canned};
    use reqwest::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_upsert_sends_conflict_key_and_auth() {
        let (base, server) = serve_canned(vec![CannedResponse::new(201)]).await;
        let store = PostgrestStore::new(base, "service-key").unwrap();

        store
            .upsert(Table::Players, &json!({"name": "Iker", "goals": 7}), Some("name"))
            .await
            .unwrap();

        let requests = server.await.unwrap();
        let request = requests[0].to_lowercase();
        assert!(request.starts_with("post /rest/v1/players?on_conflict=name "));
        assert!(request.contains("apikey: service-key"));
        assert!(request.contains("authorization: bearer service-key"));
        assert!(request.contains("prefer: resolution=merge-duplicates,return=minimal"));
        assert!(request.contains(r#""name":"iker""#));
    }

    #[tokio::test]
    async fn test_upsert_without_conflict_key_has_no_query() {
        let (base, server) = serve_canned(vec![CannedResponse::new(204)]).await;
        let store = PostgrestStore::new(base, "k").unwrap();

        store
            .upsert(Table::Standings, &json!({"team_name": "A"}), None)
            .await
            .unwrap();

        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("POST /rest/v1/standings HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_error_status_carries_body() {
        let (base, _server) = serve_canned(vec![
            CannedResponse::new(409).body(r#"{"message":"duplicate key"}"#),
        ])
        .await;
        let store = PostgrestStore::new(base, "k").unwrap();

        let err = store
            .upsert(Table::Matches, &json!({}), Some("match_date,opponent"))
            .await
            .unwrap_err();
        match &err {
            PersistenceError::Status { status, body } => {
                assert_eq!(*status, StatusCode::CONFLICT);
                assert!(body.contains("duplicate key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!err.is_transient());
    }

    #[test]
    fn test_debug_hides_key() {
        let store = PostgrestStore::new(Url::parse("https://store.test").unwrap(), "secret").unwrap();
        assert!(!format!("{store:?}").contains("secret"));
    }
}
