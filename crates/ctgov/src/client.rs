//! HTTP client for the ClinicalTrials.gov v2 `studies` endpoint.
//!
//! The registry pages results with an opaque `nextPageToken`; [`ClinicalTrialsClient`] follows
//! it until the requested window is filled, the registry runs out of pages, or the configured
//! page budget is spent. There is no retry or backoff.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::wire::{StudiesPage, Study};
use crate::{CtGovError, CtGovResult};

/// Upper bound the registry accepts for `pageSize`.
pub const MAX_PAGE_SIZE: usize = 1000;

/// Client for the public registry API.
#[derive(Clone, Debug)]
pub struct ClinicalTrialsClient {
    http: reqwest::Client,
    base_url: String,
    page_size: usize,
    max_pages: usize,
}

impl ClinicalTrialsClient {
    /// Builds a client for `base_url` (the `.../api/v2/studies` collection URL).
    ///
    /// # Errors
    ///
    /// Returns [`CtGovError::InvalidInput`] if the URL is blank, `page_size` is outside
    /// `1..=1000`, or `max_pages` is zero; [`CtGovError::Transport`] if the HTTP client cannot be
    /// constructed.
    pub fn new(
        base_url: impl Into<String>,
        page_size: usize,
        max_pages: usize,
        timeout: Duration,
    ) -> CtGovResult<Self> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            return Err(CtGovError::InvalidInput(
                "registry base URL cannot be empty".into(),
            ));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(CtGovError::InvalidInput(format!(
                "page size must be between 1 and {MAX_PAGE_SIZE}, got {page_size}"
            )));
        }
        if max_pages == 0 {
            return Err(CtGovError::InvalidInput(
                "max pages must be at least 1".into(),
            ));
        }

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url,
            page_size,
            max_pages,
        })
    }

    /// Largest number of studies a single search can return.
    pub fn max_window(&self) -> usize {
        self.page_size * self.max_pages
    }

    /// Fetches up to `window` studies matching the free-text `term`, in registry order.
    ///
    /// # Errors
    ///
    /// Returns a [`CtGovError`] if any page request fails or cannot be decoded.
    pub async fn search_studies(&self, term: &str, window: usize) -> CtGovResult<Vec<Study>> {
        let window = window.min(self.max_window());
        let page_size = self.page_size.min(window.max(1)).to_string();

        let mut studies: Vec<Study> = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0;

        while studies.len() < window && pages < self.max_pages {
            let mut query = vec![("query.term", term), ("pageSize", page_size.as_str())];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }

            let page: StudiesPage = self.get_json(&self.base_url, &query).await?;
            pages += 1;
            debug!(
                term,
                page = pages,
                received = page.studies.len(),
                "fetched registry page"
            );

            let exhausted = page.studies.is_empty();
            studies.extend(page.studies);
            page_token = page.next_page_token.filter(|t| !t.is_empty());
            if exhausted || page_token.is_none() {
                break;
            }
        }

        studies.truncate(window);
        Ok(studies)
    }

    /// Fetches a single study by NCT identifier; `Ok(None)` when the registry reports 404.
    ///
    /// # Errors
    ///
    /// Returns a [`CtGovError`] for transport failures, other non-success statuses, or decode
    /// failures.
    pub async fn get_study(&self, nct_id: &str) -> CtGovResult<Option<Study>> {
        let url = format!("{}/{}", self.base_url, nct_id);
        match self.get_json::<Study>(&url, &[]).await {
            Ok(study) => Ok(Some(study)),
            Err(CtGovError::Status { status: 404, .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Total number of studies matching `term`, as reported by `countTotal=true`.
    ///
    /// # Errors
    ///
    /// Returns a [`CtGovError`] if the request fails or cannot be decoded.
    pub async fn count_studies(&self, term: &str) -> CtGovResult<u64> {
        let page: StudiesPage = self
            .get_json(
                &self.base_url,
                &[("query.term", term), ("pageSize", "1"), ("countTotal", "true")],
            )
            .await?;
        Ok(page.total_count.unwrap_or(0))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> CtGovResult<T> {
        let response = self.http.get(url).query(query).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(CtGovError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let mut deserializer = serde_json::Deserializer::from_str(&body);
        serde_path_to_error::deserialize(&mut deserializer).map_err(|err| {
            let path = err.path().to_string();
            let path = if path.is_empty() || path == "." {
                "<root>".to_owned()
            } else {
                path
            };
            CtGovError::Decode {
                path,
                source: err.into_inner(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, Query};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    fn study(id: usize) -> Value {
        json!({ "protocolSection": { "identificationModule": { "nctId": format!("NCT{id:08}") } } })
    }

    /// Three pages of two studies each; the last page carries no token.
    async fn list(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
        if params.get("countTotal").map(String::as_str) == Some("true") {
            return Json(json!({ "studies": [study(0)], "totalCount": 4242 }));
        }
        let page: usize = params
            .get("pageToken")
            .and_then(|t| t.parse().ok())
            .unwrap_or(0);
        let studies: Vec<Value> = (0..2).map(|i| study(page * 2 + i)).collect();
        let next = (page < 2).then(|| (page + 1).to_string());
        Json(json!({ "studies": studies, "nextPageToken": next }))
    }

    async fn one(Path(id): Path<String>) -> axum::response::Response {
        match id.as_str() {
            "NCT00000001" => Json(study(1)).into_response(),
            "NCTBROKEN" => {
                Json(json!({ "protocolSection": { "designModule": { "phases": 7 } } }))
                    .into_response()
            }
            _ => (StatusCode::NOT_FOUND, "missing").into_response(),
        }
    }

    async fn serve() -> String {
        let app = Router::new()
            .route("/studies", get(list))
            .route("/studies/:id", get(one));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("test server");
        });
        format!("http://{addr}/studies")
    }

    fn client(base_url: String, page_size: usize, max_pages: usize) -> ClinicalTrialsClient {
        ClinicalTrialsClient::new(base_url, page_size, max_pages, Duration::from_secs(5))
            .expect("client should build")
    }

    #[test]
    fn rejects_invalid_configuration() {
        let timeout = Duration::from_secs(1);
        assert!(matches!(
            ClinicalTrialsClient::new("  ", 10, 1, timeout),
            Err(CtGovError::InvalidInput(_))
        ));
        assert!(matches!(
            ClinicalTrialsClient::new("http://x", 0, 1, timeout),
            Err(CtGovError::InvalidInput(_))
        ));
        assert!(matches!(
            ClinicalTrialsClient::new("http://x", 10, 0, timeout),
            Err(CtGovError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn follows_page_tokens_until_window_is_filled() {
        let client = client(serve().await, 2, 10);
        let studies = client.search_studies("cancer", 3).await.unwrap();
        assert_eq!(studies.len(), 3);
        assert_eq!(
            studies[2]
                .protocol_section
                .identification_module
                .nct_id
                .as_deref(),
            Some("NCT00000002")
        );
    }

    #[tokio::test]
    async fn stops_when_registry_runs_out_of_pages() {
        let client = client(serve().await, 2, 10);
        let studies = client.search_studies("cancer", 20).await.unwrap();
        assert_eq!(studies.len(), 6);
    }

    #[tokio::test]
    async fn respects_page_budget() {
        let client = client(serve().await, 2, 2);
        let studies = client.search_studies("cancer", 20).await.unwrap();
        assert_eq!(studies.len(), 4);
    }

    #[tokio::test]
    async fn fetch_by_id_maps_404_to_none() {
        let client = client(serve().await, 2, 2);
        assert!(client.get_study("NCT00000001").await.unwrap().is_some());
        assert!(client.get_study("NCT99999999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn decode_errors_carry_the_failing_path() {
        let client = client(serve().await, 2, 2);
        match client.get_study("NCTBROKEN").await {
            Err(CtGovError::Decode { path, .. }) => {
                assert_eq!(path, "protocolSection.designModule.phases")
            }
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn count_reads_total_count() {
        let client = client(serve().await, 2, 2);
        assert_eq!(client.count_studies("cancer").await.unwrap(), 4242);
    }
}
