//! ElasticsearchBackend - single-document index API over HTTP
//!
//! With an id the document is upserted with `PUT /{index}/_doc/{id}`,
//! otherwise `POST /{index}/_doc` lets the cluster assign one. The ingest
//! pipeline, when set, is passed as the `pipeline` query parameter.

use std::time::Duration;

use contracts::{
    ContractError, DispatchJob, ElasticsearchConfig, IndexAck, IndexBackend, IndexTarget,
};
use reqwest::{Client, Method, Url};
use serde::Deserialize;
use tracing::{debug, instrument};

const BACKEND_NAME: &str = "elasticsearch";

/// Longest response body quoted in a rejection error
const MAX_ERROR_BODY: usize = 512;

/// Relevant part of an index API response
#[derive(Debug, Deserialize)]
struct IndexResponse {
    #[serde(rename = "_id")]
    id: Option<String>,
    #[serde(default)]
    result: Option<String>,
}

/// Backend talking to an Elasticsearch-compatible cluster
#[derive(Debug, Clone)]
pub struct ElasticsearchBackend {
    client: Client,
    base_url: Url,
    credentials: Option<(String, String)>,
}

impl ElasticsearchBackend {
    /// Build the HTTP client from configuration
    ///
    /// Basic auth is only sent when a password is configured.
    ///
    /// # Errors
    /// `BackendSetup` for an invalid URL, an unreadable or invalid CA file,
    /// or a client that cannot be built.
    #[instrument(name = "elasticsearch_backend_new", skip(config), fields(url = %config.url))]
    pub fn from_config(config: &ElasticsearchConfig) -> Result<Self, ContractError> {
        let base_url = Url::parse(&config.url)
            .map_err(|e| setup_error(format!("invalid url '{}': {e}", config.url)))?;
        if base_url.cannot_be_a_base() {
            return Err(setup_error(format!("url '{}' cannot be a base", config.url)));
        }

        let mut builder = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(!config.verify_certs);

        if let Some(path) = &config.ca_cert {
            let pem = std::fs::read(path).map_err(|e| {
                setup_error(format!("cannot read ca_cert '{}': {e}", path.display()))
            })?;
            let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                setup_error(format!("invalid ca_cert '{}': {e}", path.display()))
            })?;
            builder = builder.add_root_certificate(cert);
        }

        let client = builder
            .build()
            .map_err(|e| setup_error(format!("cannot build http client: {e}")))?;

        let credentials = config
            .password
            .as_ref()
            .map(|password| (config.username.clone(), password.clone()));

        debug!(
            verify_certs = config.verify_certs,
            auth = credentials.is_some(),
            "Elasticsearch client ready"
        );

        Ok(Self {
            client,
            base_url,
            credentials,
        })
    }

    /// Document endpoint for a job
    fn document_url(&self, target: &IndexTarget, id: Option<&str>) -> Result<Url, ContractError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| setup_error("url cannot be a base"))?;
            segments.pop_if_empty().push(&target.index).push("_doc");
            if let Some(id) = id {
                segments.push(id);
            }
        }
        if let Some(pipeline) = &target.pipeline {
            url.query_pairs_mut().append_pair("pipeline", pipeline);
        }
        Ok(url)
    }
}

impl IndexBackend for ElasticsearchBackend {
    fn name(&self) -> &str {
        BACKEND_NAME
    }

    #[instrument(
        name = "elasticsearch_index",
        skip(self, target, job),
        fields(index = %target.index, seq = job.seq)
    )]
    async fn index(
        &self,
        target: &IndexTarget,
        job: &DispatchJob,
    ) -> Result<IndexAck, ContractError> {
        let id = job.id.as_deref();
        let url = self.document_url(target, id)?;
        let method = if id.is_some() { Method::PUT } else { Method::POST };

        let mut request = self.client.request(method, url).json(&job.record);
        if let Some((username, password)) = &self.credentials {
            request = request.basic_auth(username, Some(password));
        }

        let response = request
            .send()
            .await
            .map_err(|e| ContractError::backend_request(BACKEND_NAME, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ContractError::backend_rejected(
                BACKEND_NAME,
                status.as_u16(),
                truncate(&body, MAX_ERROR_BODY),
            ));
        }

        let body: IndexResponse = response.json().await.map_err(|e| {
            ContractError::backend_request(BACKEND_NAME, format!("invalid response body: {e}"))
        })?;

        Ok(IndexAck {
            id: body.id.or_else(|| job.id.clone()),
            result: body.result.unwrap_or_else(|| "unknown".to_string()),
        })
    }
}

fn setup_error(message: impl Into<String>) -> ContractError {
    ContractError::backend_setup(BACKEND_NAME, message)
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
