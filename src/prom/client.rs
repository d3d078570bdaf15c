use anyhow::{Result, Context};
use async_trait::async_trait;
use tracing::{debug, info};

use super::{MetricSource, QueryResponse};

/// Environment variable holding `user:password` credentials for basic auth
/// against the endpoint.
pub const CREDENTIALS_ENV: &str = "PROMCRED";

/// Queries a Prometheus server over its HTTP API.
pub struct PromClient {
    http: reqwest::Client,
    endpoint: String,
    credentials: Option<(String, String)>,
}

impl PromClient {
    /// Creates a client for the given base URL. Credentials are picked up
    /// from the PROMCRED environment variable when present.
    pub fn new(endpoint: &str, accept_invalid_certs: bool) -> Result<Self> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
            .context("Failed to build HTTP client")?;

        let credentials = std::env::var(CREDENTIALS_ENV).ok().and_then(|raw| {
            let (user, password) = raw.split_once(':')?;
            Some((user.to_string(), password.to_string()))
        });
        if credentials.is_some() {
            info!("Using basic auth credentials from {}", CREDENTIALS_ENV);
        }

        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    fn query_url(&self) -> String {
        format!("{}/api/v1/query", self.endpoint)
    }
}

#[async_trait]
impl MetricSource for PromClient {
    async fn query(&self, expr: &str) -> Result<QueryResponse> {
        let url = self.query_url();
        debug!("Querying: {}?query={}", url, expr);

        let mut request = self.http.get(&url).query(&[("query", expr)]);
        if let Some((user, password)) = &self.credentials {
            request = request.basic_auth(user, Some(password));
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Query request failed for metric [{}]", expr))?;

        // A completed exchange with a bad code is a skippable result, not a
        // transport error
        if !response.status().is_success() {
            return Ok(QueryResponse::failure(format!(
                "http code: {}",
                response.status().as_u16()
            )));
        }

        response
            .json::<QueryResponse>()
            .await
            .with_context(|| format!("Failed to decode query response for metric [{}]", expr))
    }
}
