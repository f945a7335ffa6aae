//! HTTP upstream client.

use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use reqwest::header::USER_AGENT;
use serde_json::Value;

use crate::config::UpstreamConfig;
use crate::upstream::{Upstream, UpstreamError, UpstreamRequest};

/// Fetches JSON documents from `base_url + path` with GET.
#[derive(Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
    base_url: String,
}

impl HttpUpstream {
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

impl Upstream for HttpUpstream {
    fn fetch(
        &self,
        request: UpstreamRequest,
        identity: Option<String>,
    ) -> BoxFuture<'static, Result<Value, UpstreamError>> {
        let mut builder = self
            .client
            .get(self.url_for(&request.path))
            .query(&request.params);
        if let Some(identity) = identity {
            builder = builder.header(USER_AGENT, identity);
        }

        async move {
            let response = builder
                .send()
                .await
                .map_err(|e| UpstreamError::Transport(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(UpstreamError::Status(status.as_u16()));
            }

            response
                .json::<Value>()
                .await
                .map_err(|e| UpstreamError::Decode(e.to_string()))
        }
        .boxed()
    }
}
