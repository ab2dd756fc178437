//! # HTTP Control Client
//!
//! Client for the JSON control surface. Each call returns the `response`
//! text of the envelope, or `"FAIL"` when the server cannot be reached or
//! answers with something that is not an envelope.

use reqwest::Method;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::protocol::{ConfigUpdate, Envelope, FAIL_REPLY};

#[derive(Debug, Clone)]
pub struct HttpControl {
    base_url: String,
    http: reqwest::Client,
}

impl HttpControl {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(config.http_timeout()).build()?;
        Ok(Self {
            base_url: config.control_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub async fn hello(&self) -> String {
        self.call(Method::GET, "/hello", None).await
    }

    pub async fn start_receiver(&self) -> String {
        self.call(Method::POST, "/start_test", None).await
    }

    pub async fn stop_receiver(&self) -> String {
        self.call(Method::POST, "/stop_op25", None).await
    }

    /// Captured receiver screen
    pub async fn output(&self) -> String {
        self.call(Method::GET, "/get_output", None).await
    }

    pub async fn config(&self) -> String {
        self.call(Method::GET, "/get_config", None).await
    }

    pub async fn write_config(&self, update: &ConfigUpdate) -> String {
        self.call(Method::POST, "/write_config", Some(update)).await
    }

    async fn call(&self, method: Method, path: &str, body: Option<&ConfigUpdate>) -> String {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let result = async {
            let response = request.send().await?.error_for_status()?;
            response.json::<Envelope>().await
        }
        .await;

        match result {
            Ok(envelope) => envelope.response,
            Err(e) => {
                debug!("Control request {} failed: {}", url, e);
                FAIL_REPLY.to_string()
            }
        }
    }
}
