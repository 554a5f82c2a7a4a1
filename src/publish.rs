//! Template publication.
//!
//! User-triggered and outside the automatic pipeline: publish failures
//! surface as [`Error`] for the host to display, never as diagnostics,
//! and are not retried. Repeated publishes create independent templates
//! on the service side; no client-side identity is assigned.

use reqwest::blocking::Client;
use serde_json::json;
use url::Url;

use crate::error::{Error, Result};

pub struct Publisher {
    client: Client,
    endpoint: Url,
}

impl Publisher {
    pub fn new(client: Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    /// Register the raw template with the hosted service.
    ///
    /// The API key is forwarded verbatim in the `Authorization` header;
    /// no format validation happens on this side. A blank key fails
    /// immediately without touching the network. Returns the template id
    /// assigned by the service.
    pub fn publish(&self, html: &str, css: &str, api_key: &str) -> Result<String> {
        if api_key.trim().is_empty() {
            return Err(Error::MissingApiKey);
        }

        let payload = json!({ "body": html, "styles": css }).to_string();
        let response = self
            .client
            .post(self.endpoint.clone())
            .header("Content-Type", "application/json")
            .header("Authorization", api_key)
            .body(payload)
            .send()
            .map_err(|e| Error::NetworkError(format!("Publish request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| Error::NetworkError(format!("Failed to read publish response: {}", e)))?;

        if !status.is_success() {
            return Err(Error::PublishError(format!(
                "service returned {}: {}",
                status,
                body.trim()
            )));
        }

        let value: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| Error::PublishError(format!("malformed response body: {}", e)))?;
        match value.get("template") {
            Some(serde_json::Value::String(id)) => Ok(id.clone()),
            Some(other) => Ok(other.to_string()),
            None => Err(Error::PublishError(
                "response carried no template id".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_api_key_fails_without_a_network_call() {
        // The endpoint is unroutable; reaching the network would error
        // with NetworkError rather than MissingApiKey.
        let publisher = Publisher::new(
            Client::new(),
            Url::parse("http://127.0.0.1:1/register").unwrap(),
        );
        assert!(matches!(publisher.publish("<p></p>", "", ""), Err(Error::MissingApiKey)));
        assert!(matches!(
            publisher.publish("<p></p>", "", "   "),
            Err(Error::MissingApiKey)
        ));
    }

    #[test]
    fn unreachable_service_is_a_network_error() {
        let publisher = Publisher::new(
            Client::new(),
            Url::parse("http://127.0.0.1:1/register").unwrap(),
        );
        assert!(matches!(
            publisher.publish("<p></p>", "", "key-123"),
            Err(Error::NetworkError(_))
        ));
    }
}
