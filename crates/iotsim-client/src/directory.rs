//! Directory client for the person, subject and device collections
//!
//! The directory is a REST table API: each collection is a path under the
//! base URL and rows are filtered with `column=eq.value` query pairs.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use crate::client::{error_from_response, parse_base_url, DEFAULT_CONNECT_TIMEOUT, DEFAULT_TIMEOUT};
use crate::error::{Result, SimClientError};
use crate::types::{Device, Person, Subject};

const PROFILES: &str = "profiles";
const SUBJECTS: &str = "elderly_persons";
const DEVICES: &str = "devices";

/// Read-only client for the directory collections
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    client: Client,
    base_url: Url,
}

impl DirectoryClient {
    /// Create a directory client without credentials
    pub fn new(base_url: &str) -> Result<Self> {
        Self::build(base_url, HeaderMap::new(), DEFAULT_TIMEOUT)
    }

    /// Create a directory client that sends `api_key` with every request.
    ///
    /// The key is set both as the `apikey` header and as an
    /// `Authorization: Bearer <key>` header.
    pub fn with_api_key(base_url: &str, api_key: &str) -> Result<Self> {
        Self::with_api_key_and_timeout(base_url, api_key, DEFAULT_TIMEOUT)
    }

    /// Same as [`DirectoryClient::with_api_key`] with a custom request timeout
    pub fn with_api_key_and_timeout(
        base_url: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key)
            .map_err(|e| SimClientError::ParseError(format!("Invalid API key: {}", e)))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| SimClientError::ParseError(format!("Invalid API key: {}", e)))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        Self::build(base_url, headers, timeout)
    }

    fn build(base_url: &str, headers: HeaderMap, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .default_headers(headers)
            .build()?;

        let base_url = parse_base_url(base_url)?;

        Ok(Self { client, base_url })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// List every person profile
    #[instrument(skip(self))]
    pub async fn list_people(&self) -> Result<Vec<Person>> {
        self.query(PROFILES, None).await
    }

    /// Resolve the subject records linked to a person
    #[instrument(skip(self))]
    pub async fn find_subjects(&self, person_id: &str) -> Result<Vec<Subject>> {
        self.query(SUBJECTS, Some(("user_id", person_id))).await
    }

    /// List the devices owned by a subject
    #[instrument(skip(self))]
    pub async fn list_devices(&self, subject_id: &str) -> Result<Vec<Device>> {
        self.query(DEVICES, Some(("elderly_person_id", subject_id)))
            .await
    }

    async fn query<T: serde::de::DeserializeOwned>(
        &self,
        collection: &str,
        filter: Option<(&str, &str)>,
    ) -> Result<Vec<T>> {
        let mut url = self.base_url.join(collection)?;
        if let Some((column, value)) = filter {
            url.query_pairs_mut()
                .append_pair(column, &format!("eq.{}", value));
        }
        debug!("Querying directory: {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(error_from_response(response, status).await);
        }

        // A null body means "no rows"
        let rows: Option<Vec<T>> = response
            .json()
            .await
            .map_err(|e| SimClientError::ParseError(e.to_string()))?;
        Ok(rows.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_creation() {
        assert!(DirectoryClient::new("http://localhost:54321/rest/v1").is_ok());
        assert!(DirectoryClient::with_api_key("http://localhost:54321/rest/v1", "anon").is_ok());
    }

    #[test]
    fn test_invalid_api_key() {
        let client = DirectoryClient::with_api_key("http://localhost:54321", "bad\nkey");
        assert!(matches!(client, Err(SimClientError::ParseError(_))));
    }

    #[test]
    fn test_base_url_normalized() {
        let client = DirectoryClient::new("http://localhost:54321/rest/v1").unwrap();
        let url = client.base_url().join(DEVICES).unwrap();
        assert_eq!(url.as_str(), "http://localhost:54321/rest/v1/devices");
    }
}
