//! Azure Blob Storage through the Azure SDK.
//!
//! Each page is one `Put Blob` request creating a block blob. The connection
//! string decides where the service lives:
//!
//! ```text
//! UseDevelopmentStorage=true                    → local emulator (Azurite)
//! AccountName=..;AccountKey=..                  → public cloud, shared key
//! AccountName=..;AccountKey=..;EndpointSuffix=. → sovereign cloud endpoint
//! BlobEndpoint=..;SharedAccessSignature=..      → explicit endpoint, SAS token
//! ```
//!
//! The client is built with retries disabled: a failed write is reported
//! once and never repeated. The locator returned for an object is its URL
//! *without* any query, so logs never carry a SAS token.

use super::BlobStore;
use crate::config::StoreConfig;
use crate::error::{Pdf2BlobError, StoreError};
use async_trait::async_trait;
use azure_core::RetryOptions;
use azure_storage::{CloudLocation, ConnectionString};
use azure_storage_blobs::prelude::{ClientBuilder, ContainerClient};
use reqwest::Url;
use tracing::debug;

const PUBLIC_ENDPOINT_SUFFIX: &str = "core.windows.net";

/// [`BlobStore`] writing block blobs into one Azure container.
#[derive(Clone)]
pub struct AzureBlobStore {
    client: ContainerClient,
    container: String,
}

impl AzureBlobStore {
    /// Parse `connection_string` and bind to `container`.
    pub fn from_connection_string(
        connection_string: &str,
        container: impl Into<String>,
    ) -> Result<Self, Pdf2BlobError> {
        let container = container.into();
        let client = client_builder(connection_string)?
            .retry(RetryOptions::none())
            .container_client(container.clone());
        Ok(Self { client, container })
    }

    /// Parse the connection string held by `store` and bind to `container`.
    pub fn from_config(
        store: &StoreConfig,
        container: impl Into<String>,
    ) -> Result<Self, Pdf2BlobError> {
        Self::from_connection_string(&store.connection_string, container)
    }

    /// Public URL of `name` in this store's container, without any query.
    pub fn blob_url(&self, name: &str) -> Result<Url, StoreError> {
        let mut url = self.client.blob_client(name).url()?;
        url.set_query(None);
        Ok(url)
    }
}

impl std::fmt::Debug for AzureBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureBlobStore")
            .field("container", &self.container)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl BlobStore for AzureBlobStore {
    fn container(&self) -> &str {
        &self.container
    }

    async fn put(
        &self,
        name: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StoreError> {
        let locator = self.blob_url(name)?;
        let size = data.len();

        self.client
            .blob_client(name)
            .put_block_blob(data)
            .content_type(content_type.to_string())
            .await?;

        debug!("PUT {} ({} bytes)", locator, size);
        Ok(locator.to_string())
    }
}

fn client_builder(raw: &str) -> Result<ClientBuilder, Pdf2BlobError> {
    let invalid = |e: azure_core::Error| Pdf2BlobError::InvalidConnectionString(e.to_string());
    let parsed = ConnectionString::new(raw).map_err(invalid)?;

    if parsed.use_development_storage == Some(true) {
        return Ok(ClientBuilder::emulator());
    }

    let credentials = parsed.storage_credentials().map_err(invalid)?;
    match (parsed.blob_endpoint, parsed.account_name) {
        (Some(endpoint), account) => {
            let account = account
                .map(str::to_string)
                .or_else(|| account_from_endpoint(endpoint))
                .ok_or_else(|| {
                    Pdf2BlobError::InvalidConnectionString(format!(
                        "cannot tell the account name from BlobEndpoint '{endpoint}'"
                    ))
                })?;
            let location = CloudLocation::Custom {
                account,
                uri: endpoint.trim_end_matches('/').to_string(),
            };
            Ok(ClientBuilder::with_location(location, credentials))
        }
        (None, Some(account)) => match parsed.endpoint_suffix {
            Some(suffix) if !suffix.eq_ignore_ascii_case(PUBLIC_ENDPOINT_SUFFIX) => {
                let location = CloudLocation::Custom {
                    account: account.to_string(),
                    uri: format!("https://{account}.blob.{suffix}"),
                };
                Ok(ClientBuilder::with_location(location, credentials))
            }
            _ => Ok(ClientBuilder::new(account, credentials)),
        },
        (None, None) => Err(Pdf2BlobError::InvalidConnectionString(
            "either BlobEndpoint or AccountName is required".into(),
        )),
    }
}

/// `acct` from `https://acct.blob.core.windows.net`.
fn account_from_endpoint(endpoint: &str) -> Option<String> {
    let url = Url::parse(endpoint).ok()?;
    let host = url.host_str()?;
    let (account, rest) = host.split_once('.')?;
    rest.starts_with("blob.").then(|| account.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(connection_string: &str) -> AzureBlobStore {
        AzureBlobStore::from_connection_string(connection_string, "processed-invoices").unwrap()
    }

    #[test]
    fn emulator_urls_are_path_style() {
        let url = store("UseDevelopmentStorage=true")
            .blob_url("image-page0-1700000000000.png")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:10000/devstoreaccount1/processed-invoices/image-page0-1700000000000.png"
        );
    }

    #[test]
    fn account_key_targets_public_endpoint() {
        let s = store("DefaultEndpointsProtocol=https;AccountName=acct;AccountKey=a2V5;EndpointSuffix=core.windows.net");
        assert_eq!(s.container(), "processed-invoices");
        assert_eq!(
            s.blob_url("image-page2-5.png").unwrap().as_str(),
            "https://acct.blob.core.windows.net/processed-invoices/image-page2-5.png"
        );
    }

    #[test]
    fn sas_endpoint_locator_has_no_token() {
        let s = store("BlobEndpoint=https://acct.blob.core.windows.net;SharedAccessSignature=sv=2021-08-06&sig=abc");
        let url = s.blob_url("a.png").unwrap();
        assert_eq!(url.query(), None);
        assert_eq!(
            url.as_str(),
            "https://acct.blob.core.windows.net/processed-invoices/a.png"
        );
    }

    #[test]
    fn account_is_read_from_blob_host() {
        assert_eq!(
            account_from_endpoint("https://acct.blob.core.windows.net/"),
            Some("acct".to_string())
        );
        assert_eq!(account_from_endpoint("http://127.0.0.1:10000/x"), None);
    }

    #[test]
    fn unusable_connection_strings_are_rejected() {
        for raw in ["AccountKey=a2V5", "EndpointSuffix=core.windows.net"] {
            let err = AzureBlobStore::from_connection_string(raw, "processed-invoices")
                .err()
                .unwrap_or_else(|| panic!("{raw} should not produce a store"));
            assert!(matches!(err, Pdf2BlobError::InvalidConnectionString(_)), "{raw}: {err}");
        }
    }
}
