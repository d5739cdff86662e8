use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use snapshop_core::config::CatalogConfig;
use snapshop_core::domain::product::ProductDescriptor;

/// Raised only while constructing the client, never while fetching.
#[derive(Debug, Error)]
pub enum CatalogClientError {
    #[error("invalid catalog base url `{0}`")]
    InvalidBaseUrl(String),
    #[error("failed to build http client: {0}")]
    Build(#[from] reqwest::Error),
}

/// Why a fetch came back empty. Serialized as the user-facing message so the
/// storefront can show it verbatim next to an empty grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CatalogFetchError {
    /// Upstream answered, but not with a usable product list (non-2xx status
    /// or a body that does not decode).
    FetchFailed,
    /// The request never completed: DNS, connect, or timeout.
    Network,
}

impl CatalogFetchError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::FetchFailed => "Failed to fetch products",
            Self::Network => "Network error occurred",
        }
    }
}

impl Serialize for CatalogFetchError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.user_message())
    }
}

/// Outcome of a catalog fetch. `products` is empty whenever `error` is set;
/// there is no partially-failed state.
#[derive(Debug)]
pub struct CatalogFetch {
    pub products: Vec<ProductDescriptor>,
    pub error: Option<CatalogFetchError>,
}

impl CatalogFetch {
    fn failure(error: CatalogFetchError) -> Self {
        Self { products: Vec::new(), error: Some(error) }
    }
}

#[derive(Clone)]
pub struct CatalogClient {
    client: Client,
    products_url: String,
}

impl CatalogClient {
    pub fn from_config(config: &CatalogConfig) -> Result<Self, CatalogClientError> {
        let base = config.base_url.trim_end_matches('/');
        if !base.starts_with("http://") && !base.starts_with("https://") {
            return Err(CatalogClientError::InvalidBaseUrl(config.base_url.clone()));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;
        Ok(Self { client, products_url: format!("{base}/products") })
    }

    /// Fetch the full product list. Infallible by contract: every failure
    /// mode collapses to an empty list plus an error marker, so the
    /// storefront keeps rendering when the upstream is down.
    pub async fn fetch_catalog(&self) -> CatalogFetch {
        let response = match self.client.get(&self.products_url).send().await {
            Ok(response) => response,
            Err(error) => {
                warn!(error = %error, url = %self.products_url, "catalog request failed");
                return CatalogFetch::failure(CatalogFetchError::Network);
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, url = %self.products_url, "catalog returned non-success status");
            return CatalogFetch::failure(CatalogFetchError::FetchFailed);
        }

        match response.json::<Vec<ProductDescriptor>>().await {
            Ok(products) => CatalogFetch { products, error: None },
            Err(error) => {
                warn!(error = %error, url = %self.products_url, "catalog body did not decode");
                CatalogFetch::failure(CatalogFetchError::FetchFailed)
            }
        }
    }
}
