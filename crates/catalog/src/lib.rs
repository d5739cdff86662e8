//! HTTP client for the upstream product catalog service.
//!
//! The storefront treats the catalog as a best-effort dependency: a fetch
//! always yields a product list (possibly empty) plus an optional error
//! marker, never a hard failure. Callers render whatever came back.

pub mod client;

pub use client::{CatalogClient, CatalogClientError, CatalogFetch, CatalogFetchError};
