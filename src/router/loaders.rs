//! Document loaders for remote and local schema documents.
//!
//! Loaders are the router's injected collaborators: the router selects one
//! by URI scheme and hands it the fragment-free document URI. Custom
//! backends (databases, archives, test doubles) plug in through
//! [`SchemaRouter::with_loader`](crate::SchemaRouter::with_loader).

use async_trait::async_trait;
use serde_json::Value;

/// Errors produced while fetching a schema document.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The HTTP request failed outright.
    #[error("GET {uri} failed: {source}")]
    Http {
        /// The document URI.
        uri: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("GET {uri} returned status {status}")]
    Status {
        /// The document URI.
        uri: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Reading a local file failed.
    #[error("reading {uri}: {source}")]
    Io {
        /// The document URI.
        uri: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// No loader is registered for the URI's scheme.
    #[error("no loader registered for scheme '{scheme}'")]
    UnsupportedScheme {
        /// The unsupported scheme.
        scheme: String,
    },

    /// The fetched bytes are not valid JSON.
    #[error("document at {uri} is not valid JSON: {source}")]
    Decode {
        /// The document URI.
        uri: String,
        /// The underlying decode error.
        #[source]
        source: serde_json::Error,
    },
}

/// Fetches schema documents by URI.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Fetches and decodes the document at `uri` (fragment already removed).
    async fn fetch(&self, uri: &str) -> Result<Value, LoadError>;
}

/// Fetches schema documents over HTTP(S).
///
/// Requests carry `Accept: application/json, application/schema+json`;
/// non-success statuses are fetch failures.
pub struct HttpLoader {
    client: reqwest::Client,
}

impl HttpLoader {
    /// Creates a loader with a fresh HTTP client.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Creates a loader reusing an existing HTTP client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentLoader for HttpLoader {
    async fn fetch(&self, uri: &str) -> Result<Value, LoadError> {
        let response = self
            .client
            .get(uri)
            .header(
                reqwest::header::ACCEPT,
                "application/json, application/schema+json",
            )
            .send()
            .await
            .map_err(|source| LoadError::Http {
                uri: uri.to_string(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                uri: uri.to_string(),
                status: status.as_u16(),
            });
        }
        response.json().await.map_err(|source| LoadError::Http {
            uri: uri.to_string(),
            source,
        })
    }
}

/// Reads schema documents from the filesystem.
///
/// Accepts `file:` URIs and bare paths.
pub struct FileLoader;

impl FileLoader {
    fn path_of(uri: &str) -> &str {
        uri.strip_prefix("file://")
            .or_else(|| uri.strip_prefix("file:"))
            .unwrap_or(uri)
    }
}

#[async_trait]
impl DocumentLoader for FileLoader {
    async fn fetch(&self, uri: &str) -> Result<Value, LoadError> {
        let text = tokio::fs::read_to_string(Self::path_of(uri))
            .await
            .map_err(|source| LoadError::Io {
                uri: uri.to_string(),
                source,
            })?;
        serde_json::from_str(&text).map_err(|source| LoadError::Decode {
            uri: uri.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_loader_path_extraction() {
        assert_eq!(FileLoader::path_of("file:///tmp/s.json"), "/tmp/s.json");
        assert_eq!(FileLoader::path_of("file:/tmp/s.json"), "/tmp/s.json");
        assert_eq!(FileLoader::path_of("/tmp/s.json"), "/tmp/s.json");
        assert_eq!(FileLoader::path_of("relative/s.json"), "relative/s.json");
    }
}
