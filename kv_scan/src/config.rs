//! Configuration for scan reply decoding.

use serde::Deserialize;

/// Limits and hints applied while decoding scan replies.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ScanConfig {
    /// Largest array header the reply reader accepts.
    /// Default: 1M elements
    #[serde(default = "default_max_array_len")]
    pub max_array_len: usize,

    /// Largest bulk string the reply reader accepts (bytes).
    /// Default: 512 MB
    #[serde(default = "default_max_bulk_len")]
    pub max_bulk_len: usize,

    /// Page size the executor may pass along as a COUNT hint.
    /// The server is free to ignore it, so nothing here depends on it.
    #[serde(default)]
    pub page_size_hint: Option<usize>,
}

fn default_max_array_len() -> usize {
    1024 * 1024
}

fn default_max_bulk_len() -> usize {
    512 * 1024 * 1024
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_array_len: default_max_array_len(),
            max_bulk_len: default_max_bulk_len(),
            page_size_hint: None,
        }
    }
}

impl ScanConfig {
    /// Builder-style: set the array length limit.
    pub fn with_max_array_len(mut self, len: usize) -> Self {
        self.max_array_len = len;
        self
    }

    /// Builder-style: set the bulk string length limit.
    pub fn with_max_bulk_len(mut self, len: usize) -> Self {
        self.max_bulk_len = len;
        self
    }

    /// Builder-style: set the page size hint.
    pub fn with_page_size_hint(mut self, count: usize) -> Self {
        self.page_size_hint = Some(count);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ScanConfig::default();
        assert_eq!(config.max_array_len, 1024 * 1024);
        assert_eq!(config.max_bulk_len, 512 * 1024 * 1024);
        assert_eq!(config.page_size_hint, None);
    }

    #[test]
    fn test_builders() {
        let config = ScanConfig::default()
            .with_max_array_len(16)
            .with_max_bulk_len(64)
            .with_page_size_hint(100);
        assert_eq!(config.max_array_len, 16);
        assert_eq!(config.max_bulk_len, 64);
        assert_eq!(config.page_size_hint, Some(100));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ScanConfig = serde_json::from_str(r#"{"page_size_hint": 500}"#).unwrap();
        assert_eq!(config.page_size_hint, Some(500));
        assert_eq!(config.max_array_len, default_max_array_len());
        assert_eq!(config.max_bulk_len, default_max_bulk_len());
    }
}
