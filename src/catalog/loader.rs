//! Fetch the dataset document from disk or over HTTP.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use super::{LoadError, RecordStore};

/// Where the dataset document lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetLocation {
    /// Local JSON file
    File(PathBuf),
    /// Remote JSON document fetched once over HTTP(S)
    Url(Url),
}

impl DatasetLocation {
    /// Interpret a location string: `http://` and `https://` are URLs,
    /// everything else is a filesystem path.
    pub fn parse(raw: &str) -> Result<Self, LoadError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(LoadError::InvalidLocation("empty location".to_string()));
        }

        let lower = raw.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            let url = Url::parse(raw)
                .map_err(|e| LoadError::InvalidLocation(format!("{}: {}", raw, e)))?;
            Ok(DatasetLocation::Url(url))
        } else {
            Ok(DatasetLocation::File(PathBuf::from(raw)))
        }
    }
}

impl fmt::Display for DatasetLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetLocation::File(path) => write!(f, "{}", path.display()),
            DatasetLocation::Url(url) => write!(f, "{}", url),
        }
    }
}

/// Load the dataset into a [`RecordStore`].
///
/// This is the only suspending operation of the crate; everything downstream
/// runs synchronously against the returned store.
pub async fn load_dataset(
    location: &DatasetLocation,
    timeout: Duration,
) -> Result<RecordStore, LoadError> {
    let text = match location {
        DatasetLocation::File(path) => tokio::fs::read_to_string(path).await?,
        DatasetLocation::Url(url) => fetch(url, timeout).await?,
    };

    let store = RecordStore::from_json_str(&text)?;
    tracing::info!("Loaded {} records from {}", store.len(), location);
    Ok(store)
}

async fn fetch(url: &Url, timeout: Duration) -> Result<String, LoadError> {
    tracing::debug!("Fetching dataset from {}", url);

    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("vipdb-search/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let response = client.get(url.clone()).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(LoadError::Http {
            status: status.as_u16(),
        });
    }

    Ok(response.text().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_location_path() {
        assert_eq!(
            DatasetLocation::parse("data/vipdb.json").unwrap(),
            DatasetLocation::File(PathBuf::from("data/vipdb.json"))
        );
    }

    #[test]
    fn test_parse_location_url() {
        let location = DatasetLocation::parse("HTTPS://example.org/vipdb.json").unwrap();
        assert!(matches!(location, DatasetLocation::Url(_)));
        assert_eq!(location.to_string(), "https://example.org/vipdb.json");
    }

    #[test]
    fn test_parse_location_empty() {
        assert!(matches!(
            DatasetLocation::parse("  "),
            Err(LoadError::InvalidLocation(_))
        ));
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vipdb.json");
        std::fs::write(&path, r#"[{"PubMed_ID": 100}, {"PubMed_ID": "200"}]"#).unwrap();

        let location = DatasetLocation::File(path);
        let store = tokio_test::block_on(load_dataset(&location, Duration::from_secs(1))).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(0).unwrap().identifier(), "100");
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let location = DatasetLocation::File(PathBuf::from("/nonexistent/vipdb.json"));
        let result = load_dataset(&location, Duration::from_secs(1)).await;
        assert!(matches!(result, Err(LoadError::Io(_))));
    }
}
