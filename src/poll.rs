use crate::model::{DownloadId, DownloadUrl};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

const DEFAULT_INTERVAL_SECS: u64 = 30;
const DEFAULT_MAX_ATTEMPTS: u32 = 120;

/// How long to wait between `download-retrieve` calls, and how many to make before giving up.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollPolicy {
    #[serde(rename = "interval_secs", with = "as_secs")]
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

mod as_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

/// Downloads resolved so far, in the order they resolved.
#[derive(Debug, Default)]
pub struct ResolvedDownloads {
    seen: HashSet<DownloadId>,
    urls: Vec<DownloadUrl>,
}

impl ResolvedDownloads {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `download` and returns `true`, unless its id was already resolved.
    pub fn insert(&mut self, download: &DownloadUrl) -> bool {
        if !self.seen.insert(download.download_id.clone()) {
            return false;
        }
        self.urls.push(download.clone());
        true
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn into_urls(self) -> Vec<DownloadUrl> {
        self.urls
    }
}

/// Number of downloads that can still resolve: everything requested minus what failed.
pub fn expected_resolutions(requested: usize, failed: usize) -> usize {
    requested.saturating_sub(failed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn download(id: &str) -> DownloadUrl {
        DownloadUrl {
            download_id: DownloadId::new(id),
            url: format!("https://dds.cr.usgs.gov/download/{id}"),
        }
    }

    #[test]
    fn test_repeated_id_counts_once() {
        let mut resolved = ResolvedDownloads::new();
        assert!(resolved.insert(&download("1")));
        assert!(resolved.insert(&download("2")));
        assert!(!resolved.insert(&download("1")));
        assert_eq!(resolved.len(), 2);

        let ids: Vec<_> = resolved
            .into_urls()
            .into_iter()
            .map(|d| d.download_id.to_string())
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_expected_resolutions() {
        assert_eq!(expected_resolutions(5, 2), 3);
        assert_eq!(expected_resolutions(1, 3), 0);
    }

    #[test]
    fn test_policy_from_toml() {
        let policy: PollPolicy = toml::from_str("interval_secs = 5\nmax_attempts = 3").unwrap();
        assert_eq!(policy.interval, Duration::from_secs(5));
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(PollPolicy::default().interval, Duration::from_secs(30));
    }
}
