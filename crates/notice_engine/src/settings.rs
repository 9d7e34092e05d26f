use std::time::Duration;

use serde::Deserialize;

use crate::FetchSettings;

pub const DEFAULT_LIST_URL: &str =
    "https://www.bizinfo.go.kr/web/lay1/bbs/S1T122C128/AS/74/list.do";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WatcherSettings {
    pub list_url: String,
    #[serde(with = "seconds")]
    pub poll_interval: Duration,
    pub fetch: FetchSettings,
}

impl Default for WatcherSettings {
    fn default() -> Self {
        Self {
            list_url: DEFAULT_LIST_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            fetch: FetchSettings::default(),
        }
    }
}

/// Durations are written as whole seconds in configuration files.
pub(crate) mod seconds {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
