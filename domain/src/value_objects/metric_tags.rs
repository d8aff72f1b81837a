//! Tag dimensions carried by a raw metric point (§3). Only `method`,
//! `status`, `url`, `scenario` are recognized; everything else the CSV
//! ingester sees in an unknown column is dropped at the boundary.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricTags {
    pub method: Option<String>,
    pub status: Option<String>,
    pub url: Option<String>,
    pub scenario: Option<String>,
}

impl MetricTags {
    pub fn is_empty(&self) -> bool {
        self.method.is_none() && self.status.is_none() && self.url.is_none() && self.scenario.is_none()
    }

    /// HTTP status code not in {200, 201}. Informational-only tags never
    /// factor into this; absence of a status is never a failure.
    pub fn is_failure(&self) -> bool {
        match &self.status {
            Some(status) => status != "200" && status != "201",
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_status_is_not_a_failure() {
        let tags = MetricTags::default();
        assert!(!tags.is_failure());
    }

    #[test]
    fn non_2xx_success_status_is_a_failure() {
        let tags = MetricTags {
            status: Some("500".into()),
            ..Default::default()
        };
        assert!(tags.is_failure());
    }

    #[test]
    fn success_statuses_are_not_failures() {
        for code in ["200", "201"] {
            let tags = MetricTags {
                status: Some(code.into()),
                ..Default::default()
            };
            assert!(!tags.is_failure());
        }
    }
}
