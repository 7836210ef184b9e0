//! Configuration for the claims protocol.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Protocol-level constants used by the claim engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Adulthood cutoff instant. A subject whose birthdate falls on or
    /// before this instant counts as adult: the adult claim is the
    /// encrypted comparison `birthdate <= cutoff` (inclusive-le, since an
    /// earlier seconds-since-epoch birthdate means an older subject).
    pub adult_cutoff: DateTime<Utc>,
    /// Degree code a subject must hold for the degree claim to come out
    /// true, compared by encrypted equality.
    pub required_degree: u8,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            // 2008-01-01T00:00:00Z: eighteen years before the current
            // deployment era.
            adult_cutoff: DateTime::from_timestamp(1_199_145_600, 0)
                .unwrap_or(DateTime::UNIX_EPOCH),
            required_degree: 8,
        }
    }
}

impl ProtocolConfig {
    /// The adulthood cutoff as unsigned seconds since the epoch, the
    /// encoding used for encrypted birthdates.
    pub fn cutoff_secs(&self) -> u64 {
        self.adult_cutoff.timestamp().max(0) as u64
    }

    /// Load config from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cutoff_is_positive() {
        let config = ProtocolConfig::default();
        assert!(config.cutoff_secs() > 0);
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = ProtocolConfig::default();
        let yaml = config.to_yaml().expect("serialize");
        let parsed = ProtocolConfig::from_yaml(&yaml).expect("parse");
        assert_eq!(parsed.adult_cutoff, config.adult_cutoff);
        assert_eq!(parsed.required_degree, config.required_degree);
    }
}
