//! Capability cards for agent discovery.

use serde::{Deserialize, Serialize};

/// Well-known path a remote agent publishes its capability card at.
pub const CAPABILITY_CARD_PATH: &str = "/.well-known/agent.json";

/// The discoverable description of a remote agent.
///
/// The card's `description` is the only signal a delegating agent uses to
/// decide routing, so its accuracy is a correctness-critical contract,
/// not cosmetic. A proxy fetches the card once and caches it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityCard {
    /// Agent name
    pub name: String,

    /// What the agent can do; the delegation contract
    pub description: String,

    /// Base URL the agent accepts invocations at
    pub url: String,

    /// Optional implementation version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl CapabilityCard {
    /// Create a capability card
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            url: url.into(),
            version: None,
        }
    }

    /// Set the implementation version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_round_trips_as_camel_case_json() {
        let card = CapabilityCard::new(
            "RemoteMathHelper",
            "Can check prime numbers and find GCDs.",
            "http://localhost:8001",
        )
        .with_version("0.3.0");

        let value = serde_json::to_value(&card).unwrap();
        assert_eq!(value["name"], "RemoteMathHelper");
        assert_eq!(value["url"], "http://localhost:8001");

        let parsed: CapabilityCard = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, card);
    }

    #[test]
    fn version_is_omitted_when_absent() {
        let card = CapabilityCard::new("a", "b", "http://x");
        let value = serde_json::to_value(&card).unwrap();
        assert!(value.get("version").is_none());
    }
}
