use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Timestamp in UTC
pub type Timestamp = DateTime<Utc>;

/// Identifier of a single simulation run
pub type RunId = Uuid;

/// Name of one simulated trading agent (e.g. "StockAgent_A")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub String);

impl AgentId {
    /// Create a new agent identity
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AgentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Name of one action type an agent can attempt (e.g. "buy", "rebalance")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskLabel(pub String);

impl TaskLabel {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TaskLabel {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TaskLabel {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_serialize_as_plain_strings() {
        let agent = AgentId::new("StockAgent_A");
        let task = TaskLabel::from("buy");

        assert_eq!(serde_json::to_string(&agent).unwrap(), "\"StockAgent_A\"");
        assert_eq!(serde_json::to_string(&task).unwrap(), "\"buy\"");
        assert_eq!(agent.to_string(), "StockAgent_A");
    }
}
