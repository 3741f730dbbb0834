//! Decision vocabulary produced by the decision core.

use serde::{Deserialize, Serialize};

/// One decision emitted in a tick's output batch, in the order taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum Decision {
    EdcHello { name: String, version: String },
    RejectJob { id: String },
    ExecuteJob { id: String, allocation: String },
}

/// A batch of decisions sharing the tick's simulation timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionBatch {
    pub now: f64,
    pub decisions: Vec<Decision>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_round_trip_execute_job() {
        let d = Decision::ExecuteJob {
            id: "j1".into(),
            allocation: "0-3".into(),
        };
        let encoded = serde_json::to_string(&d).unwrap();
        let decoded: Decision = serde_json::from_str(&encoded).unwrap();
        assert_eq!(d, decoded);
    }
}
