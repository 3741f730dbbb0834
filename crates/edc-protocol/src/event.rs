//! Event vocabulary consumed by the decision core.

use serde::{Deserialize, Serialize};

/// One event delivered to the core in a tick's input batch.
///
/// `Unknown` is the forward-compatibility catch-all: a tag the decoder
/// doesn't recognize must still decode successfully and be silently
/// dropped by the engine, rather than failing the whole batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum Event {
    Hello,
    SimulationBegins { host_count: u32 },
    JobSubmitted { id: String, width: u32, walltime: f64 },
    JobCompleted { id: String },
    AllStaticJobsSubmitted,
    #[serde(other)]
    Unknown,
}

/// A batch of events sharing one simulation timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventBatch {
    pub now: f64,
    pub events: Vec<Event>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_round_trip_job_submitted() {
        let ev = Event::JobSubmitted {
            id: "j1".into(),
            width: 4,
            walltime: 100.0,
        };
        let encoded = serde_json::to_string(&ev).unwrap();
        let decoded: Event = serde_json::from_str(&encoded).unwrap();
        assert_eq!(ev, decoded);
    }

    #[test]
    fn unknown_tag_decodes_to_unknown_variant() {
        let decoded: Event = serde_json::from_str(r#"{"t":"some_future_event"}"#).unwrap();
        assert_eq!(decoded, Event::Unknown);
    }

    #[test]
    fn batch_round_trips_through_json() {
        let batch = EventBatch {
            now: 12.5,
            events: vec![Event::Hello, Event::JobCompleted { id: "j1".into() }],
        };
        let encoded = serde_json::to_string(&batch).unwrap();
        let decoded: EventBatch = serde_json::from_str(&encoded).unwrap();
        assert_eq!(batch, decoded);
    }
}
