use thiserror::Error;

/// Recoverable conditions the Decision Engine handles internally. These
/// are never propagated as hard failures; the engine logs them at
/// `tracing::debug!` and moves on. The type exists so that recovery sites
/// are explicit and testable rather than silent `if` branches.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("job {id} width {width} exceeds platform host count {host_count}")]
    WidthExceedsPlatform {
        id: String,
        width: u32,
        host_count: u32,
    },

    #[error("job {id} could not be allocated this tick, remains queued")]
    AllocationUnavailable { id: String },

    #[error("job {id} not admitted: energy shortage")]
    EnergyShortage { id: String },
}

/// Fatal conditions that abort the current `take_decisions` call: event
/// ingestion errors are treated as fatal for the whole tick.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("simulation not yet initialized: SimulationBegins never received")]
    NotInitialized,

    #[error("host count must be positive")]
    InvalidHostCount,
}
