//! Budget Controller: the three admission-policy variants behind one tag.
//!
//! The three variants are plain structs behind a single enum, dispatched by
//! match rather than by trait object, so the Decision Engine holds exactly
//! one concrete type regardless of configured policy.

mod energy_budget;
mod power_cap;
mod reduce_pc;

use crate::config::{EngineConfig, PolicyKind};
use crate::energy_model::PowerParams;
use crate::job_registry::Job;

pub use energy_budget::EnergyBudgetState;
pub use power_cap::PowerCapState;
pub use reduce_pc::ReducePcState;

/// Outcome of an admissibility query. `Reserved` is never returned by
/// `admit` itself in this design — reservation is a side effect of
/// `pivot_not_runnable` the Decision Engine calls explicitly — but the
/// variant is kept so callers can thread an expected-start estimate
/// through the same type when reporting why the pivot didn't launch.
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    Yes,
    No(&'static str),
    Reserved { expected_start: f64 },
}

impl Admission {
    pub fn is_yes(&self) -> bool {
        matches!(self, Admission::Yes)
    }
}

/// A held reservation for the pivot job: its id, the energy it will need,
/// and the time by which it is expected to start. `end` is always the
/// pivot's *expected start time*, not its projected completion — that is
/// what the backfill sweep's "finishes before the reserved pivot starts"
/// test requires.
#[derive(Debug, Clone, PartialEq)]
struct Reservation {
    id: String,
    energy: f64,
    end: f64,
}

/// The active admission policy, holding whichever variant's state the run
/// was configured with.
#[derive(Debug, Clone)]
pub enum BudgetController {
    PowerCap(PowerCapState),
    EnergyBudget(EnergyBudgetState),
    ReducePC(ReducePcState),
}

impl BudgetController {
    pub fn new(config: &EngineConfig, host_count: u32, now: f64) -> Self {
        let params = PowerParams {
            p_idle: config.p_idle,
            p_comp: config.p_comp,
        };
        match config.policy {
            PolicyKind::PowerCap => {
                BudgetController::PowerCap(PowerCapState::new(host_count, params, config.budget_fraction))
            }
            PolicyKind::EnergyBudget => BudgetController::EnergyBudget(EnergyBudgetState::new(
                host_count,
                params,
                config.budget_fraction,
                now,
            )),
            PolicyKind::ReducePC => BudgetController::ReducePC(ReducePcState::new(
                host_count,
                params,
                config.budget_fraction,
                now,
            )),
        }
    }

    /// Whether this variant runs the eager launch sweep: EnergyBudget and
    /// ReducePC only; PowerCap goes straight to pivot reservation.
    pub fn runs_eager_sweep(&self) -> bool {
        !matches!(self, BudgetController::PowerCap(_))
    }

    pub fn on_tick(&mut self, now: f64, free_count: u32) {
        match self {
            BudgetController::PowerCap(s) => s.on_tick(now, free_count),
            BudgetController::EnergyBudget(s) => s.on_tick(now, free_count),
            BudgetController::ReducePC(s) => s.on_tick(now, free_count),
        }
    }

    pub fn admit(&self, job: &Job, free_count: u32, is_reserved_job: bool) -> Admission {
        match self {
            BudgetController::PowerCap(s) => s.admit(job, free_count),
            BudgetController::EnergyBudget(s) => s.admit(job, free_count, is_reserved_job),
            BudgetController::ReducePC(s) => s.admit(job, free_count, is_reserved_job),
        }
    }

    pub fn on_launch(&mut self, job: &Job, now: f64) {
        match self {
            BudgetController::PowerCap(s) => s.on_launch(job, now),
            BudgetController::EnergyBudget(s) => s.on_launch(job, now),
            BudgetController::ReducePC(s) => s.on_launch(job, now),
        }
    }

    pub fn on_complete(&mut self, job: &Job, now: f64) {
        match self {
            BudgetController::PowerCap(s) => s.on_complete(job, now),
            BudgetController::EnergyBudget(s) => s.on_complete(job, now),
            BudgetController::ReducePC(s) => s.on_complete(job, now),
        }
    }

    /// `queue_energies` is the estimated energy of every other waiting job,
    /// used only by ReducePC's hysteresis rule for `m`; ignored by the
    /// other two variants.
    pub fn pivot_not_runnable(
        &mut self,
        job: &Job,
        now: f64,
        expected_start: f64,
        queue_energies: &[f64],
    ) {
        match self {
            BudgetController::PowerCap(s) => s.pivot_not_runnable(job, now, expected_start),
            BudgetController::EnergyBudget(s) => s.pivot_not_runnable(job, now, expected_start),
            BudgetController::ReducePC(s) => {
                s.pivot_not_runnable(job, now, expected_start, queue_energies)
            }
        }
    }

    pub fn pivot_runnable(&mut self) {
        match self {
            BudgetController::PowerCap(s) => s.pivot_runnable(),
            BudgetController::EnergyBudget(s) => s.pivot_runnable(),
            BudgetController::ReducePC(s) => s.pivot_runnable(),
        }
    }

    pub fn reserved_id(&self) -> Option<&str> {
        match self {
            BudgetController::PowerCap(s) => s.reserved_id(),
            BudgetController::EnergyBudget(s) => s.reserved_id(),
            BudgetController::ReducePC(s) => s.reserved_id(),
        }
    }

    pub fn reservation_end(&self) -> Option<f64> {
        match self {
            BudgetController::PowerCap(s) => s.reservation_end(),
            BudgetController::EnergyBudget(s) => s.reservation_end(),
            BudgetController::ReducePC(s) => s.reservation_end(),
        }
    }

    /// The configured instantaneous power ceiling, for variants that have
    /// one. `None` for EnergyBudget/ReducePC, which bound energy rather
    /// than instantaneous power.
    pub fn power_limit(&self) -> Option<f64> {
        match self {
            BudgetController::PowerCap(s) => Some(s.p_limit()),
            _ => None,
        }
    }
}
