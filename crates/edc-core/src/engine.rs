//! Decision Engine: the synchronous EASY-backfilling state machine.
//!
//! One `take_decisions` call is one tick: ingest events, advance the
//! controller, then run the admission sweeps in a fixed order. Nothing
//! here suspends or retries across calls — a candidate that doesn't
//! launch this tick simply stays queued for the next one.

use edc_protocol::{Decision, Event, EventBatch};
use once_cell::sync::Lazy;
use tracing::{debug, trace, warn};

use crate::budget::{Admission, BudgetController};
use crate::config::EngineConfig;
use crate::energy_model::{job_energy, PowerParams};
use crate::error::{CoreError, EngineError};
use crate::host_pool::HostPool;
use crate::job_registry::{Job, JobRegistry};

/// The core's compiled-in name/version, returned verbatim in reply to
/// `Hello`. The one genuinely global, immutable piece of state in the
/// crate — computed once from `Cargo.toml` metadata, never mutated, safe
/// to share across every `DecisionEngine` instance regardless of how many
/// simulations run in the same process.
static IDENTITY: Lazy<(&'static str, &'static str)> =
    Lazy::new(|| (env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")));

/// Horizon cap ReducePC applies to its reservation estimate, bounding how
/// far out a reservation can push.
const REDUCE_PC_HORIZON_CAP: f64 = 5.0;

/// Safety margin applied to the energy component of the expected-start
/// estimate.
const ENERGY_ESTIMATE_MARGIN: f64 = 1.1;

/// All state the decision loop owns between ticks: the Host Pool, the Job
/// Registry, and the Budget Controller. `host_pool`/`controller` are `None`
/// until `SimulationBegins` is observed.
pub struct DecisionEngine {
    config: EngineConfig,
    host_pool: Option<HostPool>,
    registry: JobRegistry,
    controller: Option<BudgetController>,
}

impl DecisionEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            host_pool: None,
            registry: JobRegistry::new(),
            controller: None,
        }
    }

    fn power_params(&self) -> PowerParams {
        PowerParams {
            p_idle: self.config.p_idle,
            p_comp: self.config.p_comp,
        }
    }

    /// Total host count, once `SimulationBegins` has been observed.
    pub fn host_count(&self) -> Option<u32> {
        self.host_pool.as_ref().map(|p| p.host_count())
    }

    /// Free host count, once `SimulationBegins` has been observed.
    pub fn free_host_count(&self) -> Option<u32> {
        self.host_pool.as_ref().map(|p| p.free_count())
    }

    /// Sum of the widths of every currently running job, read from the Job
    /// Registry independently of the Host Pool's own free-count
    /// bookkeeping — lets a caller cross-check the two against each other.
    pub fn running_width_sum(&self) -> u32 {
        self.registry
            .running_end_times_sorted()
            .iter()
            .map(|(_, width)| width)
            .sum()
    }

    /// The configured PowerCap limit, if that is the active policy.
    pub fn power_limit(&self) -> Option<f64> {
        self.controller.as_ref().and_then(BudgetController::power_limit)
    }

    /// Runs one full tick: ingest, advance, then the admission sweeps in
    /// order.
    pub fn take_decisions(&mut self, batch: EventBatch) -> Result<Vec<Decision>, EngineError> {
        let now = batch.now;
        let mut decisions = Vec::new();

        self.ingest_events(now, batch.events, &mut decisions)?;

        let Some(host_pool) = self.host_pool.as_mut() else {
            // No SimulationBegins yet: nothing to schedule against.
            return Ok(decisions);
        };
        let controller = self
            .controller
            .as_mut()
            .expect("controller is initialized alongside host_pool");

        controller.on_tick(now, host_pool.free_count());

        if controller.runs_eager_sweep() {
            Self::eager_launch_sweep(host_pool, &mut self.registry, controller, now, &mut decisions);
        }

        Self::pivot_reservation(
            host_pool,
            &mut self.registry,
            controller,
            self.power_params(),
            now,
            &mut decisions,
        );

        Self::backfill_sweep(host_pool, &mut self.registry, controller, now, &mut decisions);

        Self::pivot_recheck(host_pool, &mut self.registry, controller, now, &mut decisions);

        Ok(decisions)
    }

    fn ingest_events(
        &mut self,
        now: f64,
        events: Vec<Event>,
        decisions: &mut Vec<Decision>,
    ) -> Result<(), EngineError> {
        for event in events {
            match event {
                Event::Hello => {
                    let (name, version) = *IDENTITY;
                    decisions.push(Decision::EdcHello {
                        name: name.into(),
                        version: version.into(),
                    });
                }
                Event::SimulationBegins { host_count } => {
                    if host_count == 0 {
                        return Err(EngineError::InvalidHostCount);
                    }
                    debug!(host_count, "simulation begins");
                    self.host_pool = Some(HostPool::new(host_count));
                    self.controller = Some(BudgetController::new(&self.config, host_count, now));
                }
                Event::JobSubmitted { id, width, walltime } => {
                    let Some(host_pool) = self.host_pool.as_ref() else {
                        return Err(EngineError::NotInitialized);
                    };
                    if !host_pool.fits_platform(width) {
                        let err = CoreError::WidthExceedsPlatform {
                            id: id.clone(),
                            width,
                            host_count: host_pool.host_count(),
                        };
                        debug!(%err, "rejecting job");
                        decisions.push(Decision::RejectJob { id });
                        continue;
                    }
                    self.registry.enqueue(Job {
                        id,
                        width,
                        walltime,
                        submit_time: now,
                    });
                }
                Event::JobCompleted { id } => {
                    let Some(host_pool) = self.host_pool.as_mut() else {
                        return Err(EngineError::NotInitialized);
                    };
                    let controller = self
                        .controller
                        .as_mut()
                        .expect("controller is initialized alongside host_pool");
                    match self.registry.complete(&id) {
                        Some((job, allocation)) => {
                            host_pool.release(allocation);
                            controller.on_complete(&job, now);
                            if controller.reserved_id() == Some(id.as_str()) {
                                controller.pivot_runnable();
                            }
                        }
                        None => {
                            // Duplicate delivery tolerated.
                            trace!(id, "JobCompleted for unknown id, ignored");
                        }
                    }
                }
                Event::AllStaticJobsSubmitted => {
                    // Informational only: the sweeps below run every tick
                    // regardless, so there is nothing further to do here.
                }
                Event::Unknown => {
                    warn!("ignoring event of unrecognized type");
                }
            }
        }
        Ok(())
    }

    /// EnergyBudget/ReducePC only: head-to-tail sweep where the pivot may
    /// advance without a reservation, and later jobs may leapfrog it.
    fn eager_launch_sweep(
        host_pool: &mut HostPool,
        registry: &mut JobRegistry,
        controller: &mut BudgetController,
        now: f64,
        decisions: &mut Vec<Decision>,
    ) {
        let candidates: Vec<Job> = registry.waiting().cloned().collect();
        for job in candidates {
            if !registry.is_waiting(&job.id) {
                continue; // already launched earlier in this sweep
            }
            let is_reserved = controller.reserved_id() == Some(job.id.as_str());
            match controller.admit(&job, host_pool.free_count(), is_reserved) {
                Admission::Yes => {
                    registry.remove_waiting(&job.id);
                    let launched_id = job.id.clone();
                    Self::allocate_and_launch(host_pool, registry, controller, job, now, decisions);
                    // The eager sweep is a second legitimate path by which the
                    // reserved pivot starts running (spec.md §4.4 phase 3) — if
                    // it just launched the reserved job, the reservation must
                    // be cleared here too, exactly as `pivot_recheck` does,
                    // otherwise it dangles and double-penalizes every other
                    // candidate's tightened energy view.
                    if registry.is_running(&launched_id) && controller.reserved_id() == Some(launched_id.as_str()) {
                        controller.pivot_runnable();
                    }
                }
                Admission::No("energy shortage") => {
                    let err = CoreError::EnergyShortage { id: job.id.clone() };
                    debug!(%err, "not admitted this tick");
                }
                Admission::No(_) | Admission::Reserved { .. } => {}
            }
        }
    }

    /// Pivot reservation: if the head job cannot run now, estimate when it
    /// will and install a reservation for it.
    fn pivot_reservation(
        host_pool: &mut HostPool,
        registry: &mut JobRegistry,
        controller: &mut BudgetController,
        params: PowerParams,
        now: f64,
        decisions: &mut Vec<Decision>,
    ) {
        if controller.reserved_id().is_some() {
            return;
        }
        let Some(head) = registry.head().cloned() else {
            return;
        };
        // No reservation is held at this point (checked above), so the
        // admissibility view is never tightened.
        if controller.admit(&head, host_pool.free_count(), true).is_yes() {
            registry.remove_waiting(&head.id);
            Self::allocate_and_launch(host_pool, registry, controller, head, now, decisions);
            return;
        }

        let expected_start = Self::estimate_expected_start(host_pool, registry, controller, params, &head, now);
        let queue_energies: Vec<f64> = registry
            .waiting()
            .filter(|j| j.id != head.id)
            .map(|j| job_energy(params, j.width, j.walltime))
            .collect();
        controller.pivot_not_runnable(&head, now, expected_start, &queue_energies);
    }

    /// Backfill sweep: every non-head waiting job that (a) the Host Pool
    /// can satisfy now, (b) the controller admits, and (c) is guaranteed
    /// to free its hosts before the reserved pivot starts.
    fn backfill_sweep(
        host_pool: &mut HostPool,
        registry: &mut JobRegistry,
        controller: &mut BudgetController,
        now: f64,
        decisions: &mut Vec<Decision>,
    ) {
        let head_id = registry.head().map(|j| j.id.clone());
        let candidates: Vec<Job> = registry
            .waiting()
            .filter(|j| Some(&j.id) != head_id.as_ref())
            .cloned()
            .collect();

        for job in candidates {
            if !registry.is_waiting(&job.id) {
                continue;
            }
            if host_pool.free_count() < job.width {
                continue;
            }
            let is_reserved = controller.reserved_id() == Some(job.id.as_str());
            match controller.admit(&job, host_pool.free_count(), is_reserved) {
                Admission::Yes => {}
                Admission::No("energy shortage") => {
                    let err = CoreError::EnergyShortage { id: job.id.clone() };
                    debug!(%err, "not admitted this tick");
                    continue;
                }
                Admission::No(_) | Admission::Reserved { .. } => continue,
            }
            let finishes_in_time = match controller.reservation_end() {
                Some(end) => now + job.walltime <= end,
                None => true,
            };
            if !finishes_in_time {
                continue;
            }
            registry.remove_waiting(&job.id);
            Self::allocate_and_launch(host_pool, registry, controller, job, now, decisions);
        }
    }

    /// Pivot recheck: if the reserved job is now admissible, launch it and
    /// clear the reservation.
    fn pivot_recheck(
        host_pool: &mut HostPool,
        registry: &mut JobRegistry,
        controller: &mut BudgetController,
        now: f64,
        decisions: &mut Vec<Decision>,
    ) {
        let Some(reserved_id) = controller.reserved_id().map(str::to_owned) else {
            return;
        };
        let Some(head) = registry.head().cloned() else {
            return;
        };
        if head.id != reserved_id {
            return;
        }
        if controller.admit(&head, host_pool.free_count(), true).is_yes() {
            registry.remove_waiting(&head.id);
            Self::allocate_and_launch(host_pool, registry, controller, head, now, decisions);
            controller.pivot_runnable();
        }
    }

    /// `try_allocate` then `promote`/`on_launch`/emit; on allocation
    /// failure the candidate is dropped silently and stays queued — Host
    /// Pool constraints are the final arbiter.
    fn allocate_and_launch(
        host_pool: &mut HostPool,
        registry: &mut JobRegistry,
        controller: &mut BudgetController,
        job: Job,
        now: f64,
        decisions: &mut Vec<Decision>,
    ) {
        let Some(allocation) = host_pool.try_allocate(job.width) else {
            let err = CoreError::AllocationUnavailable { id: job.id.clone() };
            debug!(%err, "re-queuing for next tick");
            registry.enqueue(job);
            return;
        };
        controller.on_launch(&job, now);
        let id = job.id.clone();
        let allocation_str = allocation.to_string();
        registry.record_launch(job, now, allocation);
        decisions.push(Decision::ExecuteJob {
            id,
            allocation: allocation_str,
        });
    }

    /// Expected-start estimate for the pivot: the later of the time enough
    /// hosts will be free, and (for energy-aware variants) the time enough
    /// energy will have replenished.
    fn estimate_expected_start(
        host_pool: &HostPool,
        registry: &JobRegistry,
        controller: &BudgetController,
        params: PowerParams,
        pivot: &Job,
        now: f64,
    ) -> f64 {
        let free_count = host_pool.free_count();
        let resource_time = if free_count >= pivot.width {
            now
        } else {
            let mut freed = free_count;
            let mut result = now;
            for (end, width) in registry.running_end_times_sorted() {
                freed += width;
                result = end;
                if freed >= pivot.width {
                    break;
                }
            }
            result
        };

        let energy_time = match controller {
            BudgetController::EnergyBudget(s) => {
                Self::energy_bound_time(params, pivot, now, s.e_available(), s.r_nominal())
            }
            BudgetController::ReducePC(s) => {
                Self::energy_bound_time(params, pivot, now, s.e_available(), s.r_nominal())
            }
            BudgetController::PowerCap(_) => now,
        };

        let mut expected = resource_time.max(energy_time);
        if matches!(controller, BudgetController::ReducePC(_)) {
            expected = expected.min(now + REDUCE_PC_HORIZON_CAP);
        }
        expected.max(now)
    }

    fn energy_bound_time(params: PowerParams, pivot: &Job, now: f64, e_available: f64, r_nominal: f64) -> f64 {
        let e_pivot = job_energy(params, pivot.width, pivot.walltime);
        let deficit = e_pivot - e_available;
        if deficit > 0.0 && r_nominal > 0.0 {
            now + (deficit / r_nominal) * ENERGY_ESTIMATE_MARGIN
        } else {
            now
        }
    }
}
