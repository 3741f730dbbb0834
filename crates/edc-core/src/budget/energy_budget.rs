//! EnergyBudget variant: a continuously replenished and continuously
//! drawn-down energy counter, with lookahead admission.

use super::{Admission, Reservation};
use crate::energy_model::{job_energy, PowerParams};
use crate::job_registry::Job;

#[derive(Debug, Clone)]
pub struct EnergyBudgetState {
    host_count: u32,
    params: PowerParams,
    r_nominal: f64,
    e_available: f64,
    e_consumed: f64,
    last_update: f64,
    reserved: Option<Reservation>,
}

impl EnergyBudgetState {
    pub fn new(host_count: u32, params: PowerParams, budget_fraction: f64, now: f64) -> Self {
        let r_nominal = budget_fraction * host_count as f64 * params.p_comp;
        Self {
            host_count,
            params,
            r_nominal,
            // Seeded at zero: the first tick establishes `last_update` as
            // the baseline rather than back-dating energy to before the
            // run began.
            e_available: 0.0,
            e_consumed: 0.0,
            last_update: now,
            reserved: None,
        }
    }

    pub fn r_nominal(&self) -> f64 {
        self.r_nominal
    }

    pub fn e_available(&self) -> f64 {
        self.e_available
    }

    pub fn e_consumed(&self) -> f64 {
        self.e_consumed
    }

    /// Tick update: replenish at `r_nominal`, draw down by
    /// every host's estimated power (busy hosts at `p_comp`, free hosts at
    /// `p_idle`) over the elapsed interval.
    pub fn on_tick(&mut self, now: f64, free_count: u32) {
        let delta = now - self.last_update;
        let busy = self.host_count.saturating_sub(free_count);
        let e_released = self.r_nominal * delta;
        let e_drawn =
            (busy as f64 * self.params.p_comp + free_count as f64 * self.params.p_idle) * delta;
        self.e_available += e_released - e_drawn;
        self.e_consumed += e_drawn;
        self.last_update = now;
        // Unlike ReducePC, EnergyBudget's reservation is not time-expired
        // here: it is cleared only by an explicit `pivot_runnable` call
        // (pivot launched, or completed while still queued is impossible
        // by construction).
    }

    fn tightened_available(&self, is_reserved_job: bool) -> f64 {
        match &self.reserved {
            Some(r) if !is_reserved_job => self.e_available - r.energy,
            _ => self.e_available,
        }
    }

    /// Lookahead admission: a job is admitted if the energy on hand plus
    /// what replenishes over its own walltime would cover it, and the
    /// (possibly reservation-tightened) balance isn't already negative.
    pub fn admit(&self, job: &Job, free_count: u32, is_reserved_job: bool) -> Admission {
        if free_count < job.width {
            return Admission::No("insufficient free hosts");
        }
        let available = self.tightened_available(is_reserved_job);
        let e_job = job_energy(self.params, job.width, job.walltime);
        if available >= 0.0 && available + self.r_nominal * job.walltime >= e_job {
            Admission::Yes
        } else {
            Admission::No("energy shortage")
        }
    }

    pub fn on_launch(&mut self, _job: &Job, _now: f64) {}
    pub fn on_complete(&mut self, _job: &Job, _now: f64) {}

    /// Installs/refreshes the pivot reservation. `expected_start` is the
    /// Decision Engine's estimate, taken directly as the reservation's
    /// end — see the note on `Reservation::end` in `budget::mod`.
    pub fn pivot_not_runnable(&mut self, job: &Job, _now: f64, expected_start: f64) {
        let energy = job_energy(self.params, job.width, job.walltime);
        self.reserved = Some(Reservation {
            id: job.id.clone(),
            energy,
            end: expected_start,
        });
    }

    pub fn pivot_runnable(&mut self) {
        self.reserved = None;
    }

    pub fn reserved_id(&self) -> Option<&str> {
        self.reserved.as_ref().map(|r| r.id.as_str())
    }

    pub fn reservation_end(&self) -> Option<f64> {
        self.reserved.as_ref().map(|r| r.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAMS: PowerParams = PowerParams {
        p_idle: 100.0,
        p_comp: 200.0,
    };

    fn job(id: &str, width: u32, walltime: f64) -> Job {
        Job {
            id: id.into(),
            width,
            walltime,
            submit_time: 0.0,
        }
    }

    #[test]
    fn lookahead_admits_short_job_even_at_zero_balance() {
        // H=2, budget_fraction=1.0 -> r_nominal = 2*200 = 400 W.
        let s = EnergyBudgetState::new(2, PARAMS, 1.0, 0.0);
        assert_eq!(s.r_nominal(), 400.0);
        // job(width=1, walltime=10): E_job = 2000 J, lookahead 0+400*10=4000 >= 2000.
        assert_eq!(s.admit(&job("j1", 1, 10.0), 2, false), Admission::Yes);
    }

    #[test]
    fn tick_accumulates_available_energy_over_idle_time() {
        let mut s = EnergyBudgetState::new(2, PARAMS, 1.0, 0.0);
        s.on_tick(10.0, 2); // fully idle: e_released = 400*10=4000, e_drawn=2*100*10=2000
        assert_eq!(s.e_available(), 2000.0);
        assert_eq!(s.e_consumed(), 2000.0);
    }

    #[test]
    fn reservation_tightens_view_for_non_reserved_jobs() {
        let mut s = EnergyBudgetState::new(2, PARAMS, 1.0, 0.0);
        s.on_tick(10.0, 2);
        s.pivot_not_runnable(&job("pivot", 2, 1.0), 10.0, 20.0);
        // reserved energy = 2*200*1 = 400; available tightened = 2000-400=1600.
        let other = job("other", 1, 0.1);
        assert_eq!(s.admit(&other, 2, false), Admission::Yes);
        assert_eq!(s.reserved_id(), Some("pivot"));
    }

    #[test]
    fn pivot_runnable_clears_reservation() {
        let mut s = EnergyBudgetState::new(2, PARAMS, 1.0, 0.0);
        s.pivot_not_runnable(&job("pivot", 1, 1.0), 0.0, 5.0);
        assert!(s.reserved_id().is_some());
        s.pivot_runnable();
        assert!(s.reserved_id().is_none());
    }

    #[test]
    fn insufficient_free_hosts_rejected_regardless_of_energy() {
        let s = EnergyBudgetState::new(4, PARAMS, 1.0, 0.0);
        assert!(matches!(s.admit(&job("j", 4, 1.0), 2, false), Admission::No(_)));
    }
}
