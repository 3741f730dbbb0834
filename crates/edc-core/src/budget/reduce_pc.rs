//! ReducePC variant: EASY reservation expressed as a reduced
//! energy-replenishment rate rather than held energy.

use super::{Admission, Reservation};
use crate::energy_model::{job_energy, PowerParams};
use crate::job_registry::Job;

const M_LOW: f64 = 0.3;
const M_HIGH: f64 = 0.5;

#[derive(Debug, Clone)]
pub struct ReducePcState {
    host_count: u32,
    params: PowerParams,
    r_nominal: f64,
    r_current: f64,
    e_available: f64,
    e_consumed: f64,
    last_update: f64,
    reserved: Option<Reservation>,
}

impl ReducePcState {
    pub fn new(host_count: u32, params: PowerParams, budget_fraction: f64, now: f64) -> Self {
        let r_nominal = budget_fraction * host_count as f64 * params.p_comp;
        Self {
            host_count,
            params,
            r_nominal,
            r_current: r_nominal,
            e_available: 0.0,
            e_consumed: 0.0,
            last_update: now,
            reserved: None,
        }
    }

    pub fn r_nominal(&self) -> f64 {
        self.r_nominal
    }

    pub fn r_current(&self) -> f64 {
        self.r_current
    }

    pub fn e_available(&self) -> f64 {
        self.e_available
    }

    pub fn on_tick(&mut self, now: f64, free_count: u32) {
        let delta = now - self.last_update;
        let busy = self.host_count.saturating_sub(free_count);
        let e_released = self.r_current * delta;
        let e_drawn =
            (busy as f64 * self.params.p_comp + free_count as f64 * self.params.p_idle) * delta;
        self.e_available += e_released - e_drawn;
        self.e_consumed += e_drawn;
        self.last_update = now;

        if let Some(r) = &self.reserved {
            if now >= r.end {
                self.reserved = None;
                self.r_current = self.r_nominal;
            }
        }
    }

    fn tightened_available(&self, is_reserved_job: bool) -> f64 {
        match &self.reserved {
            Some(r) if !is_reserved_job => self.e_available - r.energy,
            _ => self.e_available,
        }
    }

    /// Same lookahead test as EnergyBudget, but with `r_current` — the
    /// reservation-reduced rate — substituted for `r_nominal` in the
    /// lookahead term.
    pub fn admit(&self, job: &Job, free_count: u32, is_reserved_job: bool) -> Admission {
        if free_count < job.width {
            return Admission::No("insufficient free hosts");
        }
        let available = self.tightened_available(is_reserved_job);
        let e_job = job_energy(self.params, job.width, job.walltime);
        if available >= 0.0 && available + self.r_current * job.walltime >= e_job {
            Admission::Yes
        } else {
            Admission::No("energy shortage")
        }
    }

    pub fn on_launch(&mut self, _job: &Job, _now: f64) {}
    pub fn on_complete(&mut self, _job: &Job, _now: f64) {}

    /// `m` is chosen by queue composition hysteresis: if more than half of
    /// the other waiting jobs have estimated energy below half the queue's
    /// mean, the floor is relaxed to `0.5 · r_nominal`; otherwise it is the
    /// tighter `0.3 · r_nominal`. Guards `Δt ≤ 0` rather than dividing by
    /// zero.
    pub fn pivot_not_runnable(
        &mut self,
        job: &Job,
        now: f64,
        expected_start: f64,
        queue_energies: &[f64],
    ) {
        let delta_t = expected_start - now;
        if delta_t <= 0.0 {
            return;
        }
        let m = Self::hysteresis_m(queue_energies);
        let r_min = m * self.r_nominal;
        let e_pivot = job_energy(self.params, job.width, job.walltime);
        self.r_current = (self.r_nominal - e_pivot / delta_t).max(r_min);
        self.reserved = Some(Reservation {
            id: job.id.clone(),
            energy: e_pivot,
            end: expected_start,
        });
    }

    fn hysteresis_m(queue_energies: &[f64]) -> f64 {
        if queue_energies.is_empty() {
            return M_LOW;
        }
        let mean: f64 = queue_energies.iter().sum::<f64>() / queue_energies.len() as f64;
        let half_mean = mean / 2.0;
        let below = queue_energies.iter().filter(|&&e| e < half_mean).count();
        if below * 2 > queue_energies.len() {
            M_HIGH
        } else {
            M_LOW
        }
    }

    pub fn pivot_runnable(&mut self) {
        self.reserved = None;
        self.r_current = self.r_nominal;
    }

    pub fn reserved_id(&self) -> Option<&str> {
        self.reserved.as_ref().map(|r| r.id.as_str())
    }

    pub fn reservation_end(&self) -> Option<f64> {
        self.reserved.as_ref().map(|r| r.end)
    }
}
