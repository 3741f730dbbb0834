//! PowerCap variant: a hard, memoryless instantaneous power ceiling.

use super::Admission;
use crate::energy_model::PowerParams;
use crate::job_registry::Job;

#[derive(Debug, Clone)]
pub struct PowerCapState {
    host_count: u32,
    params: PowerParams,
    p_limit: f64,
}

impl PowerCapState {
    pub fn new(host_count: u32, params: PowerParams, budget_fraction: f64) -> Self {
        let p_limit = budget_fraction * host_count as f64 * params.p_comp;
        Self {
            host_count,
            params,
            p_limit,
        }
    }

    pub fn p_limit(&self) -> f64 {
        self.p_limit
    }

    pub fn on_tick(&mut self, _now: f64, _free_count: u32) {
        // Memoryless: no state to advance.
    }

    /// Admits iff projected platform power after launch stays at or under
    /// `p_limit`.
    pub fn admit(&self, job: &Job, free_count: u32) -> Admission {
        if free_count < job.width {
            return Admission::No("insufficient free hosts");
        }
        let free_after = free_count - job.width;
        let busy_after = self.host_count - free_after;
        let projected = self.params.p_idle * free_after as f64
            + self.params.p_comp * busy_after as f64;
        if projected <= self.p_limit {
            Admission::Yes
        } else {
            Admission::No("projected power exceeds cap")
        }
    }

    pub fn on_launch(&mut self, _job: &Job, _now: f64) {}
    pub fn on_complete(&mut self, _job: &Job, _now: f64) {}
    pub fn pivot_not_runnable(&mut self, _job: &Job, _now: f64, _expected_start: f64) {}
    pub fn pivot_runnable(&mut self) {}
    pub fn reserved_id(&self) -> Option<&str> {
        None
    }
    pub fn reservation_end(&self) -> Option<f64> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(width: u32) -> Job {
        Job {
            id: "j".into(),
            width,
            walltime: 10.0,
            submit_time: 0.0,
        }
    }

    const PARAMS: PowerParams = PowerParams {
        p_idle: 100.0,
        p_comp: 200.0,
    };

    #[test]
    fn admits_when_projected_power_at_or_under_cap() {
        // H=4, P_limit=800: j(width=2) at full idle -> 100*2+200*2=600 <= 800
        let s = PowerCapState::new(4, PARAMS, 1.0);
        assert_eq!(s.p_limit(), 800.0);
        assert_eq!(s.admit(&job(2), 4), Admission::Yes);
    }

    #[test]
    fn withholds_when_projected_power_exceeds_cap() {
        // H=4, budget_fraction=0.75 -> P_limit=600; width=4 -> projected 800.
        let s = PowerCapState::new(4, PARAMS, 0.75);
        assert_eq!(s.p_limit(), 600.0);
        assert!(matches!(s.admit(&job(4), 4), Admission::No(_)));
    }

    #[test]
    fn insufficient_free_hosts_is_rejected_before_power_check() {
        let s = PowerCapState::new(4, PARAMS, 1.0);
        assert!(matches!(s.admit(&job(3), 2), Admission::No(_)));
    }
}
