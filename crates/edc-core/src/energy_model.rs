//! Energy Model: pure power/energy functions shared by every Budget
//! Controller variant.
//!
//! Every function here is a pure computation over its arguments, no
//! `HostPool`/`JobRegistry` access, so controllers and tests can call them
//! directly without constructing an engine.

/// Per-host idle and per-job-host compute power, the two constants a run
/// is configured with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerParams {
    pub p_idle: f64,
    pub p_comp: f64,
}

/// Instantaneous platform power draw: every host not running a job still
/// draws `p_idle`, and every host allocated to a job draws `p_comp`
/// instead.
pub fn platform_power(params: PowerParams, host_count: u32, hosts_in_use: u32) -> f64 {
    debug_assert!(hosts_in_use <= host_count);
    let idle_hosts = host_count.saturating_sub(hosts_in_use) as f64;
    idle_hosts * params.p_idle + hosts_in_use as f64 * params.p_comp
}

/// Power drawn by a single job occupying `width` hosts.
pub fn job_power(params: PowerParams, width: u32) -> f64 {
    width as f64 * params.p_comp
}

/// Total energy a job of the given width and walltime will consume if run
/// to completion: `width * p_comp * walltime`.
pub fn job_energy(params: PowerParams, width: u32, walltime: f64) -> f64 {
    job_power(params, width) * walltime
}

/// Energy a fully idle platform draws over `duration` seconds; the
/// baseline every Budget Controller variant measures itself against.
pub fn idle_energy(params: PowerParams, host_count: u32, duration: f64) -> f64 {
    host_count as f64 * params.p_idle * duration
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAMS: PowerParams = PowerParams {
        p_idle: 100.0,
        p_comp: 200.0,
    };

    #[test]
    fn platform_power_mixes_idle_and_compute_hosts() {
        // 8 hosts, 3 busy: 5 idle + 3 compute.
        let p = platform_power(PARAMS, 8, 3);
        assert_eq!(p, 5.0 * 100.0 + 3.0 * 200.0);
    }

    #[test]
    fn fully_idle_platform_draws_only_idle_power() {
        assert_eq!(platform_power(PARAMS, 8, 0), 8.0 * 100.0);
    }

    #[test]
    fn job_energy_scales_with_width_and_walltime() {
        assert_eq!(job_energy(PARAMS, 4, 10.0), 4.0 * 200.0 * 10.0);
    }

    #[test]
    fn idle_energy_matches_platform_power_at_zero_occupancy() {
        let duration = 60.0;
        assert_eq!(
            idle_energy(PARAMS, 8, duration),
            platform_power(PARAMS, 8, 0) * duration
        );
    }
}
