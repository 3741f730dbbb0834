//! Job Registry: job descriptors, the FCFS wait queue, and the running map.
//!
//! The wait queue is strict FCFS submission order; the registry never
//! reorders it on its own (that is the Decision Engine's job, via pivot
//! selection and backfill). The running map exists only so `on_complete`
//! can hand the freed `Allocation` back to the Host Pool without the
//! caller having to carry it around separately.

use crate::host_pool::Allocation;
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: String,
    pub width: u32,
    pub walltime: f64,
    pub submit_time: f64,
}

#[derive(Debug)]
struct RunningJob {
    job: Job,
    start_time: f64,
    allocation: Allocation,
}

/// Wait queue (FCFS) plus running-job map. Completed and rejected jobs
/// leave the registry entirely; nothing here is kept once a job is done.
#[derive(Debug, Default)]
pub struct JobRegistry {
    waiting: VecDeque<Job>,
    running: HashMap<String, RunningJob>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, job: Job) {
        self.waiting.push_back(job);
    }

    /// The pivot job: the oldest job still waiting.
    pub fn head(&self) -> Option<&Job> {
        self.waiting.front()
    }

    pub fn waiting(&self) -> impl Iterator<Item = &Job> {
        self.waiting.iter()
    }

    pub fn waiting_len(&self) -> usize {
        self.waiting.len()
    }

    pub fn is_waiting(&self, id: &str) -> bool {
        self.waiting.iter().any(|j| j.id == id)
    }

    pub fn running_len(&self) -> usize {
        self.running.len()
    }

    pub fn is_running(&self, id: &str) -> bool {
        self.running.contains_key(id)
    }

    /// Removes and returns the job at the front of the wait queue,
    /// typically because it is about to launch or be rejected.
    pub fn pop_front(&mut self) -> Option<Job> {
        self.waiting.pop_front()
    }

    /// Removes a specific waiting job by id (used by the backfill sweep,
    /// which scans past the pivot rather than always taking the front).
    pub fn remove_waiting(&mut self, id: &str) -> Option<Job> {
        let pos = self.waiting.iter().position(|j| j.id == id)?;
        self.waiting.remove(pos)
    }

    pub fn record_launch(&mut self, job: Job, start_time: f64, allocation: Allocation) {
        self.running.insert(
            job.id.clone(),
            RunningJob {
                job,
                start_time,
                allocation,
            },
        );
    }

    /// Ends a running job, returning its descriptor and allocation so the
    /// caller can release the hosts and notify the Budget Controller.
    pub fn complete(&mut self, id: &str) -> Option<(Job, Allocation)> {
        self.running.remove(id).map(|r| (r.job, r.allocation))
    }

    pub fn running_job(&self, id: &str) -> Option<&Job> {
        self.running.get(id).map(|r| &r.job)
    }

    pub fn expected_end(&self, id: &str) -> Option<f64> {
        self.running.get(id).map(|r| r.start_time + r.job.walltime)
    }

    /// All running jobs' expected end times, ascending — the sequence the
    /// pivot reservation search walks when estimating an expected start.
    pub fn running_end_times_sorted(&self) -> Vec<(f64, u32)> {
        let mut ends: Vec<(f64, u32)> = self
            .running
            .values()
            .map(|r| (r.start_time + r.job.walltime, r.allocation.width()))
            .collect();
        ends.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        ends
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(id: &str, width: u32, walltime: f64, submit_time: f64) -> Job {
        Job {
            id: id.into(),
            width,
            walltime,
            submit_time,
        }
    }

    #[test]
    fn head_is_fcfs_front() {
        let mut reg = JobRegistry::new();
        reg.enqueue(job("a", 1, 10.0, 0.0));
        reg.enqueue(job("b", 1, 10.0, 1.0));
        assert_eq!(reg.head().unwrap().id, "a");
    }

    #[test]
    fn remove_waiting_extracts_non_front_job() {
        let mut reg = JobRegistry::new();
        reg.enqueue(job("a", 1, 10.0, 0.0));
        reg.enqueue(job("b", 1, 10.0, 1.0));
        reg.enqueue(job("c", 1, 10.0, 2.0));
        let removed = reg.remove_waiting("b").unwrap();
        assert_eq!(removed.id, "b");
        assert_eq!(reg.waiting_len(), 2);
        assert_eq!(reg.head().unwrap().id, "a");
    }

    #[test]
    fn complete_returns_allocation_and_clears_running() {
        let mut reg = JobRegistry::new();
        let j = job("a", 2, 10.0, 0.0);
        let mut pool = crate::host_pool::HostPool::new(4);
        let alloc = pool.try_allocate(2).unwrap();
        reg.record_launch(j, 0.0, alloc);
        assert!(reg.is_running("a"));
        let (completed_job, back) = reg.complete("a").unwrap();
        assert_eq!(completed_job.id, "a");
        assert_eq!(back.width(), 2);
        assert!(!reg.is_running("a"));
    }

    #[test]
    fn running_end_times_sorted_ascending() {
        let mut reg = JobRegistry::new();
        let mut pool = crate::host_pool::HostPool::new(8);
        reg.record_launch(job("a", 2, 100.0, 0.0), 0.0, pool.try_allocate(2).unwrap());
        reg.record_launch(job("b", 2, 10.0, 0.0), 0.0, pool.try_allocate(2).unwrap());
        let ends = reg.running_end_times_sorted();
        assert_eq!(ends, vec![(10.0, 2), (100.0, 2)]);
    }
}
