//! Recent job selection
//!
//! The job store gives no ordering guarantee, so recent queries sort
//! client-side. The strategy sits behind a trait so a store with an ordered
//! index can answer the same question without touching the monitor.

use taskworker_core::domain::Job;

/// Picks the most recently finished jobs out of an unordered listing
pub trait RecentSelector: Send + Sync {
    /// Returns the trailing `n + 1` jobs by completion time, oldest first
    fn select(&self, jobs: Vec<Job>, n: usize) -> Vec<Job>;
}

/// Sorts the full listing and keeps its tail
#[derive(Debug, Clone, Copy, Default)]
pub struct SortAndSlice;

impl RecentSelector for SortAndSlice {
    fn select(&self, jobs: Vec<Job>, n: usize) -> Vec<Job> {
        select_recent(jobs, n)
    }
}

/// Sort ascending by completion time and keep the last `min(len, n + 1)` jobs
///
/// Jobs that never finished sort first. Ties are broken by job id.
pub fn select_recent(mut jobs: Vec<Job>, n: usize) -> Vec<Job> {
    jobs.sort_by_key(|job| (job.finished_at(), job.id()));

    let keep = n.saturating_add(1).min(jobs.len());
    jobs.split_off(jobs.len() - keep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskworker_core::domain::{Task, WorkflowInstance};

    fn job_finished_at(at: Option<i64>) -> Job {
        let workflow = WorkflowInstance::new("render");
        let task = Task::new(workflow.workflow_id, "split");
        let mut job = Job::new(workflow, task);
        if let Some(at) = at {
            job.mark_finished(at);
        }
        job
    }

    fn finish_times(jobs: &[Job]) -> Vec<Option<i64>> {
        jobs.iter().map(|job| job.finished_at()).collect()
    }

    #[test]
    fn test_keeps_last_n_plus_one() {
        let jobs = [40, 10, 50, 30, 20]
            .into_iter()
            .map(|at| job_finished_at(Some(at)))
            .collect();

        let recent = select_recent(jobs, 2);
        assert_eq!(finish_times(&recent), vec![Some(30), Some(40), Some(50)]);
    }

    #[test]
    fn test_zero_window_keeps_latest() {
        let jobs = [10, 30, 20]
            .into_iter()
            .map(|at| job_finished_at(Some(at)))
            .collect();

        let recent = select_recent(jobs, 0);
        assert_eq!(finish_times(&recent), vec![Some(30)]);
    }

    #[test]
    fn test_window_larger_than_listing() {
        let jobs: Vec<Job> = [20, 10]
            .into_iter()
            .map(|at| job_finished_at(Some(at)))
            .collect();

        assert_eq!(
            finish_times(&select_recent(jobs, 10)),
            vec![Some(10), Some(20)]
        );
        assert!(select_recent(Vec::new(), 3).is_empty());
        assert!(select_recent(Vec::new(), usize::MAX).is_empty());
    }

    #[test]
    fn test_unfinished_jobs_sort_first() {
        let jobs = vec![
            job_finished_at(None),
            job_finished_at(Some(10)),
            job_finished_at(Some(20)),
        ];

        let recent = select_recent(jobs, 1);
        assert_eq!(finish_times(&recent), vec![Some(10), Some(20)]);
    }

    #[test]
    fn test_ties_are_deterministic() {
        let jobs: Vec<Job> = (0..6).map(|_| job_finished_at(Some(10))).collect();
        let mut reversed = jobs.clone();
        reversed.reverse();

        let a: Vec<_> = select_recent(jobs, 2).iter().map(|j| j.id()).collect();
        let b: Vec<_> = select_recent(reversed, 2).iter().map(|j| j.id()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_strategy_delegates() {
        let jobs = [10, 20, 30]
            .into_iter()
            .map(|at| job_finished_at(Some(at)))
            .collect();

        let recent = SortAndSlice.select(jobs, 1);
        assert_eq!(finish_times(&recent), vec![Some(20), Some(30)]);
    }
}
