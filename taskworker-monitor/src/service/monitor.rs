//! Statistics Monitor
//!
//! Read-only views of job statistics. Statistics are computed at most once
//! per job: the result is cached on the job and written back to the job
//! store, which stays the only record of it. A per-job lock is held only
//! while a computation or invalidation is in flight, so concurrent queries
//! never compute the same job twice.
//!
//! Aggregation is best-effort per job and fail-fast per store: a job whose
//! statistics cannot be produced is left out, while an unreachable store or
//! a cancelled caller fails the whole query.

use std::collections::HashMap;
use std::sync::Arc;
use taskworker_core::domain::{Job, StatisticSet};
use taskworker_core::store::{JobStore, StatisticsService, StoreAccess, WorkflowStore};
use taskworker_core::{Error, Result};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use super::recent::{RecentSelector, SortAndSlice};
use crate::config::Config;

/// Statistics keyed by job id
pub type StatsByJob = HashMap<String, StatisticSet>;

pub struct Monitor {
    jobs: Arc<dyn JobStore>,
    workflows: Arc<dyn WorkflowStore>,
    statistics: Arc<dyn StatisticsService>,
    selector: Box<dyn RecentSelector>,
    config: Config,
    in_flight: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl Monitor {
    pub fn new(
        jobs: Arc<dyn JobStore>,
        workflows: Arc<dyn WorkflowStore>,
        statistics: Arc<dyn StatisticsService>,
        config: Config,
    ) -> Self {
        Self {
            jobs,
            workflows,
            statistics,
            selector: Box::new(SortAndSlice),
            config,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Replace the strategy used to pick recent jobs
    pub fn with_selector(mut self, selector: impl RecentSelector + 'static) -> Self {
        self.selector = Box::new(selector);
        self
    }

    fn access(&self, cancel: &CancellationToken) -> StoreAccess {
        StoreAccess::new(cancel.clone(), self.config.store_timeout)
    }

    /// Statistics of every job that has them or can compute them
    pub async fn all_stats(&self, cancel: &CancellationToken) -> Result<StatsByJob> {
        let access = self.access(cancel);
        let jobs = access.call("job listing", self.jobs.find_all()).await?;

        debug!("Collecting statistics for {} job(s)", jobs.len());

        let out: StatsByJob = self.collect(jobs, &access).await?.into_iter().collect();

        info!("Returning statistics for {} job(s)", out.len());
        Ok(out)
    }

    /// Statistics of the `n + 1` most recently finished jobs
    pub async fn recent_stats(&self, n: usize, cancel: &CancellationToken) -> Result<StatsByJob> {
        Ok(self.recent_stats_ordered(n, cancel).await?.into_iter().collect())
    }

    /// Same as `recent_stats` with the configured window
    pub async fn recent_stats_default(&self, cancel: &CancellationToken) -> Result<StatsByJob> {
        self.recent_stats(self.config.recent_window, cancel).await
    }

    /// Recent statistics as a list, oldest completion first
    pub async fn recent_stats_ordered(
        &self,
        n: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<(String, StatisticSet)>> {
        debug!("Retrieving last {} stats", n);

        let access = self.access(cancel);
        let jobs = access.call("job listing", self.jobs.find_all()).await?;
        let recent = self.selector.select(jobs, n);

        self.collect(recent, &access).await
    }

    /// Forget the statistics of a job so the next query recomputes them
    ///
    /// Waits for a computation of the same job that is already running, so
    /// its result cannot land after the invalidation.
    pub async fn invalidate(&self, job_id: Uuid, cancel: &CancellationToken) -> Result<()> {
        let access = self.access(cancel);

        let lock = self.job_lock(job_id).await;
        let result = {
            let _running = lock.lock().await;
            self.clear_statistics(job_id, &access).await
        };
        self.release_job_lock(job_id, lock).await;

        result?;
        info!("Statistics of job {} invalidated", job_id);
        Ok(())
    }

    async fn clear_statistics(&self, job_id: Uuid, access: &StoreAccess) -> Result<()> {
        let Some(mut job) = access.call("job lookup", self.jobs.find_by_id(job_id)).await? else {
            return Err(Error::job_not_found(job_id));
        };

        if job.has_statistics() {
            job.invalidate_statistics();
            access.call("job save", self.jobs.save(&job)).await?;
        }
        Ok(())
    }

    async fn collect(
        &self,
        jobs: Vec<Job>,
        access: &StoreAccess,
    ) -> Result<Vec<(String, StatisticSet)>> {
        let mut out = Vec::with_capacity(jobs.len());

        for job in jobs {
            let job_id = job.id();
            match self.ensure_statistics(job, access).await {
                Ok(stats) => out.push((job_id.to_string(), stats)),
                Err(e) if e.aborts_aggregate() => return Err(e),
                Err(e) => debug!("Omitting job {} from statistics: {}", job_id, e),
            }
        }

        Ok(out)
    }

    async fn ensure_statistics(&self, job: Job, access: &StoreAccess) -> Result<StatisticSet> {
        if let Some(stats) = job.statistics() {
            return Ok(stats.clone());
        }

        let job_id = job.id();
        let lock = self.job_lock(job_id).await;
        let result = {
            let _running = lock.lock().await;
            self.compute_and_save(job_id, access).await
        };
        self.release_job_lock(job_id, lock).await;

        result
    }

    async fn compute_and_save(&self, job_id: Uuid, access: &StoreAccess) -> Result<StatisticSet> {
        // Reload under the lock: a caller we waited on may have saved a result.
        let Some(mut job) = access.call("job lookup", self.jobs.find_by_id(job_id)).await? else {
            return Err(Error::job_not_found(job_id));
        };
        if let Some(stats) = job.statistics() {
            return Ok(stats.clone());
        }

        let stats = job
            .compute_statistics(self.statistics.as_ref(), self.workflows.as_ref(), access)
            .await?
            .clone();
        access.call("job save", self.jobs.save(&job)).await?;

        info!("Computed {} statistic(s) for job {}", stats.len(), job_id);
        Ok(stats)
    }

    async fn job_lock(&self, job_id: Uuid) -> Arc<Mutex<()>> {
        self.in_flight
            .lock()
            .await
            .entry(job_id)
            .or_default()
            .clone()
    }

    /// Drop the map entry once no other caller holds or waits on the lock
    async fn release_job_lock(&self, job_id: Uuid, lock: Arc<Mutex<()>>) {
        let mut in_flight = self.in_flight.lock().await;
        let last_user = Arc::strong_count(&lock) == 2
            && in_flight
                .get(&job_id)
                .is_some_and(|entry| Arc::ptr_eq(entry, &lock));
        if last_user {
            in_flight.remove(&job_id);
        }
    }
}
