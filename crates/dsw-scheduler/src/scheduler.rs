use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::calendar::MarketCalendar;

/// A named unit of work the scheduler runs on every tick (§4.8). Mirrors the
/// teacher's heartbeat-task shape, generalized from a single hardcoded
/// background task to a registered, named, ordered list.
#[async_trait]
pub trait Job: Send + Sync {
    fn name(&self) -> &str;
    async fn run(&self) -> anyhow::Result<()>;
}

/// Holds the job registry and the market calendar gate (§4.8). Jobs run in
/// registration order; a single job's failure is logged and never aborts
/// the tick for the remaining jobs (§7 "scheduler-level errors ... log and
/// allow the next tick to retry").
pub struct Scheduler {
    calendar: Arc<dyn MarketCalendar>,
    jobs: Vec<Arc<dyn Job>>,
}

impl Scheduler {
    pub fn new(calendar: Arc<dyn MarketCalendar>) -> Self {
        Self { calendar, jobs: Vec::new() }
    }

    pub fn register(&mut self, job: Arc<dyn Job>) {
        self.jobs.push(job);
    }

    /// Runs every registered job, in order, iff the market is open at `now`.
    /// A closed market is not an error — it's "nothing to do this tick".
    pub async fn run_market_hour_jobs(&self, now: chrono::DateTime<Utc>) -> anyhow::Result<()> {
        if !self.calendar.is_open(now) {
            tracing::debug!("market closed; skipping tick");
            return Ok(());
        }
        self.run_all().await;
        Ok(())
    }

    /// Test-only escape hatch: runs every job regardless of the calendar.
    pub async fn force_run_market_hour_jobs(&self) -> anyhow::Result<()> {
        self.run_all().await;
        Ok(())
    }

    async fn run_all(&self) {
        for job in &self.jobs {
            if let Err(e) = job.run().await {
                tracing::error!(job = job.name(), error = %e, "job failed; continuing to next tick");
            }
        }
    }

    /// Continuous mode (§4.8): re-checks market-open and re-runs jobs every
    /// `polling_interval`; exits when the market closes or `cancel` fires.
    pub async fn run_forever(&self, polling_interval: Duration, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("scheduler cancelled; shutting down");
                    return;
                }
                _ = tokio::time::sleep(polling_interval) => {
                    let now = Utc::now();
                    if !self.calendar.is_open(now) {
                        tracing::info!("market closed; exiting scheduler loop");
                        return;
                    }
                    self.run_all().await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::calendar::AlwaysOpenCalendar;

    use super::*;

    struct CountingJob {
        name: String,
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl Job for CountingJob {
        fn name(&self) -> &str {
            &self.name
        }
        async fn run(&self) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("boom");
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn jobs_run_in_registration_order_when_market_open() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        struct Recorder(String, Arc<std::sync::Mutex<Vec<String>>>);
        #[async_trait]
        impl Job for Recorder {
            fn name(&self) -> &str {
                &self.0
            }
            async fn run(&self) -> anyhow::Result<()> {
                self.1.lock().unwrap().push(self.0.clone());
                Ok(())
            }
        }

        let mut scheduler = Scheduler::new(Arc::new(AlwaysOpenCalendar));
        scheduler.register(Arc::new(Recorder("first".into(), order.clone())));
        scheduler.register(Arc::new(Recorder("second".into(), order.clone())));
        scheduler.force_run_market_hour_jobs().await.unwrap();

        assert_eq!(*order.lock().unwrap(), vec!["first".to_string(), "second".to_string()]);
    }

    #[tokio::test]
    async fn closed_market_skips_all_jobs() {
        struct NeverOpen;
        impl MarketCalendar for NeverOpen {
            fn is_open(&self, _now: chrono::DateTime<Utc>) -> bool {
                false
            }
        }
        let calls = Arc::new(AtomicUsize::new(0));
        let mut scheduler = Scheduler::new(Arc::new(NeverOpen));
        scheduler.register(Arc::new(CountingJob { name: "a".into(), calls: calls.clone(), fail: false }));
        scheduler.run_market_hour_jobs(Utc::now()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn a_failing_job_does_not_block_the_next_job() {
        let calls_a = Arc::new(AtomicUsize::new(0));
        let calls_b = Arc::new(AtomicUsize::new(0));
        let mut scheduler = Scheduler::new(Arc::new(AlwaysOpenCalendar));
        scheduler.register(Arc::new(CountingJob { name: "a".into(), calls: calls_a.clone(), fail: true }));
        scheduler.register(Arc::new(CountingJob { name: "b".into(), calls: calls_b.clone(), fail: false }));
        scheduler.force_run_market_hour_jobs().await.unwrap();
        assert_eq!(calls_a.load(Ordering::SeqCst), 1);
        assert_eq!(calls_b.load(Ordering::SeqCst), 1);
    }
}
