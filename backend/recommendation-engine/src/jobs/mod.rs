// ============================================
// Training Scheduler (模型重训任务)
// ============================================
//
// Two independent periodic jobs, one per recommender:
// 1. Category model (TF-IDF + k-means)
// 2. Interaction model (co-interaction nearest neighbours)
//
// Each loop awaits its own training run before taking the next tick, so a
// slow run is never re-entered; ticks missed meanwhile are skipped. Failures
// are logged and the loop carries on with the previous model serving.

use crate::config::JobSchedule;
use crate::error::Result;
use crate::models::TrainOutcome;
use crate::services::{CategoryRecommender, InteractionRecommender};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info};

/// A recommender that can be retrained on a schedule
#[async_trait]
pub trait TrainingJob: Send + Sync {
    async fn train(&self) -> Result<TrainOutcome>;

    /// Job name (for logs)
    fn name(&self) -> &str;
}

#[async_trait]
impl TrainingJob for CategoryRecommender {
    async fn train(&self) -> Result<TrainOutcome> {
        CategoryRecommender::train(self).await
    }

    fn name(&self) -> &str {
        "train_category_model"
    }
}

#[async_trait]
impl TrainingJob for InteractionRecommender {
    async fn train(&self) -> Result<TrainOutcome> {
        InteractionRecommender::train(self).await
    }

    fn name(&self) -> &str {
        "train_interaction_model"
    }
}

/// Run one training pass, logging instead of propagating failures.
pub async fn run_training_once(job: &dyn TrainingJob) -> Option<TrainOutcome> {
    match job.train().await {
        Ok(outcome) => {
            info!(job_name = %job.name(), outcome = outcome.as_str(), "Training run finished");
            Some(outcome)
        }
        Err(e) => {
            error!(
                job_name = %job.name(),
                error = %e,
                "Training run failed, previous model keeps serving"
            );
            None
        }
    }
}

/// Periodic loop for a single job; returns once `shutdown` fires.
pub async fn run_training_loop(
    job: Arc<dyn TrainingJob>,
    schedule: JobSchedule,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut timer = interval_at(Instant::now() + schedule.initial_delay, schedule.interval);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        job_name = %job.name(),
        interval_secs = schedule.interval.as_secs(),
        initial_delay_secs = schedule.initial_delay.as_secs(),
        "Starting training loop"
    );

    loop {
        tokio::select! {
            _ = timer.tick() => {
                run_training_once(job.as_ref()).await;
            }
            _ = shutdown.recv() => {
                info!(job_name = %job.name(), "Received shutdown signal, stopping training loop");
                break;
            }
        }
    }

    info!(job_name = %job.name(), "Training loop stopped");
}

/// Owns the two background training loops.
pub struct TrainingScheduler {
    shutdown: broadcast::Sender<()>,
    handles: Vec<JoinHandle<()>>,
}

impl TrainingScheduler {
    pub fn start(
        category: Arc<CategoryRecommender>,
        category_schedule: JobSchedule,
        interaction: Arc<InteractionRecommender>,
        interaction_schedule: JobSchedule,
    ) -> Self {
        let jobs: Vec<(Arc<dyn TrainingJob>, JobSchedule)> = vec![
            (category as Arc<dyn TrainingJob>, category_schedule),
            (interaction as Arc<dyn TrainingJob>, interaction_schedule),
        ];
        Self::spawn(jobs)
    }

    pub fn spawn(jobs: Vec<(Arc<dyn TrainingJob>, JobSchedule)>) -> Self {
        let (shutdown, _) = broadcast::channel(1);
        let handles = jobs
            .into_iter()
            .map(|(job, schedule)| {
                let rx = shutdown.subscribe();
                tokio::spawn(run_training_loop(job, schedule, rx))
            })
            .collect();

        Self { shutdown, handles }
    }

    /// Signal every loop and wait for in-flight runs to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        for handle in self.handles {
            if let Err(e) = handle.await {
                error!(error = %e, "Training loop terminated abnormally");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingJob {
        runs: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl TrainingJob for CountingJob {
        async fn train(&self) -> Result<TrainOutcome> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(AppError::TrainingFailure("malformed data".into()))
            } else {
                Ok(TrainOutcome::Trained)
            }
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    fn schedule(ms: u64) -> JobSchedule {
        JobSchedule {
            interval: Duration::from_millis(ms),
            initial_delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn failing_job_keeps_firing() {
        let job = Arc::new(CountingJob {
            runs: AtomicUsize::new(0),
            fail: true,
        });
        let scheduler =
            TrainingScheduler::spawn(vec![(job.clone() as Arc<dyn TrainingJob>, schedule(10))]);

        tokio::time::sleep(Duration::from_millis(100)).await;
        scheduler.shutdown().await;

        assert!(job.runs.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn run_once_swallows_errors() {
        let job = CountingJob {
            runs: AtomicUsize::new(0),
            fail: true,
        };
        assert_eq!(run_training_once(&job).await, None);
    }

    #[tokio::test]
    async fn jobs_run_independently() {
        let fast = Arc::new(CountingJob {
            runs: AtomicUsize::new(0),
            fail: false,
        });
        let slow = Arc::new(CountingJob {
            runs: AtomicUsize::new(0),
            fail: false,
        });
        let scheduler = TrainingScheduler::spawn(vec![
            (fast.clone() as Arc<dyn TrainingJob>, schedule(10)),
            (
                slow.clone() as Arc<dyn TrainingJob>,
                JobSchedule {
                    interval: Duration::from_secs(3600),
                    initial_delay: Duration::from_secs(3600),
                },
            ),
        ]);

        tokio::time::sleep(Duration::from_millis(80)).await;
        scheduler.shutdown().await;

        assert!(fast.runs.load(Ordering::SeqCst) >= 2);
        assert_eq!(slow.runs.load(Ordering::SeqCst), 0);
    }
}
