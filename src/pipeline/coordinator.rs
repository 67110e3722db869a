//! Download → transcribe → save orchestration

use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::fetch::AudioFetcher;
use crate::pipeline::job::{JobOutcome, JobState, VoiceMemoJob};
use crate::storage::{TranscriptionRecord, TranscriptionRepository};
use crate::transcription::Transcriber;
use crate::MemoscribeError;

/// Runs jobs through the three pipeline stages
pub struct PipelineCoordinator {
    fetcher: AudioFetcher,
    transcriber: Transcriber,
    repository: Arc<TranscriptionRepository>,
}

/// State tracking for a single run
struct JobRun {
    state: JobState,
    history: Vec<JobState>,
}

impl JobRun {
    fn new() -> Self {
        Self {
            state: JobState::Queued,
            history: vec![JobState::Queued],
        }
    }

    fn advance(&mut self, next: JobState, job: &VoiceMemoJob) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        info!("{}: {} -> {}", job.storage_path, self.state, next);
        self.state = next;
        self.history.push(next);
    }
}

impl PipelineCoordinator {
    pub fn new(
        fetcher: AudioFetcher,
        transcriber: Transcriber,
        repository: Arc<TranscriptionRepository>,
    ) -> Self {
        Self {
            fetcher,
            transcriber,
            repository,
        }
    }

    /// Run one job from the start. Failures are reported in the outcome.
    pub async fn run(&self, job: VoiceMemoJob) -> JobOutcome {
        let mut run = JobRun::new();

        match self.execute(&job, &mut run).await {
            Ok(record) => {
                run.advance(JobState::Completed, &job);
                JobOutcome {
                    job,
                    state: run.state,
                    history: run.history,
                    record: Some(record),
                    error: None,
                }
            }
            Err(e) => {
                error!("{} failed while {}: {}", job.storage_path, run.state, e);
                run.advance(JobState::Failed, &job);
                JobOutcome {
                    job,
                    state: run.state,
                    history: run.history,
                    record: None,
                    error: Some(e),
                }
            }
        }
    }

    async fn execute(
        &self,
        job: &VoiceMemoJob,
        run: &mut JobRun,
    ) -> crate::Result<TranscriptionRecord> {
        run.advance(JobState::Downloading, job);
        let payload = self.fetcher.fetch(&job.storage_path).await?;

        run.advance(JobState::Transcribing, job);
        let result = match self.transcriber.transcribe(payload).await {
            Ok(result) => result,
            Err(e) => {
                self.compensate(job, &e).await;
                return Err(e);
            }
        };

        // The repository writes its own failure marker.
        run.advance(JobState::Saving, job);
        self.repository
            .save(&job.storage_path, &job.user_id, &result)
            .await
    }

    async fn compensate(&self, job: &VoiceMemoJob, err: &MemoscribeError) {
        self.repository
            .record_failure(&job.storage_path, &job.user_id, &err.to_string())
            .await;
    }

    /// Run independent jobs concurrently, at most `max_concurrent` at a time.
    ///
    /// Outcomes are returned in input order.
    pub async fn run_all(
        self: &Arc<Self>,
        jobs: Vec<VoiceMemoJob>,
        max_concurrent: usize,
    ) -> Vec<JobOutcome> {
        let permits = Arc::new(Semaphore::new(max_concurrent.max(1)));
        let mut tasks = JoinSet::new();

        for (index, job) in jobs.iter().cloned().enumerate() {
            let coordinator = Arc::clone(self);
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                (index, coordinator.run(job).await)
            });
        }

        let mut slots: Vec<Option<JobOutcome>> = jobs.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(e) => error!("Job task aborted: {}", e),
            }
        }

        slots
            .into_iter()
            .zip(jobs)
            .map(|(slot, job)| {
                slot.unwrap_or_else(|| JobOutcome {
                    job,
                    state: JobState::Failed,
                    history: vec![JobState::Queued, JobState::Failed],
                    record: None,
                    error: Some(MemoscribeError::Other("job task aborted".to_string())),
                })
            })
            .collect()
    }
}
