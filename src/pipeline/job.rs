//! Jobs and their lifecycle

use serde::{Deserialize, Serialize};

use crate::storage::TranscriptionRecord;
use crate::MemoscribeError;

/// A request to transcribe one uploaded memo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceMemoJob {
    /// Storage reference of the audio blob, also the record key
    pub storage_path: String,

    /// Owner of the memo
    pub user_id: String,
}

impl VoiceMemoJob {
    pub fn new(storage_path: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            storage_path: storage_path.into(),
            user_id: user_id.into(),
        }
    }
}

/// Lifecycle of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// Accepted, no stage started
    Queued,
    /// Fetching audio from storage
    Downloading,
    /// Waiting on the speech-to-text provider
    Transcribing,
    /// Writing the record
    Saving,
    /// Record saved
    Completed,
    /// A stage failed
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Downloading => "downloading",
            Self::Transcribing => "transcribing",
            Self::Saving => "saving",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether `next` may follow this state
    pub fn can_transition_to(&self, next: JobState) -> bool {
        match (self, next) {
            (Self::Queued, Self::Downloading)
            | (Self::Downloading, Self::Transcribing)
            | (Self::Transcribing, Self::Saving)
            | (Self::Saving, Self::Completed) => true,
            (current, Self::Failed) => !current.is_terminal(),
            _ => false,
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of running one job to a terminal state
#[derive(Debug)]
pub struct JobOutcome {
    pub job: VoiceMemoJob,

    /// Terminal state
    pub state: JobState,

    /// Every state the job passed through, starting with `Queued`
    pub history: Vec<JobState>,

    /// Saved record when completed
    pub record: Option<TranscriptionRecord>,

    /// Stage error when failed
    pub error: Option<MemoscribeError>,
}

impl JobOutcome {
    pub fn is_completed(&self) -> bool {
        self.state == JobState::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions_are_linear() {
        let path = [
            JobState::Queued,
            JobState::Downloading,
            JobState::Transcribing,
            JobState::Saving,
            JobState::Completed,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn stages_cannot_be_skipped_or_reentered() {
        assert!(!JobState::Queued.can_transition_to(JobState::Transcribing));
        assert!(!JobState::Downloading.can_transition_to(JobState::Saving));
        assert!(!JobState::Saving.can_transition_to(JobState::Downloading));
        assert!(!JobState::Completed.can_transition_to(JobState::Downloading));
    }

    #[test]
    fn failed_is_reachable_from_every_non_terminal_state() {
        for state in [
            JobState::Queued,
            JobState::Downloading,
            JobState::Transcribing,
            JobState::Saving,
        ] {
            assert!(state.can_transition_to(JobState::Failed), "{state}");
        }
        assert!(!JobState::Completed.can_transition_to(JobState::Failed));
        assert!(!JobState::Failed.can_transition_to(JobState::Failed));
    }

    #[test]
    fn job_deserializes_from_trigger_payload() {
        let job: VoiceMemoJob =
            serde_json::from_str(r#"{"storage_path":"memo-1.webm","user_id":"u1"}"#).unwrap();
        assert_eq!(job, VoiceMemoJob::new("memo-1.webm", "u1"));
    }
}
