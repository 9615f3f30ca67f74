//! Upload session state machine: key entry → upload → confirm → processing → results.
//!
//! Each state carries only the data that is legal in that step, so a session
//! cannot be confirmed without a selected file or show results without a key.

use thiserror::Error;

use crate::{CompressionInfo, SourceDocument};

pub const INVALID_FILE_MESSAGE: &str = "Please select a valid PDF file.";
pub const TIMEOUT_MESSAGE: &str = "Processing failed: the request timed out. Please try again.";

/// Highest value the cosmetic animation reaches before the real result.
const ANIMATION_CAP: u8 = 90;
/// Exclusive upper bound of one animation increment.
const ANIMATION_STEP: u8 = 10;

/// Which screen the session is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    ApiKey,
    Upload,
    Confirm,
    Processing,
    Results,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Step::ApiKey => "api-key",
            Step::Upload => "upload",
            Step::Confirm => "confirm",
            Step::Processing => "processing",
            Step::Results => "results",
        };
        f.write_str(name)
    }
}

/// Cosmetic progress shown while a request is in flight.
///
/// Advances by random steps toward 90 and only reaches 100 via
/// [`complete`](ProgressAnimation::complete).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressAnimation {
    percent: u8,
}

impl ProgressAnimation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }

    /// Advance by a random amount in `0..10`, never past 90.
    pub fn tick(&mut self) -> u8 {
        self.tick_with(&mut fastrand::Rng::new())
    }

    pub fn tick_with(&mut self, rng: &mut fastrand::Rng) -> u8 {
        if self.percent < ANIMATION_CAP {
            let step = rng.u8(0..ANIMATION_STEP);
            self.percent = (self.percent + step).min(ANIMATION_CAP);
        }
        self.percent
    }

    pub fn complete(&mut self) {
        self.percent = 100;
    }
}

#[derive(Debug, Default)]
pub enum SessionState {
    #[default]
    ApiKey,
    Upload {
        api_key: String,
        /// Error from the previous attempt, shown on the upload screen.
        last_error: Option<String>,
    },
    Confirm {
        api_key: String,
        file: SourceDocument,
        compression: Option<CompressionInfo>,
    },
    Processing {
        api_key: String,
        file: SourceDocument,
        progress: ProgressAnimation,
    },
    Results {
        api_key: String,
        file_name: String,
        summary: String,
    },
}

#[derive(Debug)]
pub enum SessionEvent {
    KeyValidated {
        api_key: String,
    },
    FileSelected {
        file: SourceDocument,
        compression: Option<CompressionInfo>,
    },
    Confirmed,
    Completed {
        summary: String,
    },
    Failed {
        error: String,
    },
    TimedOut,
    AnalyzeAnother,
    ChangeKey,
}

impl SessionEvent {
    fn name(&self) -> &'static str {
        match self {
            SessionEvent::KeyValidated { .. } => "key-validated",
            SessionEvent::FileSelected { .. } => "file-selected",
            SessionEvent::Confirmed => "confirmed",
            SessionEvent::Completed { .. } => "completed",
            SessionEvent::Failed { .. } => "failed",
            SessionEvent::TimedOut => "timed-out",
            SessionEvent::AnalyzeAnother => "analyze-another",
            SessionEvent::ChangeKey => "change-key",
        }
    }
}

/// An event that is not legal in the current step. The unchanged state is
/// handed back so the caller can keep going.
#[derive(Debug, Error)]
#[error("cannot apply '{event}' in step '{step}'")]
pub struct InvalidTransition {
    pub step: Step,
    pub event: &'static str,
    pub state: Box<SessionState>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one user action.
    pub fn transition(self, event: SessionEvent) -> Result<Self, InvalidTransition> {
        use SessionEvent as E;
        use SessionState as S;

        let from = self.current_step();
        let event_name = event.name();

        let next = match (self, event) {
            (_, E::ChangeKey) => S::ApiKey,

            (S::ApiKey, E::KeyValidated { api_key }) => S::Upload {
                api_key,
                last_error: None,
            },

            (
                S::Upload { api_key, .. } | S::Confirm { api_key, .. },
                E::FileSelected { file, compression },
            ) => select_file(api_key, file, compression),

            (S::Confirm { api_key, file, .. }, E::Confirmed) => S::Processing {
                api_key,
                file,
                progress: ProgressAnimation::new(),
            },

            (S::Processing { api_key, file, .. }, E::Completed { summary }) => S::Results {
                api_key,
                file_name: file.original_filename().to_string(),
                summary,
            },

            (S::Processing { api_key, .. }, E::Failed { error }) => S::Upload {
                api_key,
                last_error: Some(error),
            },

            (S::Processing { api_key, .. }, E::TimedOut) => S::Upload {
                api_key,
                last_error: Some(TIMEOUT_MESSAGE.to_string()),
            },

            (S::Results { api_key, .. }, E::AnalyzeAnother) => S::Upload {
                api_key,
                last_error: None,
            },

            (state, _) => {
                return Err(InvalidTransition {
                    step: from,
                    event: event_name,
                    state: Box::new(state),
                });
            }
        };

        tracing::debug!(
            from = %from,
            to = %next.current_step(),
            event = event_name,
            "session transition"
        );
        Ok(next)
    }

    pub fn current_step(&self) -> Step {
        match self {
            SessionState::ApiKey => Step::ApiKey,
            SessionState::Upload { .. } => Step::Upload,
            SessionState::Confirm { .. } => Step::Confirm,
            SessionState::Processing { .. } => Step::Processing,
            SessionState::Results { .. } => Step::Results,
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        match self {
            SessionState::ApiKey => None,
            SessionState::Upload { api_key, .. }
            | SessionState::Confirm { api_key, .. }
            | SessionState::Processing { api_key, .. }
            | SessionState::Results { api_key, .. } => Some(api_key),
        }
    }

    pub fn api_key_validated(&self) -> bool {
        self.api_key().is_some()
    }

    pub fn selected_file(&self) -> Option<&SourceDocument> {
        match self {
            SessionState::Confirm { file, .. } | SessionState::Processing { file, .. } => {
                Some(file)
            }
            _ => None,
        }
    }

    pub fn compression_info(&self) -> Option<&CompressionInfo> {
        match self {
            SessionState::Confirm { compression, .. } => compression.as_ref(),
            _ => None,
        }
    }

    pub fn last_error(&self) -> Option<&str> {
        match self {
            SessionState::Upload { last_error, .. } => last_error.as_deref(),
            _ => None,
        }
    }

    pub fn progress_mut(&mut self) -> Option<&mut ProgressAnimation> {
        match self {
            SessionState::Processing { progress, .. } => Some(progress),
            _ => None,
        }
    }

    pub fn summary(&self) -> Option<&str> {
        match self {
            SessionState::Results { summary, .. } => Some(summary),
            _ => None,
        }
    }
}

fn select_file(
    api_key: String,
    file: SourceDocument,
    compression: Option<CompressionInfo>,
) -> SessionState {
    if file.is_pdf_upload() {
        SessionState::Confirm {
            api_key,
            file,
            compression,
        }
    } else {
        SessionState::Upload {
            api_key,
            last_error: Some(INVALID_FILE_MESSAGE.to_string()),
        }
    }
}
