use async_trait::async_trait;
use std::time::Duration;

use crate::state::Feedback;

pub const SIMULATED_FEEDBACK_DELAY: Duration = Duration::from_millis(500);

/// Where message ratings go. Swap the implementation to record ratings
/// somewhere real; the conversation state machine does not change.
#[async_trait]
pub trait FeedbackSink: Send + Sync {
    async fn record(&self, index: usize, feedback: Feedback) -> anyhow::Result<()>;
}

/// Stand-in until a feedback API exists: waits, then reports success.
#[derive(Debug, Clone)]
pub struct SimulatedFeedback {
    delay: Duration,
}

impl SimulatedFeedback {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for SimulatedFeedback {
    fn default() -> Self {
        Self::new(SIMULATED_FEEDBACK_DELAY)
    }
}

#[async_trait]
impl FeedbackSink for SimulatedFeedback {
    async fn record(&self, index: usize, feedback: Feedback) -> anyhow::Result<()> {
        tokio::time::sleep(self.delay).await;
        log::info!("Feedback for message {}: {}", index, feedback.as_str());
        Ok(())
    }
}
