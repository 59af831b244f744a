/// Crawl phase definitions for the dispatcher's lifecycle
///
/// Feeding and draining overlap in time; `Feeding` means identifiers are still
/// being enqueued (records are drained concurrently), `Draining` means every
/// identifier has been enqueued and only completions remain outstanding.
use crate::SanError;
use std::fmt;

/// Represents the current phase of one crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Workers not yet started
    Idle,

    /// Identifiers are being fed into the task queue
    Feeding,

    /// All identifiers fed; waiting for outstanding units to finish
    Draining,

    /// Stop signal broadcast; waiting for workers to exit
    Stopping,

    /// Terminal; the result set has been handed back
    Done,
}

impl CrawlPhase {
    /// Checks whether moving to `to` is a legal transition
    ///
    /// `Feeding` and `Draining` may jump straight to `Stopping` when a
    /// deadline expires or every worker has exited.
    pub fn can_transition_to(&self, to: CrawlPhase) -> bool {
        matches!(
            (self, to),
            (Self::Idle, Self::Feeding)
                | (Self::Feeding, Self::Draining)
                | (Self::Feeding, Self::Stopping)
                | (Self::Draining, Self::Stopping)
                | (Self::Stopping, Self::Done)
        )
    }

    /// Returns the next phase, or an error if the transition is illegal
    pub fn transition(self, to: CrawlPhase) -> Result<CrawlPhase, SanError> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(SanError::InvalidTransition { from: self, to })
        }
    }

    /// Short lowercase name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Feeding => "feeding",
            Self::Draining => "draining",
            Self::Stopping => "stopping",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
