/// Per-identifier outcomes reported by workers on the completion channel
use crate::crawler::FetchError;

/// How processing of one identifier ended
#[derive(Debug)]
pub enum UnitStatus {
    /// Fetched and extracted; every record has been pushed to the result stream
    Extracted { records: usize },

    /// Fetched, but extraction failed; counts as zero records
    ExtractFailed { message: String },

    /// The fetch itself failed; no records were produced
    FetchFailed(FetchError),

    /// The fetcher or extractor panicked; records pushed before the panic are kept
    Panicked { message: String },
}

impl UnitStatus {
    /// Returns true if the document was retrieved
    pub fn is_fetched(&self) -> bool {
        !matches!(self, Self::FetchFailed(_) | Self::Panicked { .. })
    }

    /// Number of records pushed for this unit
    pub fn records(&self) -> usize {
        match self {
            Self::Extracted { records } => *records,
            Self::ExtractFailed { .. } | Self::FetchFailed(_) | Self::Panicked { .. } => 0,
        }
    }
}

/// One finished unit: an identifier and how it ended
#[derive(Debug)]
pub struct UnitOutcome {
    pub identifier: String,
    pub status: UnitStatus,
}

impl UnitOutcome {
    pub fn new(identifier: impl Into<String>, status: UnitStatus) -> Self {
        Self {
            identifier: identifier.into(),
            status,
        }
    }
}
