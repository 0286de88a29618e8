use std::fmt;

use stock_core::{ListingDetail, ListingId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchProgress {
    pub listing_id: ListingId,
    /// Fetches finished so far, including this one.
    pub completed: usize,
    pub total: usize,
    pub succeeded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Listing enumeration finished; `total` detail fetches follow.
    FetchStarted { total: usize },
    ListingFetched(FetchProgress),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedListing {
    pub listing_id: ListingId,
    pub detail: ListingDetail,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("listing {listing_id}: {kind}: {message}")]
pub struct FetchError {
    pub listing_id: ListingId,
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(listing_id: ListingId, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            listing_id,
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    HttpStatus(u16),
    Timeout,
    Malformed,
    NotLoggedIn,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Malformed => write!(f, "malformed listing page"),
            FailureKind::NotLoggedIn => write!(f, "session no longer logged in"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
