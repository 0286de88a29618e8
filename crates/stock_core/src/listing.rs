use std::fmt;

/// Opaque identifier of one active listing, as issued by the marketplace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListingId(String);

impl ListingId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ListingId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ListingId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Raw per-listing payload returned by the marketplace detail fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingDetail {
    pub title: String,
    pub stock: u32,
    /// Starting price exactly as displayed, e.g. `"12,345 円（税 0 円）"`.
    pub start_price: String,
}
