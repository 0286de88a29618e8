//! Auction stock engine: sessions, concurrent listing fetches and report output.
mod credentials;
mod decode;
mod fetch;
mod http;
mod marketplace;
mod persist;
mod report;
mod session;
mod types;
mod workbook;

pub use credentials::{CacheError, CredentialBundle, CredentialCache};
pub use decode::{decode_html, DecodeError, DecodedHtml};
pub use fetch::{fetch_all, FetchResults, FetchSettings, ProgressSink};
pub use http::{HttpConnector, HttpMarketplace, MarketplaceSettings};
pub use marketplace::{MarketplaceError, MarketplaceSession, SessionConnector};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use report::{build_report, collect_report, ReportError};
pub use session::{LoginError, LoginProvider, ObtainedSession, SessionError, SessionManager, SessionOrigin};
pub use types::{EngineEvent, FailureKind, FetchError, FetchProgress, FetchedListing};
pub use workbook::{render_workbook, workbook_filename, write_workbook, WorkbookError};
