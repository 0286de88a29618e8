//! Auction stock core: pure listing parsing and report aggregation.
mod listing;
mod record;
mod report;

pub use listing::{ListingDetail, ListingId};
pub use record::{parse_listing, CostRate, InvalidCostRate, Pricing, Record, CURRENCY_MARKER};
pub use report::{aggregate, CellValue, Column, ColumnSpec, ReportBuilder, ReportTable, TotalRule};
