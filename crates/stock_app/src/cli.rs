use std::path::PathBuf;

use clap::Parser;
use stock_core::CostRate;

/// ヤフオク!在庫表作成アプリ: builds a stock sheet of your active listings.
#[derive(Debug, Parser)]
#[command(name = "auction-stock", version, about)]
pub struct Cli {
    /// Marketplace user name (prompted for when omitted).
    #[arg(short, long)]
    pub username: Option<String>,

    /// Path of the cookie cache; defaults to a per-user file in the app directory.
    #[arg(short = 'c', long = "cookiefile")]
    pub cookie_file: Option<PathBuf>,

    /// Procurement cost as a fraction of the starting price.
    #[arg(long = "costrate", default_value_t = CostRate::DEFAULT)]
    pub cost_rate: CostRate,

    /// Open the workbook once it has been created.
    #[arg(long = "open-xlsx")]
    pub open_xlsx: bool,

    /// Number of listing pages fetched concurrently.
    #[arg(short, long, default_value_t = stock_engine::FetchSettings::default().workers)]
    pub workers: usize,

    /// Directory the workbook is written to.
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Log debug details to the terminal.
    #[arg(short, long)]
    pub verbose: bool,
}
