use std::io;
use std::path::{Path, PathBuf};

use stock_core::CostRate;
use stock_engine::{FetchSettings, MarketplaceSettings};

use crate::cli::Cli;

pub const APP_DIR_NAME: &str = "auction-stock";
pub const BASE_URL_ENV: &str = "AUCTION_STOCK_BASE_URL";

/// Per-user application directories, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub app_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl AppPaths {
    pub fn resolve() -> Self {
        match dirs::data_local_dir() {
            Some(data_dir) => Self::under(data_dir.join(APP_DIR_NAME)),
            None => Self::under(PathBuf::from(format!(".{APP_DIR_NAME}"))),
        }
    }

    pub fn under(app_dir: PathBuf) -> Self {
        let log_dir = app_dir.join("logs");
        Self { app_dir, log_dir }
    }

    pub fn ensure(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.app_dir)
    }

    pub fn default_cookie_file(&self, username: &str) -> PathBuf {
        self.app_dir.join(format!("{username}.cookies.json"))
    }
}

/// Everything one report run needs, threaded explicitly through the app.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub username: String,
    pub cookie_file: PathBuf,
    pub cost_rate: CostRate,
    pub open_xlsx: bool,
    pub output_dir: PathBuf,
    pub fetch: FetchSettings,
    pub marketplace: MarketplaceSettings,
}

impl RunConfig {
    pub fn new(cli: Cli, username: String, paths: &AppPaths, base_url: Option<String>) -> Self {
        let cookie_file = cli
            .cookie_file
            .filter(|path| !path.as_os_str().is_empty())
            .unwrap_or_else(|| paths.default_cookie_file(&username));
        let marketplace = base_url
            .filter(|url| !url.trim().is_empty())
            .map(MarketplaceSettings::with_base_url)
            .unwrap_or_default();
        Self {
            username,
            cookie_file,
            cost_rate: cli.cost_rate,
            open_xlsx: cli.open_xlsx,
            output_dir: cli.output_dir,
            fetch: FetchSettings {
                workers: cli.workers,
            },
            marketplace,
        }
    }

    pub fn cookie_file(&self) -> &Path {
        &self.cookie_file
    }
}
