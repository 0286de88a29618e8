mod cli;
mod config;
mod login;
mod progress;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use console::style;
use dialoguer::Input;
use log::LevelFilter;
use stock_engine::{
    build_report, ensure_output_dir, workbook_filename, write_workbook, CredentialCache,
    HttpConnector, MarketplaceSession, SessionManager, SessionOrigin,
};
use stock_logging::{stock_error, stock_info, LogDestination};

use crate::cli::Cli;
use crate::config::{AppPaths, RunConfig, BASE_URL_ENV};
use crate::login::CookiePrompt;
use crate::progress::TerminalProgress;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            stock_error!("{:#}", err);
            eprintln!("{} {:#}", style("エラー:").red().bold(), err);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let paths = AppPaths::resolve();
    paths
        .ensure()
        .with_context(|| format!("failed to create app directory {:?}", paths.app_dir))?;
    let (destination, level) = if cli.verbose {
        (LogDestination::Both, LevelFilter::Debug)
    } else {
        (LogDestination::File, LevelFilter::Info)
    };
    stock_logging::initialize(destination, &paths.log_dir, level);
    stock_info!("Starting auction-stock {}", env!("CARGO_PKG_VERSION"));

    let username = match cli.username.clone() {
        Some(name) => name,
        None => prompt_username()?,
    };
    if username.trim().is_empty() {
        bail!("ユーザー名が空です");
    }

    let base_url = std::env::var(BASE_URL_ENV).ok();
    let config = RunConfig::new(cli, username, &paths, base_url);
    stock_info!(
        "User {}, cookie cache {:?}, cost rate {}, workers {}",
        config.username,
        config.cookie_file(),
        config.cost_rate,
        config.fetch.workers
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(generate_report(&config))
}

fn prompt_username() -> Result<String> {
    let name: String = Input::new()
        .with_prompt("ユーザー名を入力してください")
        .interact_text()
        .context("failed to read user name")?;
    Ok(name.trim().to_string())
}

async fn generate_report(config: &RunConfig) -> Result<()> {
    ensure_output_dir(&config.output_dir)
        .with_context(|| format!("output directory {:?} is not usable", config.output_dir))?;

    println!("ログイン情報を確認しています...");
    let connector = HttpConnector::new(config.marketplace.clone());
    let login = CookiePrompt::new(config.marketplace.login_url.clone());
    let manager = SessionManager::new(connector, login);
    let cache = CredentialCache::new(config.cookie_file());
    let obtained = manager
        .obtain_session(&cache)
        .await
        .context("ログインに失敗しました")?;
    if obtained.origin == SessionOrigin::FreshLogin {
        println!("ログイン情報を {:?} に保存しました", cache.path());
    }

    let path = report_to_workbook(
        Arc::new(obtained.session),
        config,
        Arc::new(TerminalProgress::new()),
    )
    .await?;
    println!("{}を作成しました", style(path.display()).green());

    if config.open_xlsx {
        if let Err(err) = open::that(&path) {
            stock_error!("Could not open {:?}: {}", path, err);
            eprintln!("{:?} を開けませんでした: {}", path, err);
        }
    }
    Ok(())
}

/// Fetch every listing and save the workbook. Nothing is written unless all
/// fetches succeeded.
async fn report_to_workbook<S>(
    session: Arc<S>,
    config: &RunConfig,
    progress: Arc<TerminalProgress>,
) -> Result<PathBuf>
where
    S: MarketplaceSession + 'static,
{
    let result = build_report(session, &config.fetch, config.cost_rate, progress.clone()).await;
    progress.finish();
    let table = result.context("商品情報の取得に失敗しました")?;

    println!("ワークブックを作成しています...");
    let filename = workbook_filename(&config.username, chrono::Local::now().date_naive());
    write_workbook(&table, &config.output_dir, &filename)
        .context("ワークブックの保存に失敗しました")
}
