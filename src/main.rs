// sermon-assist - generation proxy and offline asset cache for the sermon preparation assistant

use anyhow::{anyhow, Result};
use clap::Parser;
use sermon_assist::assets::{
    resolve_url, AssetRequest, CacheManifest, CacheStorage, DiskStorage, FetchSource, HttpFetcher,
    OfflineCache,
};
use sermon_assist::cli::{Args, AssetsAction, Command};
use sermon_assist::client::{append_suggestion, ProxyClient};
use sermon_assist::config::AppConfig;
use sermon_assist::gemini::GeminiClient;
use sermon_assist::proxy::ProxyService;
use sermon_assist::server::create_router;
use sermon_assist::utils::logging;
use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Phase 1: Load configuration (credential included)
    let config = AppConfig::load()?;

    // Phase 2: Initialize logging
    logging::init(&config.logging)?;

    match args.command {
        Command::Serve { port } => serve(config, port).await,
        Command::Assets { action } => assets(config, action).await,
        Command::Passage { reference, proxy } => {
            let client = ProxyClient::new(&proxy)?;
            let passage = client.fetch_passage(&reference).await;
            println!("RVR1960:\n{}\n\nNTV:\n{}", passage.rvr1960, passage.ntv);
            Ok(())
        }
        Command::Suggest(args) => {
            let prompt = args.build_prompt()?;
            let client = ProxyClient::new(&args.proxy)?;
            let suggestion = client.suggest(&prompt).await?;
            println!("{}", append_suggestion(&args.current, &suggestion));
            Ok(())
        }
    }
}

async fn serve(config: AppConfig, port: Option<u16>) -> Result<()> {
    info!("Starting sermon-assist v{}", env!("CARGO_PKG_VERSION"));

    if config.gemini.api_key.is_none() {
        warn!("No API key configured; generation requests will fail until one is set");
    }

    let gemini_client = GeminiClient::new(&config.gemini)?;
    let proxy = ProxyService::new(config.gemini.clone(), Arc::new(gemini_client));

    let app = create_router(&config.server, proxy);
    let port = port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", config.server.host, port).parse()?;

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down gracefully");
    Ok(())
}

async fn assets(config: AppConfig, action: AssetsAction) -> Result<()> {
    let storage = Arc::new(DiskStorage::new(&config.assets.storage_dir));
    let manifest = CacheManifest::from_config(&config)?;
    let cache = OfflineCache::new(manifest, storage.clone(), Arc::new(HttpFetcher::new()?));

    match action {
        AssetsAction::Install => {
            let report = cache.install().await?;
            println!("{}: {} entries", report.cache_name, report.entries);
        }
        AssetsAction::Activate => {
            if !cache.resume_installed().await? {
                return Err(anyhow!(
                    "{} is not fully installed; run `sermon-assist assets install` first",
                    cache.cache_name()
                ));
            }
            let activated = cache.activate().await?;
            println!("activated {}", activated.kept);
            for name in activated.deleted {
                println!("deleted {}", name);
            }
        }
        AssetsAction::Update => {
            let report = cache.install().await?;
            println!("{}: {} entries", report.cache_name, report.entries);
            let activated = cache.activate().await?;
            for name in activated.deleted {
                println!("deleted {}", name);
            }
        }
        AssetsAction::Fetch { url } => {
            let url = resolve_url(&config.assets.origin, &url)?;
            let outcome = cache.handle_fetch(&AssetRequest::get(url)).await?;
            let source = match outcome.source {
                FetchSource::Cache => "cache",
                FetchSource::Network => "network",
            };
            eprintln!(
                "{} {} {} ({})",
                outcome.response.status,
                outcome.response.url,
                outcome.response.header("content-type").unwrap_or("-"),
                source
            );
            std::io::stdout().write_all(&outcome.response.body)?;
        }
        AssetsAction::List => {
            for name in storage.keys().await? {
                let marker = if name == cache.cache_name() { "*" } else { " " };
                println!("{} {} ({} entries)", marker, name, storage.len(&name).await?);
            }
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
