use anyhow::Context;
use argus_runner::{
    ArgusConfig, CsvMeasurementSource, DriverStop, Pipeline, TickDriver, http, load_config,
    load_default_config,
};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;

/// Streaming forecast, anomaly and drift pipeline for sensor time series
#[derive(Parser, Debug)]
#[command(name = "argus", version, about)]
struct Args {
    /// JSON configuration file (embedded defaults when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// HTTP bind address, overrides the config
    #[arg(long)]
    bind: Option<String>,

    /// Seconds between ticks, overrides the config
    #[arg(long)]
    interval: Option<u64>,

    /// Stop after this many driven ticks
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Run without the HTTP server
    #[arg(long)]
    no_http: bool,
}

fn resolve_config(args: &Args) -> anyhow::Result<ArgusConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => load_default_config()?,
    };
    if let Some(bind) = &args.bind {
        config.http.bind = bind.clone();
    }
    if let Some(interval) = args.interval {
        config.tick_interval_secs = interval;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = resolve_config(&args)?;

    let source = CsvMeasurementSource::open(&config.source)
        .with_context(|| format!("opening {}", config.source.path.display()))?;
    let interval = Duration::from_secs(config.tick_interval_secs);
    let bind = config.http.bind.clone();

    let pipeline = Arc::new(Pipeline::new(config, Arc::new(source), Handle::current())?);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let server = if args.no_http {
        None
    } else {
        let listener = tokio::net::TcpListener::bind(&bind)
            .await
            .with_context(|| format!("binding {bind}"))?;
        let mut rx = shutdown_rx.clone();
        let shutdown = async move {
            let _ = rx.wait_for(|stop| *stop).await;
        };
        Some(tokio::spawn(http::serve(listener, pipeline.clone(), shutdown)))
    };

    let driver = TickDriver::new(pipeline.clone(), interval).with_max_ticks(args.max_ticks);
    let mut driver = tokio::spawn(driver.run(shutdown_rx));

    let stop = tokio::select! {
        result = &mut driver => Some(result),
        _ = tokio::signal::ctrl_c() => {
            log::info!("Ctrl-C received, shutting down");
            None
        }
    };
    let _ = shutdown_tx.send(true);

    let stop = match stop {
        Some(result) => result,
        None => driver.await,
    };
    match stop {
        Ok(Ok(DriverStop::EndOfData { ticks })) => {
            log::info!("Source exhausted after {ticks} ticks")
        }
        Ok(Ok(reason)) => log::info!("Driver stopped: {:?}", reason),
        Ok(Err(e)) => log::error!("Driver failed: {}", e),
        Err(e) => log::error!("Driver task panicked: {}", e),
    }

    http::finish(server, &pipeline).await
}
