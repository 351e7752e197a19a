// wxagent - conversational weather service with an operational metrics dashboard
//
// Copyright 2024 the wxagent authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

use clap::Parser;
use reqwest::Client;
use std::error::Error;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{self, SignalKind};
use tracing::Level;
use wxagent::agent::WeatherAgent;
use wxagent::client::{WeatherClient, DEFAULT_FORECAST_URL, DEFAULT_GEOCODING_URL};
use wxagent::http::{self, AppContext};
use wxagent::store::EventStore;

const DEFAULT_LOG_LEVEL: Level = Level::INFO;
const DEFAULT_BIND_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 8000);
const DEFAULT_TIMEOUT_MILLIS: u64 = 8000;
const DEFAULT_METRICS_DIR: &str = "metrics";
const DEFAULT_DASHBOARD_DIR: &str = "dashboard";

#[derive(Debug, Parser)]
#[clap(name = "wxagent", version = clap::crate_version!())]
struct WxAgentApplication {
    /// Directory the event logs are written to
    #[clap(long, default_value = DEFAULT_METRICS_DIR)]
    metrics_dir: PathBuf,

    /// Default output directory for generated dashboards
    #[clap(long, default_value = DEFAULT_DASHBOARD_DIR)]
    dashboard_dir: PathBuf,

    /// Base URL for the Open-Meteo geocoding API
    #[clap(long, default_value_t = DEFAULT_GEOCODING_URL.into())]
    geocoding_url: String,

    /// Base URL for the Open-Meteo forecast API
    #[clap(long, default_value_t = DEFAULT_FORECAST_URL.into())]
    forecast_url: String,

    /// Timeout for weather lookups, in milliseconds.
    #[clap(long, default_value_t = DEFAULT_TIMEOUT_MILLIS)]
    timeout_millis: u64,

    /// Logging verbosity. Allowed values are 'trace', 'debug', 'info', 'warn', and 'error'
    /// (case insensitive)
    #[clap(long, default_value_t = DEFAULT_LOG_LEVEL)]
    log_level: Level,

    /// Address to bind to
    #[clap(long, default_value_t = DEFAULT_BIND_ADDR.into())]
    bind: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let opts = WxAgentApplication::parse();
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(opts.log_level)
            .finish(),
    )
    .expect("failed to set tracing subscriber");

    let timeout = Duration::from_millis(opts.timeout_millis);
    let http_client = Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
        tracing::error!(message = "unable to initialize HTTP client", error = %e);
        process::exit(1)
    });

    let store = EventStore::new(&opts.metrics_dir).unwrap_or_else(|e| {
        tracing::error!(message = "unable to open event store", error = %e);
        process::exit(1)
    });

    let client = WeatherClient::new(http_client, &opts.geocoding_url, &opts.forecast_url);
    let context = Arc::new(AppContext {
        store,
        agent: WeatherAgent::new(client),
        dashboard_dir: opts.dashboard_dir.clone(),
    });
    let app = http::router(context);

    let server = axum::Server::try_bind(&opts.bind).unwrap_or_else(|e| {
        tracing::error!(message = "error binding to address", address = %opts.bind, error = %e);
        process::exit(1)
    });

    tracing::info!(
        message = "server started",
        address = %opts.bind,
        metrics_dir = %opts.metrics_dir.display(),
    );
    server
        .serve(app.into_make_service())
        .with_graceful_shutdown(async {
            // Wait for either SIGTERM or SIGINT to shutdown
            tokio::select! {
                _ = sigterm() => {}
                _ = sigint() => {}
            }
        })
        .await?;

    tracing::info!("server shutdown");
    Ok(())
}

/// Return after the first SIGTERM signal received by this process
async fn sigterm() -> io::Result<()> {
    unix::signal(SignalKind::terminate())?.recv().await;
    Ok(())
}

/// Return after the first SIGINT signal received by this process
async fn sigint() -> io::Result<()> {
    unix::signal(SignalKind::interrupt())?.recv().await;
    Ok(())
}
