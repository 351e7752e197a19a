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
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::process;
use tracing::Level;
use wxagent::dashboard::Dashboard;

const DEFAULT_LOG_LEVEL: Level = Level::INFO;
const DEFAULT_METRICS_DIR: &str = "metrics";
const DEFAULT_OUTPUT_DIR: &str = "dashboard";

/// Generate the metrics dashboard from the recorded event logs and print
/// the absolute path of the composed HTML document.
#[derive(Debug, Parser)]
#[clap(name = "wxagent_report", version = clap::crate_version!())]
struct WxAgentReportApplication {
    /// Directory containing the CSV event logs
    #[clap(long, default_value = DEFAULT_METRICS_DIR)]
    metrics_dir: PathBuf,

    /// Output directory for the charts and the dashboard page
    #[clap(long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Logging verbosity. Allowed values are 'trace', 'debug', 'info', 'warn', and 'error'
    /// (case insensitive)
    #[clap(long, default_value_t = DEFAULT_LOG_LEVEL)]
    log_level: Level,
}

fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let opts = WxAgentReportApplication::parse();
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(opts.log_level)
            .finish(),
    )
    .expect("failed to set tracing subscriber");

    let dashboard = Dashboard::new(&opts.metrics_dir, &opts.output_dir);
    let document = dashboard.generate().unwrap_or_else(|e| {
        tracing::error!(message = "dashboard generation failed", error = %e);
        process::exit(1)
    });

    let absolute = fs::canonicalize(&document).unwrap_or(document);
    println!("{}", absolute.display());
    Ok(())
}
