//! AuroraX CLI - Command-line interface for the AuroraX search API

use anyhow::{Context, Result};
use aurorax_sdk::{
    abort_channel, AuroraXClient, CancelOutcome, ConjunctionSearch, DataProductSearch,
    EphemerisSearch, HttpConfig, LogEntry, RequestListFilter, SearchJob, SearchKind, SearchOptions,
    SearchType, StatusReport, DEFAULT_BASE_URL,
};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tabled::{Table, Tabled};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "aurorax")]
#[command(about = "AuroraX search API CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// API base URL
    #[arg(long, env = "AURORAX_API_URL", default_value = DEFAULT_BASE_URL)]
    api_url: String,

    /// API key (sent as x-aurorax-api-key)
    #[arg(long, env = "AURORAX_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, env = "AURORAX_API_TIMEOUT_SECS", default_value = "60")]
    timeout_secs: u64,

    /// Seconds between status checks while waiting
    #[arg(long, default_value = "1")]
    poll_interval: u64,

    /// Log polling progress at info level
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Ephemeris,
    DataProducts,
    Conjunctions,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a search from a JSON query file
    Search {
        #[arg(value_enum)]
        kind: Kind,

        /// Path to the query JSON
        #[arg(short, long)]
        query_file: PathBuf,

        /// Print the request URL and return without waiting
        #[arg(long)]
        no_wait: bool,

        /// Write the result rows to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show status of a submitted request
    Status {
        /// Request URL
        request_url: String,
    },

    /// Show logs of a submitted request
    Logs {
        /// Request URL
        request_url: String,
    },

    /// Wait for a request to finish
    Wait {
        /// Request URL
        request_url: String,
    },

    /// Download result rows from a data URL
    Data {
        /// Data URL (`<request_url>/data`)
        data_url: String,

        /// Optional response format JSON
        #[arg(long)]
        format_file: Option<PathBuf>,
    },

    /// Cancel a submitted request
    Cancel {
        /// Request URL
        request_url: String,

        /// Wait until the service settles the cancellation
        #[arg(long)]
        wait: bool,
    },

    /// Show the SQL-like description of a query
    Describe {
        #[arg(value_enum)]
        kind: Kind,

        /// Path to the query JSON
        #[arg(short, long)]
        query_file: PathBuf,
    },

    /// List search requests (administrator key)
    ListRequests {
        /// conjunction, data_product or ephemeris
        #[arg(long)]
        search_type: Option<String>,

        /// Only requests still running
        #[arg(long)]
        active: Option<bool>,
    },

    /// Delete a search request (administrator key)
    DeleteRequest {
        /// Request id
        request_id: String,
    },
}

#[derive(Tabled)]
struct StatusRow {
    completed: bool,
    error: bool,
    results: u64,
    bytes: u64,
    data_location: String,
}

#[derive(Tabled)]
struct LogRow {
    level: String,
    timestamp: String,
    summary: String,
}

#[derive(Tabled)]
struct SubmittedRow {
    kind: String,
    request_id: String,
    request_url: String,
}

fn init_logging(verbose: bool) -> Result<()> {
    let log_format = std::env::var("AURORAX_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
    let default_directive = if verbose { "aurorax=info" } else { "aurorax=warn" };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .context("Failed to create env filter")?;

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn print_status(report: &StatusReport) {
    let s = &report.snapshot;
    let row = StatusRow {
        completed: s.completed,
        error: s.error_condition,
        results: s.result_count,
        bytes: s.result_byte_size,
        data_location: s.data_location.clone().unwrap_or_else(|| "-".to_string()),
    };
    println!("{}", Table::new(vec![row]));

    let headline = if s.has_data() {
        "✓ Data available".green().bold()
    } else if s.error_condition {
        "✗ Search reported an error".red().bold()
    } else {
        "… Still running".yellow().bold()
    };
    println!("{}", headline);
}

fn print_logs(logs: &[LogEntry]) {
    if logs.is_empty() {
        println!("{}", "No logs available".yellow());
        return;
    }
    let rows: Vec<LogRow> = logs
        .iter()
        .map(|l| LogRow {
            level: l.level.clone(),
            timestamp: l.timestamp.clone().unwrap_or_default(),
            summary: l.summary.clone(),
        })
        .collect();
    println!("{}", Table::new(rows));
}

fn write_rows<T: Serialize>(rows: &T, output: Option<&Path>) -> Result<()> {
    let text = serde_json::to_string_pretty(rows)?;
    match output {
        Some(path) => {
            std::fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("{} {}", "✓ Results written to".green().bold(), path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}

async fn run_search<K>(
    client: &AuroraXClient,
    query_file: &Path,
    no_wait: bool,
    output: Option<&Path>,
    options: &SearchOptions,
) -> Result<()>
where
    K: SearchKind,
    K::Query: DeserializeOwned,
    K::Record: Serialize,
{
    let query: K::Query = read_json(query_file)?;
    let mut job: SearchJob<K> = client.job(query);
    info!(kind = K::NAME, query_file = %query_file.display(), "Running search");

    if no_wait {
        job.submit().await.context("Failed to submit search")?;
        info!(request_id = ?job.request_id(), "Search submitted, not waiting");
        println!("{}", "✓ Search submitted".green().bold());
        let row = SubmittedRow {
            kind: K::NAME.to_string(),
            request_id: job.request_id().unwrap_or_default().to_string(),
            request_url: job.request_url().unwrap_or_default().to_string(),
        };
        println!("{}", Table::new(vec![row]));
        return Ok(());
    }

    job.run(options.poll_interval, options.verbose, &options.abort)
        .await
        .context("Search did not complete")?;

    if let Some(status) = job.status() {
        info!(
            request_id = ?job.request_id(),
            result_count = status.result_count,
            "Search finished"
        );
        eprintln!(
            "{} {} results ({} bytes)",
            "✓ Search complete:".green().bold(),
            status.result_count,
            status.result_byte_size
        );
    }

    if job.raw_data().is_empty() {
        write_rows(&job.data(), output)
    } else {
        write_rows(&job.raw_data(), output)
    }
}

async fn run_describe<K>(client: &AuroraXClient, query_file: &Path) -> Result<()>
where
    K: SearchKind,
    K::Query: DeserializeOwned,
{
    let query: K::Query = read_json(query_file)?;
    let description = client.describe::<K>(&query).await?;
    println!("{}", description);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let mut config = HttpConfig::from_env()
        .with_base_url(cli.api_url.clone())
        .with_timeout(Duration::from_secs(cli.timeout_secs));
    if let Some(key) = &cli.api_key {
        config = config.with_api_key(key.clone());
    }
    let client = AuroraXClient::new(config).context("Failed to create client")?;
    info!(api_url = %cli.api_url, "Client ready");

    let (abort_handle, abort) = abort_channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            abort_handle.abort();
        }
    });
    let options = SearchOptions::default()
        .with_poll_interval(Duration::from_secs(cli.poll_interval))
        .verbose(cli.verbose)
        .with_abort(abort);

    match cli.command {
        Commands::Search {
            kind,
            query_file,
            no_wait,
            output,
        } => {
            let output = output.as_deref();
            match kind {
                Kind::Ephemeris => {
                    run_search::<EphemerisSearch>(&client, &query_file, no_wait, output, &options).await?
                }
                Kind::DataProducts => {
                    run_search::<DataProductSearch>(&client, &query_file, no_wait, output, &options).await?
                }
                Kind::Conjunctions => {
                    run_search::<ConjunctionSearch>(&client, &query_file, no_wait, output, &options).await?
                }
            }
        }

        Commands::Status { request_url } => {
            let report = client.get_status(&request_url).await?;
            print_status(&report);
            println!();
            print_logs(&report.logs);
        }

        Commands::Logs { request_url } => {
            let logs = client.get_logs(&request_url).await?;
            println!("{}", format!("Logs for {}:", request_url).cyan().bold());
            print_logs(&logs);
        }

        Commands::Wait { request_url } => {
            let report = client.wait_for_data(&request_url, &options).await?;
            print_status(&report);
        }

        Commands::Data {
            data_url,
            format_file,
        } => {
            let format: Option<Value> = match &format_file {
                Some(path) => Some(read_json(path)?),
                None => None,
            };
            let rows = client.get_data(&data_url, format.as_ref()).await?;
            write_rows(&rows, None)?;
        }

        Commands::Cancel { request_url, wait } => {
            info!(request_url = %request_url, wait, "Cancelling search");
            let outcome = client.cancel(&request_url, wait, &options).await?;
            info!(outcome = ?outcome, "Cancel finished");
            let message = match outcome {
                CancelOutcome::Requested => "✓ Cancellation requested".green().bold(),
                CancelOutcome::Acknowledged => "✓ Search cancelled".green().bold(),
                CancelOutcome::CompletedFirst => "○ Search completed before the cancellation took effect".yellow().bold(),
            };
            println!("{}", message);
        }

        Commands::Describe { kind, query_file } => match kind {
            Kind::Ephemeris => run_describe::<EphemerisSearch>(&client, &query_file).await?,
            Kind::DataProducts => run_describe::<DataProductSearch>(&client, &query_file).await?,
            Kind::Conjunctions => run_describe::<ConjunctionSearch>(&client, &query_file).await?,
        },

        Commands::ListRequests {
            search_type,
            active,
        } => {
            let search_type = search_type
                .as_deref()
                .map(str::parse::<SearchType>)
                .transpose()?;
            let filter = RequestListFilter {
                search_type,
                active,
                ..Default::default()
            };
            let rows = client.list_requests(&filter).await?;
            info!(count = rows.len(), "Listed search requests");
            println!("{}", format!("{} search requests", rows.len()).cyan().bold());
            write_rows(&rows, None)?;
        }

        Commands::DeleteRequest { request_id } => {
            info!(request_id = %request_id, "Deleting request");
            client.delete_request(&request_id).await?;
            println!("{}", format!("✓ Request {} deleted", request_id).green().bold());
        }
    }

    Ok(())
}
