mod chart;
mod client;
mod convert;
mod error;
mod models;
mod stats;
mod tools;

use std::time::Duration;

use clap::Parser;
use rmcp::ServiceExt;
use rmcp::transport::stdio;
use tracing_subscriber::EnvFilter;

use crate::client::{CodeforcesClient, HttpClient, LeetCodeClient};
use crate::tools::{CpServer, Settings};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Codeforces origin
    #[arg(long, env = "CODEFORCES_URL", default_value = "https://codeforces.com")]
    codeforces_url: String,
    /// LeetCode origin
    #[arg(long, env = "LEETCODE_URL", default_value = "https://leetcode.com")]
    leetcode_url: String,
    /// Handle used when a tool is called without one
    #[arg(long, env = "DEFAULT_HANDLE")]
    default_handle: Option<String>,
    /// Upstream HTTP timeout in seconds
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,
    /// Number returned by the `validate` tool
    #[arg(long, env = "MY_NUMBER", hide_env_values = true)]
    owner_number: Option<String>,
}

fn validate_base_url(raw: &str) -> Result<String, String> {
    let parsed =
        url::Url::parse(raw).map_err(|e| format!("invalid URL: {e}"))?;

    match parsed.scheme() {
        "http" | "https" => {}
        s => return Err(format!("unsupported scheme '{s}', expected http or https")),
    }

    if parsed.path() != "/" && !parsed.path().is_empty() {
        return Err(format!(
            "base URL must be an origin (no path), got '{}'",
            parsed.path()
        ));
    }
    if parsed.query().is_some() {
        return Err("base URL must not contain a query string".into());
    }
    if parsed.fragment().is_some() {
        return Err("base URL must not contain a fragment".into());
    }
    if !parsed.username().is_empty() || parsed.password().is_some() {
        return Err("base URL must not contain credentials".into());
    }

    let s = parsed.as_str().trim_end_matches('/');
    Ok(s.to_owned())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let (codeforces_url, leetcode_url) = match (
        validate_base_url(&cli.codeforces_url),
        validate_base_url(&cli.leetcode_url),
    ) {
        (Ok(cf), Ok(lc)) => (cf, lc),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("codeforces: {codeforces_url}");
    tracing::info!("leetcode: {leetcode_url}");
    match &cli.default_handle {
        Some(h) => tracing::info!("default handle: {h}"),
        None => tracing::info!("default handle: not configured"),
    }
    if cli.owner_number.is_some() {
        tracing::info!("owner number: configured");
    }

    let http = HttpClient::new(Duration::from_secs(cli.timeout_secs))?;
    let server = CpServer::new(
        CodeforcesClient::new(http.clone(), codeforces_url),
        LeetCodeClient::new(http, leetcode_url),
        Settings {
            default_handle: cli.default_handle,
            owner_number: cli.owner_number,
        },
    );

    let service = server.serve(stdio()).await?;
    service.waiting().await?;

    tracing::info!("server shut down");
    Ok(())
}
