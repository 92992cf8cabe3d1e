use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "folio-cli")]
#[command(about = "Management CLI for the folio edge router", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[arg(short, long, default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check edge router status
    Status,
    /// List cached domain resolutions
    Cache,
    /// Show how a host and path would be routed
    Resolve {
        /// Hostname as sent in the Host header
        host: String,
        /// Request path
        #[arg(default_value = "/")]
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let request = match &cli.command {
        Commands::Status => client.get(format!("{}/admin/status", cli.url)),
        Commands::Cache => client.get(format!("{}/admin/cache", cli.url)),
        Commands::Resolve { host, path } => client
            .get(format!("{}/admin/resolve", cli.url))
            .query(&[("host", host.as_str()), ("path", path.as_str())]),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await?;

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
