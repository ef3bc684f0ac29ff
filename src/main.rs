use clap::Parser;
use component_cms::app;
use component_cms::config::{self, SheetConfig};
use component_cms::tokens::TokenSet;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Design system component CMS backed by a Google Sheets tab
#[derive(Parser)]
#[command(name = "component-cms", version)]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:3000")]
    bind: SocketAddr,

    /// Google Sheets API key
    #[arg(long, env = "CMS_API_KEY", default_value = config::API_KEY_PLACEHOLDER, hide_env_values = true)]
    api_key: String,

    /// Spreadsheet id from the sheet URL
    #[arg(long, env = "CMS_SHEET_ID", default_value = config::SHEET_ID_PLACEHOLDER)]
    sheet_id: String,

    /// Tab name
    #[arg(long, env = "CMS_SHEET_NAME", default_value = config::DEFAULT_SHEET_NAME)]
    sheet_name: String,

    /// Range holding the header and data rows
    #[arg(long, env = "CMS_SHEET_RANGE", default_value = config::DEFAULT_SHEET_RANGE)]
    sheet_range: String,

    #[arg(long, env = "CMS_SHEETS_BASE_URL", default_value = config::DEFAULT_BASE_URL)]
    base_url: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "CMS_TIMEOUT_SECS", default_value_t = config::DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Design token JSON file for /tokens/colors and /tokens/typography
    #[arg(long, env = "CMS_TOKENS_FILE")]
    tokens: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = SheetConfig {
        api_key: cli.api_key,
        sheet_id: cli.sheet_id,
        sheet_name: cli.sheet_name,
        sheet_range: cli.sheet_range,
        base_url: cli.base_url,
        timeout: Duration::from_secs(cli.timeout_secs),
    };

    let tokens = match cli.tokens {
        Some(path) => Some(TokenSet::load(&path)?),
        None => None,
    };

    app::run(config, tokens, cli.bind).await
}
