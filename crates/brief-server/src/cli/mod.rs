pub mod generate;
pub mod list;
pub mod status;
pub mod validate;

use brief_core::StoreBackend;
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "brief")]
#[command(version, about = "Research briefs from a list of URLs")]
pub struct Cli {
    /// Path to brief.toml
    #[arg(long, global = true, env = "BRIEF_CONFIG", default_value = "brief.toml")]
    pub config: PathBuf,

    /// Path to data directory (overrides config file)
    #[arg(long, global = true, env = "BRIEF_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Storage backend: memory, file or redb (overrides config file)
    #[arg(long, global = true, env = "BRIEF_STORE")]
    pub store: Option<StoreBackend>,

    /// Model name sent to the completion endpoint
    #[arg(long, global = true, env = "BRIEF_LLM_MODEL")]
    pub model: Option<String>,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, global = true, env = "BRIEF_LLM_BASE_URL")]
    pub llm_base_url: Option<String>,

    /// Serve offline mock briefs when no API key is set
    #[arg(long, global = true, env = "BRIEF_MOCK_FALLBACK")]
    pub mock_fallback: Option<bool>,

    /// Groq API key
    #[arg(long, global = true, env = "GROQ_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Generate one brief and print it as JSON
    Generate(GenerateArgs),
    /// Check a brief JSON file against the schema
    Validate(ValidateArgs),
    /// Print the health report
    Status,
    /// List stored briefs
    List(ListArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// HTTP listen address (overrides config file)
    #[arg(long, env = "BRIEF_HTTP_ADDR")]
    pub http_addr: Option<SocketAddr>,
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Source URLs
    #[arg(required = true)]
    pub urls: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// JSON file holding one brief
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only briefs that have been saved
    #[arg(long)]
    pub saved: bool,

    /// Number of recent briefs to show (ignored with --saved)
    #[arg(long, default_value = "5")]
    pub limit: usize,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else if max == 0 {
        String::new()
    } else {
        format!("{}…", s.chars().take(max - 1).collect::<String>())
    }
}
