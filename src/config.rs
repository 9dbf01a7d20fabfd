use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::scrapers::{BrowserFetcher, HttpFetcher, PageFetcher};

/// Settings shared by every command. Flags win over environment variables,
/// which may also come from a `.env` file.
#[derive(Debug, Clone, Args)]
pub struct AppConfig {
    /// JSON file holding persisted properties
    #[arg(long = "store", env = "RENT_STORE_PATH", default_value = "data/properties.json", global = true)]
    pub store_path: PathBuf,

    /// User the imported records are attributed to
    #[arg(long, env = "RENT_USER_ID", global = true)]
    pub user_id: Option<i64>,

    #[command(flatten)]
    pub fetch: FetchConfig,
}

/// How listing pages are downloaded
#[derive(Debug, Clone, Args)]
pub struct FetchConfig {
    #[arg(long = "http-timeout", env = "RENT_HTTP_TIMEOUT_SECS", default_value_t = default_timeout_secs(), global = true)]
    pub timeout_secs: u64,

    #[arg(long, env = "RENT_USER_AGENT", default_value_t = default_user_agent(), global = true)]
    pub user_agent: String,

    /// Render pages in headless Chrome instead of plain HTTP
    #[arg(long, env = "RENT_BROWSER", global = true)]
    pub browser: bool,

    /// Seconds to let a rendered page run its scripts before reading it
    #[arg(long = "browser-settle", env = "RENT_BROWSER_SETTLE_SECS", default_value_t = default_settle_secs(), global = true)]
    pub settle_secs: u64,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}
fn default_settle_secs() -> u64 {
    5
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            browser: false,
            settle_secs: default_settle_secs(),
        }
    }
}

impl FetchConfig {
    /// Build the page fetcher selected by this configuration
    pub fn build_fetcher(&self) -> Result<Arc<dyn PageFetcher>> {
        if self.browser {
            info!("Fetching listing pages with headless Chrome");
            Ok(Arc::new(BrowserFetcher::new(Duration::from_secs(self.settle_secs))?))
        } else {
            Ok(Arc::new(HttpFetcher::new(self)?))
        }
    }
}
