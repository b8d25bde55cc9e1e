use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use shop_admin::{StockFailurePolicy, SyncOptions};
use shop_admin_firestore::client::DEFAULT_DATABASE;
use tracing::warn;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub firestore: FirestoreSection,
    #[serde(default)]
    pub sync: SyncSection,
    /// Fallback GitHub token when none is saved. Only set from the environment.
    #[serde(skip)]
    pub github_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FirestoreSection {
    pub project_id: Option<String>,
    pub api_key: Option<String>,
    #[serde(default = "default_database")]
    pub database: String,
}

impl Default for FirestoreSection {
    fn default() -> Self {
        Self {
            project_id: None,
            api_key: None,
            database: default_database(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SyncSection {
    /// Restore the previous stock value when a stock update fails.
    #[serde(default)]
    pub rollback_stock_on_failure: bool,
}

impl AppConfig {
    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            stock_failure: if self.sync.rollback_stock_on_failure {
                StockFailurePolicy::Rollback
            } else {
                StockFailurePolicy::Keep
            },
        }
    }

    /// Apply `SHOP_ADMIN_PROJECT_ID`, `SHOP_ADMIN_API_KEY` and `GITHUB_TOKEN`.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let set = |name: &str| var(name).filter(|v| !v.trim().is_empty());

        if let Some(project) = set("SHOP_ADMIN_PROJECT_ID") {
            self.firestore.project_id = Some(project);
        }
        if let Some(key) = set("SHOP_ADMIN_API_KEY") {
            self.firestore.api_key = Some(key);
        }
        self.github_token = set("GITHUB_TOKEN");
    }
}

fn default_database() -> String {
    DEFAULT_DATABASE.into()
}

/// Config file path: `~/.config/shop-admin/config.toml`
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("shop-admin").join("config.toml"))
}

/// Load config from file, falling back to defaults if missing, then apply
/// environment overrides.
pub fn load_config() -> AppConfig {
    let mut config = read_config_file().unwrap_or_default();
    config.apply_env(|name| std::env::var(name).ok());
    config
}

fn read_config_file() -> Option<AppConfig> {
    let path = config_path()?;
    let contents = std::fs::read_to_string(&path).ok()?;
    match toml::from_str::<AppConfig>(&contents) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to parse config, using defaults");
            None
        }
    }
}
