use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use shop_admin::{AdminContext, ImagePublisher};
use shop_admin_firestore::{AuthClient, AuthConfig, FirestoreConfig, FirestoreStore, Session};
use shop_admin_github::GitHubFileHost;
use shop_admin_store::SettingsStore;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::prompt::PromptingCredentials;

fn data_dir() -> Result<PathBuf> {
    let base = dirs::data_dir().context("could not determine data directory")?;
    let dir = base.join("shop-admin");
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create data directory: {}", dir.display()))?;
    Ok(dir)
}

pub fn open_settings() -> Result<Arc<SettingsStore>> {
    let path = data_dir()?.join("settings.db");
    let store = SettingsStore::open(&path)
        .with_context(|| format!("failed to open settings at {}", path.display()))?;
    Ok(Arc::new(store))
}

pub fn auth_client(config: &AppConfig) -> Result<AuthClient> {
    let api_key = config.firestore.api_key.clone().context(
        "no Firebase API key configured; set firestore.api_key or SHOP_ADMIN_API_KEY",
    )?;
    Ok(AuthClient::new(AuthConfig::new(api_key)))
}

fn firestore_config(config: &AppConfig) -> Result<FirestoreConfig> {
    let project_id = config.firestore.project_id.clone().context(
        "no Firestore project configured; set firestore.project_id or SHOP_ADMIN_PROJECT_ID",
    )?;
    let mut fs = FirestoreConfig::new(project_id);
    fs.database = config.firestore.database.clone();
    fs.api_key = config.firestore.api_key.clone();
    Ok(fs)
}

/// A connected console session.
pub struct App {
    pub config: AppConfig,
    pub settings: Arc<SettingsStore>,
    pub ctx: AdminContext,
}

impl App {
    pub async fn connect(config: AppConfig, settings: Arc<SettingsStore>) -> Result<Self> {
        let store = Arc::new(FirestoreStore::new(firestore_config(&config)?));

        match current_session(&config, &settings).await? {
            Some(session) => {
                debug!(email = %session.email, "using saved session");
                store.set_id_token(Some(session.id_token));
            }
            None => warn!("not signed in; requests are sent without credentials"),
        }

        let ctx = AdminContext::with_options(store, config.sync_options());
        Ok(Self {
            config,
            settings,
            ctx,
        })
    }

    pub fn publisher(&self) -> ImagePublisher {
        let credentials = PromptingCredentials {
            settings: Arc::clone(&self.settings),
            env_token: self.config.github_token.clone(),
        };
        ImagePublisher::new(Arc::new(GitHubFileHost::default()), Arc::new(credentials))
            .with_events(self.ctx.event_sender())
    }
}

/// The saved session, refreshed first when its token has expired.
async fn current_session(
    config: &AppConfig,
    settings: &SettingsStore,
) -> Result<Option<Session>> {
    let Some(session) = settings.load_session::<Session>()? else {
        return Ok(None);
    };
    if !session.is_expired(Utc::now()) {
        return Ok(Some(session));
    }

    let client = auth_client(config)?;
    match client.refresh(&session).await {
        Ok(fresh) => {
            settings.save_session(&fresh)?;
            debug!("session refreshed");
            Ok(Some(fresh))
        }
        Err(e) => {
            warn!(error = %e, "session refresh failed; run `shop-admin login`");
            Ok(None)
        }
    }
}
