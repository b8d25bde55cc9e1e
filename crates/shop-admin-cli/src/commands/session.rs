use anyhow::{Context, Result};
use shop_admin_firestore::Session;
use shop_admin_store::SettingsStore;

use crate::app::auth_client;
use crate::config::AppConfig;
use crate::prompt::ask;

pub async fn login(
    config: &AppConfig,
    settings: &SettingsStore,
    email: Option<String>,
) -> Result<()> {
    let client = auth_client(config)?;

    let email = match email {
        Some(email) => email,
        None => ask("Email: ".into()).await.context("no email given")?,
    };
    let password = ask("Password: ".into()).await.context("no password given")?;

    let session = client
        .sign_in(&email, &password)
        .await
        .context("sign-in failed")?;
    settings.save_session(&session)?;
    println!("Signed in as {}", session.email);
    Ok(())
}

pub fn logout(settings: &SettingsStore) -> Result<()> {
    match settings.load_session::<Session>() {
        Ok(Some(session)) => println!("Signed out {}", session.email),
        _ => println!("Signed out"),
    }
    settings.clear_session()?;
    Ok(())
}
