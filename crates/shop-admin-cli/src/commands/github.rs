use std::sync::Arc;

use anyhow::{Result, bail};
use clap::Subcommand;
use shop_admin::ImagePublisher;
use shop_admin_github::GitHubFileHost;
use shop_admin_store::{CredentialUpdate, SettingsStore};

#[derive(Subcommand)]
pub enum GithubAction {
    /// Save credentials for image uploads. Omitted fields keep their value.
    Set {
        #[arg(long)]
        token: Option<String>,
        #[arg(long)]
        owner: Option<String>,
        #[arg(long)]
        repo: Option<String>,
        #[arg(long)]
        branch: Option<String>,
    },
    /// Show the saved credentials with the token masked
    Show,
    /// Forget the saved credentials
    Clear,
    /// Verify the saved credentials can reach the repository
    Check,
}

pub async fn run(settings: Arc<SettingsStore>, action: GithubAction) -> Result<()> {
    match action {
        GithubAction::Set {
            token,
            owner,
            repo,
            branch,
        } => {
            settings.update_credentials(&CredentialUpdate {
                token,
                owner,
                repo,
                branch,
            })?;
            match settings.load_credentials()? {
                Some(creds) => println!("Saved credentials for {}", creds.target()),
                None => eprintln!("Saved. Token, owner and repo are all needed before uploading."),
            }
        }
        GithubAction::Show => match settings.load_credentials()? {
            Some(creds) => {
                println!("repository  {}/{}", creds.owner, creds.repo);
                println!("branch      {}", creds.branch);
                println!("token       {}", mask(&creds.token));
            }
            None => println!("No GitHub credentials saved."),
        },
        GithubAction::Clear => {
            settings.clear_credentials()?;
            println!("GitHub credentials cleared.");
        }
        GithubAction::Check => {
            let publisher = ImagePublisher::new(Arc::new(GitHubFileHost::default()), settings);
            if let Err(e) = publisher.check_access().await {
                bail!("GitHub check failed: {e}");
            }
            println!("Repository is reachable.");
        }
    }

    Ok(())
}

fn mask(token: &str) -> String {
    let visible: String = token.chars().take(4).collect();
    format!("{visible}…")
}
