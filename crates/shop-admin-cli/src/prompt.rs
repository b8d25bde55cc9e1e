use std::io::{BufRead, Write};
use std::sync::Arc;

use shop_admin::{Confirm, CredentialProvider, GitHubCredentials};
use shop_admin_store::{CredentialUpdate, SettingsStore};
use tracing::warn;

/// Print `question` to stderr and read one trimmed line from stdin.
/// Returns `None` on end of input.
pub async fn ask(question: String) -> Option<String> {
    tokio::task::spawn_blocking(move || {
        let mut stderr = std::io::stderr();
        let _ = write!(stderr, "{question}");
        let _ = stderr.flush();

        let mut line = String::new();
        match std::io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_owned()),
        }
    })
    .await
    .ok()
    .flatten()
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Asks `[y/N]` on the terminal. `--yes` skips the question.
pub struct StdinConfirm {
    pub assume_yes: bool,
}

#[async_trait::async_trait]
impl Confirm for StdinConfirm {
    async fn confirm(&self, question: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        ask(format!("{question} [y/N] "))
            .await
            .is_some_and(|a| is_yes(&a))
    }
}

/// Saved credentials, or ask the operator for them and save the answers.
pub struct PromptingCredentials {
    pub settings: Arc<SettingsStore>,
    /// Offered as the default token when none is saved.
    pub env_token: Option<String>,
}

#[async_trait::async_trait]
impl CredentialProvider for PromptingCredentials {
    async fn credentials(&self) -> Option<GitHubCredentials> {
        if let Some(saved) = self.settings.credentials().await {
            return Some(saved);
        }

        eprintln!("GitHub credentials are needed to upload images.");
        let token = match &self.env_token {
            Some(token) => {
                let answer = ask("Token [from GITHUB_TOKEN]: ".into()).await?;
                if answer.is_empty() { token.clone() } else { answer }
            }
            None => ask("Token: ".into()).await?,
        };
        let owner = ask("Repository owner: ".into()).await?;
        let repo = ask("Repository name: ".into()).await?;
        let branch = ask("Branch [main]: ".into()).await?;

        if let Err(e) = self.settings.update_credentials(&CredentialUpdate {
            token: Some(token),
            owner: Some(owner),
            repo: Some(repo),
            branch: Some(branch),
        }) {
            warn!(error = %e, "could not save credentials");
        }

        self.settings.credentials().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_explicit_yes_confirms() {
        assert!(is_yes("y"));
        assert!(is_yes("YES"));
        assert!(!is_yes(""));
        assert!(!is_yes("n"));
        assert!(!is_yes("yep"));
    }

    #[tokio::test]
    async fn assume_yes_skips_the_prompt() {
        let confirm = StdinConfirm { assume_yes: true };
        assert!(confirm.confirm("Delete product 1?").await);
    }

    #[tokio::test]
    async fn saved_credentials_are_used_without_prompting() {
        let settings = Arc::new(SettingsStore::open_in_memory().unwrap());
        settings
            .update_credentials(&CredentialUpdate {
                token: Some("t".into()),
                owner: Some("shop".into()),
                repo: Some("site".into()),
                branch: None,
            })
            .unwrap();

        let provider = PromptingCredentials {
            settings,
            env_token: None,
        };
        let creds = provider.credentials().await.unwrap();
        assert_eq!(creds.target(), "shop/site@main");
    }
}
