/// A yes/no decision the operator must make before a destructive change.
#[async_trait::async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, question: &str) -> bool;
}

/// Answers every question the same way. Useful for `--yes` style flags.
#[derive(Debug, Clone, Copy)]
pub struct Always(pub bool);

#[async_trait::async_trait]
impl Confirm for Always {
    async fn confirm(&self, _question: &str) -> bool {
        self.0
    }
}
