use anyhow::Result;
use clap::Subcommand;
use shop_admin::ReviewId;

use super::format;
use crate::app::App;
use crate::prompt::StdinConfirm;

#[derive(Subcommand)]
pub enum ReviewsAction {
    /// List reviews, newest first
    List,
    /// Delete a review
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

pub async fn run(app: &App, action: ReviewsAction) -> Result<()> {
    let ctx = &app.ctx;
    ctx.load_reviews().await?;

    match action {
        ReviewsAction::List => format::print_reviews(&ctx.reviews()),
        ReviewsAction::Delete { id, yes } => {
            let confirm = StdinConfirm { assume_yes: yes };
            ctx.delete_review(&ReviewId::new(id), &confirm).await?;
        }
    }

    Ok(())
}
