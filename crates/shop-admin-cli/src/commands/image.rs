use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::warn;

use super::products::product_id;
use crate::app::App;

#[derive(Subcommand)]
pub enum ImageAction {
    /// Upload a product image to the site repository
    Publish {
        product_id: u64,
        file: PathBuf,
        /// Also point the product's image field at the uploaded file
        #[arg(long)]
        attach: bool,
    },
}

pub async fn run(app: &App, action: ImageAction) -> Result<()> {
    match action {
        ImageAction::Publish {
            product_id: raw_id,
            file,
            attach,
        } => {
            let id = product_id(raw_id)?;
            let bytes =
                std::fs::read(&file).with_context(|| format!("failed to read {}", file.display()))?;
            let file_name = file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();

            let outcome = app
                .publisher()
                .publish_for_product(id, file_name, &bytes)
                .await?;
            println!("{}", outcome.path);

            if attach {
                let ctx = &app.ctx;
                ctx.load_products().await?;
                match ctx.product(id) {
                    Some(mut product) => {
                        product.image = outcome.path;
                        ctx.save_product(product).await?;
                    }
                    None => {
                        warn!(product = %id, "uploaded image for unknown product; nothing to attach");
                    }
                }
            }
        }
    }

    Ok(())
}
