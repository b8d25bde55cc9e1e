use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use shop_admin::{Category, ProductDraft, ProductId, StockAdjustment, StockChange};
use shop_admin::product::PLACEHOLDER_IMAGE;
use shop_admin_store::ViewMode;
use tracing::warn;

use super::format;
use crate::app::App;
use crate::prompt::StdinConfirm;

#[derive(Subcommand)]
pub enum ProductsAction {
    /// List all products
    List {
        /// Render as `table` or `cards` (defaults to the saved view mode)
        #[arg(long)]
        view: Option<ViewMode>,
    },
    /// Add a product under the next free id
    Add {
        #[arg(long)]
        title: String,
        /// Price in whole rubles
        #[arg(long)]
        price: i64,
        /// pods, disposable, liquid, or any other code
        #[arg(long)]
        category: String,
        #[arg(long, default_value_t = 0)]
        stock: u32,
        /// Image path within the site repository
        #[arg(long)]
        image: Option<String>,
    },
    /// Change fields of an existing product
    Edit {
        id: u64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        price: Option<i64>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        stock: Option<u32>,
        #[arg(long)]
        image: Option<String>,
    },
    /// Set or step a product's stock
    Stock {
        id: u64,
        /// Set stock to this value
        #[arg(long, conflicts_with_all = ["inc", "dec"])]
        set: Option<u32>,
        /// Add one
        #[arg(long, conflicts_with = "dec")]
        inc: bool,
        /// Remove one (no-op at zero)
        #[arg(long)]
        dec: bool,
    },
    /// Delete a product
    Delete {
        id: u64,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Write all products as JSON
    Export {
        /// Output file (defaults to stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Save every product from a JSON array file
    Import { file: PathBuf },
}

pub fn product_id(raw: u64) -> Result<ProductId> {
    ProductId::new(raw).context("product ids start at 1")
}

/// Parse a category flag, warning when it is not one the storefront lists.
fn category_arg(raw: &str) -> Category {
    let category = Category::parse(raw);
    if !Category::all_known().contains(&category) {
        let all_known = Category::all_known();
        let known: Vec<&str> = all_known.iter().map(|c| c.code()).collect();
        warn!(category = raw, "unlisted category; known: {}", known.join(", "));
    }
    category
}

pub async fn run(app: &App, action: ProductsAction) -> Result<()> {
    let ctx = &app.ctx;

    match action {
        ProductsAction::List { view } => {
            ctx.load_products().await?;
            let mode = match view {
                Some(mode) => mode,
                None => app.settings.view_mode()?,
            };
            format::print_products(&ctx.products(), mode);
        }
        ProductsAction::Add {
            title,
            price,
            category,
            stock,
            image,
        } => {
            ctx.load_products().await?;
            let created = ctx
                .create_product(ProductDraft {
                    title,
                    price,
                    category: category_arg(&category),
                    stock,
                    image: image.unwrap_or_else(|| PLACEHOLDER_IMAGE.to_owned()),
                })
                .await?;
            println!("{}", created.id);
        }
        ProductsAction::Edit {
            id,
            title,
            price,
            category,
            stock,
            image,
        } => {
            let id = product_id(id)?;
            ctx.load_products().await?;
            let Some(mut product) = ctx.product(id) else {
                bail!("no product with id {id}");
            };

            if let Some(title) = title {
                product.title = title;
            }
            if let Some(price) = price {
                product.price = price;
            }
            if let Some(category) = category {
                product.category = category_arg(&category);
            }
            if let Some(stock) = stock {
                product.stock = stock;
            }
            if let Some(image) = image {
                product.image = image;
            }
            ctx.save_product(product).await?;
        }
        ProductsAction::Stock { id, set, inc, dec } => {
            let id = product_id(id)?;
            ctx.load_products().await?;
            let change = match (set, inc, dec) {
                (Some(value), _, _) => ctx.update_stock(id, value).await?,
                (None, true, _) => ctx.adjust_stock(id, StockAdjustment::Increment).await?,
                (None, false, true) => ctx.adjust_stock(id, StockAdjustment::Decrement).await?,
                (None, false, false) => bail!("pass --set <N>, --inc or --dec"),
            };
            match change {
                StockChange::Updated { previous, current } => {
                    println!("stock {previous} -> {current}");
                }
                StockChange::Unchanged { current } => println!("stock unchanged at {current}"),
            }
        }
        ProductsAction::Delete { id, yes } => {
            let id = product_id(id)?;
            ctx.load_products().await?;
            let confirm = StdinConfirm { assume_yes: yes };
            ctx.delete_product(id, &confirm).await?;
        }
        ProductsAction::Export { output } => {
            ctx.load_products().await?;
            let json = ctx.export_json().context("failed to serialize products")?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    eprintln!("Exported {} products to {}", ctx.products().len(), path.display());
                }
                None => println!("{json}"),
            }
        }
        ProductsAction::Import { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let report = ctx.import_json(&text).await?;
            if let Some(failure) = report.failure {
                bail!(
                    "import stopped at product {}: {} ({} of {} saved)",
                    failure.id,
                    failure.error,
                    report.saved,
                    report.total
                );
            }
        }
    }

    Ok(())
}
