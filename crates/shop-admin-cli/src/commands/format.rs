use shop_admin::{Product, Review};
use shop_admin_store::ViewMode;

const MAX_TITLE_WIDTH: usize = 32;
const REVIEW_TEXT_BUDGET: usize = 70;

pub fn print_products(products: &[Product], mode: ViewMode) {
    if products.is_empty() {
        println!("No products found.");
        return;
    }

    let mut sorted: Vec<&Product> = products.iter().collect();
    sorted.sort_by_key(|p| p.id);

    let out = match mode {
        ViewMode::Table => product_table(&sorted),
        ViewMode::Cards => product_cards(&sorted),
    };
    print!("{out}");
    println!("\n{} products", products.len());
}

fn product_table(products: &[&Product]) -> String {
    let title_width = products
        .iter()
        .map(|p| p.title.chars().count())
        .max()
        .unwrap_or(0)
        .clamp("Title".len(), MAX_TITLE_WIDTH);

    let mut out = format!(
        "{:>5}  {:<tw$}  {:<12}  {:>10}  {:>5}  {}\n",
        "ID",
        "Title",
        "Category",
        "Price",
        "Stock",
        "Image",
        tw = title_width
    );
    for p in products {
        out.push_str(&format!(
            "{:>5}  {:<tw$}  {:<12}  {:>10}  {:>5}  {}\n",
            p.id,
            truncate(&p.title, title_width),
            p.category.display_label(),
            price(p.price),
            p.stock,
            p.image,
            tw = title_width
        ));
    }
    out
}

fn product_cards(products: &[&Product]) -> String {
    let mut out = String::new();
    for (i, p) in products.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&format!("#{} {}\n", p.id, p.title));
        out.push_str(&format!(
            "  {} · {} · stock {}\n",
            p.category.display_label(),
            price(p.price),
            p.stock
        ));
        out.push_str(&format!("  {}\n", p.image));
    }
    out
}

pub fn print_reviews(reviews: &[Review]) {
    if reviews.is_empty() {
        println!("No reviews yet.");
        return;
    }

    for r in reviews {
        println!(
            "{}  {}  {}  {}",
            r.date.format("%Y-%m-%d"),
            stars(r.rating),
            r.author(),
            r.id
        );
        if let Some(text) = r.text.as_deref().filter(|t| !t.trim().is_empty()) {
            println!("    {}", truncate(text.trim(), REVIEW_TEXT_BUDGET));
        }
    }
    println!("\n{} reviews", reviews.len());
}

fn price(amount: i64) -> String {
    format!("{amount} ₽")
}

fn stars(rating: u8) -> String {
    let filled = usize::from(rating.min(Review::MAX_RATING));
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_owned()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{truncated}…")
    }
}
