use std::sync::Arc;

use shop_admin::test_support::{FakeFileHost, InMemoryStore, ScriptedConfirm, drain_events};
use shop_admin::{
    AdminContext, AdminError, AdminEvent, Category, DeleteOutcome, GitHubCredentials,
    ImagePublisher, Product, ProductId, StaticCredentials, StockAdjustment, SyncStatus,
};

fn pid(id: u64) -> ProductId {
    ProductId::new(id).unwrap()
}

fn product(id: u64, stock: u32) -> Product {
    Product {
        id: pid(id),
        title: format!("Item {id}"),
        price: 1200,
        category: Category::Liquid,
        stock,
        image: "images/placeholder.png".into(),
    }
}

#[tokio::test]
async fn failed_stock_update_leaves_inconsistency_window() {
    let store = Arc::new(InMemoryStore::new());
    store.seed_products(&[product(1, 5)]);
    let ctx = AdminContext::new(store.clone());
    ctx.load_products().await.unwrap();
    let mut rx = ctx.subscribe();

    store.fail_next("service unavailable");
    let err = ctx.update_stock(pid(1), 4).await.unwrap_err();
    assert!(matches!(err, AdminError::Remote(_)));

    assert_eq!(ctx.product(pid(1)).unwrap().stock, 4);
    assert_eq!(store.product(1).unwrap().stock, 5);
    assert!(ctx.tracker().is_idle());

    let events = drain_events(&mut rx);
    let error_notices = events
        .iter()
        .filter_map(AdminEvent::notice)
        .filter(|n| n.is_error())
        .count();
    assert_eq!(error_notices, 1);

    // The next reload closes the window.
    ctx.load_products().await.unwrap();
    assert_eq!(ctx.product(pid(1)).unwrap().stock, 5);
}

#[tokio::test]
async fn declined_delete_makes_no_store_call() {
    let store = Arc::new(InMemoryStore::new());
    store.seed_products(&[product(2, 3)]);
    let ctx = AdminContext::new(store.clone());
    ctx.load_products().await.unwrap();
    let calls = store.call_count();
    let before = ctx.products();

    let confirm = ScriptedConfirm::new([false]);
    let outcome = ctx.delete_product(pid(2), &confirm).await.unwrap();

    assert_eq!(outcome, DeleteOutcome::Cancelled);
    assert_eq!(store.call_count(), calls);
    assert_eq!(ctx.products(), before);
    assert_eq!(confirm.questions(), vec!["Delete product 2 (Item 2)?"]);
}

#[tokio::test]
async fn stock_never_goes_negative() {
    let store = Arc::new(InMemoryStore::new());
    store.seed_products(&[product(1, 1)]);
    let ctx = AdminContext::new(store.clone());
    ctx.load_products().await.unwrap();

    for _ in 0..3 {
        ctx.adjust_stock(pid(1), StockAdjustment::Decrement)
            .await
            .unwrap();
    }

    assert_eq!(ctx.product(pid(1)).unwrap().stock, 0);
    assert_eq!(store.product(1).unwrap().stock, 0);
    assert_eq!(store.write_count(), 1);
}

#[tokio::test]
async fn import_then_export_reflects_the_store() {
    let store = Arc::new(InMemoryStore::new());
    let ctx = AdminContext::new(store.clone());

    let text = r#"[
        { "id": "4", "title": "Mint", "price": "900", "category": "liquid", "stock": 2 },
        { "id": 5, "title": "Berry", "price": 950, "category": "pods" }
    ]"#;
    let report = ctx.import_json(text).await.unwrap();
    assert!(report.is_complete());
    assert_eq!(report.saved, 2);

    let exported: Vec<Product> = serde_json::from_str(&ctx.export_json().unwrap()).unwrap();
    assert_eq!(exported.len(), 2);
    let berry = exported.iter().find(|p| p.id == pid(5)).unwrap();
    assert_eq!(berry.stock, 0);
    assert_eq!(berry.image, "images/placeholder.png");
    assert_eq!(ctx.next_product_id(), pid(6));
}

#[tokio::test]
async fn tracker_reports_idle_after_mixed_outcomes() {
    let store = Arc::new(InMemoryStore::new());
    store.seed_products(&[product(1, 2), product(2, 2), product(3, 2)]);
    let ctx = AdminContext::new(store.clone());
    ctx.load_products().await.unwrap();
    store.fail_writes_to("products", "2", "denied");
    let mut rx = ctx.subscribe();

    let (a, b, c) = tokio::join!(
        ctx.adjust_stock(pid(1), StockAdjustment::Increment),
        ctx.adjust_stock(pid(2), StockAdjustment::Increment),
        ctx.save_product(product(3, 9)),
    );
    assert!(a.is_ok());
    assert!(b.is_err());
    assert!(c.is_ok());

    let statuses: Vec<SyncStatus> = drain_events(&mut rx)
        .iter()
        .filter_map(AdminEvent::status)
        .copied()
        .collect();
    assert!(statuses.contains(&SyncStatus::Syncing(3)));
    assert_eq!(statuses.last(), Some(&SyncStatus::Idle));
    assert!(ctx.tracker().is_idle());
}

#[tokio::test]
async fn publish_creates_then_conflicts_on_stale_hash() {
    let creds = GitHubCredentials::new("t", "shop", "site", None);

    let host = Arc::new(FakeFileHost::new());
    let publisher = ImagePublisher::new(host.clone(), Arc::new(StaticCredentials(Some(creds.clone()))));
    let created = publisher
        .publish_for_product(pid(7), "photo.JPG", b"bytes")
        .await
        .unwrap();
    assert!(created.created);
    assert_eq!(created.path, "images/product7.jpg");
    assert!(host.puts()[0].prior_sha.is_none());

    let stale = Arc::new(FakeFileHost::new().with_stale_probe());
    stale.insert_blob("images/product7.jpg", b"old");
    let publisher = ImagePublisher::new(stale.clone(), Arc::new(StaticCredentials(Some(creds))));
    let err = publisher
        .publish_for_product(pid(7), "photo.jpg", b"new")
        .await
        .unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(stale.content_of("images/product7.jpg").unwrap(), b"old");
}
