use chrono::{Duration, Utc};
use rstest::{fixture, rstest};
use storefront::{
    db::{catalog::is_fresh, DatabaseProvider, TursoClient},
    types::{AppError, NewUser, ProductFilter, ProductRecord},
};
use tempfile::TempDir;

#[fixture]
async fn db() -> TursoClient {
    TursoClient::new_memory()
        .await
        .expect("Failed to create in-memory database")
}

fn new_user(email: &str) -> NewUser {
    NewUser {
        name: "Admin".to_string(),
        email: email.to_string(),
        phone: "0800".to_string(),
        password_hash: "$argon2id$hash".to_string(),
    }
}

fn record(id: &str, name: &str, categories: &[&str]) -> ProductRecord {
    let now = Utc::now();
    ProductRecord {
        id: id.to_string(),
        name: name.to_string(),
        description: "desc".to_string(),
        image: vec![format!("https://images.test/{id}.png")],
        category: categories.iter().map(|c| c.to_string()).collect(),
        tag: vec!["tag".to_string()],
        hot: false,
        is_new: false,
        created_at: now,
        updated_at: now,
    }
}

// ============= Users =============

#[rstest]
#[tokio::test]
async fn test_bootstrap_admin_only_once(#[future] db: TursoClient) {
    let db = db.await;

    let admin = db.bootstrap_admin(new_user("a@x.com")).await.unwrap();
    assert!(admin.is_admin);
    assert_eq!(db.user_count().await.unwrap(), 1);

    let second = db.bootstrap_admin(new_user("b@x.com")).await;
    assert!(matches!(second, Err(AppError::Conflict(ref msg)) if msg == "Admin already exists"));
    assert_eq!(db.user_count().await.unwrap(), 1);
}

#[rstest]
#[tokio::test]
async fn test_concurrent_bootstrap_yields_one_admin(#[future] db: TursoClient) {
    let db = db.await;

    let (a, b) = tokio::join!(
        db.bootstrap_admin(new_user("a@x.com")),
        db.bootstrap_admin(new_user("b@x.com"))
    );

    assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
    assert_eq!(db.user_count().await.unwrap(), 1);
}

#[rstest]
#[tokio::test]
async fn test_user_lookup(#[future] db: TursoClient) {
    let db = db.await;
    let admin = db.bootstrap_admin(new_user("a@x.com")).await.unwrap();

    let by_id = db.get_user_by_id(&admin.id).await.unwrap().unwrap();
    assert_eq!(by_id.email, "a@x.com");
    assert_eq!(by_id.password_hash, "$argon2id$hash");

    let by_email = db.get_user_by_email("a@x.com").await.unwrap().unwrap();
    assert_eq!(by_email.id, admin.id);

    assert!(db.get_user_by_id("missing").await.unwrap().is_none());
    assert!(db.get_user_by_email("nobody@x.com").await.unwrap().is_none());
}

// ============= Articles =============

#[rstest]
#[tokio::test]
async fn test_article_partial_update(#[future] db: TursoClient) {
    let db = db.await;
    let article = db
        .create_article("Title", "Body", &["a".to_string()])
        .await
        .unwrap();

    let updated = db
        .update_article(&article.id, None, Some("New body"), None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.title, "Title");
    assert_eq!(updated.description, "New body");
    assert_eq!(updated.tag, vec!["a"]);

    assert!(db
        .update_article("missing", Some("x"), None, None)
        .await
        .unwrap()
        .is_none());

    assert!(db.delete_article(&article.id).await.unwrap());
    assert!(!db.delete_article(&article.id).await.unwrap());
    assert!(db.list_articles().await.unwrap().is_empty());
}

// ============= Categories =============

#[rstest]
#[tokio::test]
async fn test_category_name_search(#[future] db: TursoClient) {
    let db = db.await;
    let shoes = db.create_category("Running Shoes", "https://i/1").await.unwrap();
    db.create_category("100% Cotton", "https://i/2").await.unwrap();

    let found = db.find_category_by_name("shoes").await.unwrap().unwrap();
    assert_eq!(found.id, shoes.id);

    // LIKE wildcards in the query are literal
    assert!(db.find_category_by_name("_").await.unwrap().is_none());
    assert!(db.find_category_by_name("0%").await.unwrap().is_some());
    assert!(db.find_category_by_name("hats").await.unwrap().is_none());
}

#[rstest]
#[tokio::test]
async fn test_category_search_with_non_ascii_name(#[future] db: TursoClient) {
    let db = db.await;
    let summer = db.create_category("ÉTÉ Collection", "https://i/e").await.unwrap();

    let found = db.find_category_by_name("ÉTÉ").await.unwrap().unwrap();
    assert_eq!(found.id, summer.id);

    // ASCII letters still fold around the accented ones
    let found = db.find_category_by_name("ÉTÉ COLLECTION").await.unwrap().unwrap();
    assert_eq!(found.id, summer.id);
}

#[rstest]
#[tokio::test]
async fn test_missing_categories(#[future] db: TursoClient) {
    let db = db.await;
    let a = db.create_category("A", "https://i/a").await.unwrap();

    let ids = vec![a.id.clone(), "ghost".to_string()];
    assert_eq!(db.missing_categories(&ids).await.unwrap(), vec!["ghost"]);
    assert!(!db.categories_exist(&ids).await.unwrap());
    assert!(db.categories_exist(&[a.id]).await.unwrap());
    assert!(db.categories_exist(&[]).await.unwrap());
}

// ============= Products =============

#[rstest]
#[tokio::test]
async fn test_product_population_and_filters(#[future] db: TursoClient) {
    let db = db.await;
    let shoes = db.create_category("Shoes", "https://i/s").await.unwrap();
    let hats = db.create_category("Hats", "https://i/h").await.unwrap();

    db.insert_product(record("p1", "Trail Runner", &[&shoes.id]))
        .await
        .unwrap();
    db.insert_product(record("p2", "Road Runner", &[&shoes.id, &hats.id]))
        .await
        .unwrap();
    db.insert_product(record("p3", "Sun Hat", &[&hats.id]))
        .await
        .unwrap();

    let p2 = db.get_product("p2").await.unwrap().unwrap();
    assert_eq!(
        p2.category.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
        vec!["Shoes", "Hats"]
    );
    assert!(p2.is_new);

    let by_category = ProductFilter {
        category_id: Some(hats.id.clone()),
        name: None,
    };
    assert_eq!(db.count_products(&by_category).await.unwrap(), 2);

    let by_name = ProductFilter {
        category_id: None,
        name: Some("RUNNER".to_string()),
    };
    assert_eq!(db.count_products(&by_name).await.unwrap(), 2);

    let both = ProductFilter {
        category_id: Some(hats.id.clone()),
        name: Some("runner".to_string()),
    };
    let page = db.list_products(&both, 10, 0).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id, "p2");

    let all = ProductFilter::default();
    assert_eq!(db.count_products(&all).await.unwrap(), 3);
    assert_eq!(db.list_products(&all, 2, 0).await.unwrap().len(), 2);
    assert_eq!(db.list_products(&all, 2, 2).await.unwrap().len(), 1);

    // Out-of-range values must not wrap into SQLite's "no limit"/"no offset"
    assert_eq!(db.list_products(&all, u64::MAX, 0).await.unwrap().len(), 3);
    assert!(db.list_products(&all, 10, u64::MAX).await.unwrap().is_empty());
}

#[rstest]
#[tokio::test]
async fn test_deleted_category_drops_from_population(#[future] db: TursoClient) {
    let db = db.await;
    let shoes = db.create_category("Shoes", "https://i/s").await.unwrap();
    db.insert_product(record("p1", "Runner", &[&shoes.id]))
        .await
        .unwrap();

    db.delete_category(&shoes.id).await.unwrap();

    let product = db.get_product("p1").await.unwrap().unwrap();
    assert!(product.category.is_empty());
}

#[rstest]
#[tokio::test]
async fn test_save_recomputes_new_flag(#[future] db: TursoClient) {
    let db = db.await;
    db.insert_product(record("p1", "Runner", &[])).await.unwrap();

    // Age the product past the freshness window
    let old = (Utc::now() - Duration::days(10)).timestamp();
    db.connection()
        .unwrap()
        .execute("UPDATE products SET created_at = ? WHERE id = 'p1'", [old])
        .await
        .unwrap();

    let mut stored = db.get_product_record("p1").await.unwrap().unwrap();
    assert!(stored.is_new, "flag is only refreshed on save");
    assert!(!is_fresh(stored.created_at, Utc::now()));

    stored.name = "Runner II".to_string();
    let saved = db.save_product(stored).await.unwrap().unwrap();
    assert!(!saved.is_new);
    assert_eq!(saved.name, "Runner II");

    assert!(db
        .save_product(record("ghost", "x", &[]))
        .await
        .unwrap()
        .is_none());
}

// ============= Sliders =============

#[rstest]
#[tokio::test]
async fn test_sliders(#[future] db: TursoClient) {
    let db = db.await;
    let slider = db.create_slider("Banner", "https://i/b").await.unwrap();

    assert_eq!(db.list_sliders().await.unwrap().len(), 1);
    assert_eq!(
        db.get_slider(&slider.id).await.unwrap().unwrap().image,
        "https://i/b"
    );
    assert!(db.get_slider("missing").await.unwrap().is_none());
}

// ============= Providers =============

#[tokio::test]
async fn test_local_file_database_persists() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("shop.db");
    let provider = DatabaseProvider::Local {
        path: path.to_string_lossy().to_string(),
    };

    {
        let db = provider.create_client().await.unwrap();
        db.bootstrap_admin(new_user("a@x.com")).await.unwrap();
    }

    let reopened = provider.create_client().await.unwrap();
    assert_eq!(reopened.user_count().await.unwrap(), 1);
    assert!(path.exists());
}
