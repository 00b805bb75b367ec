//! Saved-product store invariants against a real SQLite database.

use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, Utc};
use tempfile::TempDir;

use shopscout::application::saved_products::SavedProducts;
use shopscout::domain::composer;
use shopscout::domain::errors::StoreError;
use shopscout::domain::product::{
    AnalysisResult, Price, Product, RawExtraction, SavedProduct, SavedProductId, UserIdentity,
};
use shopscout::domain::repositories::SavedProductRepository;
use shopscout::infrastructure::database_connection::DatabaseConnection;
use shopscout::infrastructure::saved_product_repository::SqliteSavedProductRepository;

async fn open_store() -> Result<(TempDir, Arc<SqliteSavedProductRepository>)> {
    let dir = TempDir::new()?;
    let url = format!("sqlite:{}", dir.path().join("store.db").display());
    let connection = DatabaseConnection::new(&url).await?;
    connection.migrate().await?;
    let repository = Arc::new(SqliteSavedProductRepository::new(connection.pool().clone()));
    Ok((dir, repository))
}

fn user(uid: &str) -> UserIdentity {
    UserIdentity {
        uid: uid.to_string(),
        email: Some(format!("{uid}@example.com")),
    }
}

fn sample_product(title: &str) -> Product {
    let extraction = RawExtraction {
        source_url: "https://shop.example/item/42".to_string(),
        title: Some(title.to_string()),
        price: Some(Price {
            amount: 19.99,
            currency: "USD".to_string(),
        }),
        images: vec!["https://shop.example/img/1.jpg".to_string()],
        description: Some("A fine widget".to_string()),
        rating: None,
    };
    let analysis = AnalysisResult {
        pros: vec!["cheap".to_string()],
        cons: Vec::new(),
        recommendation: "buy".to_string(),
        alternatives: Vec::new(),
    };
    composer::compose(extraction, analysis)
}

#[tokio::test]
async fn save_then_list_round_trips_every_field() -> Result<()> {
    let (_dir, repository) = open_store().await?;
    let service = SavedProducts::new(repository);
    let owner = user("uid-1");
    let product = sample_product("Widget");
    let before = Utc::now();

    let saved = service.save(product.clone(), &owner).await?;
    // Stored identity is the store's own, never the transient product id.
    assert_ne!(saved.id.as_str(), product.id.to_string());
    assert!(saved.saved_at >= before);
    assert_eq!(saved.owner_id, "uid-1");

    let listed = service.list(&owner).await?;
    assert_eq!(listed.len(), 1);

    let record = &listed[0];
    assert_eq!(record.id, saved.id);
    assert_eq!(record.owner_id, "uid-1");
    assert_eq!(record.product.id, product.id);
    assert_eq!(record.product.title, product.title);
    assert_eq!(record.product.price, product.price);
    assert_eq!(record.product.images, product.images);
    assert_eq!(record.product.analysis, product.analysis);
    assert_eq!(record.product.analyzed_at, product.analyzed_at);
    Ok(())
}

#[tokio::test]
async fn list_is_idempotent_and_newest_first() -> Result<()> {
    let (_dir, repository) = open_store().await?;
    let now = Utc::now();

    for (offset, title) in ["first", "second", "third"].iter().enumerate() {
        let record = SavedProduct {
            id: SavedProductId::generate(),
            owner_id: "uid-1".to_string(),
            product: sample_product(title),
            saved_at: now + Duration::seconds(offset as i64),
        };
        repository.insert(&record).await?;
    }

    let service = SavedProducts::new(repository);
    let owner = user("uid-1");

    let first_listing = service.list(&owner).await?;
    let titles: Vec<_> = first_listing
        .iter()
        .map(|r| r.product.title.clone().unwrap())
        .collect();
    assert_eq!(titles, ["third", "second", "first"]);

    let second_listing = service.list(&owner).await?;
    let first_ids: Vec<_> = first_listing.iter().map(|r| r.id.clone()).collect();
    let second_ids: Vec<_> = second_listing.iter().map(|r| r.id.clone()).collect();
    assert_eq!(first_ids, second_ids);
    Ok(())
}

#[tokio::test]
async fn list_never_leaks_other_owners_records() -> Result<()> {
    let (_dir, repository) = open_store().await?;
    let service = SavedProducts::new(repository);

    service.save(sample_product("mine"), &user("uid-1")).await?;
    service
        .save(sample_product("theirs"), &user("uid-2"))
        .await?;

    let mine = service.list(&user("uid-1")).await?;
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].product.title.as_deref(), Some("mine"));

    let theirs = service.list(&user("uid-2")).await?;
    assert_eq!(theirs.len(), 1);
    assert_eq!(theirs[0].product.title.as_deref(), Some("theirs"));
    Ok(())
}

#[tokio::test]
async fn each_save_is_an_independent_record() -> Result<()> {
    let (_dir, repository) = open_store().await?;
    let service = SavedProducts::new(repository);
    let owner = user("uid-1");
    let product = sample_product("Widget");

    let first = service.save(product.clone(), &owner).await?;
    let second = service.save(product, &owner).await?;
    assert_ne!(first.id, second.id);

    let listed = service.list(&owner).await?;
    assert_eq!(listed.len(), 2);
    Ok(())
}

#[tokio::test]
async fn delete_by_non_owner_fails_and_leaves_record_intact() -> Result<()> {
    let (_dir, repository) = open_store().await?;
    let service = SavedProducts::new(repository);
    let owner = user("uid-1");

    let saved = service.save(sample_product("Widget"), &owner).await?;

    let err = service
        .delete(&saved.id, &user("uid-2"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        StoreError::NotOwner {
            id: saved.id.to_string()
        }
    );

    // The refusal reads exactly like a missing record.
    let missing = StoreError::NotFound {
        id: saved.id.to_string(),
    };
    assert_eq!(err.to_string(), missing.to_string());

    let listed = service.list(&owner).await?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, saved.id);
    Ok(())
}

#[tokio::test]
async fn owner_can_delete_and_delete_is_terminal() -> Result<()> {
    let (_dir, repository) = open_store().await?;
    let service = SavedProducts::new(repository);
    let owner = user("uid-1");

    let saved = service.save(sample_product("Widget"), &owner).await?;
    service.delete(&saved.id, &owner).await?;

    assert!(service.list(&owner).await?.is_empty());
    let err = service.delete(&saved.id, &owner).await.unwrap_err();
    assert_eq!(
        err,
        StoreError::NotFound {
            id: saved.id.to_string()
        }
    );
    Ok(())
}

#[tokio::test]
async fn delete_of_unknown_id_is_not_found() -> Result<()> {
    let (_dir, repository) = open_store().await?;
    let service = SavedProducts::new(repository);

    let ghost = SavedProductId::from_string("sp_0_deadbeef".to_string());
    let err = service.delete(&ghost, &user("uid-1")).await.unwrap_err();
    assert_eq!(
        err,
        StoreError::NotFound {
            id: ghost.to_string()
        }
    );
    Ok(())
}

#[tokio::test]
async fn racing_deletes_settle_on_exactly_one_winner() -> Result<()> {
    let (_dir, repository) = open_store().await?;
    let service = SavedProducts::new(repository.clone());
    let owner = user("uid-1");

    let saved = service.save(sample_product("Widget"), &owner).await?;

    let repo_a = (*repository).clone();
    let repo_b = (*repository).clone();
    let id_a = saved.id.clone();
    let id_b = saved.id.clone();

    let task_a = tokio::spawn(async move { repo_a.delete_owned(&id_a, "uid-1").await });
    let task_b = tokio::spawn(async move { repo_b.delete_owned(&id_b, "uid-1").await });

    let results = [task_a.await?, task_b.await?];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);

    let loser = results.into_iter().find(Result::is_err).unwrap().unwrap_err();
    assert_eq!(
        loser,
        StoreError::NotFound {
            id: saved.id.to_string()
        }
    );

    assert!(service.list(&owner).await?.is_empty());
    Ok(())
}
