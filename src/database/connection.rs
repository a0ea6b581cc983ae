use mongodb::bson::{doc, Document};
use mongodb::options::IndexOptions;
use mongodb::{Client, Database, IndexModel};

pub async fn get_db_client(database_url: &str) -> Database {
    let client = Client::with_uri_str(database_url)
        .await
        .expect("Failed to connect to MongoDB");

    let db_name = "rentalsdb";
    let db = client.database(db_name);

    match db.list_collection_names().await {
        Ok(collections) => {
            tracing::info!("Connected to database: {}", db_name);
            tracing::debug!("Collections found: {:?}", collections);
        }
        Err(e) => {
            tracing::error!("Database '{}' may not exist or is inaccessible: {}", db_name, e);
        }
    }

    ensure_indexes(&db).await;

    db
}

/// Uniqueness lives in the store, not in application-level checks: concurrent
/// registrations with the same email must not both succeed.
async fn ensure_indexes(db: &Database) {
    for (collection, index) in [
        ("users", unique_email_index()),
        ("users", unique_google_id_index()),
        ("apartments", unique_transaction_id_index()),
    ] {
        if let Err(e) = db
            .collection::<Document>(collection)
            .create_index(index)
            .await
        {
            tracing::error!("Failed to create index on {}: {}", collection, e);
        }
    }
}

fn unique_email_index() -> IndexModel {
    IndexModel::builder()
        .keys(doc! { "email": 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

// Sparse: most accounts have no Google identity, and most listings have no
// transaction id until payment starts.
fn unique_google_id_index() -> IndexModel {
    IndexModel::builder()
        .keys(doc! { "google_id": 1 })
        .options(IndexOptions::builder().unique(true).sparse(true).build())
        .build()
}

fn unique_transaction_id_index() -> IndexModel {
    IndexModel::builder()
        .keys(doc! { "payment_transaction_id": 1 })
        .options(IndexOptions::builder().unique(true).sparse(true).build())
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_index_is_unique_and_dense() {
        let index = unique_email_index();
        assert_eq!(index.keys, doc! { "email": 1 });

        let options = index.options.unwrap();
        assert_eq!(options.unique, Some(true));
        assert_eq!(options.sparse, None);
    }

    #[test]
    fn optional_identity_indexes_are_unique_and_sparse() {
        for index in [unique_google_id_index(), unique_transaction_id_index()] {
            let options = index.options.unwrap();
            assert_eq!(options.unique, Some(true));
            assert_eq!(options.sparse, Some(true));
        }
    }
}
