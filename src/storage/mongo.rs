use super::{Item, ItemFilter, ItemStore, Location, Price, Result, StorageError, Store};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    Client, Collection,
    bson::{self, Document, doc, oid::ObjectId},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// MongoDB-backed document store
pub struct MongoStorage {
    collection: Collection<Document>,
}

impl MongoStorage {
    /// Connect once and ping, so a bad host fails at startup
    pub async fn connect(host: &str, database: &str, collection: &str) -> Result<Self> {
        let uri = connection_uri(host);
        let client = Client::with_uri_str(&uri).await?;
        let db = client.database(database);

        db.run_command(doc! { "ping": 1 }).await?;
        info!(database, collection, "Connected to MongoDB");

        Ok(Self {
            collection: db.collection::<Document>(collection),
        })
    }
}

/// Accept either a full connection string or a bare `host[:port]`
pub fn connection_uri(host: &str) -> String {
    let host = host.trim();
    if host.starts_with("mongodb://") || host.starts_with("mongodb+srv://") {
        host.to_string()
    } else {
        format!("mongodb://{host}")
    }
}

// Collection layout: same shape as `Item`, but `date` is a BSON Date so
// documents written by other clients of `grocery-db.item` decode too.
#[derive(Debug, Serialize, Deserialize)]
struct StoredItem {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    upc: String,
    name: String,
    stores: Vec<StoredStore>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredStore {
    name: String,
    location: Location,
    price: Vec<StoredPrice>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredPrice {
    user: String,
    price: f64,
    upvote: u32,
    downvote: u32,
    date: bson::DateTime,
}

impl From<&Item> for StoredItem {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id,
            upc: item.upc.clone(),
            name: item.name.clone(),
            stores: item
                .stores
                .iter()
                .map(|store| StoredStore {
                    name: store.name.clone(),
                    location: store.location,
                    price: store
                        .price
                        .iter()
                        .map(|p| StoredPrice {
                            user: p.user.clone(),
                            price: p.price,
                            upvote: p.upvote,
                            downvote: p.downvote,
                            date: bson::DateTime::from_millis(p.date.timestamp_millis()),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

impl TryFrom<StoredItem> for Item {
    type Error = StorageError;

    fn try_from(stored: StoredItem) -> Result<Self> {
        let mut stores = Vec::with_capacity(stored.stores.len());
        for store in stored.stores {
            let mut prices = Vec::with_capacity(store.price.len());
            for p in store.price {
                let millis = p.date.timestamp_millis();
                let date = DateTime::<Utc>::from_timestamp_millis(millis)
                    .ok_or(StorageError::DateOutOfRange(millis))?;
                prices.push(Price {
                    user: p.user,
                    price: p.price,
                    upvote: p.upvote,
                    downvote: p.downvote,
                    date,
                });
            }
            stores.push(Store {
                name: store.name,
                location: store.location,
                price: prices,
            });
        }

        Ok(Self {
            id: stored.id,
            upc: stored.upc,
            name: stored.name,
            stores,
        })
    }
}

fn encode(item: &Item) -> Result<Document> {
    Ok(bson::to_document(&StoredItem::from(item))?)
}

fn decode(document: Document) -> Result<Item> {
    let stored: StoredItem = bson::from_document(document)?;
    Item::try_from(stored)
}

#[async_trait]
impl ItemStore for MongoStorage {
    fn backend(&self) -> &'static str {
        "mongo"
    }

    async fn insert(&self, item: &Item) -> Result<()> {
        let result = self.collection.insert_one(encode(item)?).await?;
        info!(upc = %item.upc, id = %result.inserted_id, "Item inserted");
        Ok(())
    }

    /// Documents that fail to decode are logged and skipped
    async fn find(&self, filter: &ItemFilter) -> Result<Vec<Item>> {
        let mut query = Document::new();
        query.insert(filter.field(), filter.value());

        let mut cursor = self.collection.find(query).await?;
        let mut items = Vec::new();

        while let Some(document) = cursor.try_next().await? {
            let id = document.get_object_id("_id").ok();
            match decode(document) {
                Ok(item) => items.push(item),
                Err(e) => warn!(id = ?id, error = %e, "Skipping undecodable document"),
            }
        }

        Ok(items)
    }

    async fn count(&self) -> Result<usize> {
        let count = self.collection.estimated_document_count().await?;
        Ok(usize::try_from(count).unwrap_or(usize::MAX))
    }
}
