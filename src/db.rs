use mongodb::bson::{doc, Document};
use mongodb::options::{ClientOptions, ReturnDocument};
use mongodb::{Client, Database};

pub struct MongoDB {
    pub client: Client,
    pub db: Database,
}

impl MongoDB {
    pub async fn init(uri: &str, db_name: &str) -> Self {
        let client_options = ClientOptions::parse(uri)
            .await
            .expect("Failed to parse MongoDB connection string");
        let client = Client::with_options(client_options).expect("Failed to initialize client");
        let db = client.database(db_name);
        MongoDB { client, db }
    }

    /// Allocates the next numeric id for the named sequence using a
    /// `counters` document incremented atomically.
    pub async fn next_sequence(&self, name: &str) -> Result<i64, mongodb::error::Error> {
        let counters = self.db.collection::<Document>("counters");
        let updated = counters
            .find_one_and_update(doc! { "_id": name }, doc! { "$inc": { "seq": 1_i64 } })
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await?;
        read_counter(name, updated)
    }
}

/// The upserted counter must come back with an `i64` `seq`. A missing
/// document or a wrongly-typed field must not fall back to a default:
/// re-minting an id would insert a duplicate that every later
/// `find_one` on `id` resolves arbitrarily.
fn read_counter(name: &str, updated: Option<Document>) -> Result<i64, mongodb::error::Error> {
    let doc = updated.ok_or_else(|| {
        mongodb::error::Error::custom(format!("counter {} missing after upsert", name))
    })?;
    doc.get_i64("seq").map_err(|_| {
        mongodb::error::Error::custom(format!("counter {} has a non-numeric seq", name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_with_numeric_seq_is_read() {
        let updated = Some(doc! { "_id": "projects", "seq": 42_i64 });
        assert_eq!(read_counter("projects", updated).unwrap(), 42);
    }

    #[test]
    fn missing_counter_is_an_error() {
        assert!(read_counter("projects", None).is_err());
    }

    #[test]
    fn wrongly_typed_seq_is_an_error() {
        let as_i32 = Some(doc! { "_id": "projects", "seq": 1_i32 });
        assert!(read_counter("projects", as_i32).is_err());

        let as_string = Some(doc! { "_id": "tasks", "seq": "1" });
        assert!(read_counter("tasks", as_string).is_err());
    }
}
