use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use futures::stream::TryStreamExt;
use mongodb::options::{FindOneOptions, FindOptions};
use mongodb::Client;
use tracing::{error, info};

use crate::config::mongo_conf::MongoConfig;
use crate::model::quote::QuoteRevision;
use crate::repository::repository_error::{RepositoryError, RepositoryResult};

#[async_trait]
pub trait QuoteRevisionRepository: Send + Sync {
    /// Appends a revision, allocating the next sequence number for its record
    async fn create(&self, revision: QuoteRevision) -> RepositoryResult<QuoteRevision>;
    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<QuoteRevision>;
    /// Highest-sequence revision of a record
    async fn current(&self, quote_information_id: ObjectId) -> RepositoryResult<QuoteRevision>;
    /// Full history, newest first
    async fn list_by_quote(
        &self,
        quote_information_id: ObjectId,
    ) -> RepositoryResult<Vec<QuoteRevision>>;
    /// Stamps `rejected_at` on the superseded revision and appends its
    /// replacement in a single transaction; both writes commit or neither
    /// does. Concurrent calls on the same record are not serialized beyond
    /// that (last write wins).
    async fn reject_and_create(
        &self,
        rejected_id: ObjectId,
        rejected_at: &str,
        replacement: QuoteRevision,
    ) -> RepositoryResult<QuoteRevision>;
}

pub struct MongoQuoteRevisionRepository {
    client: Client,
    collection: mongodb::Collection<QuoteRevision>,
}

impl MongoQuoteRevisionRepository {
    pub async fn new(config: &MongoConfig) -> Result<Self, mongodb::error::Error> {
        let client = crate::repository::connect(config).await?;
        let db = client.database(&config.database);
        let collection = db.collection::<QuoteRevision>("quote_revisions");
        Ok(MongoQuoteRevisionRepository { client, collection })
    }

    async fn next_sequence(&self, quote_information_id: ObjectId) -> RepositoryResult<u32> {
        let filter = doc! { "quote_information_id": quote_information_id };
        let options = FindOneOptions::builder()
            .sort(doc! { "sequence": -1 })
            .build();
        let latest = self
            .collection
            .find_one(filter, options)
            .await
            .map_err(|e| RepositoryError::database(format!("Failed to read sequence: {}", e)))?;
        Ok(latest.map(|r| r.sequence + 1).unwrap_or(1))
    }
}

#[async_trait]
impl QuoteRevisionRepository for MongoQuoteRevisionRepository {
    #[tracing::instrument(skip(self, revision), fields(quote = %revision.quote_information_id, role = %revision.created_by_role))]
    async fn create(&self, revision: QuoteRevision) -> RepositoryResult<QuoteRevision> {
        info!("Appending quote revision");
        let mut new_revision = revision;
        new_revision.id = Some(ObjectId::new());
        new_revision.sequence = self.next_sequence(new_revision.quote_information_id).await?;
        new_revision.created_at = Some(chrono::Utc::now().to_rfc3339());

        match self.collection.insert_one(new_revision.clone(), None).await {
            Ok(_) => {
                info!(sequence = new_revision.sequence, "Quote revision appended");
                Ok(new_revision)
            }
            Err(e) => {
                error!("Failed to append quote revision: {}", e);
                Err(RepositoryError::database(format!(
                    "Failed to append quote revision: {}",
                    e
                )))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<QuoteRevision> {
        let filter = doc! { "_id": id };
        match self.collection.find_one(filter, None).await {
            Ok(Some(revision)) => Ok(revision),
            Ok(None) => Err(RepositoryError::not_found(format!(
                "Quote revision not found for ID: {}",
                id
            ))),
            Err(e) => {
                error!("Failed to fetch quote revision: {}", e);
                Err(RepositoryError::database(format!(
                    "Failed to fetch quote revision: {}",
                    e
                )))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(quote = %quote_information_id))]
    async fn current(&self, quote_information_id: ObjectId) -> RepositoryResult<QuoteRevision> {
        let filter = doc! { "quote_information_id": quote_information_id };
        let options = FindOneOptions::builder()
            .sort(doc! { "sequence": -1 })
            .build();
        match self.collection.find_one(filter, options).await {
            Ok(Some(revision)) => Ok(revision),
            Ok(None) => Err(RepositoryError::not_found(format!(
                "No revisions for quote record: {}",
                quote_information_id
            ))),
            Err(e) => {
                error!("Failed to fetch current revision: {}", e);
                Err(RepositoryError::database(format!(
                    "Failed to fetch current revision: {}",
                    e
                )))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(quote = %quote_information_id))]
    async fn list_by_quote(
        &self,
        quote_information_id: ObjectId,
    ) -> RepositoryResult<Vec<QuoteRevision>> {
        let filter = doc! { "quote_information_id": quote_information_id };
        let options = FindOptions::builder().sort(doc! { "sequence": -1 }).build();
        let cursor = self.collection.find(filter, options).await.map_err(|e| {
            error!("Failed to list revisions: {}", e);
            RepositoryError::database(format!("Failed to list revisions: {}", e))
        })?;
        let revisions: Vec<QuoteRevision> = cursor.try_collect().await.map_err(|e| {
            error!("Failed to read revision cursor: {}", e);
            RepositoryError::database(format!("Failed to read cursor: {}", e))
        })?;
        Ok(revisions)
    }

    #[tracing::instrument(skip(self, replacement), fields(rejected = %rejected_id))]
    async fn reject_and_create(
        &self,
        rejected_id: ObjectId,
        rejected_at: &str,
        replacement: QuoteRevision,
    ) -> RepositoryResult<QuoteRevision> {
        info!("Rejecting current revision and appending replacement");

        let mut session = self.client.start_session(None).await.map_err(|e| {
            error!("Failed to start session: {}", e);
            RepositoryError::database(format!("Failed to start session: {}", e))
        })?;
        session.start_transaction(None).await.map_err(|e| {
            error!("Failed to start transaction: {}", e);
            RepositoryError::database(format!("Failed to start transaction: {}", e))
        })?;

        let mut new_revision = replacement;
        new_revision.id = Some(ObjectId::new());
        new_revision.created_at = Some(chrono::Utc::now().to_rfc3339());

        // Stamp the superseded revision; refuse if it was already rejected
        let outcome: Result<bool, mongodb::error::Error> = async {
            let filter = doc! { "_id": rejected_id, "rejected_at": bson::Bson::Null };
            let update = doc! { "$set": { "rejected_at": rejected_at } };
            let updated = self
                .collection
                .update_one_with_session(filter, update, None, &mut session)
                .await?;
            if updated.matched_count == 0 {
                return Ok(false);
            }

            let seq_filter = doc! { "quote_information_id": new_revision.quote_information_id };
            let seq_options = FindOneOptions::builder()
                .sort(doc! { "sequence": -1 })
                .build();
            let latest = self
                .collection
                .find_one_with_session(seq_filter, seq_options, &mut session)
                .await?;
            new_revision.sequence = latest.map(|r| r.sequence + 1).unwrap_or(1);

            self.collection
                .insert_one_with_session(new_revision.clone(), None, &mut session)
                .await?;
            Ok(true)
        }
        .await;

        match outcome {
            Ok(true) => {
                session.commit_transaction().await.map_err(|e| {
                    error!("Failed to commit reject+create transaction: {}", e);
                    RepositoryError::database(format!("Failed to commit transaction: {}", e))
                })?;
                info!(sequence = new_revision.sequence, "Replacement revision committed");
                Ok(new_revision)
            }
            Ok(false) => {
                let _ = session.abort_transaction().await;
                Err(RepositoryError::not_found(format!(
                    "Revision {} was already superseded",
                    rejected_id
                )))
            }
            Err(e) => {
                let _ = session.abort_transaction().await;
                error!("Reject+create transaction failed: {}", e);
                Err(RepositoryError::database(format!(
                    "Reject+create transaction failed: {}",
                    e
                )))
            }
        }
    }
}
