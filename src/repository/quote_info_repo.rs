use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use futures::stream::TryStreamExt;
use mongodb::options::FindOptions;
use tracing::{error, info};

use crate::config::mongo_conf::MongoConfig;
use crate::model::lifecycle::QuoteState;
use crate::model::quote::QuoteInformation;
use crate::repository::repository_error::{RepositoryError, RepositoryResult};

#[async_trait]
pub trait QuoteInformationRepository: Send + Sync {
    async fn create(&self, info: QuoteInformation) -> RepositoryResult<QuoteInformation>;
    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<QuoteInformation>;
    async fn update_status(&self, id: ObjectId, status: QuoteState) -> RepositoryResult<()>;
    /// Stamps `finalized_at` and moves the record to its terminal state
    async fn set_finalized(&self, id: ObjectId, finalized_at: &str) -> RepositoryResult<()>;
    async fn set_provider_contact(&self, id: ObjectId, phone: &str) -> RepositoryResult<()>;
    /// Active dashboard: records not yet finalized, newest first
    async fn list_active(&self, page: u32, limit: u32) -> RepositoryResult<Vec<QuoteInformation>>;
    async fn count_active(&self) -> RepositoryResult<u64>;
}

pub struct MongoQuoteInformationRepository {
    collection: mongodb::Collection<QuoteInformation>,
}

impl MongoQuoteInformationRepository {
    pub async fn new(config: &MongoConfig) -> Result<Self, mongodb::error::Error> {
        let client = crate::repository::connect(config).await?;
        let db = client.database(&config.database);
        let collection = db.collection::<QuoteInformation>("quote_informations");
        Ok(MongoQuoteInformationRepository { collection })
    }
}

#[async_trait]
impl QuoteInformationRepository for MongoQuoteInformationRepository {
    #[tracing::instrument(skip(self, info), fields(project = %info.project, company = %info.company))]
    async fn create(&self, info: QuoteInformation) -> RepositoryResult<QuoteInformation> {
        info!("Creating quote record");
        let mut new_info = info;
        new_info.id = Some(ObjectId::new());
        let now = chrono::Utc::now().to_rfc3339();
        new_info.created_at = Some(now.clone());
        new_info.updated_at = Some(now);

        match self.collection.insert_one(new_info.clone(), None).await {
            Ok(_) => {
                info!("Quote record created successfully");
                Ok(new_info)
            }
            Err(e) => {
                error!("Failed to create quote record: {}", e);
                Err(RepositoryError::database(format!(
                    "Failed to create quote record: {}",
                    e
                )))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<QuoteInformation> {
        let filter = doc! { "_id": id };
        match self.collection.find_one(filter, None).await {
            Ok(Some(info)) => Ok(info),
            Ok(None) => {
                error!("Quote record not found for ID: {}", id);
                Err(RepositoryError::not_found(format!(
                    "Quote record not found for ID: {}",
                    id
                )))
            }
            Err(e) => {
                error!("Failed to fetch quote record: {}", e);
                Err(RepositoryError::database(format!(
                    "Failed to fetch quote record: {}",
                    e
                )))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(id = %id, status = %status))]
    async fn update_status(&self, id: ObjectId, status: QuoteState) -> RepositoryResult<()> {
        info!("Updating quote record status");
        let filter = doc! { "_id": id };
        let status_bson = bson::to_bson(&status)?;
        let update = doc! { "$set": {
            "status": status_bson,
            "updated_at": chrono::Utc::now().to_rfc3339(),
        }};
        let result = self.collection.update_one(filter, update, None).await;
        match result {
            Ok(r) if r.matched_count > 0 => Ok(()),
            Ok(_) => Err(RepositoryError::not_found(format!(
                "No quote record to update for ID: {}",
                id
            ))),
            Err(e) => {
                error!("Failed to update quote record status: {}", e);
                Err(RepositoryError::database(format!(
                    "Failed to update status: {}",
                    e
                )))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    async fn set_finalized(&self, id: ObjectId, finalized_at: &str) -> RepositoryResult<()> {
        info!("Finalizing quote record");
        let filter = doc! { "_id": id, "finalized_at": bson::Bson::Null };
        let status_bson = bson::to_bson(&QuoteState::Finalized)?;
        let update = doc! { "$set": {
            "finalized_at": finalized_at,
            "status": status_bson,
            "updated_at": chrono::Utc::now().to_rfc3339(),
        }};
        let result = self.collection.update_one(filter, update, None).await;
        match result {
            Ok(r) if r.matched_count > 0 => {
                info!("Quote record finalized");
                Ok(())
            }
            Ok(_) => Err(RepositoryError::not_found(format!(
                "No open quote record to finalize for ID: {}",
                id
            ))),
            Err(e) => {
                error!("Failed to finalize quote record: {}", e);
                Err(RepositoryError::database(format!(
                    "Failed to finalize: {}",
                    e
                )))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    async fn set_provider_contact(&self, id: ObjectId, phone: &str) -> RepositoryResult<()> {
        info!("Binding provider contact to quote record");
        let filter = doc! { "_id": id };
        let update = doc! { "$set": {
            "provider_contact": phone,
            "updated_at": chrono::Utc::now().to_rfc3339(),
        }};
        let result = self.collection.update_one(filter, update, None).await;
        match result {
            Ok(r) if r.matched_count > 0 => Ok(()),
            Ok(_) => Err(RepositoryError::not_found(format!(
                "No quote record for ID: {}",
                id
            ))),
            Err(e) => {
                error!("Failed to set provider contact: {}", e);
                Err(RepositoryError::database(format!(
                    "Failed to set provider contact: {}",
                    e
                )))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(page = page, limit = limit))]
    async fn list_active(&self, page: u32, limit: u32) -> RepositoryResult<Vec<QuoteInformation>> {
        info!("Listing active quote records");
        let skip = (page.max(1) - 1) as u64 * limit as u64;
        let filter = doc! { "finalized_at": bson::Bson::Null };
        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .skip(skip)
            .limit(limit as i64)
            .build();
        let cursor = self.collection.find(filter, options).await.map_err(|e| {
            error!("Failed to list quote records: {}", e);
            RepositoryError::database(format!("Failed to list quote records: {}", e))
        })?;
        let records: Vec<QuoteInformation> = cursor.try_collect().await.map_err(|e| {
            error!("Failed to read quote record cursor: {}", e);
            RepositoryError::database(format!("Failed to read cursor: {}", e))
        })?;
        info!("Fetched {} active quote records", records.len());
        Ok(records)
    }

    #[tracing::instrument(skip(self))]
    async fn count_active(&self) -> RepositoryResult<u64> {
        let filter = doc! { "finalized_at": bson::Bson::Null };
        self.collection
            .count_documents(filter, None)
            .await
            .map_err(|e| {
                error!("Failed to count quote records: {}", e);
                RepositoryError::database(format!("Failed to count quote records: {}", e))
            })
    }
}
