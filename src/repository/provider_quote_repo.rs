use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use futures::stream::TryStreamExt;
use tracing::{error, info};

use crate::config::mongo_conf::MongoConfig;
use crate::model::provider_quote::ProviderQuote;
use crate::repository::repository_error::{RepositoryError, RepositoryResult};

#[async_trait]
pub trait ProviderQuoteRepository: Send + Sync {
    async fn create(&self, link: ProviderQuote) -> RepositoryResult<ProviderQuote>;
    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<ProviderQuote>;
    async fn find_by_provider(
        &self,
        quote_information_id: ObjectId,
        provider_user_id: ObjectId,
    ) -> RepositoryResult<Option<ProviderQuote>>;
    async fn list_by_quote(
        &self,
        quote_information_id: ObjectId,
    ) -> RepositoryResult<Vec<ProviderQuote>>;
    async fn set_revision(&self, id: ObjectId, revision_id: ObjectId) -> RepositoryResult<()>;
}

pub struct MongoProviderQuoteRepository {
    collection: mongodb::Collection<ProviderQuote>,
}

impl MongoProviderQuoteRepository {
    pub async fn new(config: &MongoConfig) -> Result<Self, mongodb::error::Error> {
        let client = crate::repository::connect(config).await?;
        let db = client.database(&config.database);
        let collection = db.collection::<ProviderQuote>("provider_quotes");
        Ok(MongoProviderQuoteRepository { collection })
    }
}

#[async_trait]
impl ProviderQuoteRepository for MongoProviderQuoteRepository {
    #[tracing::instrument(skip(self, link), fields(quote = %link.quote_information_id, provider = %link.provider_user_id))]
    async fn create(&self, link: ProviderQuote) -> RepositoryResult<ProviderQuote> {
        info!("Linking candidate provider to quote record");
        let mut new_link = link;
        new_link.id = Some(ObjectId::new());
        new_link.created_at = Some(chrono::Utc::now().to_rfc3339());

        match self.collection.insert_one(new_link.clone(), None).await {
            Ok(_) => Ok(new_link),
            Err(e) => {
                error!("Failed to link provider: {}", e);
                Err(RepositoryError::database(format!(
                    "Failed to link provider: {}",
                    e
                )))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<ProviderQuote> {
        let filter = doc! { "_id": id };
        match self.collection.find_one(filter, None).await {
            Ok(Some(link)) => Ok(link),
            Ok(None) => Err(RepositoryError::not_found(format!(
                "Provider link not found for ID: {}",
                id
            ))),
            Err(e) => {
                error!("Failed to fetch provider link: {}", e);
                Err(RepositoryError::database(format!(
                    "Failed to fetch provider link: {}",
                    e
                )))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(quote = %quote_information_id, provider = %provider_user_id))]
    async fn find_by_provider(
        &self,
        quote_information_id: ObjectId,
        provider_user_id: ObjectId,
    ) -> RepositoryResult<Option<ProviderQuote>> {
        let filter = doc! {
            "quote_information_id": quote_information_id,
            "provider_user_id": provider_user_id,
        };
        self.collection.find_one(filter, None).await.map_err(|e| {
            error!("Failed to look up provider link: {}", e);
            RepositoryError::database(format!("Failed to look up provider link: {}", e))
        })
    }

    #[tracing::instrument(skip(self), fields(quote = %quote_information_id))]
    async fn list_by_quote(
        &self,
        quote_information_id: ObjectId,
    ) -> RepositoryResult<Vec<ProviderQuote>> {
        let filter = doc! { "quote_information_id": quote_information_id };
        let cursor = self.collection.find(filter, None).await.map_err(|e| {
            error!("Failed to list provider links: {}", e);
            RepositoryError::database(format!("Failed to list provider links: {}", e))
        })?;
        cursor.try_collect().await.map_err(|e| {
            error!("Failed to read provider link cursor: {}", e);
            RepositoryError::database(format!("Failed to read cursor: {}", e))
        })
    }

    #[tracing::instrument(skip(self), fields(id = %id, revision = %revision_id))]
    async fn set_revision(&self, id: ObjectId, revision_id: ObjectId) -> RepositoryResult<()> {
        let filter = doc! { "_id": id };
        let update = doc! { "$set": { "revision_id": revision_id } };
        let result = self.collection.update_one(filter, update, None).await;
        match result {
            Ok(r) if r.matched_count > 0 => Ok(()),
            Ok(_) => Err(RepositoryError::not_found(format!(
                "No provider link for ID: {}",
                id
            ))),
            Err(e) => {
                error!("Failed to set provider link revision: {}", e);
                Err(RepositoryError::database(format!(
                    "Failed to set revision: {}",
                    e
                )))
            }
        }
    }
}
