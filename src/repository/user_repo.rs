use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use tracing::{error, info};

use crate::config::mongo_conf::MongoConfig;
use crate::model::user::User;
use crate::repository::repository_error::{RepositoryError, RepositoryResult};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, user: User) -> RepositoryResult<User>;
    async fn find_by_phone(&self, phone: &str) -> RepositoryResult<Option<User>>;
    async fn find_by_id(&self, id: &ObjectId) -> RepositoryResult<Option<User>>;
}

pub struct MongoUserRepository {
    collection: mongodb::Collection<User>,
}

impl MongoUserRepository {
    pub async fn new(config: &MongoConfig) -> Result<Self, mongodb::error::Error> {
        let client = crate::repository::connect(config).await?;
        let db = client.database(&config.database);
        let collection = db.collection::<User>("users");
        Ok(MongoUserRepository { collection })
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    #[tracing::instrument(skip(self, user), fields(phone = %user.phone, role = %user.role))]
    async fn insert(&self, user: User) -> RepositoryResult<User> {
        // Phone is the user's identity; refuse duplicates
        if self.find_by_phone(&user.phone).await?.is_some() {
            return Err(RepositoryError::already_exists(format!(
                "A user already exists for phone {}",
                user.phone
            )));
        }

        let mut new_user = user;
        new_user.id = Some(ObjectId::new());
        let now = chrono::Utc::now().to_rfc3339();
        new_user.created_at = Some(now.clone());
        new_user.updated_at = Some(now);

        match self.collection.insert_one(new_user.clone(), None).await {
            Ok(_) => {
                info!("User inserted successfully");
                Ok(new_user)
            }
            Err(e) => {
                error!("Failed to insert user: {}", e);
                Err(RepositoryError::database(format!(
                    "Failed to insert user: {}",
                    e
                )))
            }
        }
    }

    async fn find_by_phone(&self, phone: &str) -> RepositoryResult<Option<User>> {
        let filter = doc! { "phone": phone };
        self.collection.find_one(filter, None).await.map_err(|e| {
            RepositoryError::database(format!("Failed to find user by phone: {}", e))
        })
    }

    async fn find_by_id(&self, id: &ObjectId) -> RepositoryResult<Option<User>> {
        let filter = doc! { "_id": id };
        self.collection
            .find_one(filter, None)
            .await
            .map_err(|e| RepositoryError::database(format!("Failed to find user by id: {}", e)))
    }
}
