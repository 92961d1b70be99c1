//! In-memory collaborators for exercising the quote workflow without live
//! Mongo/MinIO/gateway services.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bson::oid::ObjectId;

use renders_backend::middlewares::auth_middleware::AuthContext;
use renders_backend::model::lifecycle::QuoteState;
use renders_backend::model::provider_quote::ProviderQuote;
use renders_backend::model::quote::{QuoteInformation, QuoteRevision};
use renders_backend::model::user::{Role, User};
use renders_backend::repository::provider_quote_repo::ProviderQuoteRepository;
use renders_backend::repository::quote_info_repo::QuoteInformationRepository;
use renders_backend::repository::quote_revision_repo::QuoteRevisionRepository;
use renders_backend::repository::repository_error::{RepositoryError, RepositoryResult};
use renders_backend::repository::user_repo::UserRepository;
use renders_backend::service::quote_flow_service::QuoteFlowServiceImpl;
use renders_backend::util::notify::{NotificationDispatcher, NotifyError};
use renders_backend::util::storage::{object_key_for, ObjectStorage, StorageError};

#[derive(Default)]
pub struct InMemoryInfoRepo {
    pub records: Mutex<Vec<QuoteInformation>>,
}

#[async_trait]
impl QuoteInformationRepository for InMemoryInfoRepo {
    async fn create(&self, info: QuoteInformation) -> RepositoryResult<QuoteInformation> {
        let mut new_info = info;
        new_info.id = Some(ObjectId::new());
        let now = chrono::Utc::now().to_rfc3339();
        new_info.created_at = Some(now.clone());
        new_info.updated_at = Some(now);
        self.records.lock().unwrap().push(new_info.clone());
        Ok(new_info)
    }

    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<QuoteInformation> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == Some(id))
            .cloned()
            .ok_or_else(|| RepositoryError::not_found(format!("Quote record {}", id)))
    }

    async fn update_status(&self, id: ObjectId, status: QuoteState) -> RepositoryResult<()> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id == Some(id))
            .ok_or_else(|| RepositoryError::not_found(format!("Quote record {}", id)))?;
        record.status = status;
        Ok(())
    }

    async fn set_finalized(&self, id: ObjectId, finalized_at: &str) -> RepositoryResult<()> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id == Some(id) && r.finalized_at.is_none())
            .ok_or_else(|| RepositoryError::not_found(format!("Open quote record {}", id)))?;
        record.finalized_at = Some(finalized_at.to_string());
        record.status = QuoteState::Finalized;
        Ok(())
    }

    async fn set_provider_contact(&self, id: ObjectId, phone: &str) -> RepositoryResult<()> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id == Some(id))
            .ok_or_else(|| RepositoryError::not_found(format!("Quote record {}", id)))?;
        record.provider_contact = Some(phone.to_string());
        Ok(())
    }

    async fn list_active(&self, page: u32, limit: u32) -> RepositoryResult<Vec<QuoteInformation>> {
        let records = self.records.lock().unwrap();
        let mut active: Vec<QuoteInformation> = records
            .iter()
            .filter(|r| r.finalized_at.is_none())
            .cloned()
            .collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let skip = (page.max(1) - 1) as usize * limit as usize;
        Ok(active.into_iter().skip(skip).take(limit as usize).collect())
    }

    async fn count_active(&self) -> RepositoryResult<u64> {
        let records = self.records.lock().unwrap();
        Ok(records.iter().filter(|r| r.finalized_at.is_none()).count() as u64)
    }
}

#[derive(Default)]
pub struct InMemoryRevisionRepo {
    pub revisions: Mutex<Vec<QuoteRevision>>,
}

impl InMemoryRevisionRepo {
    fn next_sequence(revisions: &[QuoteRevision], quote_information_id: ObjectId) -> u32 {
        revisions
            .iter()
            .filter(|r| r.quote_information_id == quote_information_id)
            .map(|r| r.sequence)
            .max()
            .map(|s| s + 1)
            .unwrap_or(1)
    }
}

#[async_trait]
impl QuoteRevisionRepository for InMemoryRevisionRepo {
    async fn create(&self, revision: QuoteRevision) -> RepositoryResult<QuoteRevision> {
        let mut revisions = self.revisions.lock().unwrap();
        let mut new_revision = revision;
        new_revision.id = Some(ObjectId::new());
        new_revision.sequence =
            Self::next_sequence(&revisions, new_revision.quote_information_id);
        new_revision.created_at = Some(chrono::Utc::now().to_rfc3339());
        revisions.push(new_revision.clone());
        Ok(new_revision)
    }

    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<QuoteRevision> {
        self.revisions
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == Some(id))
            .cloned()
            .ok_or_else(|| RepositoryError::not_found(format!("Revision {}", id)))
    }

    async fn current(&self, quote_information_id: ObjectId) -> RepositoryResult<QuoteRevision> {
        self.revisions
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.quote_information_id == quote_information_id)
            .max_by_key(|r| r.sequence)
            .cloned()
            .ok_or_else(|| {
                RepositoryError::not_found(format!("No revisions for {}", quote_information_id))
            })
    }

    async fn list_by_quote(
        &self,
        quote_information_id: ObjectId,
    ) -> RepositoryResult<Vec<QuoteRevision>> {
        let mut revisions: Vec<QuoteRevision> = self
            .revisions
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.quote_information_id == quote_information_id)
            .cloned()
            .collect();
        revisions.sort_by(|a, b| b.sequence.cmp(&a.sequence));
        Ok(revisions)
    }

    async fn reject_and_create(
        &self,
        rejected_id: ObjectId,
        rejected_at: &str,
        replacement: QuoteRevision,
    ) -> RepositoryResult<QuoteRevision> {
        let mut revisions = self.revisions.lock().unwrap();
        let rejected = revisions
            .iter_mut()
            .find(|r| r.id == Some(rejected_id) && r.rejected_at.is_none())
            .ok_or_else(|| {
                RepositoryError::not_found(format!("Revision {} was already superseded", rejected_id))
            })?;
        rejected.rejected_at = Some(rejected_at.to_string());

        let mut new_revision = replacement;
        new_revision.id = Some(ObjectId::new());
        new_revision.sequence =
            Self::next_sequence(&revisions, new_revision.quote_information_id);
        new_revision.created_at = Some(chrono::Utc::now().to_rfc3339());
        revisions.push(new_revision.clone());
        Ok(new_revision)
    }
}

#[derive(Default)]
pub struct InMemoryProviderRepo {
    pub links: Mutex<Vec<ProviderQuote>>,
}

#[async_trait]
impl ProviderQuoteRepository for InMemoryProviderRepo {
    async fn create(&self, link: ProviderQuote) -> RepositoryResult<ProviderQuote> {
        let mut new_link = link;
        new_link.id = Some(ObjectId::new());
        new_link.created_at = Some(chrono::Utc::now().to_rfc3339());
        self.links.lock().unwrap().push(new_link.clone());
        Ok(new_link)
    }

    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<ProviderQuote> {
        self.links
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.id == Some(id))
            .cloned()
            .ok_or_else(|| RepositoryError::not_found(format!("Provider link {}", id)))
    }

    async fn find_by_provider(
        &self,
        quote_information_id: ObjectId,
        provider_user_id: ObjectId,
    ) -> RepositoryResult<Option<ProviderQuote>> {
        Ok(self
            .links
            .lock()
            .unwrap()
            .iter()
            .find(|l| {
                l.quote_information_id == quote_information_id
                    && l.provider_user_id == provider_user_id
            })
            .cloned())
    }

    async fn list_by_quote(
        &self,
        quote_information_id: ObjectId,
    ) -> RepositoryResult<Vec<ProviderQuote>> {
        Ok(self
            .links
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.quote_information_id == quote_information_id)
            .cloned()
            .collect())
    }

    async fn set_revision(&self, id: ObjectId, revision_id: ObjectId) -> RepositoryResult<()> {
        let mut links = self.links.lock().unwrap();
        let link = links
            .iter_mut()
            .find(|l| l.id == Some(id))
            .ok_or_else(|| RepositoryError::not_found(format!("Provider link {}", id)))?;
        link.revision_id = Some(revision_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryUserRepo {
    pub users: Mutex<Vec<User>>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepo {
    async fn insert(&self, user: User) -> RepositoryResult<User> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.phone == user.phone) {
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
        users.push(new_user.clone());
        Ok(new_user)
    }

    async fn find_by_phone(&self, phone: &str) -> RepositoryResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.phone == phone)
            .cloned())
    }

    async fn find_by_id(&self, id: &ObjectId) -> RepositoryResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id.as_ref() == Some(id))
            .cloned())
    }
}

/// Records every dispatched message instead of hitting a gateway
#[derive(Default)]
pub struct RecordingDispatcher {
    pub sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    async fn send(&self, phone: &str, message: &str) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((phone.to_string(), message.to_string()));
        Ok(())
    }
}

/// Content-addressed storage fake; uploads only on unseen keys, so duplicate
/// bytes exercise the skip path
#[derive(Default)]
pub struct FakeStorage {
    pub uploaded: Mutex<Vec<String>>,
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn store(
        &self,
        data: Vec<u8>,
        filename: &str,
        _content_type: Option<&str>,
    ) -> Result<String, StorageError> {
        let key = object_key_for(&data, filename);
        let mut uploaded = self.uploaded.lock().unwrap();
        if !uploaded.contains(&key) {
            uploaded.push(key.clone());
        }
        Ok(key)
    }

    fn build_url(&self, object_name: &str) -> String {
        format!("http://storage.test/renders-uploads/{}", object_name)
    }
}

pub struct TestHarness {
    pub service: Arc<QuoteFlowServiceImpl>,
    pub info_repo: Arc<InMemoryInfoRepo>,
    pub revision_repo: Arc<InMemoryRevisionRepo>,
    pub provider_repo: Arc<InMemoryProviderRepo>,
    pub user_repo: Arc<InMemoryUserRepo>,
    pub storage: Arc<FakeStorage>,
    pub dispatcher: Arc<RecordingDispatcher>,
}

pub fn harness() -> TestHarness {
    let info_repo = Arc::new(InMemoryInfoRepo::default());
    let revision_repo = Arc::new(InMemoryRevisionRepo::default());
    let provider_repo = Arc::new(InMemoryProviderRepo::default());
    let user_repo = Arc::new(InMemoryUserRepo::default());
    let storage = Arc::new(FakeStorage::default());
    let dispatcher = Arc::new(RecordingDispatcher::default());

    let service = Arc::new(QuoteFlowServiceImpl {
        info_repo: info_repo.clone(),
        revision_repo: revision_repo.clone(),
        provider_repo: provider_repo.clone(),
        user_repo: user_repo.clone(),
        storage: storage.clone(),
        dispatcher: dispatcher.clone(),
    });

    TestHarness {
        service,
        info_repo,
        revision_repo,
        provider_repo,
        user_repo,
        storage,
        dispatcher,
    }
}

pub fn ctx(role: Role) -> AuthContext {
    AuthContext {
        user_id: ObjectId::new().to_hex(),
        phone: "5500000000".to_string(),
        role,
    }
}

pub fn ctx_for(role: Role, user_id: ObjectId, phone: &str) -> AuthContext {
    AuthContext {
        user_id: user_id.to_hex(),
        phone: phone.to_string(),
        role,
    }
}

/// Seed a user and return it with its assigned id
pub async fn seed_user(repo: &InMemoryUserRepo, role: Role, phone: &str, name: &str) -> User {
    repo.insert(User {
        id: None,
        phone: phone.to_string(),
        name: name.to_string(),
        email: None,
        role,
        password_hash: None,
        company: None,
        created_at: None,
        updated_at: None,
    })
    .await
    .expect("seed user")
}
