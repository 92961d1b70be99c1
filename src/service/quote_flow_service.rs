use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bson::oid::ObjectId;
use tracing::{error, info, instrument, warn};

use crate::dto::quote_dto::{
    CreateQuoteRequest, EntryDto, File, ProviderRevisionRequest, QuoteDetailResponse,
    QuoteListResponse, RejectQuoteRequest,
};
use crate::middlewares::auth_middleware::AuthContext;
use crate::model::lifecycle::{
    self, can_transition, counter_role, entries_ready_for_finalize, QuoteAction, QuoteState,
};
use crate::model::provider_quote::ProviderQuote;
use crate::model::quote::{Entry, QuoteInformation, QuoteRevision};
use crate::model::user::Role;
use crate::repository::provider_quote_repo::ProviderQuoteRepository;
use crate::repository::quote_info_repo::QuoteInformationRepository;
use crate::repository::quote_revision_repo::QuoteRevisionRepository;
use crate::repository::user_repo::UserRepository;
use crate::util::error::ServiceError;
use crate::util::notify::{templates, NotificationDispatcher};
use crate::util::storage::ObjectStorage;

#[async_trait]
pub trait QuoteFlowService: Send + Sync {
    /// Opens a quote record with its first revision; notifies the approval
    /// contact exactly once. `images` maps entry index to an uploaded file.
    async fn create_quote(
        &self,
        ctx: &AuthContext,
        request: CreateQuoteRequest,
        images: HashMap<usize, File>,
    ) -> Result<QuoteDetailResponse, ServiceError>;

    async fn get_quote(
        &self,
        ctx: &AuthContext,
        id: ObjectId,
    ) -> Result<QuoteDetailResponse, ServiceError>;

    /// Active dashboard; petitioners and supervisors only
    async fn list_active(
        &self,
        ctx: &AuthContext,
        page: u32,
        limit: u32,
    ) -> Result<QuoteListResponse, ServiceError>;

    async fn accept_quote(
        &self,
        ctx: &AuthContext,
        id: ObjectId,
    ) -> Result<QuoteDetailResponse, ServiceError>;

    async fn reject_quote(
        &self,
        ctx: &AuthContext,
        id: ObjectId,
        request: RejectQuoteRequest,
    ) -> Result<QuoteDetailResponse, ServiceError>;

    async fn finalize_quote(
        &self,
        ctx: &AuthContext,
        id: ObjectId,
    ) -> Result<QuoteDetailResponse, ServiceError>;

    async fn submit_provider_revision(
        &self,
        ctx: &AuthContext,
        id: ObjectId,
        request: ProviderRevisionRequest,
    ) -> Result<QuoteDetailResponse, ServiceError>;

    async fn select_provider_quote(
        &self,
        ctx: &AuthContext,
        id: ObjectId,
        provider_quote_id: ObjectId,
    ) -> Result<QuoteDetailResponse, ServiceError>;
}

pub struct QuoteFlowServiceImpl {
    pub info_repo: Arc<dyn QuoteInformationRepository>,
    pub revision_repo: Arc<dyn QuoteRevisionRepository>,
    pub provider_repo: Arc<dyn ProviderQuoteRepository>,
    pub user_repo: Arc<dyn UserRepository>,
    pub storage: Arc<dyn ObjectStorage>,
    pub dispatcher: Arc<dyn NotificationDispatcher>,
}

impl QuoteFlowServiceImpl {
    /// Effective lifecycle state of a record
    fn state_of(info: &QuoteInformation) -> QuoteState {
        if info.is_finalized() {
            QuoteState::Finalized
        } else {
            info.status
        }
    }

    fn gate(ctx: &AuthContext, info: &QuoteInformation, action: QuoteAction) -> Result<(), ServiceError> {
        let state = Self::state_of(info);
        if !can_transition(ctx.role, state, action) {
            warn!(
                role = %ctx.role,
                state = %state,
                action = %action,
                "Transition denied by policy"
            );
            return Err(ServiceError::Forbidden(format!(
                "Role {} may not {} a quote in state {}",
                ctx.role, action, state
            )));
        }
        Ok(())
    }

    /// Best-effort dispatch; a failed notification never fails the transition
    async fn notify(&self, phone: &str, message: String) {
        if let Err(e) = self.dispatcher.send(phone, &message).await {
            error!("Notification to {} failed (ignored): {}", phone, e);
        }
    }

    fn entry_from_dto(dto: EntryDto) -> Entry {
        Entry {
            name: dto.name,
            sizes: dto.sizes,
            concept: dto.concept,
            range: dto.range,
            material: dto.material,
            material_subtype: dto.material_subtype,
            unitary_cost: dto.unitary_cost,
            unitary_price: dto.unitary_price,
            unitary_final_price: dto.unitary_final_price,
            image_path: None,
        }
    }

    async fn detail(
        &self,
        info: QuoteInformation,
        current: QuoteRevision,
    ) -> Result<QuoteDetailResponse, ServiceError> {
        let info_id = info
            .id
            .ok_or_else(|| ServiceError::InternalError("Quote record without id".to_string()))?;
        let history = self.revision_repo.list_by_quote(info_id).await?;
        let providers = self.provider_repo.list_by_quote(info_id).await?;
        let image_links = current
            .entries
            .iter()
            .filter_map(|e| e.image_path.as_deref())
            .map(|path| self.storage.build_url(path))
            .collect();
        Ok(QuoteDetailResponse {
            info,
            current,
            history,
            providers,
            image_links,
        })
    }

    /// Phone that should hear about a revision now owned by `role`
    fn contact_for(info: &QuoteInformation, role: Role) -> String {
        match role {
            Role::Validator | Role::Supervisor => info.approval_contact.clone(),
            Role::Provider => info
                .provider_contact
                .clone()
                .unwrap_or_else(|| info.request_contact.clone()),
            Role::Petitioner => info.request_contact.clone(),
        }
    }
}

#[async_trait]
impl QuoteFlowService for QuoteFlowServiceImpl {
    #[instrument(skip(self, ctx, request, images), fields(role = %ctx.role, project = %request.project))]
    async fn create_quote(
        &self,
        ctx: &AuthContext,
        request: CreateQuoteRequest,
        images: HashMap<usize, File>,
    ) -> Result<QuoteDetailResponse, ServiceError> {
        info!("Creating quote record with first revision");

        if !lifecycle::can_create(ctx.role) {
            return Err(ServiceError::Forbidden(format!(
                "Role {} may not open quote records",
                ctx.role
            )));
        }

        let info = QuoteInformation {
            id: None,
            company: request.company,
            client: request.client,
            project: request.project,
            serial: request.serial,
            brand: request.brand,
            request_contact: request.request_contact,
            approval_contact: request.approval_contact,
            provider_contact: None,
            estimated_delivery_date: request.estimated_delivery_date,
            status: QuoteState::DraftSubmitted,
            finalized_at: None,
            created_at: None,
            updated_at: None,
        };
        let info = self.info_repo.create(info).await?;
        let info_id = info
            .id
            .ok_or_else(|| ServiceError::InternalError("Missing id on created record".to_string()))?;

        let mut entries: Vec<Entry> = request
            .entries
            .into_iter()
            .map(Self::entry_from_dto)
            .collect();
        for (index, file) in images {
            if let Some(entry) = entries.get_mut(index) {
                let path = self
                    .storage
                    .store(file.content, &file.filename, Some(&file.content_type))
                    .await
                    .map_err(|e| ServiceError::InternalError(format!("Image upload failed: {e}")))?;
                entry.image_path = Some(path);
            }
        }

        let revision = QuoteRevision {
            id: None,
            quote_information_id: info_id,
            sequence: 0,
            created_by_role: ctx.role,
            comment: None,
            rejected_at: None,
            provider_quote_user_id: None,
            entries,
            created_at: None,
        };
        let revision = self.revision_repo.create(revision).await?;

        self.notify(
            &info.approval_contact,
            templates::quote_created(&info.project, &info.serial),
        )
        .await;

        info!("Quote record created");
        self.detail(info, revision).await
    }

    #[instrument(skip(self, ctx), fields(id = %id, role = %ctx.role))]
    async fn get_quote(
        &self,
        ctx: &AuthContext,
        id: ObjectId,
    ) -> Result<QuoteDetailResponse, ServiceError> {
        let info = self.info_repo.get_by_id(id).await?;
        let current = self.revision_repo.current(id).await?;
        self.detail(info, current).await
    }

    #[instrument(skip(self, ctx), fields(role = %ctx.role, page = page, limit = limit))]
    async fn list_active(
        &self,
        ctx: &AuthContext,
        page: u32,
        limit: u32,
    ) -> Result<QuoteListResponse, ServiceError> {
        if !lifecycle::can_view_dashboard(ctx.role) {
            return Err(ServiceError::Forbidden(format!(
                "Role {} may not view the active dashboard",
                ctx.role
            )));
        }
        let records = self.info_repo.list_active(page, limit).await?;
        let total = self.info_repo.count_active().await?;
        Ok(QuoteListResponse {
            records,
            total,
            page,
            limit,
        })
    }

    #[instrument(skip(self, ctx), fields(id = %id, role = %ctx.role))]
    async fn accept_quote(
        &self,
        ctx: &AuthContext,
        id: ObjectId,
    ) -> Result<QuoteDetailResponse, ServiceError> {
        info!("Accepting current revision");
        let info = self.info_repo.get_by_id(id).await?;
        Self::gate(ctx, &info, QuoteAction::Accept)?;

        let current = self.revision_repo.current(id).await?;

        if current.created_by_role == Role::Petitioner {
            // Petitioner-originated quotes finalize directly on acceptance
            if !entries_ready_for_finalize(&current.entries) {
                return Err(ServiceError::PreconditionFailed(
                    "Every entry needs non-zero cost, price and final price before closing"
                        .to_string(),
                ));
            }
            let now = chrono::Utc::now().to_rfc3339();
            self.info_repo.set_finalized(id, &now).await?;
            self.notify(
                &info.request_contact,
                templates::quote_finalized(&info.project, &info.serial),
            )
            .await;
        } else {
            // Provider-originated quotes are forwarded for confirmation
            self.info_repo.update_status(id, QuoteState::Accepted).await?;
            self.notify(
                &info.request_contact,
                templates::quote_accepted(&info.project),
            )
            .await;
        }

        let info = self.info_repo.get_by_id(id).await?;
        self.detail(info, current).await
    }

    #[instrument(skip(self, ctx, request), fields(id = %id, role = %ctx.role))]
    async fn reject_quote(
        &self,
        ctx: &AuthContext,
        id: ObjectId,
        request: RejectQuoteRequest,
    ) -> Result<QuoteDetailResponse, ServiceError> {
        info!("Rejecting current revision");
        let info = self.info_repo.get_by_id(id).await?;
        Self::gate(ctx, &info, QuoteAction::Reject)?;

        let current = self.revision_repo.current(id).await?;
        let current_id = current
            .id
            .ok_or_else(|| ServiceError::InternalError("Revision without id".to_string()))?;
        if current.rejected_at.is_some() {
            return Err(ServiceError::Conflict(
                "Current revision was already rejected".to_string(),
            ));
        }

        let next_role = counter_role(ctx.role, info.provider_bound());
        let entries = match request.entries {
            Some(dtos) => {
                // Carry entry images forward by position
                let mut entries: Vec<Entry> =
                    dtos.into_iter().map(Self::entry_from_dto).collect();
                for (entry, old) in entries.iter_mut().zip(current.entries.iter()) {
                    entry.image_path = old.image_path.clone();
                }
                entries
            }
            None => current.entries.clone(),
        };

        let replacement = QuoteRevision {
            id: None,
            quote_information_id: id,
            sequence: 0,
            created_by_role: next_role,
            comment: Some(request.comment.clone()),
            rejected_at: None,
            provider_quote_user_id: current.provider_quote_user_id,
            entries,
            created_at: None,
        };

        let rejected_at = chrono::Utc::now().to_rfc3339();
        let replacement = self
            .revision_repo
            .reject_and_create(current_id, &rejected_at, replacement)
            .await?;
        self.info_repo
            .update_status(id, QuoteState::PendingApproval)
            .await?;

        self.notify(
            &Self::contact_for(&info, next_role),
            templates::quote_rejected(&info.project, &request.comment),
        )
        .await;

        let info = self.info_repo.get_by_id(id).await?;
        self.detail(info, replacement).await
    }

    #[instrument(skip(self, ctx), fields(id = %id, role = %ctx.role))]
    async fn finalize_quote(
        &self,
        ctx: &AuthContext,
        id: ObjectId,
    ) -> Result<QuoteDetailResponse, ServiceError> {
        info!("Finalizing quote record");
        let info = self.info_repo.get_by_id(id).await?;
        Self::gate(ctx, &info, QuoteAction::Finalize)?;

        let current = self.revision_repo.current(id).await?;
        if !entries_ready_for_finalize(&current.entries) {
            return Err(ServiceError::PreconditionFailed(
                "Every entry needs non-zero cost, price and final price before closing".to_string(),
            ));
        }

        let now = chrono::Utc::now().to_rfc3339();
        self.info_repo.set_finalized(id, &now).await?;

        self.notify(
            &info.request_contact,
            templates::quote_finalized(&info.project, &info.serial),
        )
        .await;

        let info = self.info_repo.get_by_id(id).await?;
        self.detail(info, current).await
    }

    #[instrument(skip(self, ctx, request), fields(id = %id, role = %ctx.role))]
    async fn submit_provider_revision(
        &self,
        ctx: &AuthContext,
        id: ObjectId,
        request: ProviderRevisionRequest,
    ) -> Result<QuoteDetailResponse, ServiceError> {
        info!("Provider submitting revision");
        let info = self.info_repo.get_by_id(id).await?;
        Self::gate(ctx, &info, QuoteAction::SubmitProviderRevision)?;

        if info.provider_bound() {
            return Err(ServiceError::Conflict(
                "A provider is already bound to this quote".to_string(),
            ));
        }

        let provider_user_id = ObjectId::parse_str(&ctx.user_id)
            .map_err(|_| ServiceError::InvalidInput("Invalid user id in context".to_string()))?;

        let link = match self
            .provider_repo
            .find_by_provider(id, provider_user_id)
            .await?
        {
            Some(link) => link,
            None => {
                self.provider_repo
                    .create(ProviderQuote {
                        id: None,
                        quote_information_id: id,
                        provider_user_id,
                        revision_id: None,
                        created_at: None,
                    })
                    .await?
            }
        };
        let link_id = link
            .id
            .ok_or_else(|| ServiceError::InternalError("Provider link without id".to_string()))?;

        let revision = QuoteRevision {
            id: None,
            quote_information_id: id,
            sequence: 0,
            created_by_role: ctx.role,
            comment: request.comment,
            rejected_at: None,
            provider_quote_user_id: Some(provider_user_id),
            entries: request
                .entries
                .into_iter()
                .map(Self::entry_from_dto)
                .collect(),
            created_at: None,
        };
        let revision = self.revision_repo.create(revision).await?;
        let revision_id = revision
            .id
            .ok_or_else(|| ServiceError::InternalError("Revision without id".to_string()))?;
        self.provider_repo.set_revision(link_id, revision_id).await?;

        self.notify(
            &info.request_contact,
            templates::provider_revision_submitted(&info.project),
        )
        .await;

        let info = self.info_repo.get_by_id(id).await?;
        self.detail(info, revision).await
    }

    #[instrument(skip(self, ctx), fields(id = %id, provider_quote = %provider_quote_id, role = %ctx.role))]
    async fn select_provider_quote(
        &self,
        ctx: &AuthContext,
        id: ObjectId,
        provider_quote_id: ObjectId,
    ) -> Result<QuoteDetailResponse, ServiceError> {
        info!("Selecting provider quote");
        let info = self.info_repo.get_by_id(id).await?;
        Self::gate(ctx, &info, QuoteAction::SelectProviderQuote)?;

        if info.provider_bound() {
            return Err(ServiceError::Conflict(
                "A provider is already bound to this quote".to_string(),
            ));
        }

        let link = self.provider_repo.get_by_id(provider_quote_id).await?;
        if link.quote_information_id != id {
            return Err(ServiceError::InvalidInput(
                "Provider quote belongs to a different record".to_string(),
            ));
        }
        let selected_revision_id = link.revision_id.ok_or_else(|| {
            ServiceError::Conflict("This provider has not submitted a revision yet".to_string())
        })?;
        let selected = self.revision_repo.get_by_id(selected_revision_id).await?;

        let provider = self
            .user_repo
            .find_by_id(&link.provider_user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Provider user not found".to_string()))?;

        // The selected proposal becomes the binding current revision; when a
        // newer revision exists it is superseded in the same transaction.
        let current = self.revision_repo.current(id).await?;
        let binding = if current.id != selected.id {
            let current_id = current
                .id
                .ok_or_else(|| ServiceError::InternalError("Revision without id".to_string()))?;
            let copy = QuoteRevision {
                id: None,
                quote_information_id: id,
                sequence: 0,
                created_by_role: selected.created_by_role,
                comment: selected.comment.clone(),
                rejected_at: None,
                provider_quote_user_id: selected.provider_quote_user_id,
                entries: selected.entries.clone(),
                created_at: None,
            };
            let rejected_at = chrono::Utc::now().to_rfc3339();
            self.revision_repo
                .reject_and_create(current_id, &rejected_at, copy)
                .await?
        } else {
            selected
        };

        self.info_repo
            .set_provider_contact(id, &provider.phone)
            .await?;

        self.notify(&provider.phone, templates::provider_selected(&info.project))
            .await;

        let info = self.info_repo.get_by_id(id).await?;
        self.detail(info, binding).await
    }
}
