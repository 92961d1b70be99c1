use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::app_conf::AppConfig;
use crate::config::seed_user_conf::SeedUserConfig;
use crate::config::{JwtConfig, MessagingConfig, MinioConfig, MongoConfig, PdfConfig};
use crate::handler::render_handler::RenderState;
use crate::middlewares::auth_middleware::AuthState;
use crate::model::user::{Role, User};
use crate::repository::provider_quote_repo::MongoProviderQuoteRepository;
use crate::repository::quote_info_repo::MongoQuoteInformationRepository;
use crate::repository::quote_revision_repo::MongoQuoteRevisionRepository;
use crate::repository::user_repo::{MongoUserRepository, UserRepository};
use crate::router::quote_router::quote_router;
use crate::router::user_router::user_router;
use crate::service::quote_flow_service::QuoteFlowServiceImpl;
use crate::service::user_service::{UserService, UserServiceImpl};
use crate::util::jwt::JwtTokenUtilsImpl;
use crate::util::notify::HttpNotificationDispatcher;
use crate::util::pdf::PdfRenderService;
use crate::util::storage::StorageService;

pub struct App {
    config: AppConfig,
    router: Router,
    pub user_service: Arc<UserServiceImpl>,
    pub quote_service: Arc<QuoteFlowServiceImpl>,
}

impl App {
    pub async fn new() -> Self {
        let config = AppConfig::from_env();
        config.validate().expect("App config error");

        let jwt_config = JwtConfig::from_env().expect("JWT config error");
        let mongo_config = MongoConfig::from_env().expect("Mongo config error");
        let minio_config = MinioConfig::from_env().expect("Minio config error");
        let messaging_config = MessagingConfig::from_env().expect("Messaging config error");
        let pdf_config = PdfConfig::from_env().expect("PDF config error");

        let user_repo = Arc::new(
            MongoUserRepository::new(&mongo_config)
                .await
                .expect("User repo error"),
        );
        let info_repo = Arc::new(
            MongoQuoteInformationRepository::new(&mongo_config)
                .await
                .expect("Quote info repo error"),
        );
        let revision_repo = Arc::new(
            MongoQuoteRevisionRepository::new(&mongo_config)
                .await
                .expect("Quote revision repo error"),
        );
        let provider_repo = Arc::new(
            MongoProviderQuoteRepository::new(&mongo_config)
                .await
                .expect("Provider quote repo error"),
        );

        let storage = Arc::new(
            StorageService::new(minio_config)
                .await
                .expect("Storage service error"),
        );
        let dispatcher = Arc::new(
            HttpNotificationDispatcher::new(messaging_config).expect("Dispatcher error"),
        );
        let renderer = Arc::new(PdfRenderService::new(pdf_config));

        let jwt_utils = Arc::new(JwtTokenUtilsImpl::new(jwt_config));
        let user_service = Arc::new(UserServiceImpl::new(user_repo.clone(), jwt_utils.clone()));

        let quote_service = Arc::new(QuoteFlowServiceImpl {
            info_repo,
            revision_repo,
            provider_repo,
            user_repo,
            storage,
            dispatcher,
        });

        let auth_state = Arc::new(AuthState {
            jwt_utils: jwt_utils.clone(),
        });
        let render_state = Arc::new(RenderState {
            flow: quote_service.clone(),
            renderer,
        });

        let router = Router::new()
            .merge(quote_router(
                quote_service.clone(),
                render_state,
                auth_state.clone(),
            ))
            .merge(user_router(user_service.clone()))
            .route("/health", get(|| async { "OK" }));

        let app = App {
            config,
            router,
            user_service,
            quote_service,
        };
        app.seed_first_supervisor().await;
        app
    }

    pub async fn start(self) {
        let addr = SocketAddr::new(
            self.config.host.parse().expect("Invalid host"),
            self.config.port,
        );
        info!("Server running at http://{}", addr);
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .expect("Failed to bind address");
        axum::serve(listener, self.router)
            .await
            .expect("Failed to start server");
    }

    /// Idempotent: creates the configured supervisor account when no user
    /// owns that phone yet. Failures are logged, never fatal.
    async fn seed_first_supervisor(&self) {
        let seed_conf = match SeedUserConfig::from_env() {
            Ok(c) => c,
            Err(e) => {
                warn!("Seed supervisor config not loaded: {e}");
                return;
            }
        };

        match self.user_service.user_repo.find_by_phone(&seed_conf.phone).await {
            Ok(Some(_)) => {
                info!("Seed supervisor already exists, skipping creation.");
                return;
            }
            Ok(None) => {}
            Err(e) => {
                error!("Failed to check for existing supervisor: {e}");
                return;
            }
        }

        let user = User {
            id: None,
            phone: seed_conf.phone.clone(),
            name: seed_conf.name.clone(),
            email: seed_conf.email.clone(),
            role: Role::Supervisor,
            password_hash: None, // Set by register
            company: None,
            created_at: None,
            updated_at: None,
        };
        match self.user_service.register(user, seed_conf.password.clone()).await {
            Ok(_) => info!("Seed supervisor created."),
            Err(e) => error!("Failed to create seed supervisor: {e}"),
        }
    }
}
