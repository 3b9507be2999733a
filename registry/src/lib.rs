use std::sync::Arc;

use adapter::mailing::{DisabledMailer, SendGridMailer};
use adapter::repository::{
    auth::AuthRepositoryImpl, event::EventRepositoryImpl, health::HealthCheckRepositoryImpl,
    project::ProjectRepositoryImpl, user::UserRepositoryImpl,
};
use adapter::database::ConnectionPool;
use kernel::mailing::Mailer;
use kernel::repository::{
    auth::AuthRepository, event::EventRepository, health::HealthCheckRepository,
    project::ProjectRepository, user::UserRepository,
};
use kernel::service::project::ProjectAssociationService;
use shared::config::AppConfig;

#[derive(Clone)]
pub struct AppRegistry {
    health_check_repository: Arc<dyn HealthCheckRepository>,
    auth_repository: Arc<dyn AuthRepository>,
    user_repository: Arc<dyn UserRepository>,
    event_repository: Arc<dyn EventRepository>,
    project_repository: Arc<dyn ProjectRepository>,
    project_service: Arc<ProjectAssociationService>,
    mailer: Arc<dyn Mailer>,
}

impl AppRegistry {
    pub fn new(pool: ConnectionPool, app_config: AppConfig) -> Self {
        let health_check_repository = Arc::new(HealthCheckRepositoryImpl::new(pool.clone()));
        let auth_repository = Arc::new(AuthRepositoryImpl::new(
            pool.clone(),
            app_config.auth.ttl,
        ));
        let user_repository = Arc::new(UserRepositoryImpl::new(pool.clone()));
        let event_repository = Arc::new(EventRepositoryImpl::new(pool.clone()));
        let project_repository: Arc<dyn ProjectRepository> =
            Arc::new(ProjectRepositoryImpl::new(pool.clone()));
        let project_service = Arc::new(ProjectAssociationService::new(
            project_repository.clone(),
        ));
        let mailer: Arc<dyn Mailer> = match app_config.mailing.api_key.clone() {
            Some(api_key) => Arc::new(SendGridMailer::new(api_key, app_config.mailing)),
            None => {
                tracing::warn!("MAILING_API_KEY is not set, welcome mails are disabled");
                Arc::new(DisabledMailer)
            }
        };
        Self {
            health_check_repository,
            auth_repository,
            user_repository,
            event_repository,
            project_repository,
            project_service,
            mailer,
        }
    }

    pub fn health_check_repository(&self) -> Arc<dyn HealthCheckRepository> {
        self.health_check_repository.clone()
    }

    pub fn auth_repository(&self) -> Arc<dyn AuthRepository> {
        self.auth_repository.clone()
    }

    pub fn user_repository(&self) -> Arc<dyn UserRepository> {
        self.user_repository.clone()
    }

    pub fn event_repository(&self) -> Arc<dyn EventRepository> {
        self.event_repository.clone()
    }

    pub fn project_repository(&self) -> Arc<dyn ProjectRepository> {
        self.project_repository.clone()
    }

    pub fn project_service(&self) -> Arc<ProjectAssociationService> {
        self.project_service.clone()
    }

    pub fn mailer(&self) -> Arc<dyn Mailer> {
        self.mailer.clone()
    }
}
