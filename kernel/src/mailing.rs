use async_trait::async_trait;
use shared::error::AppResult;

use crate::model::{event::Event, project::Project, user::User};

/// Welcome message sent to whoever registered a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WelcomeMail {
    pub to: String,
    pub project_name: String,
    pub event_name: String,
    pub event_slug: String,
    pub event_date: String,
    pub event_location: String,
    pub event_website: String,
}

impl WelcomeMail {
    /// `None` when the creator left no address to write to.
    pub fn for_registration(creator: &User, event: &Event, project: &Project) -> Option<Self> {
        let to = creator.email()?.to_string();
        Some(Self {
            to,
            project_name: project.name.clone(),
            event_name: event.name.clone(),
            event_slug: event.slug.clone(),
            event_date: event.date.format("%A %-d %B %Y").to_string(),
            event_location: event.location.clone(),
            event_website: event.homepage.clone(),
        })
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_welcome(&self, mail: WelcomeMail) -> AppResult<()>;
}
