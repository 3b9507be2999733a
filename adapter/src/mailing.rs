use async_trait::async_trait;
use kernel::mailing::{Mailer, WelcomeMail};
use reqwest::Client;
use serde_json::{json, Value};
use shared::{
    config::MailingConfig,
    error::{AppError, AppResult},
};

const SENDGRID_SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// Sends mail through the SendGrid v3 API using dynamic templates.
pub struct SendGridMailer {
    client: Client,
    api_key: String,
    config: MailingConfig,
}

impl SendGridMailer {
    pub fn new(api_key: String, config: MailingConfig) -> Self {
        Self {
            client: Client::new(),
            api_key,
            config,
        }
    }
}

#[async_trait]
impl Mailer for SendGridMailer {
    async fn send_welcome(&self, mail: WelcomeMail) -> AppResult<()> {
        let res = self
            .client
            .post(SENDGRID_SEND_URL)
            .bearer_auth(&self.api_key)
            .json(&welcome_payload(&self.config, &mail))
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("SendGrid error: {e}")))?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(AppError::ExternalServiceError(format!(
                "SendGrid answered {status}: {body}"
            )));
        }

        tracing::info!(to = %mail.to, project = %mail.project_name, "Welcome mail sent");
        Ok(())
    }
}

/// Stands in when no API key is configured.
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send_welcome(&self, mail: WelcomeMail) -> AppResult<()> {
        tracing::debug!(to = %mail.to, "Mailing is disabled, welcome mail skipped");
        Ok(())
    }
}

fn welcome_payload(config: &MailingConfig, mail: &WelcomeMail) -> Value {
    json!({
        "personalizations": [{
            "to": [{ "email": mail.to }],
            "dynamic_template_data": {
                "projectName": mail.project_name,
                "eventName": mail.event_name,
                "eventDate": mail.event_date,
                "eventLocation": mail.event_location,
                "eventWebsite": mail.event_website,
                "eventManageLink": config.manage_link,
            },
        }],
        "from": { "email": config.from_email, "name": config.from_name },
        "reply_to": {
            "email": config.from_email,
            "name": format!("{} Support", config.from_name),
        },
        "subject": "Welcome on CP",
        "categories": ["coolest-projects", format!("cp-{}-registration", mail.event_slug)],
        "template_id": config.welcome_template_id,
    })
}
