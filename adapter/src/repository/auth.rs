use async_trait::async_trait;
use derive_new::new;
use kernel::model::{auth::AccessToken, id::UserId};
use kernel::repository::auth::AuthRepository;
use shared::error::{AppError, AppResult};

use crate::database::ConnectionPool;

#[derive(new)]
pub struct AuthRepositoryImpl {
    db: ConnectionPool,
    /// Seconds a token stays valid after it was issued.
    ttl: u64,
}

#[async_trait]
impl AuthRepository for AuthRepositoryImpl {
    async fn fetch_user_id_from_token(
        &self,
        access_token: &AccessToken,
    ) -> AppResult<Option<UserId>> {
        sqlx::query_scalar(
            r#"
                SELECT user_id
                FROM auth_tokens
                WHERE token = $1
                  AND created_at > CURRENT_TIMESTAMP - make_interval(secs => $2)
            "#,
        )
        .bind(access_token.as_str())
        .bind(self.ttl as f64)
        .fetch_optional(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)
    }
}
