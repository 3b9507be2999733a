use crate::model::{id::UserId, user::UserProfile};
use derive_new::new;

/// Create-or-update of a user. Without an id a new user is inserted.
#[derive(Debug, Clone, new)]
pub struct SaveUser {
    pub id: Option<UserId>,
    pub profile: UserProfile,
}
