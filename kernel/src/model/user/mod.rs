use crate::model::id::UserId;
use chrono::NaiveDate;

pub mod event;

/// Personal details collected on the registration form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfile {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub dob: Option<NaiveDate>,
    pub gender: Option<String>,
    pub country: Option<String>,
    pub special_requirements: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub profile: UserProfile,
}

impl User {
    pub fn email(&self) -> Option<&str> {
        self.profile.email.as_deref()
    }
}
