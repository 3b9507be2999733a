use chrono::NaiveDate;
use kernel::model::{
    id::UserId,
    user::{User, UserProfile},
};
use sqlx::FromRow;

#[derive(FromRow)]
pub struct UserRow {
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub dob: Option<NaiveDate>,
    pub gender: Option<String>,
    pub country: Option<String>,
    pub special_requirements: Option<String>,
}

impl From<UserRow> for User {
    fn from(value: UserRow) -> Self {
        let UserRow {
            user_id,
            first_name,
            last_name,
            email,
            phone,
            dob,
            gender,
            country,
            special_requirements,
        } = value;
        User {
            id: user_id,
            profile: UserProfile {
                first_name,
                last_name,
                email,
                phone,
                dob,
                gender,
                country,
                special_requirements,
            },
        }
    }
}
