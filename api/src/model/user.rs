use chrono::NaiveDate;
use garde::Validate;
use kernel::model::{
    id::UserId,
    project::{
        event::{CandidateUser, ProjectUserInput},
        ProjectMember,
    },
    role::Role,
    user::UserProfile,
};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleName {
    Owner,
    Supervisor,
    Member,
}

impl From<Role> for RoleName {
    fn from(value: Role) -> Self {
        match value {
            Role::Owner => Self::Owner,
            Role::Supervisor => Self::Supervisor,
            Role::Member => Self::Member,
        }
    }
}

impl From<RoleName> for Role {
    fn from(value: RoleName) -> Self {
        match value {
            RoleName::Owner => Self::Owner,
            RoleName::Supervisor => Self::Supervisor,
            RoleName::Member => Self::Member,
        }
    }
}

// フォームの空欄は未入力として扱う
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.trim().is_empty()))
}

/// A user entry of a project form, tagged with its role in `type`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUserRequest {
    #[garde(skip)]
    #[serde(default)]
    pub id: Option<UserId>,
    #[garde(skip)]
    #[serde(rename = "type")]
    pub role: RoleName,
    #[garde(length(min = 1))]
    pub first_name: String,
    #[garde(length(min = 1))]
    pub last_name: String,
    #[garde(email)]
    #[serde(default, deserialize_with = "empty_as_none")]
    pub email: Option<String>,
    #[garde(skip)]
    #[serde(default, deserialize_with = "empty_as_none")]
    pub phone: Option<String>,
    #[garde(skip)]
    #[serde(default)]
    pub dob: Option<NaiveDate>,
    #[garde(skip)]
    #[serde(default, deserialize_with = "empty_as_none")]
    pub gender: Option<String>,
    #[garde(skip)]
    #[serde(default, deserialize_with = "empty_as_none")]
    pub country: Option<String>,
    #[garde(skip)]
    #[serde(default, deserialize_with = "empty_as_none")]
    pub special_requirements: Option<String>,
}

impl ProjectUserRequest {
    fn into_parts(self) -> (Option<UserId>, Role, UserProfile) {
        let ProjectUserRequest {
            id,
            role,
            first_name,
            last_name,
            email,
            phone,
            dob,
            gender,
            country,
            special_requirements,
        } = self;
        let profile = UserProfile {
            first_name,
            last_name,
            email,
            phone,
            dob,
            gender,
            country,
            special_requirements,
        };
        (id, role.into(), profile)
    }
}

// 新規登録時はクライアントから送られた id を使わない
impl From<ProjectUserRequest> for CandidateUser {
    fn from(value: ProjectUserRequest) -> Self {
        let (_, role, profile) = value.into_parts();
        CandidateUser::new(role, profile)
    }
}

impl From<ProjectUserRequest> for ProjectUserInput {
    fn from(value: ProjectUserRequest) -> Self {
        let (id, role, profile) = value.into_parts();
        ProjectUserInput::new(id, role, profile)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUserResponse {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub dob: Option<NaiveDate>,
    pub gender: Option<String>,
    pub country: Option<String>,
    pub special_requirements: Option<String>,
    #[serde(rename = "type")]
    pub role: RoleName,
}

impl From<&ProjectMember> for ProjectUserResponse {
    fn from(value: &ProjectMember) -> Self {
        let ProjectMember { user, role } = value;
        let UserProfile {
            first_name,
            last_name,
            email,
            phone,
            dob,
            gender,
            country,
            special_requirements,
        } = user.profile.clone();
        Self {
            id: user.id,
            first_name,
            last_name,
            email,
            phone,
            dob,
            gender,
            country,
            special_requirements,
            role: RoleName::from(*role),
        }
    }
}
