pub mod auth;
pub mod event;
pub mod id;
pub mod list;
pub mod membership;
pub mod project;
pub mod role;
pub mod user;
