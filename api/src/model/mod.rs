pub mod export;
pub mod project;
pub mod user;
