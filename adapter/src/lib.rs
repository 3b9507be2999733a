pub mod database;
pub mod mailing;
pub mod repository;
