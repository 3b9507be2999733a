pub mod mailing;
pub mod model;
pub mod repository;
pub mod service;
