//! Tab state module.

pub mod repository;

pub use repository::StateRepository;
