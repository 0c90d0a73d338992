//! Models of the user-management feature

pub mod code_issuer;
pub mod query_builder;
pub mod user;
pub mod user_model;
