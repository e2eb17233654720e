pub mod auth;
pub mod catalog;
pub mod rbac;
pub mod settings;
pub mod tenancy;
