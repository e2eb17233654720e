pub mod credentials;
pub use credentials::{CachedCredentialStore, CredentialRecord, CredentialStore, InMemoryCredentialStore};
pub mod user_repo;
pub use user_repo::UserRepository;
pub mod tenancy_repo;
pub use tenancy_repo::TenantRepository;
pub mod catalog_repo;
pub use catalog_repo::CatalogRepository;
pub mod settings_repo;
pub use settings_repo::SettingsRepository;
