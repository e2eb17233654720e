pub mod auth;
pub use auth::AuthService;
pub mod authenticator;
pub use authenticator::Authenticator;
pub mod rbac_service;
pub mod tenancy_service;
pub use tenancy_service::TenantService;
pub mod token;
pub use token::TokenCodec;
pub mod user_service;
pub use user_service::UserService;
