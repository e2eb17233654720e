// src/models/rbac.rs

use serde::Serialize;
use utoipa::ToSchema;

use crate::models::auth::Role;

// Ações nomeadas que os handlers exigem. O mapeamento para cargos fica em
// `services::rbac_service::rule_for`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ViewCatalog,
    ManageCatalog,
    ViewUsers,
    ManageUsers,
    ViewStoreSettings,
    ManageStoreSettings,
    ViewTenantReport,
    ManageTenants,
}

// Quem pode usar uma capability fora dos cargos listados.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RuleScope {
    // super_admin também satisfaz
    Any,
    // Autoatendimento da própria loja: super_admin NÃO satisfaz
    TenantOwn,
}

#[derive(Debug, Clone, Copy)]
pub struct CapabilityRule {
    pub roles: &'static [Role],
    pub scope: RuleScope,
}

#[derive(Debug, Clone, Copy)]
pub enum Requirement {
    AnyOf(&'static [Role]),
    Capability(Capability),
}
