// src/services/rbac_service.rs

use crate::{
    common::error::AuthError,
    models::{
        auth::{Principal, Role},
        rbac::{Capability, CapabilityRule, Requirement, RuleScope},
    },
};

use crate::models::auth::Role::{Admin, Cashier, InventoryStaff, Manager};

// A tabela canônica. Nenhum handler compara cargos por conta própria.
pub fn rule_for(capability: Capability) -> CapabilityRule {
    let (roles, scope): (&'static [Role], RuleScope) = match capability {
        Capability::ViewCatalog => (&[Cashier, InventoryStaff, Manager, Admin], RuleScope::Any),
        Capability::ManageCatalog => (&[InventoryStaff, Manager, Admin], RuleScope::Any),
        Capability::ViewUsers => (&[Manager, Admin], RuleScope::Any),
        Capability::ManageUsers => (&[Manager, Admin], RuleScope::Any),
        Capability::ViewStoreSettings => {
            (&[Cashier, InventoryStaff, Manager, Admin], RuleScope::TenantOwn)
        }
        Capability::ManageStoreSettings => (&[Admin], RuleScope::TenantOwn),
        // Só super_admin
        Capability::ViewTenantReport => (&[], RuleScope::Any),
        Capability::ManageTenants => (&[], RuleScope::Any),
    };
    CapabilityRule { roles, scope }
}

/// Pertinência exata no conjunto; super_admin passa em tudo que não seja
/// autoatendimento da própria loja.
pub fn authorize(principal: &Principal, requirement: &Requirement) -> Result<(), AuthError> {
    let role = principal.role();

    let allowed = match requirement {
        Requirement::AnyOf(roles) => role.is_super_admin() || roles.contains(&role),
        Requirement::Capability(capability) => {
            let rule = rule_for(*capability);
            if role.is_super_admin() {
                rule.scope == RuleScope::Any
            } else {
                rule.roles.contains(&role)
            }
        }
    };

    if allowed {
        Ok(())
    } else {
        tracing::warn!(
            user_id = %principal.user_id(),
            role = ?role,
            requirement = ?requirement,
            "acesso negado pelo controle de cargos"
        );
        Err(AuthError::Forbidden)
    }
}

// ---
// Regras de atribuição de cargo
// ---
// Quem pode conceder qual cargo ao criar/promover usuários da loja.
pub fn can_assign_role(actor: Role, target: Role) -> bool {
    match target {
        Role::SuperAdmin => false,
        Role::Admin => actor == Role::Admin,
        Role::Manager | Role::InventoryStaff | Role::Cashier => {
            matches!(actor, Role::Admin | Role::Manager)
        }
    }
}
