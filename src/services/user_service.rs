// src/services/user_service.rs

use std::sync::Arc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CachedCredentialStore, UserRepository},
    middleware::tenancy::TenantContext,
    models::auth::{CreateUserPayload, Principal, Role, User, UserStatus},
    services::{
        auth::{hash_password, normalize_email},
        rbac_service::can_assign_role,
    },
};

// Administração de usuários dentro de uma loja
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    credential_cache: Arc<CachedCredentialStore>,
}

impl UserService {
    pub fn new(user_repo: UserRepository, credential_cache: Arc<CachedCredentialStore>) -> Self {
        Self { user_repo, credential_cache }
    }

    pub async fn list(&self, tenant: &TenantContext) -> Result<Vec<User>, AppError> {
        self.user_repo.list_in_tenant(tenant).await
    }

    pub async fn invite(
        &self,
        actor: &Principal,
        tenant: &TenantContext,
        payload: CreateUserPayload,
    ) -> Result<User, AppError> {
        ensure_can_assign(actor, payload.role)?;

        let email = normalize_email(&payload.email);
        let hashed_password = hash_password(payload.password).await?;

        let user = self
            .user_repo
            .create_user(
                self.user_repo.pool(),
                tenant.tenant_id(),
                &email,
                &hashed_password,
                payload.full_name.as_deref(),
                payload.role,
            )
            .await?;

        tracing::info!(
            actor = %actor.user_id(),
            user_id = %user.id,
            role = ?user.role,
            "usuário criado na loja"
        );
        Ok(user)
    }

    pub async fn update_status(
        &self,
        actor: &Principal,
        tenant: &TenantContext,
        user_id: Uuid,
        status: UserStatus,
    ) -> Result<User, AppError> {
        self.load_manageable(actor, tenant, user_id).await?;

        let user = self
            .user_repo
            .update_status(tenant, user_id, status)
            .await?
            .ok_or(AppError::NotFound("user"))?;

        // Vale já na próxima requisição do usuário
        self.credential_cache.invalidate(user_id);
        tracing::info!(actor = %actor.user_id(), user_id = %user_id, status = ?status, "status alterado");
        Ok(user)
    }

    pub async fn update_role(
        &self,
        actor: &Principal,
        tenant: &TenantContext,
        user_id: Uuid,
        role: Role,
    ) -> Result<User, AppError> {
        self.load_manageable(actor, tenant, user_id).await?;
        ensure_can_assign(actor, role)?;

        let user = self
            .user_repo
            .update_role(tenant, user_id, role)
            .await?
            .ok_or(AppError::NotFound("user"))?;

        self.credential_cache.invalidate(user_id);
        tracing::info!(actor = %actor.user_id(), user_id = %user_id, role = ?role, "cargo alterado");
        Ok(user)
    }

    // Usuário de outra loja é 404. Um gerente não mexe em quem ele não poderia nomear.
    async fn load_manageable(
        &self,
        actor: &Principal,
        tenant: &TenantContext,
        user_id: Uuid,
    ) -> Result<User, AppError> {
        let target = self
            .user_repo
            .find_in_tenant(tenant, user_id)
            .await?
            .ok_or(AppError::NotFound("user"))?;

        ensure_can_assign(actor, target.role)?;
        Ok(target)
    }
}

fn ensure_can_assign(actor: &Principal, target: Role) -> Result<(), AppError> {
    if can_assign_role(actor.role(), target) {
        Ok(())
    } else {
        tracing::warn!(actor = %actor.user_id(), actor_role = ?actor.role(), target = ?target, "atribuição de cargo negada");
        Err(AppError::RoleAssignmentForbidden)
    }
}
