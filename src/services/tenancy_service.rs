// src/services/tenancy_service.rs

use std::sync::Arc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CachedCredentialStore, TenantRepository},
    middleware::tenancy::GlobalScope,
    models::tenancy::{Tenant, TenantReportEntry, TenantStatus},
};

// Operações globais de plataforma. Exigem um GlobalScope, que só super_admin obtém.
#[derive(Clone)]
pub struct TenantService {
    tenant_repo: TenantRepository,
    credential_cache: Arc<CachedCredentialStore>,
}

impl TenantService {
    pub fn new(tenant_repo: TenantRepository, credential_cache: Arc<CachedCredentialStore>) -> Self {
        Self { tenant_repo, credential_cache }
    }

    pub async fn tenant_report(&self, _scope: GlobalScope) -> Result<Vec<TenantReportEntry>, AppError> {
        self.tenant_repo.tenant_report().await
    }

    pub async fn set_status(
        &self,
        _scope: GlobalScope,
        tenant_id: Uuid,
        status: TenantStatus,
    ) -> Result<Tenant, AppError> {
        let tenant = self
            .tenant_repo
            .set_status(tenant_id, status)
            .await?
            .ok_or(AppError::NotFound("tenant"))?;

        // O status da loja entra em toda credencial dela; limpa tudo
        self.credential_cache.invalidate_all();

        tracing::info!(tenant_id = %tenant.id, status = ?status, "status da loja alterado");
        Ok(tenant)
    }
}
