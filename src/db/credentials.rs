// src/db/credentials.rs

use async_trait::async_trait;
use dashmap::DashMap;
use std::{
    sync::{
        atomic::{AtomicU64, AtomicUsize, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};
use uuid::Uuid;

use crate::{
    common::error::AuthError,
    models::{
        auth::{Role, UserStatus},
        tenancy::TenantStatus,
    },
};

// O que o Authenticator precisa saber do usuário (e da loja dele) no momento
// da requisição.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CredentialRecord {
    pub user_id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub role: Role,
    pub status: UserStatus,
    // None quando o usuário não tem loja (super_admin) ou a loja sumiu
    pub tenant_status: Option<TenantStatus>,
}

/// Fonte das credenciais atuais. Uma leitura por requisição autenticada.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_credentials(&self, user_id: Uuid) -> Result<Option<CredentialRecord>, AuthError>;
}

// ---
// Cache curto (opcional)
// ---
// TTL zero desliga o cache. Escritas em status/cargo chamam `invalidate`;
// mudanças de status de loja chamam `invalidate_all`.
pub struct CachedCredentialStore {
    inner: Arc<dyn CredentialStore>,
    ttl: Duration,
    entries: DashMap<Uuid, CachedEntry>,
    // Incrementa a cada invalidação; leituras iniciadas antes não gravam
    generation: AtomicU64,
}

struct CachedEntry {
    record: CredentialRecord,
    fetched_at: Instant,
}

impl CachedCredentialStore {
    pub fn new(inner: Arc<dyn CredentialStore>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: DashMap::new(),
            generation: AtomicU64::new(0),
        }
    }

    fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    pub fn invalidate(&self, user_id: Uuid) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.entries.remove(&user_id);
    }

    pub fn invalidate_all(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.entries.clear();
    }

    fn cached(&self, user_id: Uuid) -> Option<CredentialRecord> {
        let entry = self.entries.get(&user_id)?;
        (entry.fetched_at.elapsed() < self.ttl).then(|| entry.record.clone())
    }

    // `generation` é o valor lido antes da busca. Uma invalidação entre a
    // busca e o insert derruba a entrada recém gravada.
    fn store(&self, user_id: Uuid, record: CredentialRecord, generation: u64) {
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.fetched_at.elapsed() < ttl);

        let fetched_at = Instant::now();
        self.entries.insert(user_id, CachedEntry { record, fetched_at });

        if self.generation.load(Ordering::SeqCst) != generation {
            self.entries.remove_if(&user_id, |_, entry| entry.fetched_at == fetched_at);
        }
    }
}

#[async_trait]
impl CredentialStore for CachedCredentialStore {
    async fn find_credentials(&self, user_id: Uuid) -> Result<Option<CredentialRecord>, AuthError> {
        if !self.is_enabled() {
            return self.inner.find_credentials(user_id).await;
        }

        if let Some(record) = self.cached(user_id) {
            return Ok(Some(record));
        }

        let generation = self.generation.load(Ordering::SeqCst);
        let fetched = self.inner.find_credentials(user_id).await?;

        if let Some(record) = &fetched {
            self.store(user_id, record.clone(), generation);
        }

        Ok(fetched)
    }
}

// ---
// Implementação em memória
// ---
// Usada nos testes e em execuções locais sem banco.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    records: DashMap<Uuid, CredentialRecord>,
    reads: AtomicUsize,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, record: CredentialRecord) {
        self.records.insert(record.user_id, record);
    }

    pub fn set_status(&self, user_id: Uuid, status: UserStatus) {
        if let Some(mut record) = self.records.get_mut(&user_id) {
            record.status = status;
        }
    }

    pub fn set_role(&self, user_id: Uuid, role: Role) {
        if let Some(mut record) = self.records.get_mut(&user_id) {
            record.role = role;
        }
    }

    pub fn set_tenant_status(&self, tenant_id: Uuid, status: TenantStatus) {
        for mut record in self.records.iter_mut() {
            if record.tenant_id == Some(tenant_id) {
                record.tenant_status = Some(status);
            }
        }
    }

    pub fn remove(&self, user_id: Uuid) {
        self.records.remove(&user_id);
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_credentials(&self, user_id: Uuid) -> Result<Option<CredentialRecord>, AuthError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.get(&user_id).map(|r| r.value().clone()))
    }
}
