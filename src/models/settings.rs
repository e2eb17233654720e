// src/models/settings.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TenantSettings {
    #[schema(ignore)] // O contexto do principal já define a loja
    pub tenant_id: Uuid,

    #[schema(example = "Minha Loja Ltda")]
    pub store_name: Option<String>,

    #[schema(example = "Rua das Flores, 123 - Centro")]
    pub address: Option<String>,

    #[schema(example = "(11) 99999-8888")]
    pub phone: Option<String>,

    #[schema(example = "contato@minhaloja.com")]
    pub email: Option<String>,

    #[schema(example = "BRL")]
    pub currency: Option<String>,

    #[schema(example = "Obrigado pela preferência!")]
    pub receipt_footer: Option<String>,

    pub updated_at: Option<DateTime<Utc>>,
}

impl TenantSettings {
    pub fn empty(tenant_id: Uuid) -> Self {
        Self {
            tenant_id,
            store_name: None,
            address: None,
            phone: None,
            email: None,
            currency: None,
            receipt_footer: None,
            updated_at: None,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    #[validate(length(max = 120, message = "O nome da loja é muito longo."))]
    pub store_name: Option<String>,

    pub address: Option<String>,

    pub phone: Option<String>,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,

    #[validate(length(equal = 3, message = "A moeda deve ter 3 letras (ISO 4217)."))]
    pub currency: Option<String>,

    pub receipt_footer: Option<String>,
}
