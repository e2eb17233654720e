// src/common/i18n.rs

use std::{collections::HashMap, sync::Arc};

pub const DEFAULT_LANG: &str = "en";

const EN: &[(&str, &str)] = &[
    ("auth.invalid_token", "Invalid or expired token"),
    ("auth.account_inactive", "This account is not active"),
    ("auth.tenant_inactive", "This store is not active"),
    ("auth.forbidden", "You do not have permission to perform this action"),
    ("auth.invalid_credentials", "Invalid e-mail or password"),
    ("auth.email_exists", "This e-mail is already in use"),
    (
        "auth.tenant_selection_required",
        "This e-mail belongs to more than one store; inform the store id",
    ),
    ("users.role_assignment_forbidden", "You cannot assign this role"),
    ("validation.failed", "One or more fields are invalid"),
    ("resource.not_found", "Resource not found"),
    ("service.unavailable", "Service temporarily unavailable, try again"),
    ("internal.unexpected", "An unexpected error occurred"),
];

const PT: &[(&str, &str)] = &[
    ("auth.invalid_token", "Token inválido ou expirado"),
    ("auth.account_inactive", "Esta conta não está ativa"),
    ("auth.tenant_inactive", "Esta loja não está ativa"),
    ("auth.forbidden", "Você não tem permissão para realizar esta ação"),
    ("auth.invalid_credentials", "E-mail ou senha inválidos"),
    ("auth.email_exists", "Este e-mail já está em uso"),
    (
        "auth.tenant_selection_required",
        "Este e-mail pertence a mais de uma loja; informe o id da loja",
    ),
    ("users.role_assignment_forbidden", "Você não pode atribuir este cargo"),
    ("validation.failed", "Um ou mais campos são inválidos"),
    ("resource.not_found", "Recurso não encontrado"),
    ("service.unavailable", "Serviço temporariamente indisponível, tente novamente"),
    ("internal.unexpected", "Ocorreu um erro inesperado"),
];

// Mensagens por idioma, carregadas uma vez e compartilhadas pelo AppState
#[derive(Debug, Clone)]
pub struct I18nStore {
    messages: Arc<HashMap<&'static str, HashMap<&'static str, &'static str>>>,
}

impl I18nStore {
    pub fn new() -> Self {
        let mut messages = HashMap::new();
        messages.insert("en", EN.iter().copied().collect());
        messages.insert("pt", PT.iter().copied().collect());
        Self { messages: Arc::new(messages) }
    }

    // Idioma desconhecido cai para inglês; chave desconhecida volta como está
    pub fn translate(&self, lang: &str, key: &str) -> String {
        self.messages
            .get(lang)
            .and_then(|table| table.get(key))
            .or_else(|| {
                self.messages
                    .get(DEFAULT_LANG)
                    .and_then(|table| table.get(key))
            })
            .map(|msg| msg.to_string())
            .unwrap_or_else(|| key.to_string())
    }
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}
