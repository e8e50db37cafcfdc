//! Service wiring: data store, chat, preferences and household settings.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::{info, warn};

use finanzas_chat::{AnthropicConfig, AnthropicProvider, ChatService};
use finanzas_core::{HouseholdId, Money};
use finanzas_store::{
    FileKeyValueStore, FinanceStore, InMemoryFinanceStore, KeyValueStore, RestConfig, RestFinanceStore, StoreError,
};

use crate::config::AppConfig;

/// Shared state behind every handler.
#[derive(Clone)]
pub struct AppServices {
    pub store: Arc<dyn FinanceStore>,
    pub chat: ChatService,
    pub preferences: Arc<dyn KeyValueStore>,
    pub household: HouseholdId,
    pub monthly_income: Money,
    pub monthly_variable_budget: Money,
    /// Pinned "today" for deterministic tests; `None` uses the local clock.
    pub today: Option<NaiveDate>,
}

impl core::fmt::Debug for AppServices {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppServices")
            .field("household", &self.household)
            .field("chat", &self.chat)
            .field("preferences_available", &self.preferences.is_available())
            .finish()
    }
}

impl AppServices {
    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }
}

pub fn build_services(config: &AppConfig) -> Result<AppServices, StoreError> {
    let store: Arc<dyn FinanceStore> = match &config.remote_store {
        Some(remote) => {
            info!(url = %remote.url, "using hosted store");
            let rest = RestConfig::new(&remote.url, &remote.anon_key);
            Arc::new(RestFinanceStore::new(rest)?)
        }
        None => {
            warn!("SUPABASE_URL not set; using in-memory store");
            Arc::new(InMemoryFinanceStore::new())
        }
    };

    let chat = match &config.anthropic_api_key {
        Some(key) => {
            let mut provider = AnthropicConfig::new(key, &config.anthropic_model);
            provider.timeout = config.chat_timeout;
            match AnthropicProvider::new(provider) {
                Ok(provider) => ChatService::new(Arc::new(provider)),
                Err(err) => {
                    warn!(error = %err, "chat provider misconfigured; chat disabled");
                    ChatService::unconfigured()
                }
            }
        }
        None => {
            warn!("ANTHROPIC_API_KEY not set; chat disabled");
            ChatService::unconfigured()
        }
    }
    .with_max_tokens(config.chat_max_tokens);

    let preferences = FileKeyValueStore::open(&config.preferences_path);

    Ok(AppServices {
        store,
        chat,
        preferences: Arc::new(preferences),
        household: config.household_id,
        monthly_income: config.monthly_income,
        monthly_variable_budget: config.monthly_variable_budget,
        today: None,
    })
}
