use std::sync::Arc;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use tokio::sync::{Mutex, MutexGuard};

use neomind_core::ai::OpenAiClient;
use neomind_core::{LocalStore, NeomindConfig, Scheduler};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    scheduler: Arc<Mutex<Scheduler<LocalStore>>>,
    ai: Arc<OpenAiClient>,
}

impl AppState {
    pub fn new(config: &NeomindConfig) -> Result<Self> {
        let tz = config.timezone()?;
        let data_path = config.data_path();
        let store = Arc::new(LocalStore::open(&data_path)?);
        log::info!("Using event data at {}", data_path.display());

        let today = Utc::now().with_timezone(&tz).date_naive();
        let scheduler = Scheduler::open(store, config.context(), tz, today);
        let ai = OpenAiClient::new(config.ai_settings()?);
        if !ai.is_configured() {
            log::warn!("No OpenAI API key configured, AI helpers will return placeholders");
        }

        Ok(AppState::from_parts(scheduler, ai))
    }

    pub fn from_parts(scheduler: Scheduler<LocalStore>, ai: OpenAiClient) -> Self {
        AppState {
            scheduler: Arc::new(Mutex::new(scheduler)),
            ai: Arc::new(ai),
        }
    }

    /// Lock the scheduler with every snapshot the store has sent applied.
    pub async fn scheduler(&self) -> MutexGuard<'_, Scheduler<LocalStore>> {
        let mut scheduler = self.scheduler.lock().await;
        scheduler.sync_pending();
        scheduler
    }

    pub fn ai(&self) -> &OpenAiClient {
        &self.ai
    }
}

/// Today's date in the scheduler's timezone.
pub fn today(scheduler: &Scheduler<LocalStore>) -> NaiveDate {
    Utc::now().with_timezone(&scheduler.timezone()).date_naive()
}
