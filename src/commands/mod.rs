pub mod catalog;
pub mod defaults;
pub mod events;
pub mod export;
pub mod import;
pub mod series;
pub mod status;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use calbill_core::config::Config;
use calbill_core::{CalendarEvent, CalendarSource, Store};
use indicatif::{ProgressBar, ProgressStyle};

use crate::providers::{BillingSystem, Calendar};

/// Config plus the loaded store, shared by every command.
pub struct Context {
    pub config: Config,
    pub store_path: PathBuf,
    pub store: Store,
}

impl Context {
    pub fn load() -> Result<Self> {
        let config = Config::load().context("Failed to load config")?;
        let store_path = config.store_path();
        let store = Store::load(&store_path)
            .with_context(|| format!("Failed to read store at {}", store_path.display()))?;

        Ok(Context {
            config,
            store_path,
            store,
        })
    }

    pub fn save(&self) -> Result<()> {
        self.store
            .save(&self.store_path)
            .with_context(|| format!("Failed to write store at {}", self.store_path.display()))
    }

    pub fn billing_system(&self, key: Option<&str>) -> Result<BillingSystem> {
        BillingSystem::from_config(&self.config, key).context("Failed to set up billing system")
    }

    /// Fetch events from the configured calendar behind a spinner.
    pub async fn fetch_events(&self) -> Result<Vec<CalendarEvent>> {
        let calendar = Calendar::from_config(&self.config).context("Failed to set up calendar")?;

        let source = calendar.describe(&self.config);
        let spinner = create_spinner(format!("Fetching events from {source}"));
        let result = calendar.unsynchronized_events().await;
        spinner.finish_and_clear();

        result.context("Failed to fetch calendar events")
    }
}

pub fn create_spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["-", "\\", "|", "/"])
            .template("{msg} {spinner}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}
