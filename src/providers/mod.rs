//! Concrete billing systems and calendar sources, selected from config.

pub mod billy;
pub mod economic;
pub mod file;
pub mod gcal;

use calbill_core::config::{BillingSystemKind, CalendarSourceKind, Config};
use calbill_core::{
    BillingBackend, CalBillResult, CalendarEvent, CalendarSource, InvoiceDraft, RemoteContact,
    RemoteProduct,
};

use billy::BillyClient;
use economic::EconomicClient;
use file::EventFile;
use gcal::GoogleCalendar;

/// The billing system a command talks to.
pub enum BillingSystem {
    Economic(EconomicClient),
    Billy(BillyClient),
}

impl BillingSystem {
    /// Build the client for `key`, or for the configured default when absent.
    pub fn from_config(config: &Config, key: Option<&str>) -> CalBillResult<Self> {
        match config.billing_kind(key)? {
            BillingSystemKind::Economic => {
                Ok(BillingSystem::Economic(EconomicClient::new(&config.economic)?))
            }
            BillingSystemKind::Billy => Ok(BillingSystem::Billy(BillyClient::new(&config.billy)?)),
        }
    }

    pub fn kind(&self) -> BillingSystemKind {
        match self {
            BillingSystem::Economic(_) => BillingSystemKind::Economic,
            BillingSystem::Billy(_) => BillingSystemKind::Billy,
        }
    }
}

impl BillingBackend for BillingSystem {
    async fn get_products(&self) -> CalBillResult<Vec<RemoteProduct>> {
        match self {
            BillingSystem::Economic(client) => client.get_products().await,
            BillingSystem::Billy(client) => client.get_products().await,
        }
    }

    async fn get_customers(&self) -> CalBillResult<Vec<RemoteContact>> {
        match self {
            BillingSystem::Economic(client) => client.get_customers().await,
            BillingSystem::Billy(client) => client.get_customers().await,
        }
    }

    async fn export_invoice(&self, invoice: &InvoiceDraft) -> CalBillResult<String> {
        match self {
            BillingSystem::Economic(client) => client.export_invoice(invoice).await,
            BillingSystem::Billy(client) => client.export_invoice(invoice).await,
        }
    }
}

/// Where calendar events come from.
pub enum Calendar {
    Google(GoogleCalendar),
    File(EventFile),
}

impl Calendar {
    pub fn from_config(config: &Config) -> CalBillResult<Self> {
        match config.calendar.source {
            CalendarSourceKind::Google => {
                Ok(Calendar::Google(GoogleCalendar::new(&config.calendar)?))
            }
            CalendarSourceKind::File => Ok(Calendar::File(EventFile::new(config.events_path()?))),
        }
    }

    pub fn describe(&self, config: &Config) -> String {
        match self {
            Calendar::Google(_) => format!("Google Calendar ({})", config.calendar.calendar_id),
            Calendar::File(_) => match config.events_path() {
                Ok(path) => format!("event file ({})", path.display()),
                Err(_) => "event file".to_string(),
            },
        }
    }
}

impl CalendarSource for Calendar {
    async fn unsynchronized_events(&self) -> CalBillResult<Vec<CalendarEvent>> {
        match self {
            Calendar::Google(source) => source.unsynchronized_events().await,
            Calendar::File(source) => source.unsynchronized_events().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calbill_core::CalBillError;

    fn config() -> Config {
        let mut config = Config::default();
        config.billy.api_token = "token".into();
        config.economic.app_secret_token = "secret".into();
        config.economic.agreement_grant_token = "grant".into();
        config
    }

    #[test]
    fn test_billing_system_defaults_to_configured_key() {
        let system = BillingSystem::from_config(&config(), None).unwrap();
        assert_eq!(system.kind(), BillingSystemKind::Billy);

        let system = BillingSystem::from_config(&config(), Some("economic")).unwrap();
        assert_eq!(system.kind(), BillingSystemKind::Economic);
    }

    #[test]
    fn test_unknown_billing_system() {
        assert!(matches!(
            BillingSystem::from_config(&config(), Some("dinero")),
            Err(CalBillError::UnsupportedSystem(_))
        ));
    }

    #[test]
    fn test_file_calendar_needs_path() {
        let mut config = config();
        config.calendar.source = CalendarSourceKind::File;
        assert!(matches!(Calendar::from_config(&config), Err(CalBillError::Config(_))));

        config.calendar.path = Some("/tmp/events.json".into());
        assert!(matches!(Calendar::from_config(&config), Ok(Calendar::File(_))));
    }
}
