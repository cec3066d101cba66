//! UVO account: credentials, remote session and update listeners
//!
//! An [`Account`] owns one [`VehicleClient`] for the life of the process and an
//! append-only list of [`UpdateListener`]s. [`Account::update`] runs one refresh
//! cycle (login, fetch, notify) and never propagates a backend failure.

use crate::config::AccountConfig;
use crate::error::Result;
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use crate::vehicle::{Vehicle, VehicleClient};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Subscriber notified after every successful refresh cycle.
///
/// Called synchronously, in registration order, with the freshly fetched
/// vehicle list. A panic in one listener is not caught and stops delivery to
/// the listeners registered after it.
pub trait UpdateListener: Send + Sync {
    fn on_update(&self, vehicles: &[Vehicle]);
}

impl<F> UpdateListener for F
where
    F: Fn(&[Vehicle]) + Send + Sync,
{
    fn on_update(&self, vehicles: &[Vehicle]) {
        self(vehicles);
    }
}

/// Result of the most recent refresh cycle of an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshOutcome {
    pub at: DateTime<Utc>,
    pub success: bool,
    pub error: Option<String>,
}

pub struct Account {
    name: String,
    username: String,
    read_only: bool,
    client: Box<dyn VehicleClient>,
    listeners: Vec<Arc<dyn UpdateListener>>,
    vehicles: Vec<Vehicle>,
    last_refresh: Option<RefreshOutcome>,
    logger: StructuredLogger,
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("name", &self.name)
            .field("username", &self.username)
            .field("read_only", &self.read_only)
            .field("listeners", &self.listeners.len())
            .field("vehicles", &self.vehicles.len())
            .finish_non_exhaustive()
    }
}

impl Account {
    /// Create an account around an already constructed session handle
    pub fn new(config: &AccountConfig, client: Box<dyn VehicleClient>) -> Self {
        let logger = get_logger_with_context(LogContext::new("account").with_account(&config.name));
        Self {
            name: config.name.clone(),
            username: config.username.clone(),
            read_only: config.read_only,
            client,
            listeners: Vec::new(),
            vehicles: Vec::new(),
            last_refresh: None,
            logger,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn read_only(&self) -> bool {
        self.read_only
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Vehicles from the last successful refresh (empty before the first one)
    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn last_refresh(&self) -> Option<&RefreshOutcome> {
        self.last_refresh.as_ref()
    }

    /// Append a listener. Registering the same listener twice yields two
    /// notifications per refresh.
    pub fn add_update_listener(&mut self, listener: Arc<dyn UpdateListener>) {
        self.listeners.push(listener);
    }

    /// Run one refresh cycle and notify listeners on success.
    ///
    /// Returns `true` when the fetch succeeded and every listener was called.
    /// Login or fetch failures are logged and swallowed; the listener list and
    /// cached vehicles are left untouched and no listener runs.
    pub async fn update(&mut self) -> bool {
        self.logger.debug(&format!(
            "Updating vehicle state, notifying {} listeners",
            self.listeners.len()
        ));

        match self.refresh().await {
            Ok(vehicles) => {
                self.vehicles = vehicles;
                self.last_refresh = Some(RefreshOutcome {
                    at: Utc::now(),
                    success: true,
                    error: None,
                });
                for listener in &self.listeners {
                    listener.on_update(&self.vehicles);
                }
                true
            }
            Err(e) => {
                if e.is_refresh_failure() {
                    self.logger
                        .error(&format!("Error updating the vehicle state: {}", e));
                } else {
                    self.logger.error(&format!(
                        "Unexpected error updating the vehicle state: {}",
                        e
                    ));
                }
                self.last_refresh = Some(RefreshOutcome {
                    at: Utc::now(),
                    success: false,
                    error: Some(e.to_string()),
                });
                false
            }
        }
    }

    async fn refresh(&mut self) -> Result<Vec<Vehicle>> {
        self.client.login().await?;
        self.client.fetch_state().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UvoError;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Copy)]
    enum Fail {
        None,
        Login,
        Fetch,
    }

    struct StubClient {
        fail: Fail,
        vehicles: Vec<Vehicle>,
        fetches: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl VehicleClient for StubClient {
        async fn login(&mut self) -> Result<()> {
            match self.fail {
                Fail::Login => Err(UvoError::auth("bad credentials")),
                _ => Ok(()),
            }
        }

        async fn fetch_state(&mut self) -> Result<Vec<Vehicle>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            match self.fail {
                Fail::Fetch => Err(UvoError::network("connection reset")),
                _ => Ok(self.vehicles.clone()),
            }
        }
    }

    fn account(fail: Fail, vehicles: Vec<Vehicle>) -> (Account, Arc<AtomicUsize>) {
        let fetches = Arc::new(AtomicUsize::new(0));
        let client = StubClient {
            fail,
            vehicles,
            fetches: fetches.clone(),
        };
        let cfg = AccountConfig::new("home", "me@example.com", "pw");
        (Account::new(&cfg, Box::new(client)), fetches)
    }

    type CallLog = Arc<Mutex<Vec<(&'static str, Vec<String>)>>>;

    fn recorder(tag: &'static str, log: &CallLog) -> Arc<dyn UpdateListener> {
        let log = log.clone();
        Arc::new(move |vehicles: &[Vehicle]| {
            let ids = vehicles.iter().map(|v| v.id().to_string()).collect();
            log.lock().unwrap().push((tag, ids));
        })
    }

    #[tokio::test]
    async fn listeners_called_in_order_with_payload() {
        let (mut acc, _) = account(
            Fail::None,
            vec![Vehicle::new("v1", "Soul"), Vehicle::new("v2", "Niro")],
        );
        let log: CallLog = Arc::default();
        acc.add_update_listener(recorder("L1", &log));
        acc.add_update_listener(recorder("L2", &log));

        assert!(acc.update().await);

        let calls = log.lock().unwrap().clone();
        let expected = vec!["v1".to_string(), "v2".to_string()];
        assert_eq!(calls, vec![("L1", expected.clone()), ("L2", expected)]);
        assert_eq!(acc.vehicles().len(), 2);
    }

    #[tokio::test]
    async fn listener_not_called_before_update() {
        let (mut acc, fetches) = account(Fail::None, vec![Vehicle::new("v1", "Soul")]);
        let log: CallLog = Arc::default();
        acc.add_update_listener(recorder("L1", &log));
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(fetches.load(Ordering::SeqCst), 0);

        acc.update().await;
        assert_eq!(log.lock().unwrap().len(), 1);
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn login_failure_notifies_nobody() {
        let (mut acc, fetches) = account(Fail::Login, vec![Vehicle::new("v1", "Soul")]);
        let log: CallLog = Arc::default();
        acc.add_update_listener(recorder("L1", &log));

        assert!(!acc.update().await);
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(fetches.load(Ordering::SeqCst), 0);
        assert_eq!(acc.listener_count(), 1);

        let outcome = acc.last_refresh().unwrap();
        assert!(!outcome.success);
        assert!(outcome.error.as_deref().unwrap().contains("Authentication"));
    }

    #[tokio::test]
    async fn fetch_failure_keeps_previous_snapshot() {
        let (mut acc, _) = account(Fail::Fetch, Vec::new());
        acc.vehicles = vec![Vehicle::new("old", "Soul")];
        let log: CallLog = Arc::default();
        acc.add_update_listener(recorder("L1", &log));

        assert!(!acc.update().await);
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(acc.vehicles()[0].id(), "old");
    }

    #[tokio::test]
    async fn failing_account_without_listeners_returns_normally() {
        let (mut acc, _) = account(Fail::Login, Vec::new());
        assert!(!acc.update().await);
        assert_eq!(acc.listener_count(), 0);
        // Still usable on the next cycle
        assert!(!acc.update().await);
    }

    #[tokio::test]
    async fn repeated_updates_notify_every_time() {
        let (mut acc, _) = account(Fail::None, vec![Vehicle::new("v1", "Soul")]);
        let log: CallLog = Arc::default();
        acc.add_update_listener(recorder("L1", &log));

        acc.update().await;
        acc.update().await;
        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn duplicate_registration_notifies_twice() {
        let (mut acc, _) = account(Fail::None, vec![Vehicle::new("v1", "Soul")]);
        let log: CallLog = Arc::default();
        let listener = recorder("L1", &log);
        acc.add_update_listener(listener.clone());
        acc.add_update_listener(listener);

        acc.update().await;
        assert_eq!(log.lock().unwrap().len(), 2);
        assert_eq!(acc.listener_count(), 2);
    }

    #[test]
    fn read_only_flag_from_config() {
        let mut cfg = AccountConfig::new("ro", "me", "pw");
        cfg.read_only = true;
        let client = StubClient {
            fail: Fail::None,
            vehicles: Vec::new(),
            fetches: Arc::default(),
        };
        let acc = Account::new(&cfg, Box::new(client));
        assert!(acc.read_only());
        assert_eq!(acc.name(), "ro");
        assert!(acc.last_refresh().is_none());
    }
}
