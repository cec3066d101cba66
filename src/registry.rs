//! Registry of configured accounts
//!
//! Built once from configuration and never resized afterwards. Shared between
//! the service loop and the web surface as a [`SharedRegistry`].

use crate::account::{Account, RefreshOutcome};
use crate::config::AccountConfig;
use crate::error::{Result, UvoError};
use crate::logging::get_logger;
use crate::vehicle::VehicleClient;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handle passed to every component that needs the accounts
pub type SharedRegistry = Arc<Mutex<Registry>>;

/// Per-account result of a registry-wide refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountRefresh {
    pub account: String,
    pub notified: bool,
}

/// Result of refreshing every account once, in registry order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshReport {
    pub accounts: Vec<AccountRefresh>,
}

impl RefreshReport {
    pub fn succeeded(&self) -> usize {
        self.accounts.iter().filter(|a| a.notified).count()
    }

    pub fn failed(&self) -> usize {
        self.accounts.len() - self.succeeded()
    }
}

/// Point-in-time view of one account, published after every refresh cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSummary {
    pub name: String,
    pub username: String,
    pub read_only: bool,
    pub listeners: usize,
    pub vehicles: usize,
    pub last_refresh: Option<RefreshOutcome>,
}

impl From<&Account> for AccountSummary {
    fn from(account: &Account) -> Self {
        Self {
            name: account.name().to_string(),
            username: account.username().to_string(),
            read_only: account.read_only(),
            listeners: account.listener_count(),
            vehicles: account.vehicles().len(),
            last_refresh: account.last_refresh().cloned(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    accounts: Vec<Account>,
}

impl Registry {
    /// Build one account per config entry, in order.
    ///
    /// `make_client` is called once per entry to create that account's
    /// session handle. Duplicate names are rejected.
    pub fn from_config<F>(entries: &[AccountConfig], mut make_client: F) -> Result<Self>
    where
        F: FnMut(&AccountConfig) -> Result<Box<dyn VehicleClient>>,
    {
        let logger = get_logger("registry");
        let mut accounts: Vec<Account> = Vec::with_capacity(entries.len());
        for entry in entries {
            if accounts.iter().any(|a| a.name() == entry.name) {
                return Err(UvoError::validation(
                    "accounts.name",
                    format!("Duplicate account name '{}'", entry.name),
                ));
            }
            logger.debug(&format!("Adding new account {}", entry.name));
            let client = make_client(entry)?;
            accounts.push(Account::new(entry, client));
        }
        Ok(Self { accounts })
    }

    pub fn into_shared(self) -> SharedRegistry {
        Arc::new(Mutex::new(self))
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Account> {
        self.accounts.iter_mut().find(|a| a.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Account> {
        self.accounts.iter_mut()
    }

    pub fn summaries(&self) -> Vec<AccountSummary> {
        self.accounts.iter().map(AccountSummary::from).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.accounts.iter().map(Account::name).collect()
    }

    /// Refresh every account once, sequentially, in registry order.
    ///
    /// A failing account never stops later accounts from refreshing.
    pub async fn update_all(&mut self) -> RefreshReport {
        let mut report = RefreshReport::default();
        for account in &mut self.accounts {
            let notified = account.update().await;
            report.accounts.push(AccountRefresh {
                account: account.name().to_string(),
                notified,
            });
        }
        report
    }
}
