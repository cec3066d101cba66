//! Startup wiring
//!
//! Turns a validated [`Config`] into a running set of components: registry,
//! refresh service (which carries the `update_state` command), an initial
//! refresh, the adapter platforms and the aligned refresh schedule.

use crate::config::{AccountConfig, Config};
use crate::error::Result;
use crate::logging::get_logger;
use crate::registry::{RefreshReport, Registry, SharedRegistry};
use crate::schedule::RefreshSchedule;
use crate::sensor::{self, BinarySensor};
use crate::service::{ServiceHandle, UvoService};
use crate::vehicle::VehicleClient;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Name of the manual refresh command
pub const SERVICE_UPDATE_STATE: &str = "update_state";

/// Adapter platforms loaded after the initial refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    BinarySensor,
}

impl Platform {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BinarySensor => "binary_sensor",
        }
    }
}

/// Platforms announced once the registry is populated
pub const PLATFORMS: &[Platform] = &[Platform::BinarySensor];

/// Everything `setup` produced
pub struct Components {
    pub registry: SharedRegistry,
    pub sensors: Arc<Vec<Arc<BinarySensor>>>,
    pub service: UvoService,
    pub handle: ServiceHandle,
    pub initial_refresh: RefreshReport,
}

/// Build and start-up all components.
///
/// `make_client` creates one session handle per configured account.
/// `started_at` anchors the refresh schedule.
pub async fn setup<F>(config: &Config, make_client: F, started_at: DateTime<Utc>) -> Result<Components>
where
    F: FnMut(&AccountConfig) -> Result<Box<dyn VehicleClient>>,
{
    let logger = get_logger("bootstrap");
    config.validate()?;

    if config.accounts.is_empty() {
        logger.warn("No accounts configured; nothing will be polled");
    }

    let registry = Registry::from_config(&config.accounts, make_client)?.into_shared();

    let schedule = RefreshSchedule::aligned_to(started_at, config.polling.update_interval_minutes);
    let (mut service, handle) = UvoService::new(registry.clone(), schedule);
    logger.debug(&format!("Registered command {}", SERVICE_UPDATE_STATE));

    let initial_refresh = service.update_all().await;

    let mut sensors = Vec::new();
    for platform in PLATFORMS {
        logger.debug(&format!("Loading platform {}", platform.as_str()));
        match platform {
            Platform::BinarySensor => {
                let mut reg = registry.lock().await;
                sensors.extend(sensor::setup_platform(&mut reg));
            }
        }
    }

    service.publish_status().await;

    logger.info(&format!(
        "Setup complete: {} account(s), {} sensor(s), first refresh {} ok / {} failed",
        config.accounts.len(),
        sensors.len(),
        initial_refresh.succeeded(),
        initial_refresh.failed()
    ));

    Ok(Components {
        registry,
        sensors: Arc::new(sensors),
        service,
        handle,
        initial_refresh,
    })
}
