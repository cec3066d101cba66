//! Binary sensor adapters
//!
//! One [`BinarySensor`] per account x vehicle x [`SensorKind`]. Each sensor is
//! an [`UpdateListener`] on its account and recomputes its state from the
//! vehicle list delivered by every successful refresh.

use crate::account::UpdateListener;
use crate::logging::{LogContext, StructuredLogger, get_logger, get_logger_with_context};
use crate::registry::Registry;
use crate::vehicle::Vehicle;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// Attribute a binary sensor projects out of a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    DoorLockState,
    Doors,
}

impl SensorKind {
    /// All kinds, in key order
    pub const ALL: [Self; 2] = [Self::DoorLockState, Self::Doors];

    pub fn key(self) -> &'static str {
        match self {
            Self::DoorLockState => "door_lock_state",
            Self::Doors => "doors",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::DoorLockState => "Door lock state",
            Self::Doors => "Doors",
        }
    }

    pub fn device_class(self) -> &'static str {
        match self {
            Self::DoorLockState => "lock",
            Self::Doors => "door",
        }
    }

    /// On means open for `doors` and unlocked for `door_lock_state`
    pub fn evaluate(self, vehicle: &Vehicle) -> bool {
        match self {
            Self::DoorLockState => !vehicle.status.door_lock,
            Self::Doors => vehicle.any_door_open(),
        }
    }

    pub fn attributes(self, vehicle: &Vehicle) -> BTreeMap<String, serde_json::Value> {
        let mut attrs = BTreeMap::new();
        attrs.insert("car".to_string(), vehicle.nick_name().into());
        if self == Self::Doors {
            for (key, open) in vehicle.door_attributes() {
                attrs.insert(key.to_string(), open.into());
            }
        }
        attrs
    }
}

/// Serializable view of a sensor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorView {
    pub unique_id: String,
    pub name: String,
    pub label: &'static str,
    pub account: String,
    pub vehicle_id: String,
    pub kind: SensorKind,
    pub device_class: &'static str,
    pub is_on: Option<bool>,
    pub attributes: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Default)]
struct SensorState {
    is_on: Option<bool>,
    attributes: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug)]
pub struct BinarySensor {
    account: String,
    vehicle_id: String,
    kind: SensorKind,
    name: String,
    unique_id: String,
    state: RwLock<SensorState>,
    logger: StructuredLogger,
}

impl BinarySensor {
    /// Create a sensor and compute its initial state from `vehicle`
    pub fn new(account: &str, vehicle: &Vehicle, kind: SensorKind) -> Self {
        let logger = get_logger_with_context(
            LogContext::new("sensor")
                .with_account(account)
                .with_field("sensor", kind.key().to_string()),
        );
        let sensor = Self {
            account: account.to_string(),
            vehicle_id: vehicle.id().to_string(),
            kind,
            name: format!("{} {}", vehicle.nick_name(), kind.key()),
            unique_id: format!("{}-{}", vehicle.id(), kind.key()),
            state: RwLock::new(SensorState::default()),
            logger,
        };
        sensor.apply(vehicle);
        sensor
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn vehicle_id(&self) -> &str {
        &self.vehicle_id
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn device_class(&self) -> &'static str {
        self.kind.device_class()
    }

    pub fn is_on(&self) -> Option<bool> {
        self.state.read().map_or(None, |s| s.is_on)
    }

    pub fn attributes(&self) -> BTreeMap<String, serde_json::Value> {
        self.state
            .read()
            .map(|s| s.attributes.clone())
            .unwrap_or_default()
    }

    pub fn view(&self) -> SensorView {
        SensorView {
            unique_id: self.unique_id.clone(),
            name: self.name.clone(),
            label: self.kind.display_name(),
            account: self.account.clone(),
            vehicle_id: self.vehicle_id.clone(),
            kind: self.kind,
            device_class: self.device_class(),
            is_on: self.is_on(),
            attributes: self.attributes(),
        }
    }

    fn apply(&self, vehicle: &Vehicle) {
        let is_on = self.kind.evaluate(vehicle);
        let attributes = self.kind.attributes(vehicle);
        if let Ok(mut state) = self.state.write() {
            state.is_on = Some(is_on);
            state.attributes = attributes;
        }
        self.logger
            .debug(&format!("State of {}: {}", self.name, is_on));
    }
}

impl UpdateListener for BinarySensor {
    fn on_update(&self, vehicles: &[Vehicle]) {
        match vehicles.iter().find(|v| v.id() == self.vehicle_id) {
            Some(vehicle) => self.apply(vehicle),
            // Keep the last known state until the vehicle shows up again
            None => self.logger.warn(&format!(
                "Vehicle {} missing from refresh payload",
                self.vehicle_id
            )),
        }
    }
}

/// Create sensors for every cached vehicle of every account and subscribe
/// them to their account. Run after the initial refresh.
pub fn setup_platform(registry: &mut Registry) -> Vec<Arc<BinarySensor>> {
    let logger = get_logger("binary_sensor");
    logger.debug(&format!(
        "Found Kia accounts: {}",
        registry.names().join(", ")
    ));

    let mut sensors = Vec::new();
    for account in registry.iter_mut() {
        let vehicles = account.vehicles().to_vec();
        for vehicle in &vehicles {
            logger.debug(&format!(
                "Adding sensors for vehicle {} ({})",
                vehicle.nick_name(),
                vehicle.id()
            ));
            for kind in SensorKind::ALL {
                let sensor = Arc::new(BinarySensor::new(account.name(), vehicle, kind));
                account.add_update_listener(sensor.clone());
                sensors.push(sensor);
            }
        }
    }
    logger.info(&format!("Created {} binary sensor(s)", sensors.len()));
    sensors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vehicle::{DoorOpen, VehicleStatus};

    fn soul(status: VehicleStatus) -> Vehicle {
        Vehicle::new("V1", "Soul").with_status(status)
    }

    #[test]
    fn kinds_are_in_key_order() {
        let mut keys: Vec<&str> = SensorKind::ALL.iter().map(|k| k.key()).collect();
        let listed = keys.clone();
        keys.sort_unstable();
        assert_eq!(keys, listed);
    }

    #[test]
    fn naming_follows_vehicle() {
        let s = BinarySensor::new("home", &soul(VehicleStatus::default()), SensorKind::Doors);
        assert_eq!(s.name(), "Soul doors");
        assert_eq!(s.unique_id(), "V1-doors");
        assert_eq!(s.device_class(), "door");
        assert_eq!(s.account(), "home");
    }

    #[test]
    fn lock_sensor_is_on_when_unlocked() {
        let locked = soul(VehicleStatus {
            door_lock: true,
            ..VehicleStatus::default()
        });
        let s = BinarySensor::new("home", &locked, SensorKind::DoorLockState);
        assert_eq!(s.is_on(), Some(false));
        assert_eq!(s.device_class(), "lock");

        s.on_update(&[soul(VehicleStatus::default())]);
        assert_eq!(s.is_on(), Some(true));
    }

    #[test]
    fn doors_sensor_tracks_openings() {
        let s = BinarySensor::new("home", &soul(VehicleStatus::default()), SensorKind::Doors);
        assert_eq!(s.is_on(), Some(false));

        s.on_update(&[soul(VehicleStatus {
            door_open: DoorOpen {
                back_right: 1,
                ..DoorOpen::default()
            },
            ..VehicleStatus::default()
        })]);
        assert_eq!(s.is_on(), Some(true));
        let attrs = s.attributes();
        assert_eq!(attrs.get("BackRight"), Some(&serde_json::Value::Bool(true)));
        assert_eq!(attrs.get("Hood"), Some(&serde_json::Value::Bool(false)));
        assert_eq!(attrs.get("car"), Some(&serde_json::Value::from("Soul")));
    }

    #[test]
    fn lock_sensor_has_only_car_attribute() {
        let s = BinarySensor::new("home", &soul(VehicleStatus::default()), SensorKind::DoorLockState);
        let keys: Vec<String> = s.attributes().into_keys().collect();
        assert_eq!(keys, vec!["car".to_string()]);
    }

    #[test]
    fn missing_vehicle_keeps_last_state() {
        let s = BinarySensor::new(
            "home",
            &soul(VehicleStatus {
                trunk_open: true,
                ..VehicleStatus::default()
            }),
            SensorKind::Doors,
        );
        s.on_update(&[Vehicle::new("OTHER", "Niro")]);
        assert_eq!(s.is_on(), Some(true));
    }

    #[test]
    fn view_serializes() {
        let s = BinarySensor::new("home", &soul(VehicleStatus::default()), SensorKind::Doors);
        let json = serde_json::to_value(s.view()).unwrap();
        assert_eq!(json["kind"], "doors");
        assert_eq!(json["label"], "Doors");
        assert_eq!(json["is_on"], false);
        assert_eq!(json["unique_id"], "V1-doors");
    }
}
