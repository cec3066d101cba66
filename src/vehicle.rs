//! Vehicle snapshot model and the remote client capability
//!
//! A refresh cycle produces a `Vec<Vehicle>`; the account layer never looks
//! inside it, the sensor adapters do.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Identity of a vehicle as reported by UVO
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleInfo {
    pub vehicle_id: String,
    #[serde(default)]
    pub nick_name: String,
}

/// Per-door open flags; UVO reports `1` for open, `0` for closed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DoorOpen {
    pub front_left: u8,
    pub front_right: u8,
    pub back_left: u8,
    pub back_right: u8,
}

/// Status block of a vehicle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VehicleStatus {
    pub hood_open: bool,
    pub trunk_open: bool,
    pub door_open: DoorOpen,
    pub door_lock: bool,
}

/// One vehicle of an account, as last fetched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub vehicle: VehicleInfo,
    #[serde(default)]
    pub status: VehicleStatus,
}

impl DoorOpen {
    pub fn front_left_open(&self) -> bool {
        self.front_left == 1
    }

    pub fn front_right_open(&self) -> bool {
        self.front_right == 1
    }

    pub fn back_left_open(&self) -> bool {
        self.back_left == 1
    }

    pub fn back_right_open(&self) -> bool {
        self.back_right == 1
    }

    pub fn any_open(&self) -> bool {
        self.front_left_open()
            || self.front_right_open()
            || self.back_left_open()
            || self.back_right_open()
    }
}

impl Vehicle {
    pub fn new<I: Into<String>, N: Into<String>>(vehicle_id: I, nick_name: N) -> Self {
        Self {
            vehicle: VehicleInfo {
                vehicle_id: vehicle_id.into(),
                nick_name: nick_name.into(),
            },
            status: VehicleStatus::default(),
        }
    }

    pub fn with_status(mut self, status: VehicleStatus) -> Self {
        self.status = status;
        self
    }

    pub fn id(&self) -> &str {
        &self.vehicle.vehicle_id
    }

    pub fn nick_name(&self) -> &str {
        &self.vehicle.nick_name
    }

    /// Hood, trunk or any of the four doors is open
    pub fn any_door_open(&self) -> bool {
        self.status.hood_open || self.status.trunk_open || self.status.door_open.any_open()
    }

    /// Opening flags keyed by the attribute names exposed on the doors sensor
    pub fn door_attributes(&self) -> [(&'static str, bool); 6] {
        let doors = &self.status.door_open;
        [
            ("Hood", self.status.hood_open),
            ("Trunk", self.status.trunk_open),
            ("FrontLeft", doors.front_left_open()),
            ("FrontRight", doors.front_right_open()),
            ("BackLeft", doors.back_left_open()),
            ("BackRight", doors.back_right_open()),
        ]
    }
}

/// Remote session handle for one UVO account.
///
/// Each account owns exactly one client for the life of the process. A refresh
/// cycle calls [`login`](VehicleClient::login) and then
/// [`fetch_state`](VehicleClient::fetch_state); both fail with an auth,
/// network, API or timeout error.
#[async_trait::async_trait]
pub trait VehicleClient: Send + Sync {
    /// Authenticate against the backend, replacing any previous session
    async fn login(&mut self) -> Result<()>;

    /// Fetch the current vehicle list for the authenticated session
    async fn fetch_state(&mut self) -> Result<Vec<Vehicle>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_camel_case() {
        let json = r#"{
            "vehicle": {"vehicleId": "V1", "nickName": "Soul"},
            "status": {
                "hoodOpen": false,
                "trunkOpen": true,
                "doorOpen": {"frontLeft": 0, "frontRight": 1, "backLeft": 0, "backRight": 0},
                "doorLock": true
            }
        }"#;
        let v: Vehicle = serde_json::from_str(json).unwrap();
        assert_eq!(v.id(), "V1");
        assert_eq!(v.nick_name(), "Soul");
        assert!(v.status.trunk_open);
        assert!(v.status.door_open.front_right_open());
        assert!(v.status.door_lock);
    }

    #[test]
    fn test_missing_status_defaults_closed() {
        let v: Vehicle = serde_json::from_str(r#"{"vehicle": {"vehicleId": "V2"}}"#).unwrap();
        assert_eq!(v.nick_name(), "");
        assert!(!v.any_door_open());
        assert!(!v.status.door_lock);
    }

    #[test]
    fn test_any_door_open() {
        let closed = Vehicle::new("V1", "Niro");
        assert!(!closed.any_door_open());

        let hood = Vehicle::new("V1", "Niro").with_status(VehicleStatus {
            hood_open: true,
            ..VehicleStatus::default()
        });
        assert!(hood.any_door_open());

        let door = Vehicle::new("V1", "Niro").with_status(VehicleStatus {
            door_open: DoorOpen {
                back_left: 1,
                ..DoorOpen::default()
            },
            ..VehicleStatus::default()
        });
        assert!(door.any_door_open());
    }

    #[test]
    fn test_door_flag_other_than_one_is_closed() {
        let v = Vehicle::new("V1", "Niro").with_status(VehicleStatus {
            door_open: DoorOpen {
                front_left: 2,
                ..DoorOpen::default()
            },
            ..VehicleStatus::default()
        });
        assert!(!v.any_door_open());
    }

    #[test]
    fn test_door_attributes() {
        let v = Vehicle::new("V1", "Niro").with_status(VehicleStatus {
            trunk_open: true,
            door_open: DoorOpen {
                front_right: 1,
                ..DoorOpen::default()
            },
            ..VehicleStatus::default()
        });
        let attrs = v.door_attributes();
        assert_eq!(attrs[1], ("Trunk", true));
        assert_eq!(attrs[3], ("FrontRight", true));
        assert_eq!(attrs[0], ("Hood", false));
    }
}
