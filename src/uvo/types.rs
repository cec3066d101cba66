use crate::vehicle::Vehicle;
use serde::{Deserialize, Serialize};

/// Body posted to the login endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest<'a> {
    pub user_id: &'a str,
    pub password: &'a str,
}

/// Envelope of the vehicle list endpoint
#[derive(Debug, Deserialize)]
pub struct VehicleListResponse {
    #[serde(default)]
    pub payload: VehicleListPayload,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleListPayload {
    #[serde(default)]
    pub vehicle_summary: Vec<Vehicle>,
}
