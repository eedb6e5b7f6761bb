use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::participation::Participation;
use crate::entities::profile::PublicProfile;
use crate::error::{AppError, AppResult};

/// Lifecycle of a ride. The client only ever writes `Pendente` on creation;
/// later transitions happen on the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RideStatus {
    #[serde(rename = "pendente")]
    Pendente,
    #[serde(rename = "confirmada")]
    Confirmada,
    #[serde(rename = "em_andamento")]
    EmAndamento,
    #[serde(rename = "concluida")]
    Concluida,
    #[serde(rename = "cancelada")]
    Cancelada,
}

impl RideStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RideStatus::Pendente => "pendente",
            RideStatus::Confirmada => "confirmada",
            RideStatus::EmAndamento => "em_andamento",
            RideStatus::Concluida => "concluida",
            RideStatus::Cancelada => "cancelada",
        }
    }
}

/// Row in the `rides` table.
#[derive(Clone, Debug, Deserialize)]
pub struct Ride {
    pub id: Uuid,
    pub driver_id: Uuid,
    pub origin: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
    pub available_seats: i32,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub status: Option<RideStatus>,
    pub is_recurring: Option<bool>,
    pub recurring_days: Option<Vec<i32>>,
    pub origin_lat: Option<f64>,
    pub origin_lng: Option<f64>,
    pub destination_lat: Option<f64>,
    pub destination_lng: Option<f64>,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub driver: Option<PublicProfile>,
    #[serde(default)]
    pub ride_participants: Vec<Participation>,
}

/// Insert payload for `rides`. Built through [`NewRide::into_insert`] so the
/// recurring-days rule cannot be bypassed: a non-recurring ride never carries
/// a day list.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RideInsert {
    pub driver_id: Uuid,
    pub origin: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
    pub available_seats: i32,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub is_recurring: bool,
    pub recurring_days: Option<Vec<i32>>,
    pub status: RideStatus,
}

#[derive(Clone, Debug)]
pub struct NewRide {
    pub origin: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
    pub available_seats: i32,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub is_recurring: bool,
    pub recurring_days: Vec<i32>,
}

impl NewRide {
    pub fn into_insert(self, driver_id: Uuid) -> AppResult<RideInsert> {
        if self.available_seats < 1 {
            return Err(AppError::BadRequest(
                "A ride must offer at least 1 seat".to_string(),
            ));
        }
        if self.departure_time < Utc::now() {
            return Err(AppError::BadRequest(
                "Departure time must be in the future".to_string(),
            ));
        }
        if self.is_recurring && self.recurring_days.is_empty() {
            return Err(AppError::BadRequest(
                "A recurring ride needs at least one weekday".to_string(),
            ));
        }
        if self.recurring_days.iter().any(|d| !(0..=6).contains(d)) {
            return Err(AppError::BadRequest(
                "Weekdays must be between 0 (Sunday) and 6 (Saturday)".to_string(),
            ));
        }

        Ok(RideInsert {
            driver_id,
            origin: self.origin,
            destination: self.destination,
            departure_time: self.departure_time,
            available_seats: self.available_seats,
            price: self.price,
            description: self.description,
            is_recurring: self.is_recurring,
            recurring_days: if self.is_recurring {
                Some(self.recurring_days)
            } else {
                None
            },
            status: RideStatus::Pendente,
        })
    }
}
