use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Row in the `profiles` table. The id matches the auth user id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub full_name: String,
    pub course: Option<String>,
    pub university: Option<String>,
    pub phone: Option<String>,
    pub hobbies: Option<Vec<String>>,
    pub avatar_url: Option<String>,
    pub home_address: Option<String>,
    pub home_lat: Option<f64>,
    pub home_lng: Option<f64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Public subset exposed to other users (phone and home location stay private).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PublicProfile {
    pub id: Uuid,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub course: Option<String>,
    pub university: Option<String>,
}

impl PublicProfile {
    /// Column list matching this struct, for embedding in select queries.
    pub const COLUMNS: &'static str = "id, full_name, avatar_url, course, university";
}

/// Fields the owning user may change on their own profile.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub university: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hobbies: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_lng: Option<f64>,
}

/// Result row of the `get_nearby_drivers` server-side function.
#[derive(Clone, Debug, Deserialize)]
pub struct NearbyDriver {
    pub id: Uuid,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub course: Option<String>,
    pub university: Option<String>,
    pub home_address: String,
    pub distance_km: f64,
}
