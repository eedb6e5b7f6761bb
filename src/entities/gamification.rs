use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::profile::PublicProfile;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BadgeType {
    #[serde(rename = "pontual")]
    Pontual,
    #[serde(rename = "eco_rider")]
    EcoRider,
    #[serde(rename = "mestre_caronas")]
    MestreCaronas,
    #[serde(rename = "social")]
    Social,
    #[serde(rename = "musical")]
    Musical,
}

/// Row in the static `badges` catalog.
#[derive(Clone, Debug, Deserialize)]
pub struct Badge {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub badge_type: BadgeType,
    pub points_required: i32,
    pub icon: Option<String>,
}

/// Row in `user_badges`: an explicit award, inserted by the backend when a
/// threshold is crossed. The client never writes these.
#[derive(Clone, Debug, Deserialize)]
pub struct UserBadge {
    pub id: Uuid,
    pub user_id: Uuid,
    pub badge_id: Uuid,
    pub earned_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub badge: Option<Badge>,
}

/// Row in `user_points`: one ledger row per user, incremented externally.
#[derive(Clone, Debug, Deserialize)]
pub struct UserPoints {
    pub user_id: Uuid,
    pub points: Option<i32>,
    pub co2_saved_kg: Option<f64>,
    pub total_rides_as_driver: Option<i32>,
    pub total_rides_as_passenger: Option<i32>,
    #[serde(default)]
    pub profile: Option<PublicProfile>,
}

impl UserPoints {
    pub fn points(&self) -> i32 {
        self.points.unwrap_or(0)
    }
}
