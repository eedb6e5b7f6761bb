use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::profile::PublicProfile;

/// Row in the `messages` table (ride-scoped chat, append-only).
#[derive(Clone, Debug, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub ride_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sender: Option<PublicProfile>,
}

#[derive(Clone, Debug, Serialize)]
pub struct MessageInsert {
    pub ride_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
}

/// Row in the `private_messages` table. `read` is flipped by the receiver.
#[derive(Clone, Debug, Deserialize)]
pub struct PrivateMessage {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub ride_id: Option<Uuid>,
    pub content: String,
    pub read: Option<bool>,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sender: Option<PublicProfile>,
    #[serde(default)]
    pub receiver: Option<PublicProfile>,
}

#[derive(Clone, Debug, Serialize)]
pub struct PrivateMessageInsert {
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ride_id: Option<Uuid>,
    pub content: String,
}
