use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::profile::PublicProfile;
use crate::error::{AppError, AppResult};

/// Status of a passenger's request to join a ride.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticipationStatus {
    #[serde(rename = "pendente")]
    Pendente,
    #[serde(rename = "confirmado")]
    Confirmado,
    #[serde(rename = "recusado")]
    Recusado,
}

impl ParticipationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipationStatus::Pendente => "pendente",
            ParticipationStatus::Confirmado => "confirmado",
            ParticipationStatus::Recusado => "recusado",
        }
    }

    /// Whether the driver may move a request from `self` to `next`. The only
    /// legal transitions are pending to confirmed and pending to declined.
    pub fn can_transition_to(&self, next: ParticipationStatus) -> bool {
        matches!(
            (self, next),
            (
                ParticipationStatus::Pendente,
                ParticipationStatus::Confirmado | ParticipationStatus::Recusado
            )
        )
    }
}

/// Row in the `ride_participants` table.
#[derive(Clone, Debug, Deserialize)]
pub struct Participation {
    pub id: Uuid,
    #[serde(default)]
    pub ride_id: Option<Uuid>,
    #[serde(default)]
    pub passenger_id: Option<Uuid>,
    pub status: Option<ParticipationStatus>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub passenger: Option<PublicProfile>,
}

impl Participation {
    pub fn is_confirmed(&self) -> bool {
        self.status == Some(ParticipationStatus::Confirmado)
    }
}

/// Insert payload for a new ride request. Always created as pending; the
/// passenger has no way to self-confirm.
#[derive(Clone, Debug, Serialize)]
pub struct ParticipationInsert {
    pub ride_id: Uuid,
    pub passenger_id: Uuid,
    pub status: ParticipationStatus,
}

impl ParticipationInsert {
    pub fn new(ride_id: Uuid, passenger_id: Uuid) -> Self {
        Self {
            ride_id,
            passenger_id,
            status: ParticipationStatus::Pendente,
        }
    }
}

/// Validate a driver decision against the transition rules.
pub fn validate_transition(
    current: ParticipationStatus,
    next: ParticipationStatus,
) -> AppResult<()> {
    if !current.can_transition_to(next) {
        return Err(AppError::BadRequest(format!(
            "Cannot move a request from {} to {}",
            current.as_str(),
            next.as_str()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_requests_are_pending() {
        let insert = ParticipationInsert::new(Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(insert.status, ParticipationStatus::Pendente);
    }

    #[test]
    fn pending_can_be_confirmed_or_declined() {
        assert!(validate_transition(
            ParticipationStatus::Pendente,
            ParticipationStatus::Confirmado
        )
        .is_ok());
        assert!(validate_transition(
            ParticipationStatus::Pendente,
            ParticipationStatus::Recusado
        )
        .is_ok());
    }

    #[test]
    fn settled_requests_cannot_move() {
        for settled in [ParticipationStatus::Confirmado, ParticipationStatus::Recusado] {
            for next in [
                ParticipationStatus::Pendente,
                ParticipationStatus::Confirmado,
                ParticipationStatus::Recusado,
            ] {
                assert!(validate_transition(settled, next).is_err());
            }
        }
    }

    #[test]
    fn status_uses_backend_wire_values() {
        assert_eq!(
            serde_json::to_string(&ParticipationStatus::Recusado).unwrap(),
            "\"recusado\""
        );
        let parsed: ParticipationStatus = serde_json::from_str("\"confirmado\"").unwrap();
        assert_eq!(parsed, ParticipationStatus::Confirmado);
    }
}
