use chrono::{DateTime, Utc};

use crate::entities::participation::Participation;

/// Seats still open on a ride: declared seats minus confirmed requests,
/// clamped at zero. Recomputed on every fetch, never stored.
pub fn remaining_seats(available_seats: i32, participations: &[Participation]) -> i32 {
    let confirmed = participations.iter().filter(|p| p.is_confirmed()).count() as i32;
    (available_seats - confirmed).max(0)
}

/// A ride can be booked only while it still has open seats and has not
/// departed yet.
pub fn is_bookable(
    available_seats: i32,
    participations: &[Participation],
    departure_time: DateTime<Utc>,
    now: DateTime<Utc>,
) -> bool {
    remaining_seats(available_seats, participations) > 0 && departure_time > now
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::participation::ParticipationStatus;
    use chrono::Duration;
    use uuid::Uuid;

    fn participation(status: ParticipationStatus) -> Participation {
        Participation {
            id: Uuid::new_v4(),
            ride_id: None,
            passenger_id: None,
            status: Some(status),
            created_at: None,
            passenger: None,
        }
    }

    #[test]
    fn remaining_is_declared_minus_confirmed() {
        let participations = vec![
            participation(ParticipationStatus::Confirmado),
            participation(ParticipationStatus::Confirmado),
            participation(ParticipationStatus::Pendente),
            participation(ParticipationStatus::Recusado),
        ];
        // Pending and declined requests do not occupy seats
        assert_eq!(remaining_seats(4, &participations), 2);
    }

    #[test]
    fn remaining_never_goes_negative() {
        let participations = vec![
            participation(ParticipationStatus::Confirmado),
            participation(ParticipationStatus::Confirmado),
        ];
        assert_eq!(remaining_seats(1, &participations), 0);
    }

    #[test]
    fn full_rides_are_not_bookable() {
        let now = Utc::now();
        let future = now + Duration::hours(1);
        let full = vec![
            participation(ParticipationStatus::Confirmado),
            participation(ParticipationStatus::Confirmado),
        ];
        assert!(!is_bookable(2, &full, future, now));
        assert!(is_bookable(3, &full, future, now));
    }

    #[test]
    fn departed_rides_are_not_bookable_even_with_seats() {
        let now = Utc::now();
        let past = now - Duration::minutes(5);
        assert!(!is_bookable(4, &[], past, now));
    }
}
