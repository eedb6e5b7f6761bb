use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::entities::participation::{
    validate_transition, Participation, ParticipationInsert, ParticipationStatus,
};
use crate::entities::ride::{NewRide, Ride, RideStatus};
use crate::error::{AppError, AppResult};
use crate::supabase::postgrest::Order;
use crate::supabase::realtime::{PostgresChange, Subscription};
use crate::supabase::SupabaseClient;
use crate::utils::availability::{is_bookable, remaining_seats};

/// Embeds used when listing searchable rides: driver card plus the
/// participation statuses needed for the seat arithmetic.
const SEARCH_COLUMNS: &str = "*, \
    driver:profiles!rides_driver_id_fkey(id, full_name, avatar_url, course, university), \
    ride_participants!ride_participants_ride_id_fkey(id, status)";

/// Embeds used on the ride detail screen: full participant list with their
/// public profiles.
const DETAIL_COLUMNS: &str = "*, \
    driver:profiles!rides_driver_id_fkey(id, full_name, avatar_url, course, university), \
    ride_participants(id, ride_id, passenger_id, status, created_at, \
    passenger:profiles!ride_participants_passenger_id_fkey(id, full_name, avatar_url, course, university))";

/// A searchable ride together with its recomputed seat count. The count is
/// derived on every fetch and never written back.
#[derive(Clone, Debug)]
pub struct OpenRide {
    pub ride: Ride,
    pub remaining_seats: i32,
}

/// A ride the user joined (or asked to join) as passenger.
#[derive(Clone, Debug, Deserialize)]
pub struct PassengerRide {
    #[serde(flatten)]
    pub participation: Participation,
    pub ride: Option<Ride>,
}

#[derive(Clone)]
pub struct RideService {
    api: SupabaseClient,
}

impl RideService {
    pub fn new(api: SupabaseClient) -> Self {
        Self { api }
    }

    /// Offer a new ride. Created rides always start pending with no stored
    /// seat count besides the declared capacity.
    pub async fn create(&self, ride: NewRide) -> AppResult<Ride> {
        let driver_id = self.api.session.user_id().await?;
        let insert = ride.into_insert(driver_id)?;
        let created: Ride = self.api.from("rides").insert(&insert).await?;
        tracing::info!(ride = %created.id, "ride created");
        Ok(created)
    }

    /// Rides currently open for booking: pending status, future departure,
    /// at least one seat left after confirmed participants.
    pub async fn search_open(&self) -> AppResult<Vec<OpenRide>> {
        let now = Utc::now();
        let rides: Vec<Ride> = self
            .api
            .from("rides")
            .select(SEARCH_COLUMNS)
            .eq("status", RideStatus::Pendente.as_str())
            .gte("departure_time", now.to_rfc3339())
            .order("departure_time", Order::Asc)
            .fetch()
            .await?;

        Ok(open_rides(rides, now))
    }

    /// Full detail view of one ride, participants included.
    pub async fn details(&self, ride_id: Uuid) -> AppResult<OpenRide> {
        let ride: Ride = self
            .api
            .from("rides")
            .select(DETAIL_COLUMNS)
            .eq("id", ride_id)
            .single()
            .await?;

        let remaining = remaining_seats(ride.available_seats, &ride.ride_participants);
        Ok(OpenRide {
            ride,
            remaining_seats: remaining,
        })
    }

    /// Rides the user offers as driver, newest departure first.
    pub async fn my_rides_as_driver(&self) -> AppResult<Vec<Ride>> {
        let user_id = self.api.session.user_id().await?;
        self.api
            .from("rides")
            .select(DETAIL_COLUMNS)
            .eq("driver_id", user_id)
            .order("departure_time", Order::Desc)
            .fetch()
            .await
    }

    /// Rides the user requested as passenger, with the request status.
    pub async fn my_rides_as_passenger(&self) -> AppResult<Vec<PassengerRide>> {
        let user_id = self.api.session.user_id().await?;
        self.api
            .from("ride_participants")
            .select("*, ride:rides!ride_participants_ride_id_fkey(*)")
            .eq("passenger_id", user_id)
            .order("created_at", Order::Desc)
            .fetch()
            .await
    }

    /// Ask to join a ride. The request is created pending; a second request
    /// for the same ride hits the backend's unique constraint and surfaces as
    /// a conflict.
    pub async fn request_seat(&self, ride_id: Uuid) -> AppResult<Participation> {
        let user_id = self.api.session.user_id().await?;

        // Availability is re-read here, not trusted from the list the user
        // clicked on: confirmations may have landed since that fetch.
        let current = self.details(ride_id).await?;
        if current.ride.driver_id == user_id {
            return Err(AppError::BadRequest(
                "You cannot request your own ride".to_string(),
            ));
        }
        if !is_bookable(
            current.ride.available_seats,
            &current.ride.ride_participants,
            current.ride.departure_time,
            Utc::now(),
        ) {
            return Err(AppError::BadRequest(
                "This ride is no longer available".to_string(),
            ));
        }

        let insert = ParticipationInsert::new(ride_id, user_id);
        self.api.from("ride_participants").insert(&insert).await
    }

    /// Driver decision on a pending request. Only the ride's driver may
    /// transition a request, and only out of pending.
    pub async fn respond_to_request(
        &self,
        participation_id: Uuid,
        decision: ParticipationStatus,
    ) -> AppResult<()> {
        if decision == ParticipationStatus::Pendente {
            return Err(AppError::BadRequest(
                "A request can only be confirmed or declined".to_string(),
            ));
        }

        let user_id = self.api.session.user_id().await?;
        let participation: Participation = self
            .api
            .from("ride_participants")
            .eq("id", participation_id)
            .single()
            .await?;

        let ride_id = participation
            .ride_id
            .ok_or_else(|| AppError::Internal("Request without a ride".to_string()))?;
        let ride: Ride = self
            .api
            .from("rides")
            .eq("id", ride_id)
            .single()
            .await?;

        if ride.driver_id != user_id {
            return Err(AppError::Forbidden(
                "Only the driver can answer ride requests".to_string(),
            ));
        }

        let current = participation
            .status
            .unwrap_or(ParticipationStatus::Pendente);
        validate_transition(current, decision)?;

        // The update filters on pending so a racing second decision matches
        // zero rows instead of overwriting the first one.
        decision_update(&self.api, participation_id)
            .update(&json!({ "status": decision }))
            .await?;
        tracing::info!(request = %participation_id, status = decision.as_str(), "request answered");
        Ok(())
    }

    /// Live feed behind the search screen: any change to rides or their
    /// participants should refresh the list (debounced by the caller via
    /// [`crate::supabase::realtime::debounce_refetch`]).
    pub async fn watch_open(&self) -> AppResult<Subscription> {
        self.api
            .channel(
                "rides-changes",
                vec![
                    PostgresChange::all("rides"),
                    PostgresChange::all("ride_participants"),
                ],
            )
            .await
    }
}

/// Filters for the driver-decision update: row identity plus the pending
/// guard that makes the transition atomic on the backend.
fn decision_update(api: &SupabaseClient, participation_id: Uuid) -> crate::supabase::postgrest::TableQuery {
    api.from("ride_participants")
        .eq("id", participation_id)
        .eq("status", ParticipationStatus::Pendente.as_str())
}

/// Keep only rides that are actually bookable and attach the derived seat
/// count.
fn open_rides(rides: Vec<Ride>, now: DateTime<Utc>) -> Vec<OpenRide> {
    rides
        .into_iter()
        .filter_map(|ride| {
            let remaining = remaining_seats(ride.available_seats, &ride.ride_participants);
            let bookable = is_bookable(
                ride.available_seats,
                &ride.ride_participants,
                ride.departure_time,
                now,
            );
            bookable.then_some(OpenRide {
                remaining_seats: remaining,
                ride,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

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

    fn ride(seats: i32, confirmed: usize, departure: DateTime<Utc>) -> Ride {
        let mut participants = vec![participation(ParticipationStatus::Pendente)];
        participants.extend(
            std::iter::repeat_with(|| participation(ParticipationStatus::Confirmado))
                .take(confirmed),
        );
        Ride {
            id: Uuid::new_v4(),
            driver_id: Uuid::new_v4(),
            origin: "Campus".to_string(),
            destination: "Centro".to_string(),
            departure_time: departure,
            available_seats: seats,
            price: None,
            description: None,
            status: Some(RideStatus::Pendente),
            is_recurring: Some(false),
            recurring_days: None,
            origin_lat: None,
            origin_lng: None,
            destination_lat: None,
            destination_lng: None,
            created_at: None,
            driver: None,
            ride_participants: participants,
        }
    }

    #[test]
    fn remaining_equals_declared_minus_confirmed() {
        let now = Utc::now();
        let future = now + Duration::hours(3);
        let open = open_rides(vec![ride(4, 1, future)], now);
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].remaining_seats, 3);
    }

    #[test]
    fn full_rides_are_dropped_from_search() {
        let now = Utc::now();
        let future = now + Duration::hours(3);
        let open = open_rides(vec![ride(2, 2, future), ride(2, 1, future)], now);
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].remaining_seats, 1);
    }

    #[test]
    fn departed_rides_are_dropped_regardless_of_seats() {
        let now = Utc::now();
        let past = now - Duration::minutes(1);
        let open = open_rides(vec![ride(4, 0, past)], now);
        assert!(open.is_empty());
    }

    #[test]
    fn decision_update_only_touches_pending_rows() {
        let api = SupabaseClient::new(crate::config::Config {
            supabase_url: "https://abc.supabase.co".to_string(),
            supabase_anon_key: "anon".to_string(),
            geocoding_url: String::new(),
            routing_url: String::new(),
            password_reset_redirect: String::new(),
        });
        let participation_id = Uuid::new_v4();

        let params = decision_update(&api, participation_id).params();
        assert!(params.contains(&(
            "id".to_string(),
            format!("eq.{}", participation_id)
        )));
        assert!(params.contains(&("status".to_string(), "eq.pendente".to_string())));
    }

    #[test]
    fn passenger_ride_parses_embedded_ride() {
        let raw = serde_json::json!({
            "id": "a2b4c3be-70c7-4cc5-8083-7e53a1f765f1",
            "ride_id": "16cbee00-1111-4cc5-8083-7e53a1f765f1",
            "passenger_id": "7f4e41fe-39ba-45b0-9a5f-4777c01b8c6e",
            "status": "pendente",
            "created_at": "2026-08-29T10:00:00Z",
            "ride": {
                "id": "16cbee00-1111-4cc5-8083-7e53a1f765f1",
                "driver_id": "7f4e41fe-39ba-45b0-9a5f-4777c01b8c6e",
                "origin": "Campus",
                "destination": "Centro",
                "departure_time": "2026-09-01T08:00:00Z",
                "available_seats": 3,
                "price": 5.0,
                "status": "pendente"
            }
        });

        let parsed: PassengerRide = serde_json::from_value(raw).unwrap();
        assert_eq!(
            parsed.participation.status,
            Some(ParticipationStatus::Pendente)
        );
        assert_eq!(parsed.ride.unwrap().origin, "Campus");
    }
}
