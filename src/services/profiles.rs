use serde_json::json;
use uuid::Uuid;

use crate::entities::profile::{NearbyDriver, Profile, ProfileUpdate, PublicProfile};
use crate::error::AppResult;
use crate::supabase::postgrest::Order;
use crate::supabase::SupabaseClient;

/// Default search radius of the nearby-drivers lookup, in kilometers.
pub const DEFAULT_NEARBY_RADIUS_KM: f64 = 10.0;

#[derive(Clone)]
pub struct ProfileService {
    api: SupabaseClient,
}

impl ProfileService {
    pub fn new(api: SupabaseClient) -> Self {
        Self { api }
    }

    /// The caller's own profile, private fields included.
    pub async fn my_profile(&self) -> AppResult<Profile> {
        let user_id = self.api.session.user_id().await?;
        self.api
            .from("profiles")
            .eq("id", user_id)
            .single()
            .await
    }

    /// Someone else's profile. Only public fields are selected; phone and
    /// home location never leave the owner's own view.
    pub async fn public_profile(&self, user_id: Uuid) -> AppResult<PublicProfile> {
        self.api
            .from("profiles")
            .select(PublicProfile::COLUMNS)
            .eq("id", user_id)
            .single()
            .await
    }

    /// Update the caller's profile.
    pub async fn update_my_profile(&self, update: ProfileUpdate) -> AppResult<()> {
        let user_id = self.api.session.user_id().await?;
        self.api
            .from("profiles")
            .eq("id", user_id)
            .update(&update)
            .await
    }

    /// Everyone except the caller, for the users list screen.
    pub async fn other_users(&self) -> AppResult<Vec<PublicProfile>> {
        let user_id = self.api.session.user_id().await?;
        self.api
            .from("profiles")
            .select(PublicProfile::COLUMNS)
            .neq("id", user_id)
            .order("full_name", Order::Asc)
            .fetch()
            .await
    }

    /// Server-side geo-proximity lookup: drivers whose home address lies
    /// within `radius_km` of the destination (10 km when not given).
    pub async fn nearby_drivers(
        &self,
        destination_lat: f64,
        destination_lng: f64,
        radius_km: Option<f64>,
    ) -> AppResult<Vec<NearbyDriver>> {
        self.api
            .rpc(
                "get_nearby_drivers",
                &nearby_drivers_args(destination_lat, destination_lng, radius_km),
            )
            .await
    }
}

fn nearby_drivers_args(
    destination_lat: f64,
    destination_lng: f64,
    radius_km: Option<f64>,
) -> serde_json::Value {
    json!({
        "destination_lat": destination_lat,
        "destination_lng": destination_lng,
        "max_distance_km": radius_km.unwrap_or(DEFAULT_NEARBY_RADIUS_KM),
    })
}

/// Parse the comma-separated hobbies field of the profile form.
pub fn parse_hobbies(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hobbies_are_trimmed_and_blanks_dropped() {
        assert_eq!(
            parse_hobbies(" violão, trilha ,, futebol "),
            vec!["violão", "trilha", "futebol"]
        );
        assert!(parse_hobbies("  ").is_empty());
    }

    #[test]
    fn nearby_lookup_defaults_to_ten_km() {
        let args = nearby_drivers_args(-19.93, -43.94, None);
        assert_eq!(args["max_distance_km"], 10.0);

        let args = nearby_drivers_args(-19.93, -43.94, Some(25.0));
        assert_eq!(args["max_distance_km"], 25.0);
    }

    #[test]
    fn profile_update_skips_unset_fields() {
        let update = ProfileUpdate {
            course: Some("Engenharia".to_string()),
            ..Default::default()
        };
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value, serde_json::json!({ "course": "Engenharia" }));
    }
}
