use uuid::Uuid;

use crate::entities::favorite::{FavoriteLocation, FavoriteLocationInsert};
use crate::error::{AppError, AppResult};
use crate::services::routing::Point;
use crate::supabase::postgrest::Order;
use crate::supabase::SupabaseClient;
use crate::utils::geo::haversine_distance;

/// A saved location annotated with its straight-line distance from where the
/// user currently is. Locations saved without coordinates carry no distance.
#[derive(Clone, Debug)]
pub struct FavoriteWithDistance {
    pub location: FavoriteLocation,
    pub distance_km: Option<f64>,
}

#[derive(Clone)]
pub struct FavoritesService {
    api: SupabaseClient,
}

impl FavoritesService {
    pub fn new(api: SupabaseClient) -> Self {
        Self { api }
    }

    /// The caller's saved locations, newest first.
    pub async fn list(&self) -> AppResult<Vec<FavoriteLocation>> {
        let user_id = self.api.session.user_id().await?;
        self.api
            .from("favorite_locations")
            .eq("user_id", user_id)
            .order("created_at", Order::Desc)
            .fetch()
            .await
    }

    /// Saved locations with their distance from the user's position, for the
    /// favorites screen when location access is granted.
    pub async fn list_near(&self, position: Point) -> AppResult<Vec<FavoriteWithDistance>> {
        let favorites = self.list().await?;
        Ok(with_distances(favorites, position))
    }

    pub async fn add(
        &self,
        name: &str,
        address: &str,
        coordinates: Option<(f64, f64)>,
        icon: Option<&str>,
    ) -> AppResult<FavoriteLocation> {
        if name.trim().is_empty() || address.trim().is_empty() {
            return Err(AppError::BadRequest(
                "Name and address are required".to_string(),
            ));
        }

        let user_id = self.api.session.user_id().await?;
        let insert = FavoriteLocationInsert {
            user_id,
            name: name.trim().to_string(),
            address: address.trim().to_string(),
            latitude: coordinates.map(|(lat, _)| lat),
            longitude: coordinates.map(|(_, lng)| lng),
            icon: icon.map(String::from),
        };
        self.api.from("favorite_locations").insert(&insert).await
    }

    pub async fn remove(&self, id: Uuid) -> AppResult<()> {
        // Row-level policies on the backend stop cross-user deletes; the
        // user filter keeps the request honest anyway.
        let user_id = self.api.session.user_id().await?;
        self.api
            .from("favorite_locations")
            .eq("id", id)
            .eq("user_id", user_id)
            .delete()
            .await
    }
}

fn with_distances(favorites: Vec<FavoriteLocation>, from: Point) -> Vec<FavoriteWithDistance> {
    favorites
        .into_iter()
        .map(|location| {
            let distance_km = match (location.latitude, location.longitude) {
                (Some(lat), Some(lng)) => {
                    Some(haversine_distance(from.lat, from.lng, lat, lng))
                }
                _ => None,
            };
            FavoriteWithDistance {
                location,
                distance_km,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn favorite(coordinates: Option<(f64, f64)>) -> FavoriteLocation {
        FavoriteLocation {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Casa".to_string(),
            address: "Rua dos Aimorés, Belo Horizonte".to_string(),
            latitude: coordinates.map(|(lat, _)| lat),
            longitude: coordinates.map(|(_, lng)| lng),
            icon: None,
            created_at: None,
        }
    }

    #[test]
    fn distances_are_computed_from_the_given_position() {
        // UFMG main campus
        let position = Point {
            lat: -19.8707,
            lng: -43.9676,
        };
        // Praça Sete, downtown Belo Horizonte
        let favorites = vec![favorite(Some((-19.9320, -43.9385)))];

        let annotated = with_distances(favorites, position);
        let distance = annotated[0].distance_km.unwrap();
        assert!(distance > 5.0 && distance < 10.0);
    }

    #[test]
    fn favorites_without_coordinates_carry_no_distance() {
        let position = Point {
            lat: -19.87,
            lng: -43.96,
        };
        let annotated = with_distances(vec![favorite(None)], position);
        assert!(annotated[0].distance_km.is_none());
    }
}
