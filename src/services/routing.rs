use serde::Deserialize;

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Fixed fare rate used for the price suggestion, in R$ per kilometer.
pub const PRICE_PER_KM_BRL: f64 = 1.50;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub lat: f64,
    pub lng: f64,
}

/// A geocoded address.
#[derive(Clone, Debug)]
pub struct GeocodedPlace {
    pub display_name: String,
    pub point: Point,
}

/// A driving route between two points.
#[derive(Clone, Debug)]
pub struct Route {
    pub distance_km: f64,
    pub duration_min: f64,
    /// Encoded polyline, passed straight to the map layer.
    pub geometry: String,
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    display_name: String,
    // Nominatim returns coordinates as strings
    lat: String,
    lon: String,
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    geometry: String,
}

#[derive(Clone)]
pub struct RoutingService {
    http: reqwest::Client,
    config: Config,
}

impl RoutingService {
    pub fn new(config: Config) -> Self {
        // The public geocoder rejects requests without an identifying agent
        let http = reqwest::Client::builder()
            .user_agent("pickme-client/0.1")
            .build()
            .unwrap_or_default();
        Self { http, config }
    }

    /// Free-text address to coordinates.
    pub async fn geocode(&self, query: &str) -> AppResult<GeocodedPlace> {
        let url = format!("{}/search", self.config.geocoding_url);
        let places: Vec<NominatimPlace> = self
            .http
            .get(url)
            .query(&[("format", "json"), ("q", query), ("limit", "1")])
            .send()
            .await
            .map_err(|_| AppError::RouteUnavailable)?
            .json()
            .await
            .map_err(|_| AppError::RouteUnavailable)?;

        let place = places
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound("Address not found, try a more specific one".to_string()))?;

        let point = Point {
            lat: place.lat.parse().map_err(|_| AppError::RouteUnavailable)?,
            lng: place.lon.parse().map_err(|_| AppError::RouteUnavailable)?,
        };
        Ok(GeocodedPlace {
            display_name: place.display_name,
            point,
        })
    }

    /// Driving route between two points via the external routing service.
    pub async fn route(&self, from: Point, to: Point) -> AppResult<Route> {
        let url = format!(
            "{}/route/v1/driving/{},{};{},{}",
            self.config.routing_url, from.lng, from.lat, to.lng, to.lat
        );
        let response: OsrmResponse = self
            .http
            .get(url)
            .query(&[("overview", "full"), ("geometries", "polyline")])
            .send()
            .await
            .map_err(|_| AppError::RouteUnavailable)?
            .json()
            .await
            .map_err(|_| AppError::RouteUnavailable)?;

        if response.code != "Ok" {
            return Err(AppError::RouteUnavailable);
        }
        let route = response.routes.into_iter().next().ok_or(AppError::RouteUnavailable)?;

        Ok(Route {
            distance_km: route.distance / 1000.0,
            duration_min: route.duration / 60.0,
            geometry: route.geometry,
        })
    }

    /// Route between two addresses plus a suggested price.
    pub async fn estimate_trip(&self, origin: &str, destination: &str) -> AppResult<TripEstimate> {
        let from = self.geocode(origin).await?;
        let to = self.geocode(destination).await?;
        let route = self.route(from.point, to.point).await?;
        let price = estimate_price(route.distance_km);
        Ok(TripEstimate {
            origin: from,
            destination: to,
            route,
            price_brl: price,
        })
    }
}

#[derive(Clone, Debug)]
pub struct TripEstimate {
    pub origin: GeocodedPlace,
    pub destination: GeocodedPlace,
    pub route: Route,
    pub price_brl: f64,
}

/// Suggested fare: distance times the fixed rate, rounded to cents.
pub fn estimate_price(distance_km: f64) -> f64 {
    (distance_km * PRICE_PER_KM_BRL * 100.0).round() / 100.0
}
