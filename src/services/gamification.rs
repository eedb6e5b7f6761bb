use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::entities::gamification::{Badge, UserBadge, UserPoints};
use crate::error::AppResult;
use crate::supabase::postgrest::Order;
use crate::supabase::SupabaseClient;

const RANKING_COLUMNS: &str =
    "*, profile:profiles!user_points_user_id_fkey(id, full_name, avatar_url, course, university)";

/// A catalog badge joined with the user's award record, if any. "Earned"
/// means an award row exists; meeting the threshold alone is not enough,
/// since award issuance lives on the backend.
#[derive(Clone, Debug)]
pub struct BadgeStanding {
    pub badge: Badge,
    pub earned: bool,
    pub earned_at: Option<DateTime<Utc>>,
    pub points_missing: i32,
}

#[derive(Clone)]
pub struct GamificationService {
    api: SupabaseClient,
}

impl GamificationService {
    pub fn new(api: SupabaseClient) -> Self {
        Self { api }
    }

    /// Top of the points ranking, highest first.
    pub async fn top_ranking(&self, limit: u32) -> AppResult<Vec<UserPoints>> {
        self.api
            .from("user_points")
            .select(RANKING_COLUMNS)
            .order("points", Order::Desc)
            .limit(limit)
            .fetch()
            .await
    }

    /// The caller's ledger row. Absent until the backend first awards points.
    pub async fn my_points(&self) -> AppResult<Option<UserPoints>> {
        let user_id = self.api.session.user_id().await?;
        let rows: Vec<UserPoints> = self
            .api
            .from("user_points")
            .select(RANKING_COLUMNS)
            .eq("user_id", user_id)
            .fetch()
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Static badge catalog, cheapest threshold first.
    pub async fn badge_catalog(&self) -> AppResult<Vec<Badge>> {
        self.api
            .from("badges")
            .order("points_required", Order::Asc)
            .fetch()
            .await
    }

    /// Awards the caller has actually received.
    pub async fn my_badges(&self) -> AppResult<Vec<UserBadge>> {
        let user_id = self.api.session.user_id().await?;
        self.api
            .from("user_badges")
            .select("*, badge:badges(*)")
            .eq("user_id", user_id)
            .fetch()
            .await
    }

    /// Catalog joined with the caller's awards and ledger total, ready for
    /// the ranking screen.
    pub async fn badge_standings(&self) -> AppResult<Vec<BadgeStanding>> {
        let catalog = self.badge_catalog().await?;
        let awards = self.my_badges().await?;
        let points = self.my_points().await?.map(|p| p.points()).unwrap_or(0);
        Ok(match_badges(catalog, &awards, points))
    }
}

/// Join the catalog against the explicit award set.
pub fn match_badges(catalog: Vec<Badge>, awards: &[UserBadge], points: i32) -> Vec<BadgeStanding> {
    let awarded: HashMap<Uuid, Option<DateTime<Utc>>> = awards
        .iter()
        .map(|award| (award.badge_id, award.earned_at))
        .collect();

    catalog
        .into_iter()
        .map(|badge| {
            let earned_at = awarded.get(&badge.id).copied();
            BadgeStanding {
                earned: earned_at.is_some(),
                earned_at: earned_at.flatten(),
                points_missing: (badge.points_required - points).max(0),
                badge,
            }
        })
        .collect()
}
