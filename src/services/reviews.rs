use uuid::Uuid;

use crate::entities::review::{Review, ReviewInsert};
use crate::error::AppResult;
use crate::supabase::postgrest::Order;
use crate::supabase::SupabaseClient;

const REVIEW_COLUMNS: &str =
    "*, reviewer:profiles!reviews_reviewer_id_fkey(id, full_name, avatar_url, course, university)";

#[derive(Clone)]
pub struct ReviewsService {
    api: SupabaseClient,
}

impl ReviewsService {
    pub fn new(api: SupabaseClient) -> Self {
        Self { api }
    }

    /// Reviews written about a user, newest first.
    pub async fn about_user(&self, user_id: Uuid) -> AppResult<Vec<Review>> {
        self.api
            .from("reviews")
            .select(REVIEW_COLUMNS)
            .eq("reviewed_id", user_id)
            .order("created_at", Order::Desc)
            .fetch()
            .await
    }

    /// Rate the other party of a completed ride.
    pub async fn submit(
        &self,
        ride_id: Uuid,
        reviewed_id: Uuid,
        rating: i32,
        safety_rating: Option<i32>,
        comment: Option<&str>,
    ) -> AppResult<Review> {
        let reviewer_id = self.api.session.user_id().await?;
        let insert = ReviewInsert {
            ride_id,
            reviewer_id,
            reviewed_id,
            rating,
            safety_rating,
            comment: comment.map(str::trim).filter(|c| !c.is_empty()).map(String::from),
        };
        insert.validate()?;
        self.api.from("reviews").insert(&insert).await
    }
}

/// Mean rating across a user's reviews, or `None` without any.
pub fn average_rating(reviews: &[Review]) -> Option<f64> {
    if reviews.is_empty() {
        return None;
    }
    let sum: i32 = reviews.iter().map(|r| r.rating).sum();
    Some(sum as f64 / reviews.len() as f64)
}
