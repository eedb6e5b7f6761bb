use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::profile::PublicProfile;
use crate::error::{AppError, AppResult};

/// Row in the `reviews` table: one passenger/driver rating per completed ride.
#[derive(Clone, Debug, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub ride_id: Uuid,
    pub reviewer_id: Uuid,
    pub reviewed_id: Uuid,
    pub rating: i32,
    pub safety_rating: Option<i32>,
    pub comment: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reviewer: Option<PublicProfile>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ReviewInsert {
    pub ride_id: Uuid,
    pub reviewer_id: Uuid,
    pub reviewed_id: Uuid,
    pub rating: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_rating: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl ReviewInsert {
    pub fn validate(&self) -> AppResult<()> {
        if !(1..=5).contains(&self.rating) {
            return Err(AppError::BadRequest(
                "Rating must be between 1 and 5".to_string(),
            ));
        }
        if let Some(safety) = self.safety_rating {
            if !(1..=5).contains(&safety) {
                return Err(AppError::BadRequest(
                    "Safety rating must be between 1 and 5".to_string(),
                ));
            }
        }
        if self.reviewer_id == self.reviewed_id {
            return Err(AppError::BadRequest(
                "You cannot review yourself".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert(rating: i32) -> ReviewInsert {
        ReviewInsert {
            ride_id: Uuid::new_v4(),
            reviewer_id: Uuid::new_v4(),
            reviewed_id: Uuid::new_v4(),
            rating,
            safety_rating: None,
            comment: None,
        }
    }

    #[test]
    fn rating_bounds_are_enforced() {
        assert!(insert(0).validate().is_err());
        assert!(insert(6).validate().is_err());
        assert!(insert(5).validate().is_ok());
    }

    #[test]
    fn self_review_is_rejected() {
        let mut review = insert(4);
        review.reviewed_id = review.reviewer_id;
        assert!(review.validate().is_err());
    }
}
