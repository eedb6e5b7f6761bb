pub mod favorite;
pub mod gamification;
pub mod message;
pub mod participation;
pub mod profile;
pub mod review;
pub mod ride;
