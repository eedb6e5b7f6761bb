pub mod favorites;
pub mod gamification;
pub mod messaging;
pub mod profiles;
pub mod reviews;
pub mod rides;
pub mod routing;
