pub mod config;
pub mod entities;
pub mod error;
pub mod services;
pub mod session;
pub mod supabase;
pub mod utils;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use supabase::SupabaseClient;

use services::favorites::FavoritesService;
use services::gamification::GamificationService;
use services::messaging::MessagingService;
use services::profiles::ProfileService;
use services::reviews::ReviewsService;
use services::rides::RideService;
use services::routing::RoutingService;

/// Everything a screen needs: one shared backend handle (with its session
/// store) and one service per feature area.
#[derive(Clone)]
pub struct AppContext {
    pub api: SupabaseClient,
    pub rides: RideService,
    pub messaging: MessagingService,
    pub gamification: GamificationService,
    pub profiles: ProfileService,
    pub favorites: FavoritesService,
    pub reviews: ReviewsService,
    pub routing: RoutingService,
}

impl AppContext {
    pub fn new(config: Config) -> Self {
        let api = SupabaseClient::new(config.clone());
        Self {
            rides: RideService::new(api.clone()),
            messaging: MessagingService::new(api.clone()),
            gamification: GamificationService::new(api.clone()),
            profiles: ProfileService::new(api.clone()),
            favorites: FavoritesService::new(api.clone()),
            reviews: ReviewsService::new(api.clone()),
            routing: RoutingService::new(config),
            api,
        }
    }
}
