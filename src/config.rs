use std::env;

#[derive(Clone)]
pub struct Config {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub geocoding_url: String,
    pub routing_url: String,
    pub password_reset_redirect: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            supabase_url: env::var("SUPABASE_URL")
                .expect("SUPABASE_URL must be set"),
            supabase_anon_key: env::var("SUPABASE_ANON_KEY")
                .expect("SUPABASE_ANON_KEY must be set"),
            geocoding_url: env::var("GEOCODING_URL")
                .unwrap_or_else(|_| "https://nominatim.openstreetmap.org".to_string()),
            routing_url: env::var("ROUTING_URL")
                .unwrap_or_else(|_| "https://router.project-osrm.org".to_string()),
            password_reset_redirect: env::var("PASSWORD_RESET_REDIRECT")
                .unwrap_or_else(|_| "https://pickmetrip.app/reset-password".to_string()),
        }
    }

    /// WebSocket endpoint of the realtime change feed.
    pub fn realtime_url(&self) -> String {
        let ws_base = self
            .supabase_url
            .replacen("https://", "wss://", 1)
            .replacen("http://", "ws://", 1);
        format!(
            "{}/realtime/v1/websocket?apikey={}&vsn=1.0.0",
            ws_base, self.supabase_anon_key
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn realtime_url_swaps_scheme_and_carries_key() {
        let config = Config {
            supabase_url: "https://abc.supabase.co".to_string(),
            supabase_anon_key: "anon-key".to_string(),
            geocoding_url: String::new(),
            routing_url: String::new(),
            password_reset_redirect: String::new(),
        };

        assert_eq!(
            config.realtime_url(),
            "wss://abc.supabase.co/realtime/v1/websocket?apikey=anon-key&vsn=1.0.0"
        );
    }
}
