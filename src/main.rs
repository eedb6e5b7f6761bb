use std::env;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pickme_client::supabase::realtime::debounce_refetch;
use pickme_client::{AppContext, Config};

/// Terminal demo of the client core: sign in, show the bookable rides, then
/// keep the list fresh from the realtime feed until interrupted.
#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pickme_client=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();
    let app = AppContext::new(config);

    // Sign in with demo credentials
    let email = env::var("PICKME_EMAIL").expect("PICKME_EMAIL must be set");
    let password = env::var("PICKME_PASSWORD").expect("PICKME_PASSWORD must be set");
    let session = app
        .api
        .sign_in_with_password(&email, &password)
        .await
        .expect("Failed to sign in");
    tracing::info!(
        "Signed in as {}",
        session.user.full_name().unwrap_or("unknown")
    );

    print_open_rides(&app).await;

    // Tail the change feed, refetching once per burst of changes
    let mut feed = app
        .rides
        .watch_open()
        .await
        .expect("Failed to open the ride feed");
    tracing::info!("Watching for ride changes (ctrl-c to quit)");

    debounce_refetch(feed.events_mut(), Duration::from_millis(250), || async {
        print_open_rides(&app).await;
    })
    .await;
}

async fn print_open_rides(app: &AppContext) {
    match app.rides.search_open().await {
        Ok(rides) => {
            println!("--- {} rides open for booking ---", rides.len());
            for open in rides {
                println!(
                    "{} -> {} | {} | {} seat(s) | {}",
                    open.ride.origin,
                    open.ride.destination,
                    open.ride.departure_time.format("%d/%m %H:%M"),
                    open.remaining_seats,
                    open.ride
                        .price
                        .map(|p| format!("R${:.2}", p))
                        .unwrap_or_else(|| "free".to_string()),
                );
            }
        }
        Err(e) => tracing::error!("Could not load rides: {}", e),
    }
}
