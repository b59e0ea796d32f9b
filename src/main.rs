use std::sync::Arc;

use pristine_client::config::ApiConfig;
use pristine_client::media;
use pristine_client::properties::PropertyService;
use pristine_client::session::SessionManager;
use pristine_client::ApiClient;
use tracing::{info, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let config = ApiConfig::from_env();
    info!("🏠 Pristine Primier client");
    info!("API base: {}", config.api_base_url);
    info!("");

    let media_base = config.media_base_url.clone();
    let client = Arc::new(ApiClient::new(config)?);

    // Restore any existing session before touching anything else
    let session = SessionManager::new(client.clone());
    session.check_on_load().await;
    match session.current_user() {
        Some(user) => info!("Signed in as {}", user.display_name()),
        None => info!("Browsing anonymously"),
    }

    let properties = PropertyService::new(client);
    let featured = properties.featured().await?;
    info!("✅ {} featured listings", featured.results.len());

    for (i, property) in featured.results.iter().enumerate() {
        println!("{}. {} ({}, {})", i + 1, property.title, property.city, property.state);
        if let Some(price) = property.price {
            println!("   Price: {}", price);
        }
        if let Some(acres) = property.size_acres {
            println!("   Size: {} acres", acres);
        }
        println!("   Image: {}", media::primary_image_url(&media_base, property));
        println!();
    }

    Ok(())
}
