mod catalog;
mod context;
mod gateway;
mod models;
mod storage;

use std::env;
use std::sync::Arc;

use catalog::{apply_filters, sort_establishments, EstablishmentFilters};
use context::AppContext;
use gateway::{DirectoryGateway, MockGateway, RestGateway};
use models::{MessageType, NewBooking, NewMessage, SortOption};
use storage::FilePreferenceStore;
use tracing::{error, info, warn, Level};
use tracing_subscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("💇 Salon Scout");
    info!("==============");

    // Local preferences live in one JSON file next to the binary
    let prefs_path = env::var("SALON_SCOUT_PREFS")
        .unwrap_or_else(|_| "data/preferences.json".to_string());
    let store = Arc::new(FilePreferenceStore::new(&prefs_path)?);
    let ctx = AppContext::load(store).await;

    let settings = ctx.app_settings().await;
    info!(
        "Language {:?}, accent {}",
        settings.language, settings.theme_color
    );
    if ctx.user_profile().await.is_none() {
        ctx.update_user_profile(models::UserProfile {
            first_name: "Demo".to_string(),
            last_name: "User".to_string(),
            age: None,
            city: "Kyiv".to_string(),
            photo: None,
            phone: None,
            email: None,
        })
        .await?;
        info!("Stored a first-run profile");
    }

    // Without a configured backend the seeded mock directory stands in
    let gateway: Arc<dyn DirectoryGateway> = match env::var("SALON_SCOUT_API") {
        Ok(base_url) => {
            info!("Using directory backend at {base_url}");
            Arc::new(RestGateway::new(base_url)?)
        }
        Err(_) => {
            info!("SALON_SCOUT_API not set, using the seeded mock directory");
            Arc::new(MockGateway::seeded())
        }
    };

    let establishments = match gateway.fetch_establishments().await {
        Ok(establishments) => establishments,
        Err(err) => {
            error!("Failed to fetch establishments: {err:#}");
            Vec::new()
        }
    };

    let visible = apply_filters(&establishments, &EstablishmentFilters::default());
    let listing = sort_establishments(&visible, SortOption::Distance);

    info!("✅ {} establishments, nearest first", listing.len());
    for (i, establishment) in listing.iter().enumerate() {
        let distance = establishment
            .distance_km
            .map(|km| format!("{km:.1} km"))
            .unwrap_or_else(|| "?".to_string());
        println!(
            "{}. {} ({:?}, {})",
            i + 1,
            establishment.name,
            establishment.kind,
            distance
        );
        println!(
            "   {:.1}★ ({} reviews), {} open slots",
            establishment.rating,
            establishment.review_count,
            establishment.open_slot_count()
        );
        println!("   {}", establishment.address);
        println!();
    }

    let Some(nearest) = listing.first() else {
        warn!("Nothing to show, exiting");
        return Ok(());
    };

    // Favorite the nearest establishment (toggling twice would undo it)
    let now_favorite = ctx.toggle_favorite(&nearest.id).await?;
    info!(
        "{} is {} a favorite; favorites: {:?}",
        nearest.name,
        if now_favorite { "now" } else { "no longer" },
        ctx.favorites().await
    );

    // Book the first open slot of the first service
    if let (Some(service), Some(slot)) = (
        nearest.services.first(),
        nearest.available_slots.iter().find(|s| s.available),
    ) {
        let day = gateway.fetch_bookings(&nearest.id, slot.date).await?;
        info!(
            "{} bookings already on {}; slot check is advisory, the backend decides",
            day.len(),
            slot.date
        );

        match gateway
            .create_booking(NewBooking {
                user_id: "demo-user".to_string(),
                establishment_id: nearest.id.clone(),
                employee_id: None,
                service_id: service.id.clone(),
                booking_date: slot.date,
                booking_time: slot.time.clone(),
                duration: service.duration,
                notes: None,
                total_price: Some(service.price),
            })
            .await
        {
            Ok(booking) => info!(
                "💾 Booked '{}' on {} at {} ({:?})",
                service.name, booking.booking_date, booking.booking_time, booking.status
            ),
            Err(err) => warn!("Booking rejected: {err:#}"),
        }
    }

    // Message the first member of staff over a live feed
    let staff = gateway.fetch_employees(&nearest.id).await?;
    if let Some(employee) = staff.first() {
        let chat = gateway
            .find_or_create_chat("demo-user", &nearest.id, &employee.id)
            .await?;
        let mut feed = gateway.subscribe_messages(&chat.id).await?;

        gateway
            .send_message(NewMessage {
                chat_id: chat.id.clone(),
                sender_id: "demo-user".to_string(),
                content: format!("Hi {}, do you have time today?", employee.name),
                message_type: MessageType::Text,
            })
            .await?;

        if let Some(delivered) = feed.recv().await {
            info!("Live feed delivered: {}", delivered.content);
        }
        gateway.mark_messages_read(&chat.id, "demo-user").await?;
        feed.unsubscribe();
    }

    Ok(())
}
