use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Category of a service establishment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EstablishmentKind {
    Hairdresser,
    Cosmetologist,
    NailSalon,
    Spa,
    Barbershop,
}

/// Ordinal price tier. Unrecognized tiers coming off the wire land in
/// `Other` and sort after the four known tiers instead of failing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PriceRange {
    #[serde(rename = "$")]
    Budget,
    #[serde(rename = "$$")]
    Moderate,
    #[serde(rename = "$$$")]
    Premium,
    #[serde(rename = "$$$$")]
    Luxury,
    #[serde(other)]
    Other,
}

impl PriceRange {
    pub fn ordinal(&self) -> u8 {
        match self {
            PriceRange::Budget => 1,
            PriceRange::Moderate => 2,
            PriceRange::Premium => 3,
            PriceRange::Luxury => 4,
            PriceRange::Other => 5,
        }
    }
}

/// A bookable service offered by an establishment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    /// Duration in minutes
    pub duration: u32,
    pub price: f64,
    pub description: Option<String>,
    pub establishment_id: Option<String>,
    pub is_active: Option<bool>,
}

/// A discrete bookable time unit tied to a date.
/// Availability is advisory only; the backend is the authority at write time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlot {
    pub id: String,
    /// HH:MM
    pub time: String,
    pub available: bool,
    pub date: NaiveDate,
}

/// Open/close pair for one weekday; a day absent from the map or mapped
/// to `None` means closed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayHours {
    pub open: String,
    pub close: String,
}

pub type OpeningHours = BTreeMap<String, Option<DayHours>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: String,
    pub establishment_id: String,
    pub name: String,
    pub role: String,
    pub photo_url: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    /// Soft-delete marker: deactivated employees keep their row
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Core establishment record as served by the directory backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Establishment {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EstablishmentKind,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub rating: f32,
    pub review_count: u32,
    pub price_range: PriceRange,
    pub image_url: String,
    pub phone: String,
    pub services: Vec<Service>,
    pub available_slots: Vec<TimeSlot>,
    pub opening_hours: OpeningHours,
    /// Kilometers from the user, when a location was available
    pub distance_km: Option<f64>,
    pub is_favorite: Option<bool>,
    pub owner_id: Option<String>,
    pub description: Option<String>,
    pub employees: Option<Vec<Employee>>,
}

impl Establishment {
    /// Open slots right now, the quantity the availability sort ranks by
    pub fn open_slot_count(&self) -> usize {
        self.available_slots.iter().filter(|s| s.available).count()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub user_id: String,
    pub establishment_id: String,
    pub employee_id: Option<String>,
    pub service_id: String,
    pub booking_date: NaiveDate,
    /// HH:MM
    pub booking_time: String,
    pub duration: u32,
    pub status: BookingStatus,
    pub notes: Option<String>,
    pub total_price: Option<f64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Fields the client supplies when requesting a booking; the backend mints
/// id, status and timestamps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBooking {
    pub user_id: String,
    pub establishment_id: String,
    pub employee_id: Option<String>,
    pub service_id: String,
    pub booking_date: NaiveDate,
    pub booking_time: String,
    pub duration: u32,
    pub notes: Option<String>,
    pub total_price: Option<f64>,
}

/// A conversation between a user and one employee of one establishment.
/// At most one chat may exist per (user, establishment, employee) triple.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: String,
    pub user_id: String,
    pub establishment_id: String,
    pub employee_id: String,
    pub last_message_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub establishment: Option<Establishment>,
    pub employee: Option<Employee>,
    /// Most recent message, projected for list previews
    pub last_message: Option<Message>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    Image,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub chat_id: String,
    pub sender_id: String,
    pub content: String,
    pub message_type: MessageType,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMessage {
    pub chat_id: String,
    pub sender_id: String,
    pub content: String,
    pub message_type: MessageType,
}

/// Fields an owner supplies when listing a new establishment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEstablishment {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EstablishmentKind,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub price_range: PriceRange,
    pub image_url: String,
    pub phone: String,
    pub owner_id: String,
    pub description: Option<String>,
    pub services: Vec<Service>,
    pub opening_hours: OpeningHours,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub first_name: String,
    pub last_name: String,
    pub age: Option<u32>,
    pub city: String,
    pub photo: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Uk,
    Ru,
}

/// Default accent color used until the user picks another one
pub const DEFAULT_THEME_COLOR: &str = "#64b5f6";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppSettings {
    pub language: Language,
    pub theme_color: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            language: Language::En,
            theme_color: DEFAULT_THEME_COLOR.to_string(),
        }
    }
}

/// Keys the listing can be ordered by
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOption {
    Distance,
    Rating,
    Price,
    Availability,
}
