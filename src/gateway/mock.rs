use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::{broadcast, RwLock};
use tracing::info;
use uuid::Uuid;

use crate::gateway::realtime::MessageFeed;
use crate::gateway::traits::DirectoryGateway;
use crate::models::{
    Booking, BookingStatus, Chat, DayHours, Employee, Establishment, EstablishmentKind, Message,
    NewBooking, NewEstablishment, NewMessage, PriceRange, Service, TimeSlot,
};

#[derive(Default)]
struct Tables {
    establishments: Vec<Establishment>,
    bookings: Vec<Booking>,
    employees: Vec<Employee>,
    chats: Vec<Chat>,
    messages: Vec<Message>,
}

/// In-memory stand-in for the directory backend, seeded with sample salons.
/// Mirrors the backend guarantees the client depends on: slot uniqueness at
/// booking time and one chat per (user, establishment, employee) triple.
pub struct MockGateway {
    tables: RwLock<Tables>,
    events: broadcast::Sender<Message>,
}

impl MockGateway {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            tables: RwLock::new(Tables::default()),
            events,
        }
    }

    /// Gateway preloaded with sample establishments and staff
    pub fn seeded() -> Self {
        let gateway = Self::new();
        {
            let mut tables = gateway.tables.try_write().expect("fresh gateway");
            let (establishments, employees) = sample_directory();
            tables.establishments = establishments;
            tables.employees = employees;
        }
        info!("Mock directory seeded");
        gateway
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DirectoryGateway for MockGateway {
    async fn fetch_establishments(&self) -> Result<Vec<Establishment>> {
        Ok(self.tables.read().await.establishments.clone())
    }

    async fn fetch_bookings(
        &self,
        establishment_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Booking>> {
        let tables = self.tables.read().await;
        Ok(tables
            .bookings
            .iter()
            .filter(|b| {
                b.establishment_id == establishment_id
                    && b.booking_date == date
                    && b.status != BookingStatus::Cancelled
            })
            .cloned()
            .collect())
    }

    async fn create_booking(&self, booking: NewBooking) -> Result<Booking> {
        let mut tables = self.tables.write().await;

        // The check a real backend would enforce transactionally; the client
        // side pre-check is advisory and may have raced another writer.
        let taken = tables.bookings.iter().any(|b| {
            b.establishment_id == booking.establishment_id
                && b.booking_date == booking.booking_date
                && b.booking_time == booking.booking_time
                && b.status != BookingStatus::Cancelled
        });
        if taken {
            bail!(
                "Slot {} {} at establishment {} is already booked",
                booking.booking_date,
                booking.booking_time,
                booking.establishment_id
            );
        }

        let now = Utc::now();
        let created = Booking {
            id: Uuid::new_v4().to_string(),
            user_id: booking.user_id,
            establishment_id: booking.establishment_id,
            employee_id: booking.employee_id,
            service_id: booking.service_id,
            booking_date: booking.booking_date,
            booking_time: booking.booking_time,
            duration: booking.duration,
            status: BookingStatus::Pending,
            notes: booking.notes,
            total_price: booking.total_price,
            created_at: Some(now),
            updated_at: Some(now),
        };
        tables.bookings.push(created.clone());
        Ok(created)
    }

    async fn create_establishment(
        &self,
        establishment: NewEstablishment,
    ) -> Result<Establishment> {
        let mut tables = self.tables.write().await;
        let created = Establishment {
            id: Uuid::new_v4().to_string(),
            name: establishment.name,
            kind: establishment.kind,
            address: establishment.address,
            latitude: establishment.latitude,
            longitude: establishment.longitude,
            rating: 0.0,
            review_count: 0,
            price_range: establishment.price_range,
            image_url: establishment.image_url,
            phone: establishment.phone,
            services: establishment.services,
            available_slots: vec![],
            opening_hours: establishment.opening_hours,
            distance_km: None,
            is_favorite: None,
            owner_id: Some(establishment.owner_id),
            description: establishment.description,
            employees: None,
        };
        tables.establishments.push(created.clone());
        Ok(created)
    }

    async fn fetch_employees(&self, establishment_id: &str) -> Result<Vec<Employee>> {
        let tables = self.tables.read().await;
        Ok(tables
            .employees
            .iter()
            .filter(|e| e.establishment_id == establishment_id && e.is_active)
            .cloned()
            .collect())
    }

    async fn deactivate_employee(&self, employee_id: &str) -> Result<()> {
        let mut tables = self.tables.write().await;
        let Some(employee) = tables.employees.iter_mut().find(|e| e.id == employee_id) else {
            bail!("No employee {employee_id}");
        };
        employee.is_active = false;
        employee.updated_at = Some(Utc::now());
        Ok(())
    }

    async fn fetch_chats(&self, user_id: &str) -> Result<Vec<Chat>> {
        let tables = self.tables.read().await;
        let mut chats: Vec<Chat> = tables
            .chats
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .map(|mut chat| {
                chat.last_message = tables
                    .messages
                    .iter()
                    .filter(|m| m.chat_id == chat.id)
                    .max_by_key(|m| m.created_at)
                    .cloned();
                chat.establishment = tables
                    .establishments
                    .iter()
                    .find(|e| e.id == chat.establishment_id)
                    .cloned();
                chat.employee = tables
                    .employees
                    .iter()
                    .find(|e| e.id == chat.employee_id)
                    .cloned();
                chat
            })
            .collect();
        chats.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
        Ok(chats)
    }

    async fn find_or_create_chat(
        &self,
        user_id: &str,
        establishment_id: &str,
        employee_id: &str,
    ) -> Result<Chat> {
        let mut tables = self.tables.write().await;

        // Lookup and insert happen under one write lock, the uniqueness
        // guarantee a real backend would provide with a constraint
        if let Some(existing) = tables.chats.iter().find(|c| {
            c.user_id == user_id
                && c.establishment_id == establishment_id
                && c.employee_id == employee_id
        }) {
            return Ok(existing.clone());
        }

        let now = Utc::now();
        let chat = Chat {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            establishment_id: establishment_id.to_string(),
            employee_id: employee_id.to_string(),
            last_message_at: now,
            created_at: now,
            establishment: None,
            employee: None,
            last_message: None,
        };
        tables.chats.push(chat.clone());
        Ok(chat)
    }

    async fn fetch_messages(&self, chat_id: &str) -> Result<Vec<Message>> {
        let tables = self.tables.read().await;
        let mut messages: Vec<Message> = tables
            .messages
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .cloned()
            .collect();
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(messages)
    }

    async fn send_message(&self, message: NewMessage) -> Result<Message> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;
        let Some(chat) = tables.chats.iter_mut().find(|c| c.id == message.chat_id) else {
            bail!("No chat {}", message.chat_id);
        };

        let now = Utc::now();
        chat.last_message_at = now;
        let created = Message {
            id: Uuid::new_v4().to_string(),
            chat_id: message.chat_id,
            sender_id: message.sender_id,
            content: message.content,
            message_type: message.message_type,
            is_read: false,
            created_at: now,
        };
        tables.messages.push(created.clone());

        // No subscribers is fine
        let _ = self.events.send(created.clone());
        Ok(created)
    }

    async fn mark_messages_read(&self, chat_id: &str, reader_id: &str) -> Result<()> {
        let mut tables = self.tables.write().await;
        for message in tables
            .messages
            .iter_mut()
            .filter(|m| m.chat_id == chat_id && m.sender_id != reader_id)
        {
            message.is_read = true;
        }
        Ok(())
    }

    async fn subscribe_messages(&self, chat_id: &str) -> Result<MessageFeed> {
        Ok(MessageFeed::from_broadcast(
            self.events.subscribe(),
            chat_id.to_string(),
        ))
    }
}

fn weekday_hours() -> crate::models::OpeningHours {
    let mut hours = crate::models::OpeningHours::new();
    for day in ["monday", "tuesday", "wednesday", "thursday", "friday"] {
        hours.insert(
            day.to_string(),
            Some(DayHours {
                open: "09:00".to_string(),
                close: "19:00".to_string(),
            }),
        );
    }
    hours.insert(
        "saturday".to_string(),
        Some(DayHours {
            open: "10:00".to_string(),
            close: "16:00".to_string(),
        }),
    );
    hours.insert("sunday".to_string(), None);
    hours
}

fn slot(establishment: &str, n: u32, date: NaiveDate, time: &str, available: bool) -> TimeSlot {
    TimeSlot {
        id: format!("{establishment}-slot-{n}"),
        time: time.to_string(),
        available,
        date,
    }
}

/// Sample directory used when no real backend is configured
fn sample_directory() -> (Vec<Establishment>, Vec<Employee>) {
    let today = Utc::now().date_naive();

    let establishments = vec![
        Establishment {
            id: "est-aurora".to_string(),
            name: "Aurora Beauty Studio".to_string(),
            kind: EstablishmentKind::Cosmetologist,
            address: "Khreshchatyk St 12, Kyiv".to_string(),
            latitude: 50.4474,
            longitude: 30.5229,
            rating: 4.8,
            review_count: 214,
            price_range: PriceRange::Premium,
            image_url: "https://images.example.com/aurora.jpg".to_string(),
            phone: "+380441234567".to_string(),
            services: vec![
                Service {
                    id: "svc-aurora-1".to_string(),
                    name: "Classic facial".to_string(),
                    duration: 60,
                    price: 1200.0,
                    description: Some("Cleansing and hydration".to_string()),
                    establishment_id: Some("est-aurora".to_string()),
                    is_active: Some(true),
                },
                Service {
                    id: "svc-aurora-2".to_string(),
                    name: "Brow shaping".to_string(),
                    duration: 30,
                    price: 450.0,
                    description: None,
                    establishment_id: Some("est-aurora".to_string()),
                    is_active: Some(true),
                },
            ],
            available_slots: vec![
                slot("est-aurora", 1, today, "10:00", true),
                slot("est-aurora", 2, today, "11:30", true),
                slot("est-aurora", 3, today, "14:00", false),
                slot("est-aurora", 4, today, "16:00", true),
            ],
            opening_hours: weekday_hours(),
            distance_km: Some(5.2),
            is_favorite: None,
            owner_id: Some("user-owner-1".to_string()),
            description: Some("Skin care and cosmetology in the city center".to_string()),
            employees: None,
        },
        Establishment {
            id: "est-sharp".to_string(),
            name: "Sharp Cut Barbershop".to_string(),
            kind: EstablishmentKind::Barbershop,
            address: "Sichovykh Striltsiv 8, Kyiv".to_string(),
            latitude: 50.4547,
            longitude: 30.5038,
            rating: 4.6,
            review_count: 98,
            price_range: PriceRange::Moderate,
            image_url: "https://images.example.com/sharp.jpg".to_string(),
            phone: "+380442345678".to_string(),
            services: vec![Service {
                id: "svc-sharp-1".to_string(),
                name: "Haircut and beard trim".to_string(),
                duration: 45,
                price: 600.0,
                description: None,
                establishment_id: Some("est-sharp".to_string()),
                is_active: Some(true),
            }],
            available_slots: vec![
                slot("est-sharp", 1, today, "09:00", true),
                slot("est-sharp", 2, today, "12:00", false),
            ],
            opening_hours: weekday_hours(),
            distance_km: Some(1.1),
            is_favorite: None,
            owner_id: Some("user-owner-2".to_string()),
            description: None,
            employees: None,
        },
        Establishment {
            id: "est-velvet".to_string(),
            name: "Velvet Nails".to_string(),
            kind: EstablishmentKind::NailSalon,
            address: "Lesi Ukrainky Blvd 24, Kyiv".to_string(),
            latitude: 50.4215,
            longitude: 30.5367,
            rating: 4.6,
            review_count: 156,
            price_range: PriceRange::Budget,
            image_url: "https://images.example.com/velvet.jpg".to_string(),
            phone: "+380443456789".to_string(),
            services: vec![Service {
                id: "svc-velvet-1".to_string(),
                name: "Gel manicure".to_string(),
                duration: 90,
                price: 550.0,
                description: None,
                establishment_id: Some("est-velvet".to_string()),
                is_active: Some(true),
            }],
            available_slots: vec![
                slot("est-velvet", 1, today, "10:00", true),
                slot("est-velvet", 2, today, "13:00", true),
                slot("est-velvet", 3, today, "15:30", true),
                slot("est-velvet", 4, today, "17:00", true),
            ],
            opening_hours: weekday_hours(),
            distance_km: Some(3.0),
            is_favorite: None,
            owner_id: None,
            description: None,
            employees: None,
        },
    ];

    let now = Utc::now();
    let employees = vec![
        Employee {
            id: "emp-daria".to_string(),
            establishment_id: "est-aurora".to_string(),
            name: "Daria Melnyk".to_string(),
            role: "Cosmetologist".to_string(),
            photo_url: None,
            phone: Some("+380671111111".to_string()),
            email: None,
            bio: Some("8 years of skin care practice".to_string()),
            is_active: true,
            created_at: Some(now),
            updated_at: Some(now),
        },
        Employee {
            id: "emp-taras".to_string(),
            establishment_id: "est-sharp".to_string(),
            name: "Taras Bondar".to_string(),
            role: "Barber".to_string(),
            photo_url: None,
            phone: None,
            email: None,
            bio: None,
            is_active: true,
            created_at: Some(now),
            updated_at: Some(now),
        },
    ];

    (establishments, employees)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageType;

    fn new_booking(date: NaiveDate, time: &str) -> NewBooking {
        NewBooking {
            user_id: "user-1".to_string(),
            establishment_id: "est-sharp".to_string(),
            employee_id: Some("emp-taras".to_string()),
            service_id: "svc-sharp-1".to_string(),
            booking_date: date,
            booking_time: time.to_string(),
            duration: 45,
            notes: None,
            total_price: Some(600.0),
        }
    }

    #[tokio::test]
    async fn booking_is_created_pending_and_taken_slots_are_rejected() {
        let gateway = MockGateway::seeded();
        let date = NaiveDate::from_ymd_opt(2025, 7, 10).unwrap();

        let booking = gateway.create_booking(new_booking(date, "09:00")).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);

        // Same slot again: the backend-side rejection the client must expect
        let err = gateway.create_booking(new_booking(date, "09:00")).await;
        assert!(err.is_err());

        let day = gateway.fetch_bookings("est-sharp", date).await.unwrap();
        assert_eq!(day.len(), 1);
    }

    #[tokio::test]
    async fn find_or_create_chat_reuses_the_triple() {
        let gateway = MockGateway::seeded();

        let first = gateway
            .find_or_create_chat("user-1", "est-sharp", "emp-taras")
            .await
            .unwrap();
        let second = gateway
            .find_or_create_chat("user-1", "est-sharp", "emp-taras")
            .await
            .unwrap();
        assert_eq!(first.id, second.id);

        // A different employee is a different conversation
        let other = gateway
            .find_or_create_chat("user-1", "est-aurora", "emp-daria")
            .await
            .unwrap();
        assert_ne!(first.id, other.id);
    }

    #[tokio::test]
    async fn messages_come_back_oldest_first_and_bump_the_chat() {
        let gateway = MockGateway::seeded();
        let chat = gateway
            .find_or_create_chat("user-1", "est-sharp", "emp-taras")
            .await
            .unwrap();

        for content in ["hi", "is 9:00 free?", "great"] {
            gateway
                .send_message(NewMessage {
                    chat_id: chat.id.clone(),
                    sender_id: "user-1".to_string(),
                    content: content.to_string(),
                    message_type: MessageType::Text,
                })
                .await
                .unwrap();
        }

        let messages = gateway.fetch_messages(&chat.id).await.unwrap();
        let contents: Vec<_> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["hi", "is 9:00 free?", "great"]);

        let chats = gateway.fetch_chats("user-1").await.unwrap();
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0].last_message.as_ref().unwrap().content, "great");
        assert!(chats[0].last_message_at >= chat.last_message_at);
    }

    #[tokio::test]
    async fn chat_list_orders_by_latest_activity() {
        let gateway = MockGateway::seeded();
        let older = gateway
            .find_or_create_chat("user-1", "est-aurora", "emp-daria")
            .await
            .unwrap();
        let newer = gateway
            .find_or_create_chat("user-1", "est-sharp", "emp-taras")
            .await
            .unwrap();

        gateway
            .send_message(NewMessage {
                chat_id: newer.id.clone(),
                sender_id: "user-1".to_string(),
                content: "ping".to_string(),
                message_type: MessageType::Text,
            })
            .await
            .unwrap();

        let chats = gateway.fetch_chats("user-1").await.unwrap();
        assert_eq!(chats[0].id, newer.id);
        assert_eq!(chats[1].id, older.id);
    }

    #[tokio::test]
    async fn mark_read_skips_the_readers_own_messages() {
        let gateway = MockGateway::seeded();
        let chat = gateway
            .find_or_create_chat("user-1", "est-sharp", "emp-taras")
            .await
            .unwrap();

        gateway
            .send_message(NewMessage {
                chat_id: chat.id.clone(),
                sender_id: "emp-taras".to_string(),
                content: "hello".to_string(),
                message_type: MessageType::Text,
            })
            .await
            .unwrap();
        gateway
            .send_message(NewMessage {
                chat_id: chat.id.clone(),
                sender_id: "user-1".to_string(),
                content: "hi".to_string(),
                message_type: MessageType::Text,
            })
            .await
            .unwrap();

        gateway.mark_messages_read(&chat.id, "user-1").await.unwrap();

        let messages = gateway.fetch_messages(&chat.id).await.unwrap();
        let from_employee = messages.iter().find(|m| m.sender_id == "emp-taras").unwrap();
        let from_user = messages.iter().find(|m| m.sender_id == "user-1").unwrap();
        assert!(from_employee.is_read);
        assert!(!from_user.is_read);
    }

    #[tokio::test]
    async fn live_feed_only_sees_its_own_chat() {
        let gateway = MockGateway::seeded();
        let mine = gateway
            .find_or_create_chat("user-1", "est-sharp", "emp-taras")
            .await
            .unwrap();
        let other = gateway
            .find_or_create_chat("user-1", "est-aurora", "emp-daria")
            .await
            .unwrap();

        let mut feed = gateway.subscribe_messages(&mine.id).await.unwrap();

        gateway
            .send_message(NewMessage {
                chat_id: other.id.clone(),
                sender_id: "user-1".to_string(),
                content: "elsewhere".to_string(),
                message_type: MessageType::Text,
            })
            .await
            .unwrap();
        gateway
            .send_message(NewMessage {
                chat_id: mine.id.clone(),
                sender_id: "emp-taras".to_string(),
                content: "for you".to_string(),
                message_type: MessageType::Text,
            })
            .await
            .unwrap();

        let delivered = feed.recv().await.unwrap();
        assert_eq!(delivered.chat_id, mine.id);
        assert_eq!(delivered.content, "for you");

        feed.unsubscribe();
    }

    #[tokio::test]
    async fn deactivated_employee_disappears_from_fetch_but_keeps_the_row() {
        let gateway = MockGateway::seeded();

        let before = gateway.fetch_employees("est-sharp").await.unwrap();
        assert_eq!(before.len(), 1);

        gateway.deactivate_employee("emp-taras").await.unwrap();

        let after = gateway.fetch_employees("est-sharp").await.unwrap();
        assert!(after.is_empty());

        // The row itself survives for history; messages from the employee
        // still resolve through existing chats
        let tables = gateway.tables.read().await;
        assert!(tables.employees.iter().any(|e| e.id == "emp-taras"));
    }

    #[tokio::test]
    async fn created_establishment_starts_unrated() {
        let gateway = MockGateway::seeded();
        let created = gateway
            .create_establishment(NewEstablishment {
                name: "New Spa".to_string(),
                kind: EstablishmentKind::Spa,
                address: "Somewhere 1".to_string(),
                latitude: 50.0,
                longitude: 30.0,
                price_range: PriceRange::Luxury,
                image_url: String::new(),
                phone: String::new(),
                owner_id: "user-owner-3".to_string(),
                description: None,
                services: vec![],
                opening_hours: weekday_hours(),
            })
            .await
            .unwrap();

        assert_eq!(created.rating, 0.0);
        assert_eq!(created.review_count, 0);

        let all = gateway.fetch_establishments().await.unwrap();
        assert!(all.iter().any(|e| e.id == created.id));
    }
}
