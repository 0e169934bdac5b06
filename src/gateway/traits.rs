use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::gateway::realtime::MessageFeed;
use crate::models::{
    Booking, Chat, Employee, Establishment, Message, NewBooking, NewEstablishment, NewMessage,
};

/// Remote directory backend: establishments, bookings, staff and chat.
///
/// The client treats this as an opaque row source; in particular a slot
/// availability check is advisory, and `create_booking` may still reject a
/// slot that looked free a moment earlier.
#[async_trait]
pub trait DirectoryGateway: Send + Sync {
    async fn fetch_establishments(&self) -> Result<Vec<Establishment>>;

    /// Non-cancelled bookings for one establishment on one day, the data a
    /// booking screen uses to grey out taken slots
    async fn fetch_bookings(
        &self,
        establishment_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Booking>>;

    /// Request a booking. The backend owns slot correctness; a taken slot
    /// surfaces as an error here.
    async fn create_booking(&self, booking: NewBooking) -> Result<Booking>;

    async fn create_establishment(&self, establishment: NewEstablishment)
        -> Result<Establishment>;

    /// Active employees only; deactivated rows are retained server-side but
    /// never served
    async fn fetch_employees(&self, establishment_id: &str) -> Result<Vec<Employee>>;

    /// Soft delete: flips `is_active` off, keeps the row
    async fn deactivate_employee(&self, employee_id: &str) -> Result<()>;

    /// Chats for a user, newest activity first, each carrying a last-message
    /// preview
    async fn fetch_chats(&self, user_id: &str) -> Result<Vec<Chat>>;

    /// Look the (user, establishment, employee) triple up before inserting,
    /// so repeated opens of the same conversation reuse one chat
    async fn find_or_create_chat(
        &self,
        user_id: &str,
        establishment_id: &str,
        employee_id: &str,
    ) -> Result<Chat>;

    /// Full history for a chat, oldest first
    async fn fetch_messages(&self, chat_id: &str) -> Result<Vec<Message>>;

    /// Insert a message and bump the chat's `last_message_at`
    async fn send_message(&self, message: NewMessage) -> Result<Message>;

    /// Mark everything not sent by `reader_id` as read
    async fn mark_messages_read(&self, chat_id: &str, reader_id: &str) -> Result<()>;

    /// Live delivery of new messages in a chat; drop the feed to unsubscribe
    async fn subscribe_messages(&self, chat_id: &str) -> Result<MessageFeed>;
}
