use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::Client;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::gateway::realtime::MessageFeed;
use crate::gateway::traits::DirectoryGateway;
use crate::models::{
    Booking, Chat, Employee, Establishment, Message, NewBooking, NewEstablishment, NewMessage,
};

const POLL_INTERVAL: Duration = Duration::from_secs(3);

/// REST implementation of the directory gateway
pub struct RestGateway {
    client: Client,
    base_url: String,
}

impl RestGateway {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("salon-scout/0.1")
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        debug!("GET {url}");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {url}"))?;

        if !response.status().is_success() {
            anyhow::bail!("GET {url} returned {}", response.status());
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to decode response from {url}"))
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T> {
        let url = self.url(path);
        debug!("POST {url}");
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to post to {url}"))?;

        if !response.status().is_success() {
            anyhow::bail!("POST {url} returned {}", response.status());
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to decode response from {url}"))
    }

    async fn post_empty(&self, path: &str, body: &serde_json::Value) -> Result<()> {
        let url = self.url(path);
        debug!("POST {url}");
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to post to {url}"))?;

        if !response.status().is_success() {
            anyhow::bail!("POST {url} returned {}", response.status());
        }
        Ok(())
    }
}

#[async_trait]
impl DirectoryGateway for RestGateway {
    async fn fetch_establishments(&self) -> Result<Vec<Establishment>> {
        self.get_json("/establishments").await
    }

    async fn fetch_bookings(
        &self,
        establishment_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Booking>> {
        self.get_json(&format!(
            "/establishments/{establishment_id}/bookings?date={date}"
        ))
        .await
    }

    async fn create_booking(&self, booking: NewBooking) -> Result<Booking> {
        self.post_json("/bookings", &serde_json::to_value(&booking)?)
            .await
    }

    async fn create_establishment(
        &self,
        establishment: NewEstablishment,
    ) -> Result<Establishment> {
        self.post_json("/establishments", &serde_json::to_value(&establishment)?)
            .await
    }

    async fn fetch_employees(&self, establishment_id: &str) -> Result<Vec<Employee>> {
        self.get_json(&format!(
            "/establishments/{establishment_id}/employees?active=true"
        ))
        .await
    }

    async fn deactivate_employee(&self, employee_id: &str) -> Result<()> {
        self.post_empty(
            &format!("/employees/{employee_id}/deactivate"),
            &json!({}),
        )
        .await
    }

    async fn fetch_chats(&self, user_id: &str) -> Result<Vec<Chat>> {
        self.get_json(&format!("/users/{user_id}/chats")).await
    }

    async fn find_or_create_chat(
        &self,
        user_id: &str,
        establishment_id: &str,
        employee_id: &str,
    ) -> Result<Chat> {
        self.post_json(
            "/chats/find-or-create",
            &json!({
                "user_id": user_id,
                "establishment_id": establishment_id,
                "employee_id": employee_id,
            }),
        )
        .await
    }

    async fn fetch_messages(&self, chat_id: &str) -> Result<Vec<Message>> {
        self.get_json(&format!("/chats/{chat_id}/messages")).await
    }

    async fn send_message(&self, message: NewMessage) -> Result<Message> {
        self.post_json("/messages", &serde_json::to_value(&message)?)
            .await
    }

    async fn mark_messages_read(&self, chat_id: &str, reader_id: &str) -> Result<()> {
        self.post_empty(
            &format!("/chats/{chat_id}/read"),
            &json!({ "reader_id": reader_id }),
        )
        .await
    }

    /// Near-realtime over plain REST: poll for messages newer than a cursor
    /// and forward them into the feed. Polling errors are logged and retried
    /// on the next tick, never surfaced to the consumer.
    async fn subscribe_messages(&self, chat_id: &str) -> Result<MessageFeed> {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = self.client.clone();
        let url = self.url(&format!("/chats/{chat_id}/messages"));
        let chat_id = chat_id.to_string();

        let forwarder = tokio::spawn(async move {
            let mut cursor = Utc::now();
            let mut ticker = tokio::time::interval(POLL_INTERVAL);
            loop {
                ticker.tick().await;
                let request = client
                    .get(&url)
                    .query(&[("after", cursor.to_rfc3339())])
                    .send()
                    .await;
                let batch: Vec<Message> = match request {
                    Ok(response) if response.status().is_success() => {
                        match response.json().await {
                            Ok(batch) => batch,
                            Err(err) => {
                                warn!("Bad message payload for chat {chat_id}: {err:#}");
                                continue;
                            }
                        }
                    }
                    Ok(response) => {
                        warn!("Message poll for chat {chat_id} returned {}", response.status());
                        continue;
                    }
                    Err(err) => {
                        warn!("Message poll for chat {chat_id} failed: {err:#}");
                        continue;
                    }
                };

                for message in batch {
                    if message.created_at > cursor {
                        cursor = message.created_at;
                    }
                    if tx.send(message).is_err() {
                        return;
                    }
                }
            }
        });

        Ok(MessageFeed::new(rx, forwarder))
    }
}
