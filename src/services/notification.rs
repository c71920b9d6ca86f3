//! Booking confirmation mail.
//!
//! Delivery is fire-and-forget. The booking service calls [`deliver`] from a
//! detached tokio task, so the request that committed the booking neither
//! waits for it nor cancels it when dropped.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::config::MailConfig;
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq)]
pub struct BookingConfirmation {
    pub recipient: String,
    pub name: String,
    pub movie_title: String,
    /// Already formatted for display.
    pub showtime: String,
    pub seats: Vec<String>,
}

impl BookingConfirmation {
    pub fn subject(&self) -> &'static str {
        "Your Movie Ticket is Confirmed!"
    }

    pub fn html(&self) -> String {
        format!(
            "<h2>Hi {name},</h2>\
             <p>Your ticket for <b>{title}</b> has been <b>confirmed</b>!</p>\
             <p><b>Showtime:</b> {showtime}</p>\
             <p><b>Seats:</b> {seats}</p>\
             <br/><p>Enjoy your movie!</p><hr/>\
             <small>This is an automated email. Please do not reply.</small>",
            name = self.name,
            title = self.movie_title,
            showtime = self.showtime,
            seats = self.seats.join(", "),
        )
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_booking_confirmation(&self, message: &BookingConfirmation) -> Result<(), AppError>;
}

/// Sends and logs the outcome. Never fails.
pub async fn deliver(notifier: &dyn Notifier, message: &BookingConfirmation) {
    match notifier.send_booking_confirmation(message).await {
        Ok(()) => info!("Booking confirmation sent to {}", message.recipient),
        Err(e) => error!(
            "Failed to send booking confirmation to {}: {}",
            message.recipient, e
        ),
    }
}

/// Posts mail to an HTTP mail service.
pub struct HttpNotifier {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    from: String,
}

#[derive(Serialize)]
struct MailPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: String,
}

impl HttpNotifier {
    pub fn new(api_url: String, api_key: Option<String>, from: String) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Internal(format!("mail client setup failed: {}", e)))?;
        Ok(Self { client, api_url, api_key, from })
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send_booking_confirmation(&self, message: &BookingConfirmation) -> Result<(), AppError> {
        let payload = MailPayload {
            from: &self.from,
            to: &message.recipient,
            subject: message.subject(),
            html: message.html(),
        };

        let mut request = self.client.post(&self.api_url).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let res = request.send().await.map_err(|e| {
            AppError::Internal(format!("mail service connection error: {}", e))
        })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(AppError::Internal(format!(
                "mail service failed. Status: {}, Body: {}",
                status, text
            )));
        }

        Ok(())
    }
}

/// Writes the mail to the log instead of sending it.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_booking_confirmation(&self, message: &BookingConfirmation) -> Result<(), AppError> {
        info!(
            recipient = %message.recipient,
            movie = %message.movie_title,
            showtime = %message.showtime,
            seats = %message.seats.join(","),
            "Booking confirmation (mail service not configured)"
        );
        Ok(())
    }
}

pub fn from_config(config: &MailConfig) -> Result<Arc<dyn Notifier>, AppError> {
    match &config.service_url {
        Some(url) => Ok(Arc::new(HttpNotifier::new(
            url.clone(),
            config.token.clone(),
            config.from.clone(),
        )?)),
        None => Ok(Arc::new(LogNotifier)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_lists_seats_and_title() {
        let message = BookingConfirmation {
            recipient: "a@example.com".into(),
            name: "Ada".into(),
            movie_title: "Alien".into(),
            showtime: "Friday, May 2, 2025 20:00 UTC".into(),
            seats: vec!["A1".into(), "A2".into()],
        };
        let html = message.html();
        assert!(html.contains("Hi Ada,"));
        assert!(html.contains("<b>Alien</b>"));
        assert!(html.contains("A1, A2"));
    }
}
