//! Payment confirmation emails.
//!
//! The notifier is installed as the engine's order-settled hook, so it runs once for every order that was paid for
//! and had stock taken. Delivery is best effort: failures are logged and never retried, and never affect the order.
//!
//! Mail goes out through an HTTP relay that accepts a JSON message (most transactional mail providers offer one). If
//! no relay is configured the message is written to the log instead.
use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
};
use serde::{Deserialize, Serialize};
use shop_payment_engine::events::{EventHooks, OrderSettledEvent};
use thiserror::Error;

use crate::config::MailConfig;

#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("Could not initialize mail client: {0}")]
    Initialization(String),
    #[error("Could not deliver email: {0}")]
    DeliveryError(String),
    #[error("Mail relay rejected the message. Error {status}. {message}")]
    Rejected { status: u16, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

impl EmailMessage {
    pub fn payment_confirmation(mail: &MailConfig, event: &OrderSettledEvent) -> Self {
        let order_id = event.order_id;
        let amount = event.amount.value();
        let subject = format!("Order confirmation: your order #{order_id} has been paid");
        let html = format!(
            "<html>\n  <body>\n    <h2>Thank you for your purchase!</h2>\n    <p>Your order <strong>#{order_id}</strong> \
             has been processed.</p>\n    <p>Amount paid: <strong>{amount} TWD</strong></p>\n  </body>\n</html>\n"
        );
        Self { from: mail.from.clone(), to: mail.to.clone(), subject, html }
    }
}

#[derive(Clone)]
pub struct EmailNotifier {
    config: MailConfig,
    relay_url: String,
    client: Arc<Client>,
}

impl EmailNotifier {
    pub fn new(config: MailConfig, relay_url: String) -> Result<Self, NotifierError> {
        let mut headers = HeaderMap::with_capacity(1);
        if !config.api_key.reveal().is_empty() {
            let val = HeaderValue::from_str(&format!("Bearer {}", config.api_key.reveal()))
                .map_err(|e| NotifierError::Initialization(e.to_string()))?;
            headers.insert(AUTHORIZATION, val);
        }
        let client =
            Client::builder().default_headers(headers).build().map_err(|e| NotifierError::Initialization(e.to_string()))?;
        Ok(Self { config, relay_url, client: Arc::new(client) })
    }

    pub async fn send_payment_confirmation(&self, event: &OrderSettledEvent) -> Result<(), NotifierError> {
        let message = EmailMessage::payment_confirmation(&self.config, event);
        trace!("✉️ Sending payment confirmation for order #{} to {}", event.order_id, self.relay_url);
        let response = self
            .client
            .post(&self.relay_url)
            .json(&message)
            .send()
            .await
            .map_err(|e| NotifierError::DeliveryError(e.to_string()))?;
        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| NotifierError::DeliveryError(e.to_string()))?;
            Err(NotifierError::Rejected { status, message })
        }
    }
}

/// Registers the payment confirmation email as the order-settled hook.
pub fn install_notifier(hooks: &mut EventHooks, mail: &MailConfig) -> Result<(), NotifierError> {
    match &mail.relay_url {
        Some(url) => {
            let notifier = EmailNotifier::new(mail.clone(), url.clone())?;
            info!("✉️ Payment confirmations will be sent via {url}");
            hooks.on_order_settled(move |ev| {
                let notifier = notifier.clone();
                Box::pin(async move {
                    match notifier.send_payment_confirmation(&ev).await {
                        Ok(()) => info!("✉️ Payment confirmation sent for order #{}", ev.order_id),
                        Err(e) => error!("✉️ Could not send payment confirmation for order #{}. {e}", ev.order_id),
                    }
                }) as Pin<Box<dyn Future<Output = ()> + Send>>
            });
        },
        None => {
            let mail = mail.clone();
            hooks.on_order_settled(move |ev| {
                let message = EmailMessage::payment_confirmation(&mail, &ev);
                Box::pin(async move {
                    info!("✉️ [not sent] To: {} Subject: {}", message.to, message.subject);
                    debug!("✉️ [not sent] {}", message.html);
                }) as Pin<Box<dyn Future<Output = ()> + Send>>
            });
        },
    }
    Ok(())
}
