use crate::adapters::push::PushGateway;
use crate::domain::notification::{
    DEVICE_NOT_REGISTERED, DeliveryTicket, DispatchResult, NotificationRequest, TicketStatus, build_message,
};
use crate::domain::token::is_valid_token;
use opentelemetry::{global, metrics::Counter};
use serde_json::Value;
use std::sync::Arc;

#[derive(Clone, Debug)]
struct Metrics {
    sent: Counter<u64>,
    errors: Counter<u64>,
    invalid_tokens: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("steeple-push");
        Self {
            sent: meter
                .u64_counter("push_sent_total")
                .with_description("Total number of push notifications successfully sent")
                .build(),
            errors: meter
                .u64_counter("push_errors_total")
                .with_description("Total number of push notification delivery errors")
                .build(),
            invalid_tokens: meter
                .u64_counter("push_invalid_tokens_total")
                .with_description("Total number of tokens the gateway reported as unregistered")
                .build(),
        }
    }
}

/// Fans one notification out to many device tokens in gateway-sized batches
/// and aggregates the per-message delivery tickets.
#[derive(Debug)]
pub struct NotificationDispatcher {
    gateway: Arc<dyn PushGateway>,
    batch_size: usize,
    metrics: Metrics,
}

impl NotificationDispatcher {
    #[must_use]
    pub fn new(gateway: Arc<dyn PushGateway>, batch_size: usize) -> Self {
        Self { gateway, batch_size: batch_size.max(1), metrics: Metrics::new() }
    }

    /// Dispatches `request` to every valid token in `tokens`.
    ///
    /// Batches are submitted sequentially so ticket order stays aligned
    /// with the valid-token order across batch boundaries; the cleanup pass
    /// depends on that alignment to map failures back to source tokens.
    /// A transport fault on one batch degrades that batch to synthetic
    /// error tickets and the remaining batches still go out.
    #[tracing::instrument(level = "debug", skip(self, tokens, request), fields(tokens = tokens.len()))]
    pub async fn dispatch(&self, tokens: &[String], request: &NotificationRequest) -> DispatchResult {
        if request.title.trim().is_empty() || request.body.trim().is_empty() {
            return DispatchResult::rejected("Notification title and body are required");
        }

        let valid: Vec<&String> = tokens.iter().filter(|token| is_valid_token(token)).collect();
        let dropped = tokens.len() - valid.len();
        if dropped > 0 {
            tracing::debug!(dropped, "Dropped invalid push tokens before batching");
        }
        if valid.is_empty() {
            return DispatchResult::rejected("No valid push tokens provided");
        }

        let messages: Vec<Value> = valid.iter().map(|token| build_message(token, request)).collect();

        let mut tickets: Vec<DeliveryTicket> = Vec::with_capacity(messages.len());
        for batch in messages.chunks(self.batch_size) {
            match self.gateway.submit(batch).await {
                Ok(mut batch_tickets) => {
                    if batch_tickets.len() != batch.len() {
                        tracing::warn!(
                            expected = batch.len(),
                            received = batch_tickets.len(),
                            "Gateway returned a misaligned ticket batch"
                        );
                        batch_tickets.truncate(batch.len());
                        batch_tickets.resize_with(batch.len(), || {
                            DeliveryTicket::transport_error("Ticket missing from gateway response")
                        });
                    }
                    tickets.append(&mut batch_tickets);
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        batch_size = batch.len(),
                        "Batch submission failed, continuing with remaining batches"
                    );
                    let message = e.to_string();
                    tickets.extend(std::iter::repeat_with(|| DeliveryTicket::transport_error(&message)).take(batch.len()));
                }
            }
        }

        let sent = tickets.iter().filter(|ticket| ticket.is_ok()).count();
        let errors = tickets.len() - sent;

        // Ticket k belongs to valid token k; only the unregistered kind
        // marks a token for deletion.
        let invalid_tokens: Vec<String> = valid
            .iter()
            .zip(&tickets)
            .filter(|(_, ticket)| {
                ticket.status == TicketStatus::Error && ticket.error_kind() == Some(DEVICE_NOT_REGISTERED)
            })
            .map(|(token, _)| (*token).clone())
            .collect();

        self.metrics.sent.add(sent as u64, &[]);
        self.metrics.errors.add(errors as u64, &[]);
        self.metrics.invalid_tokens.add(invalid_tokens.len() as u64, &[]);

        DispatchResult {
            success: sent > 0,
            error: (sent == 0).then(|| "All notification deliveries failed".to_owned()),
            sent,
            errors,
            invalid_tokens,
            tickets,
        }
    }
}
