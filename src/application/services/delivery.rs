//! Delivery fan-out
//!
//! Hands the deliveries produced by a posted message to the push channel.
//! Pushing is best-effort: by the time it runs the message is committed,
//! so nothing here can fail the write.

use uuid::Uuid;

use crate::application::dto::DeliveryView;

/// Result of handing one delivery to the push channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Queued on at least one live session of the recipient
    Pushed,
    /// The recipient has live sessions but all of their queues were full
    Dropped,
    /// The recipient has no live session
    Offline,
}

impl PushOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            PushOutcome::Pushed => "pushed",
            PushOutcome::Dropped => "dropped",
            PushOutcome::Offline => "offline",
        }
    }
}

/// Push channel towards connected clients.
#[cfg_attr(test, mockall::automock)]
pub trait DeliveryPublisher: Send + Sync {
    /// Queue a delivery for the recipient's live connections without waiting.
    fn publish(&self, recipient_id: Uuid, delivery: &DeliveryView) -> PushOutcome;
}

/// Publish every delivery and return how many reached a live session.
pub fn fan_out<P>(publisher: &P, deliveries: &[DeliveryView]) -> usize
where
    P: DeliveryPublisher + ?Sized,
{
    let mut pushed = 0;
    for delivery in deliveries {
        let outcome = publisher.publish(delivery.recipient_id, delivery);
        crate::infrastructure::metrics::record_delivery(outcome.as_str());

        match outcome {
            PushOutcome::Pushed => pushed += 1,
            PushOutcome::Dropped => {
                tracing::warn!(recipient_id = %delivery.recipient_id, message_id = %delivery.message.id, "Delivery dropped")
            }
            PushOutcome::Offline => {}
        }
    }
    pushed
}
