use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use portfolio_contact_core::OutboundMessage;

use crate::error::SubmissionError;
use crate::http::SubmissionResponse;

/// Anything that can deliver a contact message to the site owner.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    fn name(&self) -> &'static str;

    async fn deliver(
        &self,
        message: OutboundMessage,
    ) -> Result<SubmissionResponse, SubmissionError>;
}

/// Allows one outstanding delivery at a time.
///
/// This is the programmatic counterpart of disabling the submit button
/// while a request is pending.
pub struct SubmissionGuard<T> {
    transport: T,
    in_flight: AtomicBool,
}

impl<T: MessageTransport> SubmissionGuard<T> {
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            in_flight: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn submit(
        &self,
        message: OutboundMessage,
    ) -> Result<SubmissionResponse, SubmissionError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!(transport = self.transport.name(), "submission already in flight");
            return Err(SubmissionError::InFlight);
        }
        let _release = InFlightRelease(&self.in_flight);
        self.transport.deliver(message).await
    }
}

/// Clears the in-flight flag even when the submit future is dropped.
struct InFlightRelease<'a>(&'a AtomicBool);

impl Drop for InFlightRelease<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    use tokio::sync::Notify;

    use super::*;
    use crate::http::ResponseBody;

    struct GatedTransport {
        release: Arc<Notify>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MessageTransport for GatedTransport {
        fn name(&self) -> &'static str {
            "gated"
        }

        async fn deliver(
            &self,
            _message: OutboundMessage,
        ) -> Result<SubmissionResponse, SubmissionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.release.notified().await;
            Ok(SubmissionResponse {
                status: 200,
                body: ResponseBody::Empty,
                attempts: 1,
            })
        }
    }

    fn message() -> OutboundMessage {
        OutboundMessage::new(
            "Ana Costa",
            "ana@example.pt",
            "Hello there",
            "one two three four five six seven eight nine ten eleven",
        )
    }

    #[tokio::test]
    async fn second_submit_is_rejected_while_first_is_pending() {
        let release = Arc::new(Notify::new());
        let guard = SubmissionGuard::new(GatedTransport {
            release: Arc::clone(&release),
            calls: AtomicUsize::new(0),
        });

        let first = guard.submit(message());
        let second = async {
            tokio::task::yield_now().await;
            assert!(guard.is_submitting());
            let result = guard.submit(message()).await;
            release.notify_one();
            result
        };
        let (first, second) = tokio::join!(first, second);

        assert!(first.is_ok());
        assert_eq!(second, Err(SubmissionError::InFlight));
        assert_eq!(guard.transport().calls.load(Ordering::SeqCst), 1);
        assert!(!guard.is_submitting());

        release.notify_one();
        assert!(guard.submit(message()).await.is_ok());
    }
}
