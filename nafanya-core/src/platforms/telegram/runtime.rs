//! src/platforms/telegram/runtime.rs
use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use nafanya_common::traits::telemetry_traits::ErrorReporter;
use crate::services::MessageService;
use crate::Error;

use super::client::TelegramClient;

/// Pause after a failed `getUpdates` before polling again.
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(3);

/// Long-polling loop. Every inbound message is handled on its own task.
pub struct TelegramRuntime {
    client: TelegramClient,
    bot_username: String,
    service: Arc<MessageService>,
    shutdown_rx: watch::Receiver<bool>,
}

impl TelegramRuntime {
    pub fn new(
        client: TelegramClient,
        bot_username: impl Into<String>,
        service: Arc<MessageService>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            client,
            bot_username: bot_username.into(),
            service,
            shutdown_rx,
        }
    }

    /// Runs until the shutdown signal flips. Returns the error if any
    /// handler hit an unrecoverable fault.
    pub async fn run(mut self) -> Result<(), Error> {
        let (fatal_tx, mut fatal_rx) = mpsc::unbounded_channel::<Error>();
        let mut offset: i64 = 0;

        info!("Telegram polling started as @{}", self.bot_username);

        loop {
            tokio::select! {
                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        info!("Telegram polling stopped.");
                        return Ok(());
                    }
                }
                Some(fatal) = fatal_rx.recv() => {
                    error!("Unrecoverable error in message handler: {}", fatal);
                    return Err(fatal);
                }
                polled = self.client.get_updates(offset) => {
                    match polled {
                        Ok(updates) => {
                            for update in updates {
                                offset = offset.max(update.update_id + 1);
                                let Some(message) = update.message else { continue };
                                let Some(inbound) = message.to_inbound(&self.bot_username) else {
                                    debug!("skipping update {} without a usable message", update.update_id);
                                    continue;
                                };

                                let service = self.service.clone();
                                let reporter = service.reporter();
                                tokio::spawn(supervise(
                                    async move { service.handle_message(inbound).await },
                                    reporter,
                                    fatal_tx.clone(),
                                ));
                            }
                        }
                        Err(e) => {
                            warn!("getUpdates failed: {}; retrying in {:?}", e, POLL_ERROR_BACKOFF);
                            tokio::time::sleep(POLL_ERROR_BACKOFF).await;
                        }
                    }
                }
            }
        }
    }
}

/// Runs one handler on its own task. A fatal error is forwarded to the
/// polling loop; a panic is logged and reported and the bot keeps going.
pub(crate) async fn supervise<F>(
    work: F,
    reporter: Arc<dyn ErrorReporter>,
    fatal_tx: mpsc::UnboundedSender<Error>,
) where
    F: Future<Output = Result<(), Error>> + Send + 'static,
{
    match tokio::spawn(work).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            let _ = fatal_tx.send(e);
        }
        Err(join_err) if join_err.is_panic() => {
            let e = Error::Internal(format!("message handler panicked: {}", panic_message(join_err.into_panic())));
            error!("{}", e);
            reporter.capture_error(&e);
        }
        Err(join_err) => warn!("message handler cancelled: {}", join_err),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fakes::RecordingReporter;

    async fn overflowing_handler() -> Result<(), Error> {
        panic!("DateTime + TimeDelta overflowed")
    }

    async fn broken_entropy_handler() -> Result<(), Error> {
        Err(Error::Entropy("getrandom".into()))
    }

    #[tokio::test]
    async fn panicking_handler_is_reported() {
        let reporter = Arc::new(RecordingReporter::default());
        let (tx, mut rx) = mpsc::unbounded_channel();

        supervise(overflowing_handler(), reporter.clone(), tx).await;

        let errors = reporter.errors.lock().clone();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("panicked: DateTime + TimeDelta overflowed"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn fatal_error_reaches_the_loop() {
        let reporter = Arc::new(RecordingReporter::default());
        let (tx, mut rx) = mpsc::unbounded_channel();

        supervise(broken_entropy_handler(), reporter.clone(), tx).await;

        assert!(matches!(rx.try_recv(), Ok(Error::Entropy(_))));
        assert!(reporter.errors.lock().is_empty());
    }
}
