use crate::chat::{ChatEvent, ChatService, Session};
use crate::config::ReliabilityConfig;
use crate::policy::ArchivePolicy;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Single dispatch point for chat-service events.
///
/// Lifecycle events feed the session flags and the pairing timer; self-sent
/// messages feed the ledger and arm the delayed archival check.
pub struct EventPump {
    service: Arc<dyn ChatService>,
    session: Arc<Session>,
    policy: Arc<ArchivePolicy>,
    pairing_timeout: Duration,
    pairing_timer: Mutex<Option<JoinHandle<()>>>,
}

impl EventPump {
    pub fn new(
        service: Arc<dyn ChatService>,
        session: Arc<Session>,
        policy: Arc<ArchivePolicy>,
        cfg: &ReliabilityConfig,
    ) -> Self {
        Self {
            service,
            session,
            policy,
            pairing_timeout: Duration::from_secs(cfg.pairing_timeout_secs),
            pairing_timer: Mutex::new(None),
        }
    }

    /// Subscribe to the service's event stream and dispatch until it ends.
    pub async fn run(self: Arc<Self>) {
        let (tx, mut rx) = mpsc::channel(64);
        let service = Arc::clone(&self.service);
        let listener = tokio::spawn(async move {
            if let Err(e) = service.listen(tx).await {
                tracing::warn!("event stream ended: {e:#}");
            }
        });

        while let Some(event) = rx.recv().await {
            self.handle(event);
        }
        let _ = listener.await;
    }

    pub fn handle(&self, event: ChatEvent) {
        match event {
            ChatEvent::PairingCode { code } => {
                println!("  › pairing code: {code}");
                tracing::info!("pairing code issued, waiting for it to be entered");
                self.arm_pairing_timer();
            }
            ChatEvent::Authenticated => {
                tracing::info!("authentication successful");
                self.session.set_paired(true);
                self.cancel_pairing_timer();
            }
            ChatEvent::Ready => {
                tracing::info!("chat client ready");
                self.session.set_connected(true);
                self.session.set_paired(true);
                self.cancel_pairing_timer();
            }
            ChatEvent::Disconnected { reason } => {
                tracing::info!("chat client disconnected: {reason}");
                self.session.set_connected(false);
                self.session.set_paired(false);
            }
            ChatEvent::MessageCreated {
                conversation_id,
                message,
            } => {
                if !message.from_me {
                    return;
                }
                tracing::debug!("outgoing message in {conversation_id}");
                self.session
                    .record_outgoing(&conversation_id, message.timestamp);
                self.policy.schedule_check(conversation_id);
            }
        }
    }

    /// A freshly issued code replaces any pending timer; if the code is
    /// still unconfirmed when the timer fires, the connection attempt is
    /// abandoned and left to the scheduler's retry path.
    fn arm_pairing_timer(&self) {
        let session = Arc::clone(&self.session);
        let service = Arc::clone(&self.service);
        let timeout = self.pairing_timeout;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if session.is_paired() {
                return;
            }
            tracing::warn!(
                "pairing code not entered within {}s, disconnecting",
                timeout.as_secs()
            );
            if let Err(e) = service.disconnect().await {
                tracing::warn!("disconnect after pairing timeout failed: {e:#}");
            }
            session.set_connected(false);
        });

        let mut slot = self.pairing_timer.lock().expect("pairing timer poisoned");
        if let Some(previous) = slot.replace(timer) {
            previous.abort();
        }
    }

    fn cancel_pairing_timer(&self) {
        let mut slot = self.pairing_timer.lock().expect("pairing timer poisoned");
        if let Some(timer) = slot.take() {
            timer.abort();
        }
    }
}
