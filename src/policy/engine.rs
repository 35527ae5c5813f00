use super::inspector::{self, Exemption};
use crate::chat::{ChatService, Session};
use crate::config::ArchiveConfig;
use anyhow::Context;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Outcome of evaluating one conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Archived,
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyArchived,
    Pinned,
    Unread,
    NoPendingOutgoing,
    ReplyReceived,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyArchived => write!(f, "already archived"),
            Self::Pinned => write!(f, "pinned"),
            Self::Unread => write!(f, "has unread messages"),
            Self::NoPendingOutgoing => write!(f, "no pending outgoing message"),
            Self::ReplyReceived => write!(f, "reply received"),
        }
    }
}

/// Per-conversation archival decisions.
///
/// Direct conversations are only archived through the event-driven path:
/// an entry in the session ledger (the bot sent the most recent tracked
/// message) and no newer reply among the recent messages. Groups need no
/// reply detection; the unread check already covers them.
pub struct ArchivePolicy {
    service: Arc<dyn ChatService>,
    session: Arc<Session>,
    recent_limit: usize,
    check_delay: Duration,
}

impl ArchivePolicy {
    pub fn new(service: Arc<dyn ChatService>, session: Arc<Session>, cfg: &ArchiveConfig) -> Self {
        Self {
            service,
            session,
            recent_limit: cfg.recent_messages,
            check_delay: Duration::from_secs(cfg.check_delay_secs),
        }
    }

    /// Decide archive-or-skip for one conversation, re-reading its live
    /// state first. An error aborts only this evaluation.
    pub async fn evaluate(&self, chat_id: &str) -> anyhow::Result<Verdict> {
        let chat = self
            .service
            .chat_by_id(chat_id)
            .await
            .context("refresh conversation")?;

        if chat.archived {
            tracing::debug!("\"{}\" is already archived", chat.name);
            return Ok(Verdict::Skipped(SkipReason::AlreadyArchived));
        }

        if let Some(exemption) = inspector::exemption(self.service.as_ref(), &chat).await {
            tracing::info!("\"{}\" will not be archived: {exemption}", chat.name);
            return Ok(Verdict::Skipped(match exemption {
                Exemption::Unread => SkipReason::Unread,
                Exemption::PinnedLocally | Exemption::PinnedInHome => SkipReason::Pinned,
            }));
        }

        // Groups are archived outright; unread was already ruled out above.
        if chat.is_group {
            self.service
                .archive(&chat.id)
                .await
                .context("archive group")?;
            tracing::info!("group \"{}\" archived", chat.name);
            return Ok(Verdict::Archived);
        }

        let Some(sent_at) = self.session.last_outgoing(&chat.id) else {
            tracing::debug!("\"{}\" skipped: no pending outgoing message", chat.name);
            return Ok(Verdict::Skipped(SkipReason::NoPendingOutgoing));
        };

        let messages = self
            .service
            .recent_messages(&chat.id, self.recent_limit)
            .await
            .context("fetch recent messages")?;

        if messages
            .iter()
            .any(|m| !m.from_me && m.timestamp > sent_at)
        {
            tracing::info!("\"{}\" has received a reply, leaving it in place", chat.name);
            return Ok(Verdict::Skipped(SkipReason::ReplyReceived));
        }

        self.service
            .archive(&chat.id)
            .await
            .context("archive conversation")?;
        tracing::info!("\"{}\" archived", chat.name);
        Ok(Verdict::Archived)
    }

    /// Arm a delayed check for one conversation. Checks are deliberately
    /// independent and never coalesced; each one re-reads live state when
    /// it fires, so a stale timer can only ever skip.
    pub fn schedule_check(self: &Arc<Self>, chat_id: String) -> tokio::task::JoinHandle<()> {
        let policy = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(policy.check_delay).await;
            if let Err(e) = policy.evaluate(&chat_id).await {
                tracing::warn!("archival check for {chat_id} failed: {e:#}");
            }
        })
    }
}
