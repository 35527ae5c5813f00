use super::inspector;
use crate::chat::{ChatService, Conversation};
use anyhow::Context;
use std::time::Duration;

/// Tally of one bulk pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub archived: u32,
    pub skipped: u32,
}

/// Bulk-archive idle groups: every non-archived group that is neither
/// pinned nor unread. Direct conversations are never swept; without reply
/// detection that would not be safe, so they stay on the event-driven
/// path. Never propagates an error.
pub async fn sweep_groups(service: &dyn ChatService, pause: Duration) -> SweepReport {
    match sweep_inner(service, pause).await {
        Ok(report) => report,
        Err(e) => {
            tracing::warn!("group sweep aborted: {e:#}");
            SweepReport::default()
        }
    }
}

async fn sweep_inner(service: &dyn ChatService, pause: Duration) -> anyhow::Result<SweepReport> {
    let chats = service.list_chats().await.context("list conversations")?;
    let groups: Vec<Conversation> = chats
        .into_iter()
        .filter(|c| c.is_group && !c.archived)
        .collect();
    tracing::info!("found {} groups in the home list", groups.len());

    let mut report = SweepReport::default();
    for group in &groups {
        // Re-fetch so the decision is made on current state, not the
        // snapshot from the list call.
        let fresh = match service.chat_by_id(&group.id).await {
            Ok(chat) => chat,
            Err(e) => {
                tracing::warn!("could not refresh group \"{}\": {e:#}", group.name);
                report.skipped += 1;
                continue;
            }
        };

        if fresh.archived {
            report.skipped += 1;
            continue;
        }

        if let Some(exemption) = inspector::exemption(service, &fresh).await {
            tracing::info!("group \"{}\" skipped: {exemption}", fresh.name);
            report.skipped += 1;
            continue;
        }

        match service.archive(&fresh.id).await {
            Ok(()) => {
                tracing::info!("group \"{}\" archived", fresh.name);
                report.archived += 1;
            }
            Err(e) => {
                tracing::warn!("failed to archive group \"{}\": {e:#}", fresh.name);
                report.skipped += 1;
            }
        }

        // Pace archive calls so the service is not hammered.
        tokio::time::sleep(pause).await;
    }

    tracing::info!(
        "sweep done: archived {} of {} groups ({} skipped)",
        report.archived,
        groups.len(),
        report.skipped
    );
    Ok(report)
}
