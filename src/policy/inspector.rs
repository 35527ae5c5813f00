use crate::chat::{ChatService, Conversation};
use std::fmt;

/// Why a conversation is off-limits for archival.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exemption {
    PinnedLocally,
    PinnedInHome,
    Unread,
}

impl fmt::Display for Exemption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PinnedLocally => write!(f, "pinned locally"),
            Self::PinnedInHome => write!(f, "pinned in the home list"),
            Self::Unread => write!(f, "has unread messages"),
        }
    }
}

/// Check whether a conversation may be archived at all. Pin checks come
/// before the unread check so skip logs name the stronger reason.
pub async fn exemption(service: &dyn ChatService, chat: &Conversation) -> Option<Exemption> {
    if chat.pinned {
        return Some(Exemption::PinnedLocally);
    }
    if pinned_in_home(service, &chat.id).await {
        return Some(Exemption::PinnedInHome);
    }
    if chat.unread_count > 0 {
        return Some(Exemption::Unread);
    }
    None
}

/// The service does not expose "is this chat pinned in the home list"
/// directly, so this is an O(n) scan over a fresh fetch of the unarchived
/// list. A failed fetch counts as pinned: when in doubt, do not archive.
async fn pinned_in_home(service: &dyn ChatService, id: &str) -> bool {
    match service.list_chats().await {
        Ok(chats) => chats.iter().any(|c| c.pinned && c.id == id),
        Err(e) => {
            tracing::warn!("pinned check failed for {id}: {e:#}");
            true
        }
    }
}
