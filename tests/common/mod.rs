#![allow(dead_code)]

use async_trait::async_trait;
use chatkeeper::chat::{ChatEvent, ChatService, Conversation, Message};
use chatkeeper::sched::Clock;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use tokio::sync::mpsc;

/// Scripted in-memory chat service: canned chats and messages, plus call
/// counters the assertions read back.
pub struct MockChat {
    pub chats: Mutex<Vec<Conversation>>,
    pub messages: Mutex<HashMap<String, Vec<Message>>>,
    pub archive_calls: Mutex<Vec<String>>,
    pub connect_calls: AtomicU32,
    pub disconnect_calls: AtomicU32,
    pub list_calls: AtomicU32,
    pub fail_listing: AtomicBool,
}

impl MockChat {
    pub fn new() -> Self {
        Self::with_chats(Vec::new())
    }

    pub fn with_chats(chats: Vec<Conversation>) -> Self {
        Self {
            chats: Mutex::new(chats),
            messages: Mutex::new(HashMap::new()),
            archive_calls: Mutex::new(Vec::new()),
            connect_calls: AtomicU32::new(0),
            disconnect_calls: AtomicU32::new(0),
            list_calls: AtomicU32::new(0),
            fail_listing: AtomicBool::new(false),
        }
    }

    pub fn set_messages(&self, chat_id: &str, messages: Vec<Message>) {
        self.messages
            .lock()
            .unwrap()
            .insert(chat_id.to_string(), messages);
    }

    pub fn archived(&self) -> Vec<String> {
        self.archive_calls.lock().unwrap().clone()
    }

    pub fn connects(&self) -> u32 {
        self.connect_calls.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> u32 {
        self.disconnect_calls.load(Ordering::SeqCst)
    }

    pub fn listings(&self) -> u32 {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatService for MockChat {
    async fn connect(&self) -> anyhow::Result<()> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> anyhow::Result<()> {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn list_chats(&self) -> anyhow::Result<Vec<Conversation>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing.load(Ordering::SeqCst) {
            anyhow::bail!("service unavailable");
        }
        Ok(self
            .chats
            .lock()
            .unwrap()
            .iter()
            .filter(|c| !c.archived)
            .cloned()
            .collect())
    }

    async fn chat_by_id(&self, id: &str) -> anyhow::Result<Conversation> {
        self.chats
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no such chat: {id}"))
    }

    async fn recent_messages(&self, id: &str, limit: usize) -> anyhow::Result<Vec<Message>> {
        let messages = self
            .messages
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .unwrap_or_default();
        Ok(messages.into_iter().take(limit).collect())
    }

    async fn archive(&self, id: &str) -> anyhow::Result<()> {
        self.archive_calls.lock().unwrap().push(id.to_string());
        let mut chats = self.chats.lock().unwrap();
        match chats.iter_mut().find(|c| c.id == id) {
            Some(chat) => {
                chat.archived = true;
                Ok(())
            }
            None => anyhow::bail!("no such chat: {id}"),
        }
    }

    async fn listen(&self, _tx: mpsc::Sender<ChatEvent>) -> anyhow::Result<()> {
        std::future::pending().await
    }
}

/// A clock pinned to one instant, for driving day/night transitions.
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

pub fn clock_at(hour: u32, minute: u32) -> FixedClock {
    FixedClock(
        NaiveDate::from_ymd_opt(2024, 3, 11)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap(),
    )
}

pub fn group(id: &str, name: &str) -> Conversation {
    Conversation {
        id: id.into(),
        name: name.into(),
        is_group: true,
        archived: false,
        pinned: false,
        unread_count: 0,
    }
}

pub fn direct(id: &str, name: &str) -> Conversation {
    Conversation {
        id: id.into(),
        name: name.into(),
        is_group: false,
        archived: false,
        pinned: false,
        unread_count: 0,
    }
}

pub fn message(from_me: bool, timestamp: i64) -> Message {
    Message { from_me, timestamp }
}
