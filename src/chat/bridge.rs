//! Sidecar bridge to the real chat client.
//!
//! The protocol client itself (authentication, pairing, message transport)
//! lives in an external process. We spawn it and speak newline-delimited
//! JSON over its stdio: requests `{"id": n, "op": "..."}` on stdin, replies
//! `{"id": n, "ok": true, ...}` and unsolicited event lines
//! `{"event": "...", ...}` on stdout. Malformed lines are logged and
//! skipped, never fatal.

use super::traits::{ChatEvent, ChatService, Conversation, Message};
use crate::config::BridgeConfig;
use crate::error::BridgeError;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{mpsc, oneshot};

type PendingMap = Mutex<HashMap<u64, oneshot::Sender<Value>>>;

pub struct BridgeService {
    stdin: tokio::sync::Mutex<ChildStdin>,
    pending: Arc<PendingMap>,
    events: Mutex<Option<mpsc::Receiver<ChatEvent>>>,
    next_id: AtomicU64,
    _child: Child,
}

impl BridgeService {
    /// Spawn the configured sidecar command and start draining its stdout.
    pub fn spawn(config: &BridgeConfig) -> Result<Self, BridgeError> {
        let spawn_err = |message: String| BridgeError::Spawn {
            command: config.command.clone(),
            message,
        };

        let mut child = Command::new(&config.command)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| spawn_err(e.to_string()))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| spawn_err("stdin not captured".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| spawn_err("stdout not captured".into()))?;

        let pending: Arc<PendingMap> = Arc::new(Mutex::new(HashMap::new()));
        let (event_tx, event_rx) = mpsc::channel(64);
        tokio::spawn(read_stdout(stdout, Arc::clone(&pending), event_tx));

        Ok(Self {
            stdin: tokio::sync::Mutex::new(stdin),
            pending,
            events: Mutex::new(Some(event_rx)),
            next_id: AtomicU64::new(0),
            _child: child,
        })
    }

    /// Send one request line and wait for the matching reply.
    async fn request(&self, op: &str, extra: Value) -> Result<Value, BridgeError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (reply_tx, reply_rx) = oneshot::channel();
        self.pending
            .lock()
            .expect("pending lock poisoned")
            .insert(id, reply_tx);

        let mut payload = json!({ "id": id, "op": op });
        if let (Some(object), Some(extra_object)) = (payload.as_object_mut(), extra.as_object()) {
            for (key, value) in extra_object {
                object.insert(key.clone(), value.clone());
            }
        }
        let mut line = payload.to_string();
        line.push('\n');

        let write = {
            let mut stdin = self.stdin.lock().await;
            match stdin.write_all(line.as_bytes()).await {
                Ok(()) => stdin.flush().await,
                Err(e) => Err(e),
            }
        };
        if write.is_err() {
            self.pending
                .lock()
                .expect("pending lock poisoned")
                .remove(&id);
            return Err(BridgeError::Closed { op: op.into() });
        }

        let reply = reply_rx
            .await
            .map_err(|_| BridgeError::Closed { op: op.into() })?;

        if reply.get("ok").and_then(Value::as_bool).unwrap_or(false) {
            Ok(reply)
        } else {
            let message = reply
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unspecified error")
                .to_string();
            Err(BridgeError::Rejected {
                op: op.into(),
                message,
            })
        }
    }
}

/// Pull one named field out of a reply and deserialize it.
fn reply_field<T: serde::de::DeserializeOwned>(
    mut reply: Value,
    key: &str,
    op: &str,
) -> Result<T, BridgeError> {
    let value = reply
        .get_mut(key)
        .map(Value::take)
        .ok_or_else(|| BridgeError::Protocol {
            op: op.into(),
            message: format!("missing `{key}` field"),
        })?;
    serde_json::from_value(value).map_err(|e| BridgeError::Protocol {
        op: op.into(),
        message: e.to_string(),
    })
}

async fn read_stdout(
    stdout: ChildStdout,
    pending: Arc<PendingMap>,
    events: mpsc::Sender<ChatEvent>,
) {
    let mut lines = BufReader::new(stdout).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => dispatch_line(&line, &pending, &events).await,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("bridge stdout read failed: {e}");
                break;
            }
        }
    }
    tracing::debug!("bridge stdout closed");
}

async fn dispatch_line(line: &str, pending: &PendingMap, events: &mpsc::Sender<ChatEvent>) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }

    let value: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("skipping malformed bridge line: {e}");
            return;
        }
    };

    if let Some(id) = value.get("id").and_then(Value::as_u64) {
        let waiter = pending.lock().expect("pending lock poisoned").remove(&id);
        match waiter {
            Some(reply_tx) => {
                let _ = reply_tx.send(value);
            }
            None => tracing::warn!("bridge reply for unknown request id {id}"),
        }
        return;
    }

    if value.get("event").is_some() {
        match serde_json::from_value::<ChatEvent>(value) {
            Ok(event) => {
                let _ = events.send(event).await;
            }
            Err(e) => tracing::warn!("skipping unknown bridge event: {e}"),
        }
        return;
    }

    tracing::warn!("skipping unrecognized bridge line");
}

#[async_trait]
impl ChatService for BridgeService {
    async fn connect(&self) -> anyhow::Result<()> {
        self.request("connect", Value::Null).await?;
        Ok(())
    }

    async fn disconnect(&self) -> anyhow::Result<()> {
        self.request("disconnect", Value::Null).await?;
        Ok(())
    }

    async fn list_chats(&self) -> anyhow::Result<Vec<Conversation>> {
        let reply = self.request("list_chats", Value::Null).await?;
        Ok(reply_field(reply, "chats", "list_chats")?)
    }

    async fn chat_by_id(&self, id: &str) -> anyhow::Result<Conversation> {
        let reply = self.request("get_chat", json!({ "chat": id })).await?;
        Ok(reply_field(reply, "chat", "get_chat")?)
    }

    async fn recent_messages(&self, id: &str, limit: usize) -> anyhow::Result<Vec<Message>> {
        let reply = self
            .request("recent_messages", json!({ "chat": id, "limit": limit }))
            .await?;
        Ok(reply_field(reply, "messages", "recent_messages")?)
    }

    async fn archive(&self, id: &str) -> anyhow::Result<()> {
        self.request("archive", json!({ "chat": id })).await?;
        Ok(())
    }

    async fn listen(&self, tx: mpsc::Sender<ChatEvent>) -> anyhow::Result<()> {
        let mut events = self
            .events
            .lock()
            .expect("events lock poisoned")
            .take()
            .ok_or_else(|| anyhow::anyhow!("bridge event stream already taken"))?;

        while let Some(event) = events.recv().await {
            if tx.send(event).await.is_err() {
                break;
            }
        }
        Ok(())
    }
}
