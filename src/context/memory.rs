//! Sliding-window conversation memory.
//!
//! Each conversation keeps at most `max_entries` turns in process memory.
//! `ConversationStore` hands out one async mutex per conversation id; a
//! chat request holds it from history rendering until the exchange is
//! committed, so turns of concurrent requests never interleave.
//! The store itself is capped at `max_conversations` ids; creating one
//! past the cap evicts the least recently used idle conversation.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

pub const DEFAULT_CONVERSATION_ID: &str = "default";
pub const ASSISTANT_LABEL: &str = "AyurWell";
pub const DEFAULT_MAX_CONVERSATIONS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatTurn {
    pub role: Role,
    /// User turn carrying the image analysis rather than typed text.
    pub image_derived: bool,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            image_derived: false,
            text: text.into(),
            created_at: Utc::now(),
        }
    }

    pub fn image_context(text: impl Into<String>) -> Self {
        Self {
            image_derived: true,
            ..Self::user(text)
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            image_derived: false,
            text: text.into(),
            created_at: Utc::now(),
        }
    }

    pub fn label(&self) -> &'static str {
        match (self.role, self.image_derived) {
            (Role::Assistant, _) => ASSISTANT_LABEL,
            (Role::User, true) => "User Image Context",
            (Role::User, false) => "User",
        }
    }

    pub fn render(&self) -> String {
        format!("{}: {}", self.label(), self.text)
    }
}

#[derive(Debug, Clone)]
pub struct ConversationLog {
    turns: VecDeque<ChatTurn>,
    max_entries: usize,
}

impl ConversationLog {
    pub fn new(max_entries: usize) -> Self {
        Self {
            turns: VecDeque::new(),
            max_entries: max_entries.max(1),
        }
    }

    /// Appends and evicts the oldest turns beyond capacity.
    pub fn append(&mut self, turn: ChatTurn) {
        self.turns.push_back(turn);
        while self.turns.len() > self.max_entries {
            self.turns.pop_front();
        }
    }

    pub fn render(&self) -> String {
        render_turns(self.turns.iter())
    }

    /// History as it would look after `pending` were appended, without
    /// mutating the log.
    pub fn render_with(&self, pending: &[ChatTurn]) -> String {
        let total = self.turns.len() + pending.len();
        let skip = total.saturating_sub(self.max_entries);
        render_turns(self.turns.iter().chain(pending.iter()).skip(skip))
    }

    pub fn turns(&self) -> impl Iterator<Item = &ChatTurn> {
        self.turns.iter()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

/// Drops the idle conversation touched longest ago. Logs held by an
/// in-flight request are skipped, so the map may briefly exceed its cap.
fn evict_least_recent(logs: &mut HashMap<String, Slot>) {
    let victim = logs
        .iter()
        .filter(|(_, slot)| Arc::strong_count(&slot.log) == 1)
        .min_by_key(|(_, slot)| slot.last_used.load(Ordering::Relaxed))
        .map(|(id, _)| id.clone());
    if let Some(id) = victim {
        tracing::debug!(conversation = %id, "evicting idle conversation");
        logs.remove(&id);
    }
}

fn render_turns<'a>(turns: impl Iterator<Item = &'a ChatTurn>) -> String {
    turns.map(ChatTurn::render).collect::<Vec<_>>().join("\n")
}

pub type SharedLog = Arc<Mutex<ConversationLog>>;

struct Slot {
    log: SharedLog,
    last_used: AtomicU64,
}

#[derive(Clone)]
pub struct ConversationStore {
    logs: Arc<RwLock<HashMap<String, Slot>>>,
    clock: Arc<AtomicU64>,
    max_entries: usize,
    max_conversations: usize,
}

impl ConversationStore {
    pub fn new(max_entries: usize) -> Self {
        Self::with_capacity(max_entries, DEFAULT_MAX_CONVERSATIONS)
    }

    pub fn with_capacity(max_entries: usize, max_conversations: usize) -> Self {
        Self {
            logs: Arc::new(RwLock::new(HashMap::new())),
            clock: Arc::new(AtomicU64::new(0)),
            max_entries,
            max_conversations: max_conversations.max(1),
        }
    }

    /// Normalizes an optional client-supplied id. Ids are not
    /// authenticated; the number kept is bounded by `max_conversations`.
    pub fn resolve_id(id: Option<&str>) -> String {
        id.map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_CONVERSATION_ID)
            .to_string()
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Log for `id`, created on first use.
    pub async fn get_or_create(&self, id: &str) -> SharedLog {
        if let Some(slot) = self.logs.read().await.get(id) {
            slot.last_used.store(self.tick(), Ordering::Relaxed);
            return slot.log.clone();
        }
        let mut logs = self.logs.write().await;
        if let Some(slot) = logs.get(id) {
            slot.last_used.store(self.tick(), Ordering::Relaxed);
            return slot.log.clone();
        }
        if logs.len() >= self.max_conversations {
            evict_least_recent(&mut logs);
        }
        let log: SharedLog = Arc::new(Mutex::new(ConversationLog::new(self.max_entries)));
        logs.insert(
            id.to_string(),
            Slot {
                log: log.clone(),
                last_used: AtomicU64::new(self.tick()),
            },
        );
        log
    }

    pub async fn get(&self, id: &str) -> Option<SharedLog> {
        self.logs.read().await.get(id).map(|slot| slot.log.clone())
    }

    /// Drops a conversation. Returns whether it existed.
    pub async fn remove(&self, id: &str) -> bool {
        self.logs.write().await.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.logs.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_uses_role_labels_in_order() {
        let mut log = ConversationLog::new(20);
        log.append(ChatTurn::user("I feel anxious"));
        log.append(ChatTurn::image_context("Image Analysis: a tulsi leaf"));
        log.append(ChatTurn::assistant("Try Brahmi."));
        assert_eq!(
            log.render(),
            "User: I feel anxious\nUser Image Context: Image Analysis: a tulsi leaf\nAyurWell: Try Brahmi."
        );
    }

    #[test]
    fn window_never_exceeds_capacity() {
        let mut log = ConversationLog::new(20);
        for i in 0..11 {
            log.append(ChatTurn::user(format!("question {}", i)));
            log.append(ChatTurn::assistant(format!("answer {}", i)));
            assert!(log.len() <= 20);
        }
        assert_eq!(log.len(), 20);
        let rendered = log.render();
        assert!(!rendered.contains("question 0\n"));
        assert!(!rendered.contains("answer 0"));
        assert!(rendered.starts_with("User: question 1"));
        assert!(rendered.ends_with("AyurWell: answer 10"));
    }

    #[test]
    fn render_with_includes_pending_turns_inside_window() {
        let mut log = ConversationLog::new(3);
        log.append(ChatTurn::user("a"));
        log.append(ChatTurn::assistant("b"));
        log.append(ChatTurn::user("c"));

        let rendered = log.render_with(&[ChatTurn::user("d")]);
        assert_eq!(rendered, "AyurWell: b\nUser: c\nUser: d");
        assert_eq!(log.len(), 3);
        assert_eq!(log.render(), "User: a\nAyurWell: b\nUser: c");
    }

    #[test]
    fn missing_or_blank_id_maps_to_default() {
        assert_eq!(ConversationStore::resolve_id(None), "default");
        assert_eq!(ConversationStore::resolve_id(Some("  ")), "default");
        assert_eq!(ConversationStore::resolve_id(Some(" abc ")), "abc");
    }

    #[tokio::test]
    async fn store_returns_same_log_for_same_id() {
        let store = ConversationStore::new(20);
        let first = store.get_or_create("s1").await;
        first.lock().await.append(ChatTurn::user("hello there"));

        let again = store.get_or_create("s1").await;
        assert_eq!(again.lock().await.len(), 1);

        let other = store.get_or_create("s2").await;
        assert!(other.lock().await.is_empty());
        assert_eq!(store.len().await, 2);

        assert!(store.remove("s1").await);
        assert!(!store.remove("s1").await);
        assert!(store.get("s1").await.is_none());
    }

    #[tokio::test]
    async fn store_evicts_least_recently_used_past_capacity() {
        let store = ConversationStore::with_capacity(20, 2);
        store.get_or_create("a").await;
        store.get_or_create("b").await;
        // Touch "a" so "b" becomes the oldest.
        store.get_or_create("a").await;

        store.get_or_create("c").await;
        assert_eq!(store.len().await, 2);
        assert!(store.get("a").await.is_some());
        assert!(store.get("b").await.is_none());
        assert!(store.get("c").await.is_some());
    }

    #[tokio::test]
    async fn store_keeps_conversations_held_by_a_request() {
        let store = ConversationStore::with_capacity(20, 1);
        let held = store.get_or_create("busy").await;
        let _guard = held.lock().await;

        store.get_or_create("next").await;
        assert!(store.get("busy").await.is_some());
        assert!(store.get("next").await.is_some());
    }
}
