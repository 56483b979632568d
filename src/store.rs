use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::api::{ApiClient, ApiError, UnreadCounts};
use crate::session::SessionService;
use crate::utils::format_clock;

/// Outbound side of the live chat connection, supplied by the transport
/// layer. The store only ever serializes a payload and hands it over.
pub trait ChatSocket: Send + Sync {
    fn send(&self, payload: &str) -> anyhow::Result<()>;
}

/// The user's fond membership record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FondData {
    pub id: i64,
    pub name: String,
    pub leader: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, JsonValue>,
}

/// Tri-state fond membership cache.
///
/// Transitions `NotFetched -> Absent` or `NotFetched -> Present`, never
/// backward; the fetch action issues at most one request while `NotFetched`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FondMembership {
    #[default]
    NotFetched,
    Absent,
    Present(FondData),
}

impl FondMembership {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, FondMembership::NotFetched)
    }
}

/// Chat event as delivered by the socket transport; `time` is epoch millis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundChatMessage {
    pub sender: String,
    pub text: String,
    pub time: i64,
}

/// Chat message as consumers read it: `time` rendered as clock time.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub sender: String,
    pub text: String,
    pub time: String,
}

struct StoreState {
    chat: VecDeque<ChatMessage>,
    max_messages: usize,
    socket: Option<Arc<dyn ChatSocket>>,
    unread_messages: u32,
    unread_notifications: u32,
    fond: FondMembership,
    fond_fetch_inflight: bool,
}

/// Process-wide state read by independent consumers: the chat buffer, the
/// unread counters and the fond membership cache.
///
/// Sole writer of its three state slices. Mutations are synchronous; the
/// async actions below orchestrate the network and commit through them.
/// Handles are cheap clones sharing one inner state.
#[derive(Clone)]
pub struct SharedStore {
    session: SessionService,
    api: ApiClient,
    inner: Arc<RwLock<StoreState>>,
}

impl SharedStore {
    pub fn new(session: SessionService, api: ApiClient, max_messages: usize) -> Self {
        Self {
            session,
            api,
            inner: Arc::new(RwLock::new(StoreState {
                chat: VecDeque::new(),
                max_messages,
                socket: None,
                unread_messages: 0,
                unread_notifications: 0,
                fond: FondMembership::NotFetched,
                fond_fetch_inflight: false,
            })),
        }
    }

    // ---- Mutations ----

    pub fn push_chat_message(&self, msg: InboundChatMessage) {
        let rendered = ChatMessage {
            sender: msg.sender,
            text: msg.text,
            time: format_clock(msg.time),
        };
        let mut st = self.inner.write();
        while st.chat.len() >= st.max_messages {
            st.chat.pop_front();
        }
        st.chat.push_back(rendered);
    }

    /// Changes the buffer capacity. The existing buffer is not trimmed; a
    /// capacity reduction takes effect through future evictions.
    pub fn set_max_messages(&self, n: usize) {
        self.inner.write().max_messages = n;
    }

    pub fn attach_socket(&self, socket: Arc<dyn ChatSocket>) {
        self.inner.write().socket = Some(socket);
    }

    /// Serializes `payload` and sends it over the attached socket. No-op
    /// unless a socket is attached and the session is authenticated; a send
    /// failure is logged, never propagated.
    pub fn send_chat_message<T: Serialize>(&self, payload: &T) {
        let socket = self.inner.read().socket.clone();
        let Some(socket) = socket else { return };
        if !self.session.is_authenticated() {
            return;
        }
        let encoded = match serde_json::to_string(payload) {
            Ok(s) => s,
            Err(e) => {
                log::error!("store.chat.encode_error {e}");
                return;
            }
        };
        if let Err(e) = socket.send(&encoded) {
            log::error!("store.chat.send_error {e:#}");
        }
    }

    pub fn set_unread_messages(&self, n: u32) {
        self.inner.write().unread_messages = n;
    }

    pub fn set_unread_notifications(&self, n: u32) {
        self.inner.write().unread_notifications = n;
    }

    pub fn set_fond_membership(&self, v: FondMembership) {
        self.inner.write().fond = v;
    }

    // ---- Getters ----

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.inner.read().chat.iter().cloned().collect()
    }

    pub fn unread(&self) -> UnreadCounts {
        let st = self.inner.read();
        UnreadCounts {
            unread_messages: st.unread_messages,
            unread_notifications: st.unread_notifications,
        }
    }

    pub fn total_unread(&self) -> u32 {
        let st = self.inner.read();
        st.unread_messages + st.unread_notifications
    }

    pub fn fond(&self) -> FondMembership {
        self.inner.read().fond.clone()
    }

    pub fn has_fond(&self) -> bool {
        matches!(self.inner.read().fond, FondMembership::Present(_))
    }

    pub fn is_fond_leader(&self) -> bool {
        match &self.inner.read().fond {
            FondMembership::Present(data) => data.leader,
            FondMembership::Absent | FondMembership::NotFetched => false,
        }
    }

    // ---- Actions ----

    /// Fetches the unread counts and commits both counters. No-op when
    /// unauthenticated; on failure the counters keep their previous values
    /// and the action stays silently retryable.
    pub async fn refresh_unread(&self) {
        if !self.session.is_authenticated() {
            return;
        }
        self.session.sync_authorization_header();
        match self.api.unread().await {
            Ok(counts) => {
                let mut st = self.inner.write();
                st.unread_messages = counts.unread_messages;
                st.unread_notifications = counts.unread_notifications;
            }
            Err(e) => log::error!("store.unread.error {e}"),
        }
    }

    /// Resolves the fond membership cache. No-op when unauthenticated, when
    /// the cache is already resolved, or when a fetch is in flight: racing
    /// callers are deduplicated so one request is issued per state-lifetime.
    /// 404 commits `Absent`; any other error leaves the cache `NotFetched`
    /// and eligible for a later retry.
    pub async fn refresh_fond_membership(&self) {
        if !self.session.is_authenticated() {
            return;
        }
        {
            let mut st = self.inner.write();
            if st.fond.is_resolved() || st.fond_fetch_inflight {
                return;
            }
            st.fond_fetch_inflight = true;
        }

        self.session.sync_authorization_header();
        let result = self.api.fond_user_data().await;

        let mut st = self.inner.write();
        st.fond_fetch_inflight = false;
        match result {
            Ok(data) => st.fond = FondMembership::Present(data),
            Err(ApiError::NotFound) => st.fond = FondMembership::Absent,
            Err(e) => log::error!("store.fond.error {e}"),
        }
    }
}
