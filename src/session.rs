use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::api::AuthHeaderSlot;
use crate::storage::KeyValueStore;

pub const TOKEN_KEY: &str = "token";
pub const COMPANY_KEY: &str = "company";

/// The user's current company. Its presence in storage is the proxy for
/// "user has completed onboarding".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanySummary {
    pub name: String,
    pub isin: String,
    /// Backend fields we do not interpret; kept so the stored record
    /// round-trips losslessly.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, JsonValue>,
}

/// Owns the auth token and the cached company record.
///
/// Sole writer of the `token`/`company` storage keys and of the shared
/// authorization header slot; everything else reads through the getters here.
#[derive(Clone)]
pub struct SessionService {
    kv: Arc<dyn KeyValueStore>,
    auth: AuthHeaderSlot,
}

impl SessionService {
    pub fn new(kv: Arc<dyn KeyValueStore>, auth: AuthHeaderSlot) -> Self {
        Self { kv, auth }
    }

    pub fn token(&self) -> Option<String> {
        match self.kv.get(TOKEN_KEY) {
            Ok(t) => t,
            Err(e) => {
                log::error!("session.storage.error op=get key={TOKEN_KEY} {e:#}");
                None
            }
        }
    }

    pub fn save_token(&self, token: &str) -> Result<()> {
        self.kv.set(TOKEN_KEY, token)?;
        self.sync_authorization_header();
        Ok(())
    }

    pub fn delete_token(&self) -> Result<()> {
        self.kv.remove(TOKEN_KEY)
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().map_or(false, |t| !t.is_empty())
    }

    /// Converges the shared authorization header slot with the stored token.
    ///
    /// Idempotent: overwrites the slot only when it differs from
    /// `"Token <token>"`, and does nothing when unauthenticated. Safe to call
    /// repeatedly and from concurrent tasks.
    pub fn sync_authorization_header(&self) {
        let Some(token) = self.token().filter(|t| !t.is_empty()) else {
            return;
        };
        let want = format!("Token {token}");
        let mut slot = self.auth.write();
        if slot.as_deref() != Some(want.as_str()) {
            *slot = Some(want);
        }
    }

    pub fn save_company(&self, company: &CompanySummary) -> Result<()> {
        let encoded = serde_json::to_string(company)?;
        self.kv.set(COMPANY_KEY, &encoded)
    }

    pub fn company(&self) -> Option<CompanySummary> {
        let raw = match self.kv.get(COMPANY_KEY) {
            Ok(r) => r?,
            Err(e) => {
                log::error!("session.storage.error op=get key={COMPANY_KEY} {e:#}");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(c) => Some(c),
            Err(e) => {
                // A record that no longer decodes counts as absent; the guard
                // then routes through onboarding instead of crashing.
                log::error!("session.company.decode_error {e}");
                None
            }
        }
    }

    pub fn has_company(&self) -> bool {
        self.company().is_some()
    }

    /// Drops the entire session: storage and the header slot.
    ///
    /// Called when the backend answers 401 to an authenticated request; the
    /// caller is expected to route the user to the login page afterwards.
    pub fn purge(&self) -> Result<()> {
        self.kv.clear()?;
        *self.auth.write() = None;
        Ok(())
    }
}
