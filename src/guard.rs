use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::api::{ApiClient, ApiError};
use crate::routes::{self, Route};
use crate::session::SessionService;

/// Progress-bar widget the guard brackets each named navigation with.
pub trait ProgressSink: Send + Sync {
    fn start(&self);
    fn done(&self);
}

/// Default sink: surfaces the bracket on the log stream.
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn start(&self) {
        log::debug!("progress.start");
    }

    fn done(&self) {
        log::debug!("progress.done");
    }
}

pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn start(&self) {}
    fn done(&self) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Allow,
    Redirect(String),
    /// Fenced mode only: a newer navigation started while the company lookup
    /// was in flight. Nothing was committed; the caller drops the attempt.
    Superseded,
}

/// Per-navigation decision procedure, consulted before each route change.
///
/// Each `resolve` call takes the next generation from a shared counter. With
/// fencing on (the default), a company lookup that finishes after a newer
/// navigation has started is discarded instead of committed. Fencing off
/// lets a stale resolution commit anyway; that legacy mode exists for
/// compatibility testing.
#[derive(Clone)]
pub struct NavigationGuard {
    session: SessionService,
    api: ApiClient,
    progress: Arc<dyn ProgressSink>,
    fencing: bool,
    generation: Arc<AtomicU64>,
}

impl NavigationGuard {
    pub fn new(
        session: SessionService,
        api: ApiClient,
        progress: Arc<dyn ProgressSink>,
        fencing: bool,
    ) -> Self {
        Self {
            session,
            api,
            progress,
            fencing,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub async fn resolve(&self, to: &Route) -> Resolution {
        if !to.name.is_empty() {
            self.progress.start();
        }
        let resolution = self.decide(to).await;
        // The bracket closes for every completed transition, whatever the
        // outcome.
        self.progress.done();
        resolution
    }

    async fn decide(&self, to: &Route) -> Resolution {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if !to.requires_auth {
            return Resolution::Allow;
        }

        if !self.session.is_authenticated() {
            log::info!("guard.redirect target={} reason=unauthenticated", to.name);
            return Resolution::Redirect(routes::LOGIN_PATH.to_string());
        }

        // Logging out must always be reachable once authenticated, even
        // before a company exists.
        if to.name == routes::LOGOUT {
            return Resolution::Allow;
        }

        if self.session.has_company() || to.name == routes::FOUND_FIRST_COMPANY {
            return Resolution::Allow;
        }

        // No cached company: one lookup decides between proceeding and
        // onboarding. At most one request per navigation attempt, never
        // cancelled once in flight.
        self.session.sync_authorization_header();
        let result = self.api.active_company().await;

        if self.fencing && self.generation.load(Ordering::SeqCst) != generation {
            log::warn!(
                "guard.company.superseded target={} generation={}",
                to.name,
                generation
            );
            return Resolution::Superseded;
        }

        match result {
            Ok(company) => {
                if let Err(e) = self.session.save_company(&company) {
                    log::error!("guard.company.save_error {e:#}");
                }
                Resolution::Allow
            }
            Err(ApiError::Unauthorized) => {
                // The stored token is no longer valid on the backend. Drop the
                // session and send the user back through login.
                if let Err(e) = self.session.purge() {
                    log::error!("guard.session.purge_error {e:#}");
                }
                log::info!("guard.redirect target={} reason=token_rejected", to.name);
                Resolution::Redirect(routes::LOGIN_PATH.to_string())
            }
            Err(e) => {
                log::info!("guard.redirect target={} reason=no_company err={e}", to.name);
                Resolution::Redirect(routes::FOUND_FIRST_COMPANY_PATH.to_string())
            }
        }
    }
}
