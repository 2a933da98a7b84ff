//! Best-effort mirror of the canonical dossier to the remote profile record.
//!
//! Contention policy: one sync may be in flight at a time; a call made while
//! the slot is taken is dropped entirely — not queued, not retried — and the
//! drop is observable through the returned outcome and the tracker's counter.
//! Callers must not assume eventual delivery.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::auth::AuthSession;
use crate::models::dossier::Dossier;
use crate::remote::ProfileRepository;
use crate::store::{LocalStore, DOSSIER_SLOT};

/// What happened to a sync call. `Dropped` and `SkippedUnauthenticated` are
/// normal outcomes, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Applied,
    NoRemoteRecord,
    SkippedUnauthenticated,
    Dropped,
}

/// Single-slot in-flight tracker. Replaces a bare boolean so contention is
/// observable: dropped attempts are counted and logged instead of vanishing.
#[derive(Debug)]
pub struct InFlight {
    name: &'static str,
    busy: Arc<AtomicBool>,
    dropped: AtomicU64,
}

impl InFlight {
    pub fn new(name: &'static str) -> Self {
        InFlight {
            name,
            busy: Arc::new(AtomicBool::new(false)),
            dropped: AtomicU64::new(0),
        }
    }

    /// Claims the slot. Returns `None` — and records the drop — when an
    /// operation is already in flight. The guard holds its own handle to the
    /// slot and frees it on drop.
    pub fn try_begin(&self) -> Option<InFlightGuard> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            Some(InFlightGuard {
                busy: Arc::clone(&self.busy),
            })
        } else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            warn!("'{}' already in flight, dropping call", self.name);
            None
        }
    }

    /// Observability surface for hosts and tests.
    #[allow(dead_code)]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    #[allow(dead_code)]
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

pub struct InFlightGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

pub struct ProfileSync {
    profiles: Arc<dyn ProfileRepository>,
    in_flight: InFlight,
}

impl ProfileSync {
    pub fn new(profiles: Arc<dyn ProfileRepository>) -> Self {
        ProfileSync {
            profiles,
            in_flight: InFlight::new("profile-sync"),
        }
    }

    #[allow(dead_code)]
    pub fn in_flight(&self) -> &InFlight {
        &self.in_flight
    }

    /// Fetches the remote record and, when present, replaces the canonical
    /// dossier and overwrites the local slot. No-op without a session or
    /// while another sync is in flight.
    pub async fn pull(
        &self,
        session: Option<&AuthSession>,
        dossier: &mut Dossier,
        store: &LocalStore,
    ) -> Result<SyncOutcome, AppError> {
        let Some(session) = session else {
            return Ok(SyncOutcome::SkippedUnauthenticated);
        };
        let Some(_guard) = self.in_flight.try_begin() else {
            return Ok(SyncOutcome::Dropped);
        };

        match self.profiles.fetch(session.user_id).await? {
            Some(remote) => {
                *dossier = remote;
                store.write_json(DOSSIER_SLOT, dossier)?;
                info!("Pulled remote dossier for {}", session.user_id);
                Ok(SyncOutcome::Applied)
            }
            None => Ok(SyncOutcome::NoRemoteRecord),
        }
    }

    /// Upserts the dossier into the remote record keyed by the session's
    /// user. Silently returns without a session.
    pub async fn push(
        &self,
        session: Option<&AuthSession>,
        dossier: &Dossier,
    ) -> Result<SyncOutcome, AppError> {
        let Some(session) = session else {
            return Ok(SyncOutcome::SkippedUnauthenticated);
        };
        let Some(_guard) = self.in_flight.try_begin() else {
            return Ok(SyncOutcome::Dropped);
        };

        self.profiles.upsert(session.user_id, dossier).await?;
        info!("Pushed dossier for {}", session.user_id);
        Ok(SyncOutcome::Applied)
    }
}
