// Session credential state
//
// Holds the credential material captured at login (session cookie +
// anti-forgery token) and the single-flight guard that serializes
// authentication attempts. No I/O happens here -- this is a guarded
// value holder, written only by the authentication routine.

use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// Credential material captured from a successful login.
///
/// Either artifact can be absent: some controller deployments omit the
/// anti-forgery token, and absence is stored rather than treated as a
/// login failure.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    /// Session cookie value (sent back as `Cookie: unifises=...`).
    pub token: Option<String>,
    /// Anti-forgery token (sent back as `X-Csrf-Token`).
    pub csrf_token: Option<String>,
}

/// Guarded holder for the client's single session.
///
/// `begin_auth`/`complete_auth` bracket exactly one authentication
/// attempt at a time; entry is an atomic check-and-set, so two
/// concurrent 401 handlers cannot both start a login.
#[derive(Debug, Default)]
pub(crate) struct SessionState {
    credentials: RwLock<Option<Credentials>>,
    auth_in_flight: AtomicBool,
}

impl SessionState {
    /// Snapshot of the current credentials, if a login has succeeded.
    pub(crate) fn credentials(&self) -> Option<Credentials> {
        self.credentials
            .read()
            .expect("session lock poisoned")
            .clone()
    }

    /// Try to enter the authentication critical section.
    ///
    /// Returns `true` iff no other attempt is in flight. A caller that
    /// receives `true` must call [`complete_auth`](Self::complete_auth)
    /// when the attempt finishes, whatever the outcome.
    pub(crate) fn begin_auth(&self) -> bool {
        self.auth_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Record the outcome of an authentication attempt.
    ///
    /// A successful attempt overwrites the stored credentials wholesale
    /// (never merged). The in-flight flag clears regardless of outcome.
    pub(crate) fn complete_auth(&self, result: Option<Credentials>) {
        if let Some(credentials) = result {
            *self.credentials.write().expect("session lock poisoned") = Some(credentials);
        }
        self.auth_in_flight.store(false, Ordering::Release);
    }

    /// Drop the stored credentials (logout).
    pub(crate) fn clear(&self) {
        *self.credentials.write().expect("session lock poisoned") = None;
    }
}
