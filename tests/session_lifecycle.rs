//! End-to-end lifecycle tests for the privileged session manager.
//!
//! These drive `PrivilegedSession` through the public API with a fake
//! sudo backend, covering the whole arc: prompt, background renewal,
//! teardown, and re-establishment after the grant is lost.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use macsweep::session::{PrivilegedSession, SessionState, SudoBackend, Timings};

#[derive(Default)]
struct ScriptedSudo {
    valid: AtomicBool,
    decline: AtomicBool,
    refresh_ok: AtomicBool,
    prompts: AtomicU32,
    refreshes: AtomicU32,
}

impl ScriptedSudo {
    fn accepting() -> Arc<Self> {
        let sudo = Self::default();
        sudo.refresh_ok.store(true, Ordering::SeqCst);
        Arc::new(sudo)
    }
}

// Orphan rule: `SudoBackend` can't be implemented on `Arc<_>` from an
// external test crate, so wrap the shared handle in a local newtype.
struct Shared(Arc<ScriptedSudo>);

impl SudoBackend for Shared {
    fn probe(&self) -> bool {
        self.0.valid.load(Ordering::SeqCst)
    }

    fn prompt(&self) -> bool {
        self.0.prompts.fetch_add(1, Ordering::SeqCst);
        if self.0.decline.load(Ordering::SeqCst) {
            return false;
        }
        self.0.valid.store(true, Ordering::SeqCst);
        true
    }

    fn refresh(&self) -> bool {
        self.0.refreshes.fetch_add(1, Ordering::SeqCst);
        self.0.refresh_ok.load(Ordering::SeqCst)
    }
}

fn fast_timings() -> Timings {
    Timings {
        initial_delay: Duration::from_millis(5),
        refresh_interval: Duration::from_millis(20),
        retry_backoff: Duration::from_millis(5),
        max_retries: 2,
    }
}

#[test]
fn full_lifecycle_prompt_refresh_stop_reprompt() {
    let sudo = ScriptedSudo::accepting();
    let mut session = PrivilegedSession::with_backend(Shared(Arc::clone(&sudo)), fast_timings());
    assert_eq!(session.state(), SessionState::Uninitialized);

    assert!(session.ensure_session().unwrap());
    assert_eq!(session.state(), SessionState::Active);

    // Background worker keeps the grant warm without further prompts.
    thread::sleep(Duration::from_millis(120));
    assert!(sudo.refreshes.load(Ordering::SeqCst) >= 2);
    assert_eq!(sudo.prompts.load(Ordering::SeqCst), 1);

    session.stop_session();
    assert_eq!(session.state(), SessionState::Terminated);

    // No renewal activity after teardown.
    let settled = sudo.refreshes.load(Ordering::SeqCst);
    thread::sleep(Duration::from_millis(60));
    assert_eq!(sudo.refreshes.load(Ordering::SeqCst), settled);

    // A terminated session can be brought back; that costs one prompt.
    sudo.valid.store(false, Ordering::SeqCst);
    assert!(session.ensure_session().unwrap());
    assert_eq!(session.state(), SessionState::Active);
    assert_eq!(sudo.prompts.load(Ordering::SeqCst), 2);

    session.stop_session();
}

#[test]
fn drop_stops_the_renewal_worker() {
    let sudo = ScriptedSudo::accepting();
    {
        let mut session = PrivilegedSession::with_backend(Shared(Arc::clone(&sudo)), fast_timings());
        session.ensure_session().unwrap();
        thread::sleep(Duration::from_millis(40));
    }

    let settled = sudo.refreshes.load(Ordering::SeqCst);
    thread::sleep(Duration::from_millis(60));
    assert_eq!(
        sudo.refreshes.load(Ordering::SeqCst),
        settled,
        "worker must not outlive its owner"
    );
}

#[test]
fn decline_leaves_session_usable() {
    let sudo = ScriptedSudo::accepting();
    sudo.decline.store(true, Ordering::SeqCst);
    let mut session = PrivilegedSession::with_backend(Shared(Arc::clone(&sudo)), fast_timings());

    // Declining is a normal outcome, not an error.
    assert_eq!(session.ensure_session().unwrap(), false);
    assert_eq!(session.state(), SessionState::Uninitialized);

    // The user changes their mind; the same session object recovers.
    sudo.decline.store(false, Ordering::SeqCst);
    assert!(session.ensure_session().unwrap());
    assert_eq!(session.state(), SessionState::Active);
    assert_eq!(sudo.prompts.load(Ordering::SeqCst), 2);

    session.stop_session();
}

#[test]
fn lost_grant_spawns_a_single_replacement_worker() {
    let sudo = ScriptedSudo::accepting();
    let mut session = PrivilegedSession::with_backend(Shared(Arc::clone(&sudo)), fast_timings());
    session.ensure_session().unwrap();
    thread::sleep(Duration::from_millis(40));

    // The cached grant expires behind our back.
    sudo.valid.store(false, Ordering::SeqCst);
    assert!(session.ensure_session().unwrap());
    assert_eq!(sudo.prompts.load(Ordering::SeqCst), 2);

    // Exactly one worker is refreshing: over ~3 intervals we see a
    // bounded number of refreshes, not double.
    let start = sudo.refreshes.load(Ordering::SeqCst);
    thread::sleep(Duration::from_millis(70));
    let delta = sudo.refreshes.load(Ordering::SeqCst) - start;
    assert!(delta >= 1, "replacement worker is running");
    assert!(delta <= 5, "stale worker was not stopped (saw {} refreshes)", delta);

    session.stop_session();
}

#[test]
fn owner_death_then_explicit_stop_is_clean() {
    let sudo = ScriptedSudo::accepting();
    let alive = Arc::new(AtomicBool::new(true));
    let probe = Arc::clone(&alive);
    let mut session = PrivilegedSession::with_backend(Shared(Arc::clone(&sudo)), fast_timings())
        .with_liveness(move || probe.load(Ordering::SeqCst));
    session.ensure_session().unwrap();

    alive.store(false, Ordering::SeqCst);
    thread::sleep(Duration::from_millis(100));

    // The worker already exited on the liveness probe; stopping again is
    // quiet and quick.
    session.stop_session();
    assert_eq!(session.state(), SessionState::Terminated);
}
