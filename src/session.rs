//! Privileged session management.
//!
//! One process-wide session struct supervises the cached administrator
//! grant: prompt once, then keep the grant warm from a background worker
//! thread until the owning operation ends. The worker holds a stop token
//! and an owner-liveness probe so it can never outlive its parent, and
//! teardown is idempotent so a signal racing an explicit stop is harmless.
//!
//! The sudo calls are behind a trait so the lifecycle logic is testable
//! without credentials.

use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::SessionConfig;
use crate::error::SweepResult;

/// Credential operations the session manager needs.
pub trait SudoBackend: Send + Sync + 'static {
    /// Non-interactive validity check; must never prompt.
    fn probe(&self) -> bool;

    /// Interactive credential prompt. Returns false when declined or
    /// failed; the manager never retries the prompt itself.
    fn prompt(&self) -> bool;

    /// Non-interactive refresh of the cached grant.
    fn refresh(&self) -> bool;
}

/// Real backend driving the system `sudo`.
#[derive(Debug, Default)]
pub struct SystemSudo;

impl SudoBackend for SystemSudo {
    fn probe(&self) -> bool {
        silent_sudo(&["-n", "true"])
    }

    fn prompt(&self) -> bool {
        // Interactive: stdio inherited so the password (or Touch ID via
        // pam_tid) prompt reaches the user.
        Command::new("sudo")
            .args(["-v", "-p", "macsweep needs administrator rights: "])
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn refresh(&self) -> bool {
        silent_sudo(&["-n", "-v"])
    }
}

fn silent_sudo(args: &[&str]) -> bool {
    Command::new("sudo")
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Establishing,
    Active,
    Terminated,
}

/// Worker timings, resolved from [`SessionConfig`]. Tests shrink these to
/// milliseconds.
#[derive(Debug, Clone, Copy)]
pub struct Timings {
    pub initial_delay: Duration,
    pub refresh_interval: Duration,
    pub retry_backoff: Duration,
    pub max_retries: u32,
}

impl From<&SessionConfig> for Timings {
    fn from(cfg: &SessionConfig) -> Self {
        Self {
            initial_delay: Duration::from_secs(cfg.initial_delay_secs),
            refresh_interval: Duration::from_secs(cfg.refresh_secs),
            retry_backoff: Duration::from_secs(cfg.retry_backoff_secs),
            max_retries: cfg.max_retries.max(1),
        }
    }
}

struct Keepalive {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Owner of the process-wide privileged session.
pub struct PrivilegedSession<B: SudoBackend = SystemSudo> {
    backend: Arc<B>,
    timings: Timings,
    liveness: Arc<dyn Fn() -> bool + Send + Sync>,
    state: SessionState,
    keepalive: Option<Keepalive>,
}

impl PrivilegedSession<SystemSudo> {
    pub fn new(cfg: &SessionConfig) -> Self {
        Self::with_backend(SystemSudo, Timings::from(cfg))
    }
}

impl<B: SudoBackend> PrivilegedSession<B> {
    pub fn with_backend(backend: B, timings: Timings) -> Self {
        Self {
            backend: Arc::new(backend),
            timings,
            // The worker is an in-process thread, so parent death already
            // ends it; the probe stays injectable for out-of-process
            // workers and for exercising self-termination.
            liveness: Arc::new(|| true),
            state: SessionState::Uninitialized,
            keepalive: None,
        }
    }

    pub fn with_liveness(mut self, probe: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.liveness = Arc::new(probe);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Non-interactive probe: true iff the cached grant is currently
    /// valid. No prompting, no state changes.
    pub fn has_session(&self) -> bool {
        self.backend.probe()
    }

    /// Make sure a privileged session is active, prompting at most once.
    ///
    /// Returns `Ok(false)` when the prompt is declined or fails; callers
    /// decide whether to continue without elevation.
    pub fn ensure_session(&mut self) -> SweepResult<bool> {
        if self.state == SessionState::Active && self.backend.probe() {
            return Ok(true);
        }

        // A stale worker from a lost session must die before a new one
        // starts; two keepalives for one grant is never allowed.
        self.stop_keepalive();
        self.state = SessionState::Establishing;

        if !self.backend.prompt() {
            self.state = SessionState::Uninitialized;
            return Ok(false);
        }

        self.spawn_keepalive();
        self.state = SessionState::Active;
        Ok(true)
    }

    /// Tear the session down. Idempotent: safe to call repeatedly and
    /// concurrently with signal-driven shutdown.
    pub fn stop_session(&mut self) {
        self.stop_keepalive();
        self.state = SessionState::Terminated;
    }

    fn spawn_keepalive(&mut self) {
        let stop = Arc::new(AtomicBool::new(false));
        let backend = Arc::clone(&self.backend);
        let liveness = Arc::clone(&self.liveness);
        let timings = self.timings;
        let stop_flag = Arc::clone(&stop);

        let handle = thread::spawn(move || {
            run_keepalive(&*backend, &stop_flag, &*liveness, timings);
        });
        self.keepalive = Some(Keepalive { stop, handle });
    }

    fn stop_keepalive(&mut self) {
        let Some(keepalive) = self.keepalive.take() else {
            return;
        };
        keepalive.stop.store(true, Ordering::SeqCst);

        // Bounded wait; the worker observes the flag within one sleep
        // slice. If it somehow does not, detach rather than hang.
        let deadline = Instant::now() + Duration::from_secs(2);
        while !keepalive.handle.is_finished() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        if keepalive.handle.is_finished() {
            let _ = keepalive.handle.join();
        }
    }
}

impl<B: SudoBackend> Drop for PrivilegedSession<B> {
    fn drop(&mut self) {
        self.stop_session();
    }
}

/// Renewal loop body.
///
/// Settles briefly after the initial prompt (a fresh biometric grant can
/// need a moment before non-interactive refreshes succeed), then
/// refreshes on an interval that undercuts the credential cache expiry.
/// Refresh failures retry a bounded number of times, then the loop ends
/// silently; the next `ensure_session` notices the lost grant and
/// re-prompts. Stop token and owner liveness are checked inside every
/// sleep so the worker exits within one slice of either signal.
fn run_keepalive(
    backend: &dyn SudoBackend,
    stop: &AtomicBool,
    liveness: &(dyn Fn() -> bool + Send + Sync),
    timings: Timings,
) {
    if !sleep_unless_stopped(stop, liveness, timings.initial_delay) {
        return;
    }

    loop {
        if stop.load(Ordering::SeqCst) || !liveness() {
            return;
        }

        let mut ok = backend.refresh();
        let mut attempts = 1;
        while !ok && attempts < timings.max_retries {
            if !sleep_unless_stopped(stop, liveness, timings.retry_backoff) {
                return;
            }
            ok = backend.refresh();
            attempts += 1;
        }
        if !ok {
            return;
        }

        if !sleep_unless_stopped(stop, liveness, timings.refresh_interval) {
            return;
        }
    }
}

/// Sleep in short slices, returning false as soon as the stop token is
/// set or the owner stops being alive.
fn sleep_unless_stopped(
    stop: &AtomicBool,
    liveness: &(dyn Fn() -> bool + Send + Sync),
    total: Duration,
) -> bool {
    const SLICE: Duration = Duration::from_millis(25);
    let deadline = Instant::now() + total;
    loop {
        if stop.load(Ordering::SeqCst) || !liveness() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep(SLICE.min(deadline - now));
    }
}
