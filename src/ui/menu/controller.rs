//! Interactive loop and terminal lifecycle for the paginated menu.
//!
//! The controller owns raw mode, the alternate screen and cursor
//! visibility while a menu runs. Restoration goes through one idempotent
//! routine shared by the normal exit path, the error path (via a drop
//! guard) and the Ctrl-C handler, so the terminal comes back in a sane
//! state no matter how the loop ends. Input is polled with a bounded
//! timeout so the loop stays responsive to cancellation with no key
//! pressed.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, Once};
use std::time::Duration;

use crossterm::style::Print;
use crossterm::terminal::{self, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute, queue};

use crate::error::{SweepError, SweepResult};
use crate::ui::keys::{Decoded, KeyDecoder};
use crate::ui::terminal::stdin_is_tty;

use super::render::render_frame;
use super::state::{MenuItem, MenuState, Transition};

const POLL_TIMEOUT: Duration = Duration::from_millis(120);

static CANCEL_REQUESTED: AtomicBool = AtomicBool::new(false);
static SIGNAL_HOOK: Once = Once::new();
static RESTORE_PLAN: Mutex<Option<RestorePlan>> = Mutex::new(None);

/// What the teardown routine has to undo. Armed when the controller
/// mutates the terminal, taken (once) by whoever restores first.
#[derive(Debug, Clone, Copy)]
struct RestorePlan {
    raw: bool,
    /// Only set when this controller entered the alternate screen itself;
    /// an enclosing managed screen is never left from here.
    alt: bool,
}

fn arm_restore(plan: RestorePlan) {
    if let Ok(mut slot) = RESTORE_PLAN.lock() {
        *slot = Some(plan);
    }
}

/// Idempotent terminal restore. Safe to call from the signal handler and
/// safe to call twice; the plan is taken atomically so only the first
/// caller does work. Failures are swallowed after a best-effort fallback
/// so they never mask the result of the operation that triggered teardown.
pub fn restore_terminal() {
    let plan = RESTORE_PLAN.lock().ok().and_then(|mut slot| slot.take());
    let Some(plan) = plan else { return };

    let mut out = io::stdout();
    let _ = execute!(out, cursor::Show);
    if plan.alt {
        let _ = execute!(out, LeaveAlternateScreen);
    }
    if plan.raw {
        let _ = terminal::disable_raw_mode();
    }
}

/// True once an interrupt has been delivered; the menu loop treats it as
/// cancel on its next tick.
pub fn cancel_requested() -> bool {
    CANCEL_REQUESTED.load(Ordering::SeqCst)
}

fn install_signal_hook() {
    SIGNAL_HOOK.call_once(|| {
        let _ = ctrlc::set_handler(|| {
            CANCEL_REQUESTED.store(true, Ordering::SeqCst);
            restore_terminal();
        });
    });
}

/// Runs `restore_terminal` on every exit path, including panics and `?`.
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore_terminal();
    }
}

/// Display knobs for one menu run.
#[derive(Debug, Clone)]
pub struct MenuOptions {
    pub title: String,
    pub page_size: usize,
    pub color: bool,
    pub unicode: bool,
    /// An enclosing caller already owns the alternate screen
    pub managed_screen: bool,
    pub width: u16,
}

/// Run the interactive menu to completion.
///
/// Returns `Ok(Some(indices))` on confirm (ascending original indices),
/// `Ok(None)` on cancel (quit key or interrupt signal).
pub fn run_menu(
    items: Vec<MenuItem>,
    preselected: &[usize],
    opts: &MenuOptions,
) -> SweepResult<Option<Vec<usize>>> {
    if items.is_empty() {
        return Err(SweepError::EmptyMenu);
    }
    if !stdin_is_tty() {
        return Err(SweepError::NoTty);
    }

    let mut state = MenuState::new(items, opts.page_size, preselected);

    CANCEL_REQUESTED.store(false, Ordering::SeqCst);
    install_signal_hook();

    let mut out = io::stdout();
    terminal::enable_raw_mode()?;
    arm_restore(RestorePlan {
        raw: true,
        alt: false,
    });
    let _guard = TerminalGuard;

    if !opts.managed_screen {
        execute!(out, EnterAlternateScreen)?;
        arm_restore(RestorePlan {
            raw: true,
            alt: true,
        });
    }
    // The only full clear; steady-state redraws are in place.
    execute!(out, cursor::Hide, terminal::Clear(ClearType::All))?;

    let mut width = opts.width;
    let decoder = KeyDecoder::new(POLL_TIMEOUT);

    draw(&mut out, &state, opts, width)?;
    let outcome = loop {
        if cancel_requested() {
            break None;
        }
        match decoder.next(state.filter_mode())? {
            Decoded::Idle => continue,
            Decoded::Resize(w, _) => {
                width = w;
                draw(&mut out, &state, opts, width)?;
            }
            Decoded::Key(key) => match state.handle(key) {
                Transition::Continue => draw(&mut out, &state, opts, width)?,
                Transition::Confirmed(indices) => break Some(indices),
                Transition::Cancelled => break None,
            },
        }
    };

    restore_terminal();
    Ok(outcome)
}

/// Repaint in place: cursor home, then clear and rewrite each line. The
/// frame has a fixed height so a shorter frame never leaves stale rows.
fn draw(out: &mut io::Stdout, state: &MenuState, opts: &MenuOptions, width: u16) -> io::Result<()> {
    let lines = render_frame(state, &opts.title, opts.color, opts.unicode, width);
    queue!(out, cursor::MoveTo(0, 0))?;
    for line in &lines {
        queue!(
            out,
            terminal::Clear(ClearType::CurrentLine),
            Print(line),
            Print("\r\n")
        )?;
    }
    out.flush()
}
