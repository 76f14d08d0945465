//! Action dispatch.
//!
//! The catalog names actions by string id; this module resolves them
//! through a registered-handler map and stays deliberately narrow: one
//! `execute(id, path)` entry point, no interpretation of what an entry
//! means. Elevation is encoded in the id itself with the `admin:` prefix
//! so the dispatcher and the catalog agree without extra schema.
//!
//! Id grammar: `[admin:]<verb>[:<arg>]`
//!   - `delete-path`          remove the entry's path recursively
//!   - `run-tool:<cmdline>`   run an external tool, path appended if set

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::{SweepError, SweepResult};

/// Marks an action that must run with administrator rights.
pub const ADMIN_PREFIX: &str = "admin:";

/// Resolved pieces of an action id handed to a handler.
#[derive(Debug, Clone, Copy)]
pub struct ActionContext<'a> {
    /// Argument after the verb, if the id carried one
    pub arg: Option<&'a str>,
    /// Path from the catalog entry
    pub path: Option<&'a Path>,
    /// True when the id carried the admin prefix
    pub admin: bool,
}

type Handler = Box<dyn Fn(&ActionContext<'_>) -> SweepResult<()> + Send + Sync>;

/// True when the action id requires an active privileged session.
pub fn requires_admin(id: &str) -> bool {
    id.starts_with(ADMIN_PREFIX)
}

/// String-keyed action dispatcher.
pub struct Dispatcher {
    handlers: HashMap<String, Handler>,
}

impl Dispatcher {
    /// Dispatcher with the builtin verbs registered.
    pub fn builtin() -> Self {
        let mut dispatcher = Self {
            handlers: HashMap::new(),
        };
        dispatcher.register("delete-path", delete_path);
        dispatcher.register("run-tool", run_tool);
        dispatcher
    }

    /// Register (or replace) a handler for a verb.
    pub fn register(
        &mut self,
        verb: &str,
        handler: impl Fn(&ActionContext<'_>) -> SweepResult<()> + Send + Sync + 'static,
    ) {
        self.handlers.insert(verb.to_string(), Box::new(handler));
    }

    /// Execute an action id against an optional path.
    pub fn execute(&self, id: &str, path: Option<&Path>) -> SweepResult<()> {
        let admin = requires_admin(id);
        let rest = id.strip_prefix(ADMIN_PREFIX).unwrap_or(id);
        let (verb, arg) = match rest.split_once(':') {
            Some((v, a)) => (v, Some(a)),
            None => (rest, None),
        };

        let handler = self
            .handlers
            .get(verb)
            .ok_or_else(|| SweepError::UnknownAction { id: id.to_string() })?;

        handler(&ActionContext { arg, path, admin })
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut verbs: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        verbs.sort_unstable();
        f.debug_struct("Dispatcher").field("verbs", &verbs).finish()
    }
}

/// Builtin: recursively remove the entry's path. A path that is already
/// gone counts as success.
fn delete_path(ctx: &ActionContext<'_>) -> SweepResult<()> {
    let path = ctx.path.ok_or_else(|| SweepError::MissingPath {
        id: String::from("delete-path"),
    })?;

    if ctx.admin {
        return run_elevated("rm", &["-rf", &path.to_string_lossy()]);
    }

    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path)?,
        Ok(_) => fs::remove_file(path)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Builtin: run an external tool, appending the path when present.
fn run_tool(ctx: &ActionContext<'_>) -> SweepResult<()> {
    let cmdline = ctx.arg.ok_or_else(|| SweepError::UnknownAction {
        id: String::from("run-tool"),
    })?;
    let mut parts = cmdline.split_whitespace();
    let Some(tool) = parts.next() else {
        return Err(SweepError::UnknownAction {
            id: String::from("run-tool"),
        });
    };

    let mut args: Vec<String> = parts.map(str::to_string).collect();
    if let Some(path) = ctx.path {
        args.push(path.to_string_lossy().into_owned());
    }

    if ctx.admin {
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        return run_elevated(tool, &arg_refs);
    }

    let status = Command::new(tool)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()?;
    if !status.success() {
        return Err(SweepError::ToolFailed {
            tool: tool.to_string(),
            status: status.code().unwrap_or(-1),
        });
    }
    Ok(())
}

/// Run a command through the cached sudo grant, never prompting. The
/// caller is responsible for having an active session.
fn run_elevated(tool: &str, args: &[&str]) -> SweepResult<()> {
    let status = Command::new("sudo")
        .arg("-n")
        .arg(tool)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()?;
    if !status.success() {
        return Err(SweepError::ToolFailed {
            tool: format!("sudo {}", tool),
            status: status.code().unwrap_or(-1),
        });
    }
    Ok(())
}
