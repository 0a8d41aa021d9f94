//! The interactive selector bridge.
//!
//! One call is one round trip: render the candidates, lease the terminal,
//! spawn the selector, feed it every line, wait for it, read what it printed
//! and map those lines back to the caller's values.

use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::process::{LaunchSpec, Launcher, ProcessExit, SelectorChild, SystemLauncher};
use super::terminal::{SystemTerminal, TerminalControl, TerminalLease};
use crate::config::SelectorConfig;
use crate::core::candidate::{CandidateTable, DuplicatePolicy};
use crate::core::options::FzfOptions;
use crate::error::{Error, Result};

/// fzf exits with 1 when nothing matched and 130 when the user aborted.
const CANCEL_CODES: &[i32] = &[1, 130];

/// Variables that could change fzf's output format behind our back.
const DEFAULT_OPTS_VARS: &[&str] = &["FZF_DEFAULT_OPTS", "FZF_DEFAULT_OPTS_FILE"];

/// How often a deadline-bound wait polls the child.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// What the user chose.
#[derive(Debug)]
pub struct Selection<'a, T> {
    /// Chosen candidates in the order the selector printed them, repeats kept.
    pub items: Vec<&'a T>,
    /// Final query, when [`FzfOptions::print_query`] is set.
    pub query: Option<String>,
    /// Key that accepted the selection (empty for Enter), when
    /// [`FzfOptions::expect`] lists any keys.
    pub key: Option<String>,
}

impl<'a, T> Selection<'a, T> {
    /// Nothing chosen.
    pub fn cancelled() -> Self {
        Self {
            items: Vec::new(),
            query: None,
            key: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn first(&self) -> Option<&'a T> {
        self.items.first().copied()
    }

    pub fn into_items(self) -> Vec<&'a T> {
        self.items
    }
}

/// Runs the selector over typed candidates.
#[derive(Debug, Clone)]
pub struct Selector<L = SystemLauncher, C = SystemTerminal> {
    launcher: L,
    terminal: C,
    program: String,
    options: FzfOptions,
    duplicates: DuplicatePolicy,
    inherit_default_opts: bool,
    timeout: Option<Duration>,
}

impl Selector {
    /// `fzf` from `PATH`, fzf's own defaults, no deadline.
    pub fn new() -> Self {
        Self::with_parts(SystemLauncher, SystemTerminal::default())
    }

    /// Binary, base flags and deadline taken from the user's config.
    pub fn from_config(config: &SelectorConfig) -> Self {
        let mut selector = Self::new()
            .program(config.binary.clone())
            .options(config.options())
            .inherit_default_opts(config.inherit_default_opts);
        selector.timeout = config.timeout;
        selector
    }
}

impl Default for Selector {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Launcher, C: TerminalControl> Selector<L, C> {
    /// A selector over custom process and terminal capabilities.
    pub fn with_parts(launcher: L, terminal: C) -> Self {
        Self {
            launcher,
            terminal,
            program: "fzf".to_string(),
            options: FzfOptions::default(),
            duplicates: DuplicatePolicy::default(),
            inherit_default_opts: false,
            timeout: None,
        }
    }

    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn options(mut self, options: FzfOptions) -> Self {
        self.options = options;
        self
    }

    /// Shorthand for toggling [`FzfOptions::multi`].
    pub fn multi(mut self, multi: bool) -> Self {
        self.options.multi = multi;
        self
    }

    pub fn duplicates(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }

    /// Keep `FZF_DEFAULT_OPTS` in the selector's environment.
    pub fn inherit_default_opts(mut self, inherit: bool) -> Self {
        self.inherit_default_opts = inherit;
        self
    }

    /// Kill the selector if the user hasn't finished after `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    pub fn terminal(&self) -> &C {
        &self.terminal
    }

    /// Let the user pick from `candidates`, each shown as `display(candidate)`.
    ///
    /// Cancelling (Esc, Ctrl-C, or accepting with no match) returns an empty
    /// [`Selection`].  An empty `candidates` slice returns one without
    /// launching anything.
    pub fn select<'a, T, F>(&self, candidates: &'a [T], display: F) -> Result<Selection<'a, T>>
    where
        F: Fn(&T) -> String,
    {
        let table = CandidateTable::build(candidates, display, self.duplicates)?;
        if table.is_empty() {
            debug!("no candidates, nothing to select");
            return Ok(Selection::cancelled());
        }
        if table.has_duplicates() {
            debug!("duplicate display lines, choosing one of them will fail");
        }

        let spec = self.launch_spec();
        let (exit, output) = {
            let _lease = TerminalLease::acquire(&self.terminal)?;
            self.run(&spec, table.input())?
        };
        debug!(code = ?exit.code, bytes = output.len(), "selector exited");

        match exit.code {
            Some(0) => self.parse_output(&table, &output),
            Some(code) if CANCEL_CODES.contains(&code) => {
                debug!(code, "selection cancelled");
                Ok(Selection::cancelled())
            }
            code => Err(Error::ExternalToolFailed {
                program: self.program.clone(),
                code,
            }),
        }
    }

    /// Single-choice [`select`](Self::select); `None` when cancelled.
    pub fn select_one<'a, T, F>(&self, candidates: &'a [T], display: F) -> Result<Option<&'a T>>
    where
        F: Fn(&T) -> String,
    {
        if self.options.multi {
            let single = Selector {
                launcher: &self.launcher,
                terminal: &self.terminal,
                program: self.program.clone(),
                options: self.options.clone().multi(false),
                duplicates: self.duplicates,
                inherit_default_opts: self.inherit_default_opts,
                timeout: self.timeout,
            };
            return Ok(single.select(candidates, display)?.first());
        }
        Ok(self.select(candidates, display)?.first())
    }

    fn launch_spec(&self) -> LaunchSpec {
        let mut args = self.options.to_args();
        args.extend(self.duplicates.selector_args());
        let env_remove = if self.inherit_default_opts {
            Vec::new()
        } else {
            DEFAULT_OPTS_VARS.iter().map(|v| v.to_string()).collect()
        };
        LaunchSpec {
            program: self.program.clone(),
            args,
            env_remove,
        }
    }

    /// Spawn → write → wait → read.  On every error after a successful spawn
    /// the child is killed and reaped and its pipes are let go unread.
    fn run(&self, spec: &LaunchSpec, input: Vec<u8>) -> Result<(ProcessExit, Vec<u8>)> {
        debug!(program = %spec.program, args = ?spec.args, "spawning selector");
        let mut child = self.launcher.spawn(spec).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::ExternalToolNotFound {
                    program: spec.program.clone(),
                }
            } else {
                Error::Io(e)
            }
        })?;

        if let Err(e) = child.write(input) {
            abandon(&mut child);
            return Err(e.into());
        }
        let exit = match self.wait(&mut child) {
            Ok(exit) => exit,
            Err(e) => {
                abandon(&mut child);
                return Err(e);
            }
        };
        let output = child.read()?;
        Ok((exit, output))
    }

    fn wait(&self, child: &mut L::Child) -> Result<ProcessExit> {
        let Some(timeout) = self.timeout else {
            return Ok(child.wait()?);
        };

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(exit) = child.try_wait()? {
                return Ok(exit);
            }
            let now = Instant::now();
            if now >= deadline {
                warn!(?timeout, "selector ran past its deadline, killing it");
                return Err(Error::TimedOut(timeout));
            }
            thread::sleep(POLL_INTERVAL.min(deadline - now));
        }
    }

    fn parse_output<'a, T>(
        &self,
        table: &CandidateTable<'a, T>,
        output: &[u8],
    ) -> Result<Selection<'a, T>> {
        let text = String::from_utf8_lossy(output);
        let mut lines = text.split_terminator('\n');

        let query = if self.options.print_query {
            Some(lines.next().unwrap_or_default().to_string())
        } else {
            None
        };
        let key = if self.options.expect.is_empty() {
            None
        } else {
            Some(lines.next().unwrap_or_default().to_string())
        };
        let items = table.resolve_all(lines)?;
        debug!(chosen = items.len(), "mapped selection back to candidates");

        Ok(Selection { items, query, key })
    }
}

/// Best-effort teardown of a child we no longer care about.  Never reads:
/// a grandchild holding stdout would keep the read from returning.
fn abandon<Ch: SelectorChild>(child: &mut Ch) {
    if let Err(e) = child.kill() {
        debug!(error = %e, "kill failed, selector probably already exited");
    }
    let _ = child.wait();
    child.detach();
}
