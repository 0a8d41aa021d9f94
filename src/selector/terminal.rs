//! Scoped terminal ownership.
//!
//! Only one selector may own the terminal at a time.  A [`TerminalLease`]
//! takes a process-wide lock, lifts any raw mode the caller holds, records
//! the tty settings the selector starts from and writes them back when
//! dropped, whichever way the selection ended.  A selector that is killed
//! mid-session cannot undo its own changes, so the lease does it.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Save and restore the terminal around a child that drives it itself.
pub trait TerminalControl {
    /// Everything needed to put the terminal back.
    type Saved;

    /// Leave any raw mode the caller holds and record the resulting settings.
    fn save(&self) -> io::Result<Self::Saved>;

    /// Write back exactly what [`save`](Self::save) recorded, raw mode included.
    fn restore(&self, saved: &Self::Saved) -> io::Result<()>;
}

impl<C: TerminalControl> TerminalControl for &C {
    type Saved = C::Saved;

    fn save(&self) -> io::Result<C::Saved> {
        (**self).save()
    }

    fn restore(&self, saved: &C::Saved) -> io::Result<()> {
        (**self).restore(saved)
    }
}

/// The controlling terminal: crossterm's raw mode plus the tty's termios.
#[derive(Debug, Clone)]
pub struct SystemTerminal {
    path: PathBuf,
}

impl SystemTerminal {
    /// Manage the tty at `path` instead of `/dev/tty`.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for SystemTerminal {
    fn default() -> Self {
        Self::at("/dev/tty")
    }
}

/// State recorded by [`SystemTerminal::save`].
pub struct SavedTerminal {
    raw: bool,
    /// `None` without a controlling terminal.
    #[cfg(unix)]
    tty: Option<termios::Snapshot>,
}

impl TerminalControl for SystemTerminal {
    type Saved = SavedTerminal;

    fn save(&self) -> io::Result<SavedTerminal> {
        let raw = crossterm::terminal::is_raw_mode_enabled()?;
        if raw {
            crossterm::terminal::disable_raw_mode()?;
        }
        Ok(SavedTerminal {
            raw,
            #[cfg(unix)]
            tty: termios::Snapshot::take(&self.path),
        })
    }

    fn restore(&self, saved: &SavedTerminal) -> io::Result<()> {
        // Cooked settings first, so crossterm records them as the mode to
        // return to when the caller later leaves raw mode.
        #[cfg(unix)]
        if let Some(tty) = &saved.tty {
            tty.apply()?;
        }
        if saved.raw {
            crossterm::terminal::enable_raw_mode()?;
        }
        Ok(())
    }
}

#[cfg(unix)]
mod termios {
    use std::fs::{File, OpenOptions};
    use std::io;
    use std::mem::MaybeUninit;
    use std::os::unix::fs::OpenOptionsExt;
    use std::os::unix::io::AsRawFd;
    use std::path::Path;

    /// A tty and the settings it had when the snapshot was taken.
    pub struct Snapshot {
        tty: File,
        mode: libc::termios,
    }

    impl Snapshot {
        pub fn take(path: &Path) -> Option<Self> {
            let tty = match OpenOptions::new()
                .read(true)
                .write(true)
                .custom_flags(libc::O_NOCTTY)
                .open(path)
            {
                Ok(tty) => tty,
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "no tty to snapshot");
                    return None;
                }
            };
            let mut mode = MaybeUninit::<libc::termios>::uninit();
            // SAFETY: the fd is open for the duration of the call and
            // tcgetattr fills `mode` completely when it returns 0.
            if unsafe { libc::tcgetattr(tty.as_raw_fd(), mode.as_mut_ptr()) } != 0 {
                tracing::debug!(
                    path = %path.display(),
                    error = %io::Error::last_os_error(),
                    "tcgetattr failed"
                );
                return None;
            }
            // SAFETY: initialised by the successful tcgetattr above.
            let mode = unsafe { mode.assume_init() };
            Some(Self { tty, mode })
        }

        pub fn apply(&self) -> io::Result<()> {
            // SAFETY: the fd is open and `mode` is a valid termios.
            if unsafe { libc::tcsetattr(self.tty.as_raw_fd(), libc::TCSANOW, &self.mode) } != 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        }
    }
}

static TERMINAL: Mutex<()> = Mutex::new(());

/// Exclusive use of the terminal until dropped.
#[must_use = "the terminal is released as soon as the lease is dropped"]
pub struct TerminalLease<'t, C: TerminalControl> {
    control: &'t C,
    saved: C::Saved,
    // Fields drop after `Drop::drop` returns, so the lock is held until the
    // terminal has been restored.
    _lock: MutexGuard<'static, ()>,
}

impl<'t, C: TerminalControl> TerminalLease<'t, C> {
    /// Block until no other lease is alive, then prepare the terminal for a
    /// child that drives it itself.
    pub fn acquire(control: &'t C) -> io::Result<Self> {
        // A panic in another selection doesn't leave the terminal in a state
        // we can't restore, so poisoning is ignored.
        let lock = TERMINAL.lock().unwrap_or_else(PoisonError::into_inner);

        let saved = control.save()?;
        let lease = Self {
            control,
            saved,
            _lock: lock,
        };

        // Whatever the caller printed must land before the selector draws.
        io::stdout().flush()?;
        io::stderr().flush()?;

        tracing::debug!("terminal leased");
        Ok(lease)
    }
}

impl<C: TerminalControl> Drop for TerminalLease<'_, C> {
    fn drop(&mut self) {
        match self.control.restore(&self.saved) {
            Ok(()) => tracing::debug!("terminal released"),
            Err(e) => tracing::warn!(error = %e, "failed to restore terminal mode"),
        }
    }
}
