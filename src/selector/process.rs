//! Child-process capability.
//!
//! The bridge only talks to the selector through [`Launcher`] and
//! [`SelectorChild`], so tests can swap the real process for a scripted one.

use std::io::{self, Read, Write};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// How long a child gets to exit after SIGTERM before it is SIGKILLed.
pub const KILL_GRACE: Duration = Duration::from_millis(250);

/// How a child finished.  `code` is `None` when it died from a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessExit {
    pub code: Option<i32>,
}

impl ProcessExit {
    pub fn success(self) -> bool {
        self.code == Some(0)
    }
}

/// Program, arguments and environment tweaks for one launch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Variables removed from the inherited environment.
    pub env_remove: Vec<String>,
}

/// Starts selector processes.
pub trait Launcher {
    type Child: SelectorChild;

    /// Start `spec` with stdin and stdout piped and stderr inherited.
    fn spawn(&self, spec: &LaunchSpec) -> io::Result<Self::Child>;
}

/// A running selector.
pub trait SelectorChild {
    /// Hand `input` to the child's stdin, closing it once everything is written.
    fn write(&mut self, input: Vec<u8>) -> io::Result<()>;

    /// Everything the child wrote to stdout.  Blocks until stdout closes, so
    /// call it after the child has exited.
    fn read(&mut self) -> io::Result<Vec<u8>>;

    fn wait(&mut self) -> io::Result<ProcessExit>;

    fn try_wait(&mut self) -> io::Result<Option<ProcessExit>>;

    /// Ask the child to stop, forcing it once [`KILL_GRACE`] has passed.
    fn kill(&mut self) -> io::Result<()>;

    /// Stop tracking the pipes.  Pending reads and writes are left to finish
    /// on their own, since a grandchild may keep them open indefinitely.
    fn detach(&mut self);
}

impl<L: Launcher> Launcher for &L {
    type Child = L::Child;

    fn spawn(&self, spec: &LaunchSpec) -> io::Result<Self::Child> {
        (**self).spawn(spec)
    }
}

// ───────────────────────────────────────── std::process ──────

/// [`Launcher`] backed by `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    type Child = SystemChild;

    fn spawn(&self, spec: &LaunchSpec) -> io::Result<SystemChild> {
        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        for key in &spec.env_remove {
            command.env_remove(key);
        }

        let mut child = command.spawn()?;

        // Drain stdout on its own thread: a large multi-selection must not
        // stall the child on a full pipe while we wait for it.
        let reader = child.stdout.take().map(|mut stdout| {
            thread::spawn(move || -> io::Result<Vec<u8>> {
                let mut buf = Vec::new();
                stdout.read_to_end(&mut buf)?;
                Ok(buf)
            })
        });

        Ok(SystemChild {
            child,
            writer: None,
            reader,
        })
    }
}

/// A child started by [`SystemLauncher`].
#[derive(Debug)]
pub struct SystemChild {
    child: Child,
    writer: Option<JoinHandle<io::Result<()>>>,
    reader: Option<JoinHandle<io::Result<Vec<u8>>>>,
}

impl SelectorChild for SystemChild {
    fn write(&mut self, input: Vec<u8>) -> io::Result<()> {
        let Some(mut stdin) = self.child.stdin.take() else {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "selector stdin already closed",
            ));
        };

        // The selector reads while it renders, so feed it from a thread and
        // let the caller go on to wait.
        self.writer = Some(thread::spawn(move || {
            match stdin.write_all(&input) {
                // The user accepted before reading everything.
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
                other => other,
            }
            // `stdin` drops here, which closes the pipe.
        }));
        Ok(())
    }

    fn read(&mut self) -> io::Result<Vec<u8>> {
        if let Some(writer) = self.writer.take() {
            join(writer)?;
        }
        match self.reader.take() {
            Some(reader) => join(reader),
            None => Ok(Vec::new()),
        }
    }

    fn wait(&mut self) -> io::Result<ProcessExit> {
        let status = self.child.wait()?;
        Ok(ProcessExit {
            code: status.code(),
        })
    }

    fn try_wait(&mut self) -> io::Result<Option<ProcessExit>> {
        Ok(self
            .child
            .try_wait()?
            .map(|status| ProcessExit { code: status.code() }))
    }

    fn kill(&mut self) -> io::Result<()> {
        // SIGTERM first: fzf catches it and tears down its UI.
        #[cfg(unix)]
        {
            if self.child.try_wait()?.is_some() {
                return Ok(());
            }
            signal(self.child.id(), libc::SIGTERM)?;
            let deadline = std::time::Instant::now() + KILL_GRACE;
            while std::time::Instant::now() < deadline {
                if self.child.try_wait()?.is_some() {
                    return Ok(());
                }
                thread::sleep(Duration::from_millis(10));
            }
            tracing::debug!(pid = self.child.id(), "selector ignored SIGTERM");
        }
        self.child.kill()
    }

    fn detach(&mut self) {
        // Dropping a JoinHandle detaches its thread.
        self.writer.take();
        self.reader.take();
    }
}

#[cfg(unix)]
fn signal(pid: u32, sig: libc::c_int) -> io::Result<()> {
    let pid = libc::pid_t::try_from(pid).map_err(io::Error::other)?;
    // SAFETY: kill(2) takes plain integers and touches no memory of ours.
    if unsafe { libc::kill(pid, sig) } == -1 {
        let err = io::Error::last_os_error();
        // Exited between the check and the signal.
        if err.raw_os_error() == Some(libc::ESRCH) {
            return Ok(());
        }
        return Err(err);
    }
    Ok(())
}

fn join<T>(handle: JoinHandle<io::Result<T>>) -> io::Result<T> {
    handle
        .join()
        .map_err(|_| io::Error::other("selector pipe thread panicked"))?
}
