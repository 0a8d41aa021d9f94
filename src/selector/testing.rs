//! Scripted stand-ins for the process and terminal capabilities.

use std::cell::{Cell, RefCell};
use std::io;
use std::rc::Rc;

use super::process::{LaunchSpec, Launcher, ProcessExit, SelectorChild};
use super::terminal::TerminalControl;

// ───────────────────────────────────────── terminal ──────────

pub struct FakeTerminal {
    raw: Cell<bool>,
    changes: Cell<usize>,
}

impl FakeTerminal {
    pub fn new(raw: bool) -> Self {
        Self {
            raw: Cell::new(raw),
            changes: Cell::new(0),
        }
    }

    pub fn raw(&self) -> bool {
        self.raw.get()
    }

    pub fn mode_changes(&self) -> usize {
        self.changes.get()
    }

    /// Flip the mode the way a child would, behind the lease's back.
    pub fn set_raw(&self, raw: bool) {
        self.raw.set(raw);
        self.changes.set(self.changes.get() + 1);
    }
}

impl TerminalControl for FakeTerminal {
    /// Whether the terminal was raw when saved.
    type Saved = bool;

    fn save(&self) -> io::Result<bool> {
        let was_raw = self.raw.get();
        if was_raw {
            self.set_raw(false);
        }
        Ok(was_raw)
    }

    fn restore(&self, saved: &bool) -> io::Result<()> {
        if self.raw.get() != *saved {
            self.set_raw(*saved);
        }
        Ok(())
    }
}

/// A pseudo-terminal pair.  The leader stays open so the follower at
/// [`path`](Self::path) keeps working.
#[cfg(target_os = "linux")]
pub struct Pty {
    _leader: std::fs::File,
    path: std::path::PathBuf,
}

#[cfg(target_os = "linux")]
impl Pty {
    pub fn open() -> Self {
        use std::ffi::CStr;
        use std::os::unix::io::FromRawFd;

        // SAFETY: plain libc calls on a fd we own; `name` outlives ptsname_r
        // and is NUL-terminated on success.
        unsafe {
            let fd = libc::posix_openpt(libc::O_RDWR | libc::O_NOCTTY);
            assert!(fd >= 0, "posix_openpt: {}", io::Error::last_os_error());
            let leader = std::fs::File::from_raw_fd(fd);
            assert_eq!(libc::grantpt(fd), 0);
            assert_eq!(libc::unlockpt(fd), 0);
            let mut name = [0 as libc::c_char; 128];
            assert_eq!(libc::ptsname_r(fd, name.as_mut_ptr(), name.len()), 0);
            let path = CStr::from_ptr(name.as_ptr()).to_str().unwrap().into();
            Self {
                _leader: leader,
                path,
            }
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    pub fn local_flags(&self) -> libc::tcflag_t {
        self.with_termios(|_| ()).c_lflag
    }

    pub fn set_local_flags(&self, flags: libc::tcflag_t) {
        self.with_termios(|mode| mode.c_lflag = flags);
    }

    fn with_termios(&self, change: impl FnOnce(&mut libc::termios)) -> libc::termios {
        use std::os::unix::fs::OpenOptionsExt;
        use std::os::unix::io::AsRawFd;

        let follower = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY)
            .open(&self.path)
            .unwrap();
        // SAFETY: the fd is open; termios is plain data filled by tcgetattr.
        unsafe {
            let mut mode: libc::termios = std::mem::zeroed();
            assert_eq!(libc::tcgetattr(follower.as_raw_fd(), &mut mode), 0);
            change(&mut mode);
            assert_eq!(
                libc::tcsetattr(follower.as_raw_fd(), libc::TCSANOW, &mode),
                0
            );
            mode
        }
    }
}

// ───────────────────────────────────────── process ───────────

#[derive(Clone, Default)]
enum Behaviour {
    #[default]
    Exit,
    Missing,
    /// Never exits on its own.
    Hang,
}

/// Launches [`FakeChild`]ren that print a fixed output and exit with a fixed code.
#[derive(Default)]
pub struct FakeLauncher {
    behaviour: Behaviour,
    output: Vec<u8>,
    code: Option<i32>,
    spawned: RefCell<Vec<LaunchSpec>>,
    input: Rc<RefCell<Vec<u8>>>,
    killed: Rc<Cell<bool>>,
    detached: Rc<Cell<bool>>,
}

impl FakeLauncher {
    pub fn printing(output: &str, code: i32) -> Self {
        Self {
            output: output.as_bytes().to_vec(),
            code: Some(code),
            ..Self::default()
        }
    }

    pub fn missing() -> Self {
        Self {
            behaviour: Behaviour::Missing,
            ..Self::default()
        }
    }

    pub fn hanging() -> Self {
        Self {
            behaviour: Behaviour::Hang,
            ..Self::default()
        }
    }

    /// What the bridge wrote to stdin.
    pub fn input(&self) -> String {
        String::from_utf8(self.input.borrow().clone()).unwrap()
    }

    pub fn spawn_count(&self) -> usize {
        self.spawned.borrow().len()
    }

    pub fn last_spec(&self) -> LaunchSpec {
        self.spawned.borrow().last().cloned().unwrap()
    }

    pub fn killed(&self) -> bool {
        self.killed.get()
    }

    pub fn detached(&self) -> bool {
        self.detached.get()
    }
}

impl Launcher for FakeLauncher {
    type Child = FakeChild;

    fn spawn(&self, spec: &LaunchSpec) -> io::Result<FakeChild> {
        self.spawned.borrow_mut().push(spec.clone());
        if matches!(self.behaviour, Behaviour::Missing) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such file"));
        }
        Ok(FakeChild {
            hang: matches!(self.behaviour, Behaviour::Hang),
            output: self.output.clone(),
            code: self.code,
            input: Rc::clone(&self.input),
            killed: Rc::clone(&self.killed),
            detached: Rc::clone(&self.detached),
        })
    }
}

pub struct FakeChild {
    hang: bool,
    output: Vec<u8>,
    code: Option<i32>,
    input: Rc<RefCell<Vec<u8>>>,
    killed: Rc<Cell<bool>>,
    detached: Rc<Cell<bool>>,
}

impl FakeChild {
    fn exit(&self) -> ProcessExit {
        if self.killed.get() {
            ProcessExit { code: None }
        } else {
            ProcessExit { code: self.code }
        }
    }
}

impl SelectorChild for FakeChild {
    fn write(&mut self, input: Vec<u8>) -> io::Result<()> {
        self.input.borrow_mut().extend(input);
        Ok(())
    }

    fn read(&mut self) -> io::Result<Vec<u8>> {
        assert!(!self.hang || self.detached.get(), "read would block on a hung child");
        if self.killed.get() || self.detached.get() {
            return Ok(Vec::new());
        }
        Ok(self.output.clone())
    }

    fn wait(&mut self) -> io::Result<ProcessExit> {
        assert!(
            !self.hang || self.killed.get(),
            "blocking wait on a child that never exits"
        );
        Ok(self.exit())
    }

    fn try_wait(&mut self) -> io::Result<Option<ProcessExit>> {
        if self.hang && !self.killed.get() {
            return Ok(None);
        }
        Ok(Some(self.exit()))
    }

    fn kill(&mut self) -> io::Result<()> {
        self.killed.set(true);
        Ok(())
    }

    fn detach(&mut self) {
        self.detached.set(true);
    }
}
