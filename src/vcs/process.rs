//! Child process supervision: spawning, line channels, kill and termination.
//!
//! A [`ProcessLink`] owns one `/bin/sh -c` child. Its stdout and stderr are
//! read by two independent tasks that split them into lines; the owner pulls
//! lines without blocking and is woken through [`Event::Link`] whenever
//! something new is available. Termination is reported once, after both
//! channels are closed and the exit status is known.
//!
//! Each child leads its own process group, and a kill signals the whole
//! group so commands started by the shell die with it.

use std::fmt;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};

use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::event::Event;

static NEXT_LINK_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one spawned child, unique for the life of the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkId(u64);

impl LinkId {
    fn next() -> Self {
        Self(NEXT_LINK_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Result of a non-blocking read from one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkLine {
    Line(String),
    Pending,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Running,
    Terminated,
}

/// How the child ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Termination {
    /// Exit code; `None` if the child was killed by a signal or never reaped.
    pub code: Option<i32>,
    pub success: bool,
}

impl Termination {
    fn from_status(status: Option<ExitStatus>) -> Self {
        match status {
            Some(status) => Self {
                code: status.code(),
                success: status.success(),
            },
            None => Self {
                code: None,
                success: false,
            },
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit status {}", code),
            None => write!(f, "terminated by signal"),
        }
    }
}

/// One supervised child process.
pub struct ProcessLink {
    id: LinkId,
    command: String,
    state: LinkState,
    stdout_rx: Option<mpsc::UnboundedReceiver<String>>,
    stderr_rx: Option<mpsc::UnboundedReceiver<String>>,
    exit_rx: Option<oneshot::Receiver<Option<ExitStatus>>>,
    kill_tx: Option<oneshot::Sender<()>>,
    readers: Vec<JoinHandle<()>>,
}

impl ProcessLink {
    /// Spawn `command` through the shell with both streams delivered as lines.
    pub fn spawn(
        command: &str,
        cwd: Option<&Path>,
        notify: mpsc::UnboundedSender<Event>,
    ) -> Result<Self> {
        Self::spawn_inner(command, cwd, None, notify)
    }

    /// Spawn `command` with stdout redirected into `stdout_file`.
    ///
    /// The stdout channel is closed from the start; stderr is still
    /// delivered as lines.
    pub fn spawn_to_file(
        command: &str,
        cwd: Option<&Path>,
        stdout_file: std::fs::File,
        notify: mpsc::UnboundedSender<Event>,
    ) -> Result<Self> {
        Self::spawn_inner(command, cwd, Some(stdout_file), notify)
    }

    fn spawn_inner(
        command: &str,
        cwd: Option<&Path>,
        stdout_file: Option<std::fs::File>,
        notify: mpsc::UnboundedSender<Event>,
    ) -> Result<Self> {
        let id = LinkId::next();

        let mut cmd = Command::new("/bin/sh");
        cmd.arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stderr(Stdio::piped())
            .process_group(0)
            .kill_on_drop(true);
        match stdout_file {
            Some(file) => cmd.stdout(Stdio::from(file)),
            None => cmd.stdout(Stdio::piped()),
        };
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|source| AppError::Spawn {
            command: command.to_string(),
            source,
        })?;
        let pgid = child.id();
        info!(link = %id, command, pgid = ?pgid, "spawned child");

        let mut readers = Vec::with_capacity(2);
        let mut done = Vec::with_capacity(2);

        let stdout_rx = match child.stdout.take() {
            Some(stdout) => {
                let (tx, rx) = mpsc::unbounded_channel();
                let (done_tx, done_rx) = oneshot::channel();
                readers.push(spawn_reader(id, "stdout", stdout, tx, done_tx, notify.clone()));
                done.push(done_rx);
                Some(rx)
            }
            None => None,
        };

        let stderr_rx = match child.stderr.take() {
            Some(stderr) => {
                let (tx, rx) = mpsc::unbounded_channel();
                let (done_tx, done_rx) = oneshot::channel();
                readers.push(spawn_reader(id, "stderr", stderr, tx, done_tx, notify.clone()));
                done.push(done_rx);
                Some(rx)
            }
            None => None,
        };

        let (kill_tx, kill_rx) = oneshot::channel::<()>();
        let (exit_tx, exit_rx) = oneshot::channel();

        tokio::spawn(async move {
            let status = tokio::select! {
                status = child.wait() => status.ok(),
                _ = kill_rx => {
                    if let Some(pgid) = pgid {
                        kill_group(pgid);
                    }
                    let _ = child.kill().await;
                    None
                }
            };
            for rx in done {
                let _ = rx.await;
            }
            let _ = exit_tx.send(status);
            let _ = notify.send(Event::Link(id));
        });

        Ok(Self {
            id,
            command: command.to_string(),
            state: LinkState::Running,
            stdout_rx,
            stderr_rx,
            exit_rx: Some(exit_rx),
            kill_tx: Some(kill_tx),
            readers,
        })
    }

    pub fn id(&self) -> LinkId {
        self.id
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    #[cfg(test)]
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Next complete stdout line, without blocking.
    pub fn next_stdout_line(&mut self) -> LinkLine {
        next_from(&mut self.stdout_rx)
    }

    /// Next complete stderr line, without blocking.
    pub fn next_stderr_line(&mut self) -> LinkLine {
        next_from(&mut self.stderr_rx)
    }

    /// Report termination exactly once.
    ///
    /// Returns `None` while either channel still has undelivered lines or
    /// the exit status is not yet known.
    pub fn poll_terminated(&mut self) -> Option<Termination> {
        if self.state == LinkState::Terminated
            || self.stdout_rx.is_some()
            || self.stderr_rx.is_some()
        {
            return None;
        }

        let rx = self.exit_rx.as_mut()?;
        match rx.try_recv() {
            Ok(status) => {
                let termination = Termination::from_status(status);
                self.finish();
                info!(link = %self.id, %termination, "child terminated");
                Some(termination)
            }
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => {
                self.finish();
                Some(Termination::from_status(None))
            }
        }
    }

    /// Terminate the child immediately and discard undelivered lines.
    ///
    /// Idempotent. A killed link never reports termination.
    pub fn kill(&mut self) {
        if self.state == LinkState::Terminated {
            return;
        }
        if let Some(tx) = self.kill_tx.take() {
            let _ = tx.send(());
        }
        for reader in self.readers.drain(..) {
            reader.abort();
        }
        self.stdout_rx = None;
        self.stderr_rx = None;
        self.exit_rx = None;
        self.state = LinkState::Terminated;
        debug!(link = %self.id, "killed child");
    }

    fn finish(&mut self) {
        self.state = LinkState::Terminated;
        self.exit_rx = None;
        self.kill_tx = None;
        self.readers.clear();
    }
}

impl Drop for ProcessLink {
    fn drop(&mut self) {
        self.kill();
    }
}

impl fmt::Debug for ProcessLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessLink")
            .field("id", &self.id)
            .field("command", &self.command)
            .field("state", &self.state)
            .finish()
    }
}

/// SIGKILL every process in the group led by `pgid`.
fn kill_group(pgid: u32) {
    let Ok(raw) = i32::try_from(pgid) else {
        return;
    };
    if let Err(e) = killpg(Pid::from_raw(raw), Signal::SIGKILL) {
        debug!(pgid, error = %e, "process group already gone");
    }
}

fn next_from(rx: &mut Option<mpsc::UnboundedReceiver<String>>) -> LinkLine {
    let Some(receiver) = rx.as_mut() else {
        return LinkLine::Closed;
    };
    match receiver.try_recv() {
        Ok(line) => LinkLine::Line(line),
        Err(TryRecvError::Empty) => LinkLine::Pending,
        Err(TryRecvError::Disconnected) => {
            *rx = None;
            LinkLine::Closed
        }
    }
}

/// Read `stream` line by line into `tx`, waking the owner for each line.
///
/// Invalid UTF-8 is replaced rather than treated as an error; an I/O error
/// closes this channel early without touching the other one.
fn spawn_reader<R>(
    id: LinkId,
    channel: &'static str,
    stream: R,
    tx: mpsc::UnboundedSender<String>,
    done: oneshot::Sender<()>,
    notify: mpsc::UnboundedSender<Event>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    while matches!(buf.last(), Some(b'\n') | Some(b'\r')) {
                        buf.pop();
                    }
                    let line = String::from_utf8_lossy(&buf).into_owned();
                    if tx.send(line).is_err() {
                        break;
                    }
                    let _ = notify.send(Event::Link(id));
                }
                Err(e) => {
                    let err = AppError::Channel(format!("{} of {}: {}", channel, id, e));
                    warn!(link = %id, channel, error = %err, "channel closed early");
                    break;
                }
            }
        }
        // Close the channel before signalling, so that once termination is
        // visible the owner can always observe `Closed`.
        drop(tx);
        let _ = done.send(());
        let _ = notify.send(Event::Link(id));
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vcs::test_support::{drain_link, event_channel};
    use std::time::Duration;

    #[tokio::test]
    async fn delivers_both_channels_in_order() {
        let (tx, mut rx) = event_channel();
        let mut link = ProcessLink::spawn(
            "printf 'one\\ntwo\\nthree\\n'; echo oops >&2; echo again >&2",
            None,
            tx,
        )
        .unwrap();

        let (out, err, term) = drain_link(&mut link, &mut rx).await;
        assert_eq!(out, vec!["one", "two", "three"]);
        assert_eq!(err, vec!["oops", "again"]);
        assert!(term.success);
        assert_eq!(term.code, Some(0));
        assert_eq!(link.state(), LinkState::Terminated);
    }

    #[tokio::test]
    async fn last_line_without_newline_is_delivered() {
        let (tx, mut rx) = event_channel();
        let mut link = ProcessLink::spawn("printf 'a\\nb'", None, tx).unwrap();
        let (out, _, _) = drain_link(&mut link, &mut rx).await;
        assert_eq!(out, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn reports_failure_exit_code() {
        let (tx, mut rx) = event_channel();
        let mut link = ProcessLink::spawn("echo bad >&2; exit 3", None, tx).unwrap();
        let (out, err, term) = drain_link(&mut link, &mut rx).await;
        assert!(out.is_empty());
        assert_eq!(err, vec!["bad"]);
        assert!(!term.success);
        assert_eq!(term.code, Some(3));
    }

    #[tokio::test]
    async fn termination_reported_once() {
        let (tx, mut rx) = event_channel();
        let mut link = ProcessLink::spawn("true", None, tx).unwrap();
        drain_link(&mut link, &mut rx).await;
        assert_eq!(link.poll_terminated(), None);
    }

    #[tokio::test]
    async fn runs_in_working_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "").unwrap();
        let (tx, mut rx) = event_channel();
        let mut link = ProcessLink::spawn("ls", Some(dir.path()), tx).unwrap();
        let (out, _, _) = drain_link(&mut link, &mut rx).await;
        assert_eq!(out, vec!["marker.txt"]);
    }

    #[tokio::test]
    async fn missing_working_directory_is_spawn_error() {
        let (tx, _rx) = event_channel();
        let result = ProcessLink::spawn("true", Some(Path::new("/no/such/dir/here")), tx);
        assert!(matches!(result, Err(AppError::Spawn { .. })));
    }

    #[tokio::test]
    async fn stdout_to_file_closes_stdout_channel() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out.txt");
        let file = std::fs::File::create(&path).unwrap();
        let (tx, mut rx) = event_channel();
        let mut link =
            ProcessLink::spawn_to_file("echo captured; echo warn >&2", None, file, tx).unwrap();

        assert_eq!(link.next_stdout_line(), LinkLine::Closed);
        let (out, err, term) = drain_link(&mut link, &mut rx).await;
        assert!(out.is_empty());
        assert_eq!(err, vec!["warn"]);
        assert!(term.success);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "captured\n");
    }

    #[tokio::test]
    async fn kill_is_idempotent_and_discards_lines() {
        let (tx, mut rx) = event_channel();
        let mut link = ProcessLink::spawn("echo early; sleep 30", None, tx).unwrap();

        // wait for the first line to be buffered
        let _ = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await;
        link.kill();
        link.kill();

        assert_eq!(link.state(), LinkState::Terminated);
        assert_eq!(link.next_stdout_line(), LinkLine::Closed);
        assert_eq!(link.next_stderr_line(), LinkLine::Closed);
        assert_eq!(link.poll_terminated(), None);
    }

    /// Whether `pid` has exited; a zombie awaiting its reaper counts as gone.
    fn is_gone(pid: &str) -> bool {
        match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
            Ok(stat) => stat
                .rsplit(')')
                .next()
                .map(|rest| rest.trim_start().starts_with('Z'))
                .unwrap_or(false),
            Err(_) => true,
        }
    }

    #[tokio::test]
    async fn kill_takes_shell_children_with_it() {
        let (tx, mut rx) = event_channel();
        let mut link = ProcessLink::spawn("sleep 47 & echo $!; wait", None, tx).unwrap();

        let grandchild = loop {
            let _ = tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .expect("no output from the shell");
            if let LinkLine::Line(pid) = link.next_stdout_line() {
                break pid;
            }
        };
        assert!(!is_gone(&grandchild));

        link.kill();

        let mut gone = false;
        for _ in 0..50 {
            if is_gone(&grandchild) {
                gone = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(gone, "pid {grandchild} survived the kill");
    }

    #[tokio::test]
    async fn link_ids_are_unique() {
        let (tx, _rx) = event_channel();
        let a = ProcessLink::spawn("true", None, tx.clone()).unwrap();
        let b = ProcessLink::spawn("true", None, tx).unwrap();
        assert_ne!(a.id(), b.id());
    }
}
