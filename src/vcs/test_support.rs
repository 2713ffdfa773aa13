//! Helpers for driving process-backed collections from `#[tokio::test]`s.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::event::Event;
use crate::vcs::process::{LinkId, LinkLine, ProcessLink, Termination};

/// Upper bound for any single child used in tests.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

pub fn event_channel() -> (mpsc::UnboundedSender<Event>, mpsc::UnboundedReceiver<Event>) {
    mpsc::unbounded_channel()
}

/// Wait for the next process wake-up and return the link it names.
pub async fn next_link_event(rx: &mut mpsc::UnboundedReceiver<Event>) -> LinkId {
    loop {
        let event = tokio::time::timeout(TEST_TIMEOUT, rx.recv())
            .await
            .expect("timed out waiting for a process event")
            .expect("event channel closed");
        if let Event::Link(id) = event {
            return id;
        }
    }
}

/// Pull every line out of `link` until it reports termination.
pub async fn drain_link(
    link: &mut ProcessLink,
    rx: &mut mpsc::UnboundedReceiver<Event>,
) -> (Vec<String>, Vec<String>, Termination) {
    let mut out = Vec::new();
    let mut err = Vec::new();
    let run = async {
        loop {
            while let LinkLine::Line(line) = link.next_stdout_line() {
                out.push(line);
            }
            while let LinkLine::Line(line) = link.next_stderr_line() {
                err.push(line);
            }
            if let Some(termination) = link.poll_terminated() {
                return termination;
            }
            if rx.recv().await.is_none() {
                tokio::task::yield_now().await;
            }
        }
    };
    let termination = tokio::time::timeout(TEST_TIMEOUT, run)
        .await
        .expect("child did not terminate in time");
    (out, err, termination)
}
