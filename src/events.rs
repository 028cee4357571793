//! Messages from a running engine to whoever started it.
//!
//! The worker emits [`RunEvent::LogLine`]s in the order the engine printed
//! them, then exactly one [`RunEvent::Completed`]. Built on
//! [`tokio::sync::mpsc`] so there is a single, ordered consumer.

use tokio::sync::mpsc;

/// One notification about a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// A line of engine output, trailing newline stripped.
    LogLine(String),
    /// The engine exited. `-1` when it was killed without an exit code.
    Completed(i32),
}

/// Sending half, owned by the worker.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<RunEvent>,
}

impl EventSender {
    /// Emit an event. Returns `false` when the receiver is gone; the run
    /// carries on regardless.
    pub fn emit(&self, event: RunEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn line(&self, line: impl Into<String>) -> bool {
        self.emit(RunEvent::LogLine(line.into()))
    }
}

/// A fresh channel for one run.
pub fn channel() -> (EventSender, mpsc::UnboundedReceiver<RunEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_arrive_in_order() {
        let (tx, mut rx) = channel();
        tx.line("first");
        tx.line("second");
        tx.emit(RunEvent::Completed(0));

        assert_eq!(rx.recv().await.unwrap(), RunEvent::LogLine("first".into()));
        assert_eq!(rx.recv().await.unwrap(), RunEvent::LogLine("second".into()));
        assert_eq!(rx.recv().await.unwrap(), RunEvent::Completed(0));
    }

    #[test]
    fn emit_without_receiver_returns_false() {
        let (tx, rx) = channel();
        drop(rx);
        assert!(!tx.emit(RunEvent::Completed(1)));
    }

    #[tokio::test]
    async fn channel_closes_when_senders_drop() {
        let (tx, mut rx) = channel();
        let tx2 = tx.clone();
        tx2.line("only");
        drop(tx);
        drop(tx2);

        assert_eq!(rx.recv().await.unwrap(), RunEvent::LogLine("only".into()));
        assert!(rx.recv().await.is_none());
    }
}
