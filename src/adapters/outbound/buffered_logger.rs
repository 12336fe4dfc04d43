use crate::domains::logger::DomainLogger;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

enum Level {
    Info,
    Warn,
    Error,
}

enum LogMessage {
    Record { level: Level, msg: String },
    /// Acknowledged once every earlier record reached the bridge.
    Flush(oneshot::Sender<()>),
}

/// Non-blocking logger draining into a bridge from a background task.
pub struct BufferedLogger {
    sender: mpsc::Sender<LogMessage>,
}

impl BufferedLogger {
    fn push(&self, level: Level, msg: &str) {
        // Dropped when the buffer is full; stages never wait on logging.
        let _ = self.sender.try_send(LogMessage::Record {
            level,
            msg: msg.to_string(),
        });
    }

    /// Waits until everything logged so far has been handed to the bridge
    /// and the bridge has flushed. Call before the runtime shuts down.
    pub async fn drain(&self) {
        let (ack, done) = oneshot::channel();
        if self.sender.send(LogMessage::Flush(ack)).await.is_ok() {
            let _ = done.await;
        }
    }
}

impl DomainLogger for BufferedLogger {
    fn info(&self, msg: &str) {
        self.push(Level::Info, msg);
    }

    fn warn(&self, msg: &str) {
        self.push(Level::Warn, msg);
    }

    fn error(&self, msg: &str) {
        self.push(Level::Error, msg);
    }
}

/// Must be called inside a tokio runtime.
pub fn init_buffered_logger(bridge: Arc<dyn DomainLogger>, capacity: usize) -> Arc<BufferedLogger> {
    let (sender, mut rx) = mpsc::channel::<LogMessage>(capacity.max(1));
    tokio::spawn(async move {
        while let Some(entry) = rx.recv().await {
            match entry {
                LogMessage::Record { level: Level::Info, msg } => bridge.info(&msg),
                LogMessage::Record { level: Level::Warn, msg } => bridge.warn(&msg),
                LogMessage::Record { level: Level::Error, msg } => bridge.error(&msg),
                LogMessage::Flush(ack) => {
                    bridge.flush();
                    let _ = ack.send(());
                }
            }
        }
    });
    Arc::new(BufferedLogger { sender })
}
