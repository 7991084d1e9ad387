//! Asynchronous provider decorator.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::context::ContextMap;
use crate::level::Level;
use crate::provider::{LogEvent, LogProvider};

enum Command {
    Record {
        level: Level,
        logger: String,
        message: String,
        context: ContextMap,
    },
    Flush(mpsc::Sender<()>),
}

/// Decorator that moves event delivery onto a worker thread.
///
/// Callers pay only for formatting and a channel send; the wrapped
/// provider runs on the worker. `flush` blocks until every event enqueued
/// before it has been delivered and the inner provider flushed. Dropping
/// the decorator drains the queue and joins the worker.
pub struct AsyncLogProvider {
    inner: Arc<dyn LogProvider>,
    sender: Option<mpsc::Sender<Command>>,
    worker: Option<JoinHandle<()>>,
}

impl AsyncLogProvider {
    pub fn new(inner: Box<dyn LogProvider>) -> Self {
        let inner: Arc<dyn LogProvider> = Arc::from(inner);
        let (sender, receiver) = mpsc::channel();
        let worker_provider = Arc::clone(&inner);
        let worker = thread::spawn(move || worker_loop(receiver, worker_provider));
        AsyncLogProvider {
            inner,
            sender: Some(sender),
            worker: Some(worker),
        }
    }
}

fn worker_loop(receiver: mpsc::Receiver<Command>, provider: Arc<dyn LogProvider>) {
    while let Ok(command) = receiver.recv() {
        match command {
            Command::Record {
                level,
                logger,
                message,
                context,
            } => {
                provider.log(&LogEvent {
                    level,
                    logger: &logger,
                    message: format_args!("{}", message),
                    context,
                });
            }
            Command::Flush(done) => {
                provider.flush();
                let _ = done.send(());
            }
        }
    }
    provider.flush();
}

impl LogProvider for AsyncLogProvider {
    fn enabled(&self, logger: &str, level: Level) -> bool {
        self.inner.enabled(logger, level)
    }

    fn log(&self, event: &LogEvent<'_>) {
        let Some(sender) = &self.sender else {
            return;
        };
        let record = Command::Record {
            level: event.level,
            logger: event.logger.to_string(),
            message: event.message.to_string(),
            context: event.context.clone(),
        };
        if sender.send(record).is_err() {
            log::warn!("Log worker is gone, event dropped");
        }
    }

    fn flush(&self) {
        let Some(sender) = &self.sender else {
            return;
        };
        let (done, drained) = mpsc::channel();
        if sender.send(Command::Flush(done)).is_ok() {
            let _ = drained.recv();
        }
    }
}

impl Drop for AsyncLogProvider {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain and exit.
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::warn!("Log worker panicked during shutdown");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::fmt;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        records: Mutex<Vec<String>>,
        flushes: Mutex<u32>,
    }

    impl LogProvider for Recorder {
        fn enabled(&self, _logger: &str, level: Level) -> bool {
            level >= Level::Debug
        }

        fn log(&self, event: &LogEvent<'_>) {
            self.records
                .lock()
                .unwrap()
                .push(format!("{} {}", event.logger, event.message));
        }

        fn flush(&self) {
            *self.flushes.lock().unwrap() += 1;
        }
    }

    fn event<'a>(logger: &'a str, message: fmt::Arguments<'a>) -> LogEvent<'a> {
        LogEvent {
            level: Level::Info,
            logger,
            message,
            context: BTreeMap::new(),
        }
    }

    #[test]
    fn test_events_arrive_in_order_after_flush() {
        let recorder = Arc::new(Recorder::default());
        let provider = AsyncLogProvider::new(Box::new(ArcProvider(Arc::clone(&recorder))));
        for i in 0..10 {
            provider.log(&event("async", format_args!("message {}", i)));
        }
        provider.flush();
        let records = recorder.records.lock().unwrap();
        assert_eq!(records.len(), 10);
        assert_eq!(records[0], "async message 0");
        assert_eq!(records[9], "async message 9");
    }

    #[test]
    fn test_drop_drains_the_queue() {
        let recorder = Arc::new(Recorder::default());
        {
            let provider = AsyncLogProvider::new(Box::new(ArcProvider(Arc::clone(&recorder))));
            provider.log(&event("async", format_args!("last words")));
        }
        let records = recorder.records.lock().unwrap();
        assert_eq!(records.as_slice(), ["async last words"]);
    }

    #[test]
    fn test_enabled_delegates_to_inner() {
        let recorder = Arc::new(Recorder::default());
        let provider = AsyncLogProvider::new(Box::new(ArcProvider(recorder)));
        assert!(provider.enabled("async", Level::Warn));
        assert!(!provider.enabled("async", Level::Trace));
    }

    /// Shares one recorder between the test and the worker.
    struct ArcProvider(Arc<Recorder>);

    impl LogProvider for ArcProvider {
        fn enabled(&self, logger: &str, level: Level) -> bool {
            self.0.enabled(logger, level)
        }

        fn log(&self, event: &LogEvent<'_>) {
            self.0.log(event);
        }

        fn flush(&self) {
            self.0.flush();
        }
    }
}
