// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Cache activity reporting.
//!
//! Every tier owns a [`CacheTelemetry`]. Each recorded activity is emitted as a
//! `cache.event` tracing event and, when a [`CacheListener`] is attached, forwarded to the
//! listener as a [`CacheEvent`]. Listeners are for observability only; nothing in the
//! cache layer reacts to what they do.

use std::fmt::{self, Display};
use std::sync::Arc;

/// Type alias for cache names used in telemetry.
pub type CacheName = &'static str;

/// The cache operation during which an activity happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CacheOperation {
    /// A read.
    Get,
    /// A write.
    Insert,
}

impl CacheOperation {
    /// Returns the stable string form used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "cache.get",
            Self::Insert => "cache.insert",
        }
    }
}

/// What a cache operation resulted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CacheActivity {
    /// A live entry was found.
    Hit,
    /// No entry was found.
    Miss,
    /// An entry was found but had expired and was evicted.
    Expired,
    /// An entry was stored.
    Inserted,
    /// An entry found in a lower tier was copied into a higher one.
    Promoted,
    /// The storage failed; the operation degraded to a miss or a no-op.
    Error,
}

impl CacheActivity {
    /// Returns the stable string form used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "cache.hit",
            Self::Miss => "cache.miss",
            Self::Expired => "cache.expired",
            Self::Inserted => "cache.inserted",
            Self::Promoted => "cache.promoted",
            Self::Error => "cache.error",
        }
    }
}

/// A single reported cache activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEvent {
    /// Name of the reporting tier.
    pub cache: CacheName,
    /// Operation being performed.
    pub operation: CacheOperation,
    /// Outcome of the operation.
    pub activity: CacheActivity,
    /// Human-readable description, usually naming the key or file involved.
    pub message: String,
}

impl Display for CacheEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {}: {}",
            self.cache,
            self.operation.as_str(),
            self.activity.as_str(),
            self.message
        )
    }
}

/// Receives cache events for observability.
///
/// Implemented for any `Fn(&CacheEvent)` closure.
pub trait CacheListener: Send + Sync {
    /// Called once per recorded activity.
    fn on_event(&self, event: &CacheEvent);
}

impl<F> CacheListener for F
where
    F: Fn(&CacheEvent) + Send + Sync,
{
    fn on_event(&self, event: &CacheEvent) {
        self(event);
    }
}

/// Records cache activity as tracing events and forwards it to an optional listener.
///
/// Cloning is cheap; clones share the same listener.
#[derive(Clone, Default)]
pub struct CacheTelemetry {
    listener: Option<Arc<dyn CacheListener>>,
}

impl fmt::Debug for CacheTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheTelemetry")
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

impl CacheTelemetry {
    /// Creates telemetry that only emits tracing events.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates telemetry that also forwards events to `listener`.
    #[must_use]
    pub fn with_listener(listener: impl CacheListener + 'static) -> Self {
        Self {
            listener: Some(Arc::new(listener)),
        }
    }

    /// Records one activity.
    pub fn record(&self, cache: CacheName, operation: CacheOperation, activity: CacheActivity, message: impl Display) {
        let op = operation.as_str();
        let ev = activity.as_str();
        let message = &message;

        // Tracing level must be constant, so we use a macro to select the appropriate level.
        macro_rules! emit_event {
            ($level:ident) => {
                tracing::$level!(
                    cache.name = cache,
                    cache.operation = op,
                    cache.activity = ev,
                    cache.message = %message,
                    "cache.event"
                )
            };
        }

        match activity {
            CacheActivity::Hit | CacheActivity::Miss => emit_event!(debug),
            CacheActivity::Expired | CacheActivity::Inserted | CacheActivity::Promoted => emit_event!(info),
            CacheActivity::Error => emit_event!(error),
        }

        if let Some(listener) = &self.listener {
            listener.on_event(&CacheEvent {
                cache,
                operation,
                activity,
                message: message.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use parking_lot::Mutex;
    use tracing_subscriber::fmt::MakeWriter;

    use super::*;

    #[derive(Clone, Default)]
    struct LogCapture {
        buffer: Arc<Mutex<Vec<u8>>>,
    }

    impl LogCapture {
        fn output(&self) -> String {
            String::from_utf8_lossy(&self.buffer.lock()).to_string()
        }

        fn subscriber(&self) -> impl tracing::Subscriber {
            use tracing_subscriber::layer::SubscriberExt;
            tracing_subscriber::registry().with(
                tracing_subscriber::fmt::layer()
                    .with_writer(self.clone())
                    .with_ansi(false),
            )
        }
    }

    struct LogCaptureWriter {
        buffer: Arc<Mutex<Vec<u8>>>,
    }

    impl Write for LogCaptureWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.buffer.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogCapture {
        type Writer = LogCaptureWriter;

        fn make_writer(&'a self) -> Self::Writer {
            LogCaptureWriter {
                buffer: Arc::clone(&self.buffer),
            }
        }
    }

    #[test]
    fn operation_and_activity_strings_are_stable() {
        assert_eq!(CacheOperation::Get.as_str(), "cache.get");
        assert_eq!(CacheOperation::Insert.as_str(), "cache.insert");
        assert_eq!(CacheActivity::Hit.as_str(), "cache.hit");
        assert_eq!(CacheActivity::Miss.as_str(), "cache.miss");
        assert_eq!(CacheActivity::Expired.as_str(), "cache.expired");
        assert_eq!(CacheActivity::Inserted.as_str(), "cache.inserted");
        assert_eq!(CacheActivity::Promoted.as_str(), "cache.promoted");
        assert_eq!(CacheActivity::Error.as_str(), "cache.error");
    }

    #[test]
    fn listener_receives_every_event() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let telemetry = CacheTelemetry::with_listener(move |event: &CacheEvent| sink.lock().push(event.clone()));

        telemetry.record("memory", CacheOperation::Get, CacheActivity::Miss, "key-1");
        telemetry.record("disk", CacheOperation::Insert, CacheActivity::Error, "disk full");

        let events = events.lock();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].activity, CacheActivity::Miss);
        assert_eq!(events[1].cache, "disk");
        assert_eq!(events[1].to_string(), "[disk] cache.insert cache.error: disk full");
    }

    #[test]
    fn events_are_logged_with_level_by_activity() {
        let capture = LogCapture::default();
        let _guard = tracing::subscriber::set_default(capture.subscriber());
        let telemetry = CacheTelemetry::new();

        telemetry.record("memory", CacheOperation::Get, CacheActivity::Hit, "k");
        telemetry.record("memory", CacheOperation::Get, CacheActivity::Expired, "k");
        telemetry.record("disk", CacheOperation::Get, CacheActivity::Error, "corrupt file");

        let output = capture.output();
        assert!(output.contains("DEBUG"), "{output}");
        assert!(output.contains("INFO"), "{output}");
        assert!(output.contains("ERROR"), "{output}");
        assert!(output.contains("cache.activity=\"cache.error\""), "{output}");
        assert!(output.contains("corrupt file"), "{output}");
    }

    #[test]
    fn debug_hides_listener() {
        let telemetry = CacheTelemetry::with_listener(|_: &CacheEvent| {});
        assert_eq!(format!("{telemetry:?}"), "CacheTelemetry { listener: true }");
    }
}
