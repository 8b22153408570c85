//! Buffered, thread-safe event sink.
//!
//! Workers of the task runtime call `emit` concurrently. Appending and the
//! flush it may trigger happen under one lock, so lines never interleave
//! and a flush happens exactly when the buffer reaches capacity.

use std::fs::File;
use std::io::{BufWriter, Write};

use parking_lot::Mutex;

use crate::error::LogError;
use crate::runtime::config::LoggerConfig;
use crate::runtime::entry::LogEntry;

/// Delegation nesting seen by the code emitting an event.
///
/// The task runtime hands a context down at every task-creation boundary;
/// `delegated` is the context a newly delegated piece of work runs in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallContext {
    depth: i32,
}

impl CallContext {
    pub fn root() -> Self {
        Self { depth: 0 }
    }

    pub fn at_depth(depth: i32) -> Self {
        Self { depth }
    }

    pub fn depth(&self) -> i32 {
        self.depth
    }

    pub fn delegated(&self) -> Self {
        Self {
            depth: self.depth + 1,
        }
    }
}

struct LogBuffer<W: Write> {
    entries: Vec<LogEntry>,
    // Only `finalize` takes the sink, after the last flush.
    sink: Option<W>,
    flushes: u64,
    written: u64,
}

impl<W: Write> LogBuffer<W> {
    /// Writes every buffered entry, one per line, and empties the buffer.
    fn flush(&mut self) -> Result<(), LogError> {
        let Some(sink) = self.sink.as_mut() else {
            return Ok(());
        };
        for entry in self.entries.drain(..) {
            writeln!(sink, "{}", entry)?;
            self.written += 1;
        }
        self.flushes += 1;
        Ok(())
    }

    /// `flush`, then pushes the sink's own buffer to the OS.
    fn sync(&mut self) -> Result<(), LogError> {
        self.flush()?;
        if let Some(sink) = self.sink.as_mut() {
            sink.flush()?;
        }
        Ok(())
    }
}

impl<W: Write> Drop for LogBuffer<W> {
    fn drop(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        let pending = self.entries.len();
        if let Err(e) = self.sync() {
            tracing::error!(pending, "profiling log lost entries on drop: {}", e);
        }
    }
}

/// A profiling log writing to `W`.
pub struct Logger<W: Write + Send> {
    inner: Mutex<LogBuffer<W>>,
    capacity: usize,
}

/// The logger used by instrumented programs.
pub type FileLogger = Logger<BufWriter<File>>;

impl Logger<BufWriter<File>> {
    /// Opens (truncating) the file named by `config`.
    pub fn create(config: &LoggerConfig) -> Result<Self, LogError> {
        let path = config.output_path();
        let file = File::create(&path).map_err(|source| LogError::Open {
            path: path.display().to_string(),
            source,
        })?;
        tracing::debug!(path = %path.display(), capacity = config.capacity, "profiling log opened");
        Ok(Self::with_sink(BufWriter::new(file), config.capacity))
    }
}

impl<W: Write + Send> Logger<W> {
    /// A logger writing to `sink`, flushing every `capacity` entries.
    pub fn with_sink(sink: W, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(LogBuffer {
                entries: Vec::with_capacity(capacity),
                sink: Some(sink),
                flushes: 0,
                written: 0,
            }),
            capacity,
        }
    }

    /// Buffers `entry`, writing the whole buffer out once it is full.
    pub fn emit(&self, entry: LogEntry) -> Result<(), LogError> {
        let mut buf = self.inner.lock();
        buf.entries.push(entry);
        if buf.entries.len() >= self.capacity {
            buf.flush()?;
        }
        Ok(())
    }

    /// Records that a lazy task-creation site was reached.
    #[allow(clippy::too_many_arguments)]
    pub fn record_intrinsic(
        &self,
        version: i32,
        trip_count: u64,
        granularity: u64,
        depth: i32,
        caller_link: &str,
        source_loc: &str,
        inline_loc: &str,
    ) -> Result<(), LogError> {
        self.emit(LogEntry::Intrinsic {
            version,
            trip_count,
            granularity,
            depth,
            caller_link: caller_link.to_owned(),
            source_loc: source_loc.to_owned(),
            inline_loc: inline_loc.to_owned(),
        })
    }

    /// Records a call into a function containing task-creation sites,
    /// tagged with the caller's delegation depth.
    pub fn record_call(
        &self,
        ctx: &CallContext,
        callee_link: &str,
        callsite_loc: &str,
        caller_link: &str,
    ) -> Result<(), LogError> {
        self.emit(LogEntry::Call {
            callee_link: callee_link.to_owned(),
            callsite_loc: callsite_loc.to_owned(),
            caller_link: caller_link.to_owned(),
            depth: ctx.depth(),
        })
    }

    /// Writes out whatever is buffered, regardless of capacity.
    pub fn flush(&self) -> Result<(), LogError> {
        self.inner.lock().sync()
    }

    /// Entries waiting to be written.
    pub fn buffered(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Number of times the buffer has been written out.
    pub fn flushes(&self) -> u64 {
        self.inner.lock().flushes
    }

    /// Entries written to the sink so far.
    pub fn written(&self) -> u64 {
        self.inner.lock().written
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Final flush. Consumes the logger and hands back the sink.
    ///
    /// A logger dropped without `finalize` still writes out what it holds.
    pub fn finalize(self) -> Result<W, LogError> {
        let mut buf = self.inner.into_inner();
        buf.sync()?;
        tracing::debug!(entries = buf.written, flushes = buf.flushes, "profiling log finalized");
        buf.sink.take().ok_or(LogError::Finalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(n: usize) -> LogEntry {
        LogEntry::Call {
            callee_link: format!("f{}", n),
            callsite_loc: "main.c:1:1".into(),
            caller_link: "main".into(),
            depth: 0,
        }
    }

    #[test]
    fn flush_happens_exactly_at_capacity() {
        let logger = Logger::with_sink(Vec::new(), 3);
        logger.emit(call(0)).unwrap();
        logger.emit(call(1)).unwrap();
        assert_eq!(logger.flushes(), 0);
        assert_eq!(logger.buffered(), 2);
        logger.emit(call(2)).unwrap();
        assert_eq!(logger.flushes(), 1);
        assert_eq!(logger.buffered(), 0);
        assert_eq!(logger.written(), 3);
    }

    #[test]
    fn finalize_writes_partial_buffer() {
        let logger = Logger::with_sink(Vec::new(), 10);
        logger.emit(call(0)).unwrap();
        let out = String::from_utf8(logger.finalize().unwrap()).unwrap();
        assert_eq!(out, "calledat,f0,main.c:1:1,main,0\n");
    }

    #[test]
    fn call_context_depth() {
        let ctx = CallContext::root().delegated().delegated();
        assert_eq!(ctx.depth(), 2);
        let logger = Logger::with_sink(Vec::new(), 10);
        logger.record_call(&ctx, "g", "a.c:3:4", "f").unwrap();
        let out = String::from_utf8(logger.finalize().unwrap()).unwrap();
        assert_eq!(out, "calledat,g,a.c:3:4,f,2\n");
    }

    /// Sink that stays readable after the logger owning it is gone.
    #[derive(Clone, Default)]
    struct SharedSink(std::sync::Arc<Mutex<Vec<u8>>>);

    impl Write for SharedSink {
        fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn dropped_logger_writes_out_buffered_entries() {
        let sink = SharedSink::default();
        let logger = Logger::with_sink(sink.clone(), 10);
        logger.emit(call(0)).unwrap();
        logger.emit(call(1)).unwrap();
        drop(logger);
        let out = String::from_utf8(sink.0.lock().clone()).unwrap();
        assert_eq!(out, "calledat,f0,main.c:1:1,main,0\ncalledat,f1,main.c:1:1,main,0\n");
    }
}
