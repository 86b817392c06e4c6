//! Error types for the buffering and streaming core.
//!
//! Two enums split the failure space the way callers consume it:
//!
//! - [`BufferError`] covers structural buffer failures: an index or window
//!   outside the valid logical range, a write that capacity cannot absorb,
//!   or a block whose channel shape does not match the buffer. These are
//!   surfaced to the caller as hard results and never silently truncated;
//!   callers that want best-effort sizing use the explicit `*_up_to`
//!   operations instead.
//! - [`StreamError`] covers lifecycle and transport failures around a
//!   running pipeline: a source that cannot be opened, a send that failed,
//!   or a start/stop called in the wrong state. Transport errors are
//!   recovered locally (logged, loop continues); nothing here is fatal to
//!   the process.
//!
//! Both derive `thiserror::Error`, so `?` and `#[from]` conversions work
//! throughout the crate.

use thiserror::Error;

/// Convenience alias for buffer operation results.
pub type BufferResult<T> = std::result::Result<T, BufferError>;

/// Convenience alias for stream lifecycle and transport results.
pub type StreamResult<T> = std::result::Result<T, StreamError>;

/// Structural failure of a buffer operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// Index or window outside `[0, logical_length)`.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange {
        /// Resolved index or requested sample count.
        index: isize,
        /// Logical length at the time of the request.
        len: usize,
    },

    /// Write or growth blocked by the capacity bound.
    #[error("capacity exceeded: requested {requested}, capacity {capacity}")]
    CapacityExceeded {
        /// Total samples the operation needed room for.
        requested: usize,
        /// Bound that could not be satisfied.
        capacity: usize,
    },

    /// Incoming block's sample shape does not match: a channel count
    /// differing from the buffer's, or an interleaved vector whose length
    /// is not a multiple of the channel count.
    #[error("sample shape mismatch: expected {expected}, got {actual}")]
    LengthMismatch {
        /// Channel count required by the receiving buffer or constructor.
        expected: usize,
        /// Offending channel count or value count.
        actual: usize,
    },
}

/// Lifecycle or transport failure of a streaming component.
#[derive(Error, Debug)]
pub enum StreamError {
    /// `start()` was called while the worker is already running.
    ///
    /// Public lifecycle methods treat this as a logged no-op; the variant
    /// exists for callers that need to branch on the condition.
    #[error("stream is already running")]
    AlreadyRunning,

    /// `stop()` was called while the worker is idle.
    #[error("stream is not running")]
    NotRunning,

    /// The acquisition source could not be opened or has gone away.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// A transport send failed. Logged by the worker loop, which continues.
    #[error("send failed: {0}")]
    SendFailed(#[from] std::io::Error),

    /// A structural buffer failure bubbled up through the pipeline.
    #[error(transparent)]
    Buffer(#[from] BufferError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_errors_render_context() {
        let err = BufferError::IndexOutOfRange { index: -7, len: 5 };
        assert_eq!(err.to_string(), "index -7 out of range for length 5");

        let err = BufferError::CapacityExceeded {
            requested: 12,
            capacity: 8,
        };
        assert!(err.to_string().contains("requested 12"));

        let err = BufferError::LengthMismatch {
            expected: 16,
            actual: 2,
        };
        assert_eq!(err.to_string(), "sample shape mismatch: expected 16, got 2");
    }

    #[test]
    fn io_error_converts_to_send_failed() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "no listener");
        let err: StreamError = io.into();
        match err {
            StreamError::SendFailed(inner) => {
                assert_eq!(inner.kind(), std::io::ErrorKind::ConnectionRefused);
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn buffer_error_converts_transparently() {
        let err: StreamError = BufferError::CapacityExceeded {
            requested: 4,
            capacity: 2,
        }
        .into();
        assert_eq!(err.to_string(), "capacity exceeded: requested 4, capacity 2");
    }
}
