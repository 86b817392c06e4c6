//! Background execution units: the interval scheduler and the
//! pull-and-forward stream loop.
//!
//! Each unit owns exactly one spawned task and talks to the rest of the
//! system only through the callback or sink it drives and its
//! cancellation signal. Stopping is synchronous in effect: the stop call
//! does not return until the task has exited.

mod periodic;
mod stream;

pub use periodic::PeriodicTask;
pub use stream::StreamWorker;
