//! Wall-clock timing and time-to-sample-count translation.

mod sampling;
mod timer;

pub use sampling::{Checkpoint, SamplingClock};
pub use timer::Timer;
