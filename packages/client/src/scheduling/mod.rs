//! Cancellable timing utilities shared by the HTTP and duplex layers

pub mod abort;
pub mod debounce;
pub mod delay;
pub mod interval;
pub mod timer;

pub use abort::{AbortController, AbortSignal};
pub use debounce::{debounce, throttle, Debounced, Throttled};
pub use delay::{delay, race_with_timeout, until_aborted};
pub use interval::{interval, Interval, Ticks};
pub use timer::{sleep, Instant};
