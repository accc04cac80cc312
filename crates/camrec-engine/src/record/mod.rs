//! Encoder-side video sinks reading from the shared GPU context.

mod raw_sink;
mod readback;

pub use raw_sink::RawVideoSink;
