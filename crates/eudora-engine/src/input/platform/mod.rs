//! Platform event translation into [`RawEvent`](crate::input::RawEvent)s.

pub mod winit;
