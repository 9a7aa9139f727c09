//! Processor implementations
//!
//! Contains DemoProcessor.

mod demo;

pub use self::demo::DemoProcessor;
