// ============================================================================
// Pulsegen Library
// ============================================================================
//
// A command-gated synthetic event feed generator: commands arriving on a
// control queue open (or refresh) a work window, and a single background
// worker publishes a composed payload to a broadcast topic at a fixed
// cadence until the window runs out.

pub mod composer;
pub mod config;
pub mod consumer;
pub mod core;
pub mod publisher;
pub mod supplier;
pub mod transport;
pub mod window;

// Re-export main types for convenience
pub use composer::{LineSet, compose};
pub use config::SupplierConfig;
pub use consumer::QueueConsumer;
pub use core::{Command, QUIT, Result, SupplierError};
pub use publisher::{PeriodicPublisher, PublisherStatus};
pub use supplier::{LoopOutcome, Supplier};
pub use transport::{InMemoryTransport, Transport};
pub use window::compute_remaining;
