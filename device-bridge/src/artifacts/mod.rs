//! Ephemeral screenshot files
//!
//! A capture allocates a scratch file, lets the device write into it and hands
//! it back for transmission. Successful captures are deleted by the cleanup
//! queue after a delay; failed captures are deleted before the error is
//! returned.

pub mod manager;
pub mod scheduler;

pub use manager::{ArtifactManager, ScreenshotArtifact};
pub use scheduler::CleanupScheduler;
