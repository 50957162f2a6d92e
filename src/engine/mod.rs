//! Core engine: collect -> classify -> reconcile -> bet, and later
//! results -> stats.

pub mod collector;
pub mod executor;
pub mod pipeline;
pub mod reconciler;
pub mod results;
pub mod stats;
