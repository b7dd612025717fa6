//! State module for tracking crawl progress
//!
//! This module provides the in-memory state behind the frontier.
//!
//! # Components
//!
//! - `DomainQueue`: Pending URLs and last access time for one domain
//! - `FrontierState`: All domain queues plus the seen, checked-out and completed sets

mod domain_queue;
mod frontier_state;

// Re-export main types
pub use domain_queue::DomainQueue;
pub use frontier_state::FrontierState;
