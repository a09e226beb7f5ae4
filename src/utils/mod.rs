//! Utility Module
//!
//! - [`WorkerPool`]: bounded-concurrency job launcher used by every parallel
//!   stage of the renderer
//!
//! ```rust,ignore
//! use tessera::utils::WorkerPool;
//!
//! let pool = WorkerPool::new(8);
//! for i in 0..32 {
//!     pool.execute(move || println!("job {i}"));
//! }
//! pool.wait();
//! ```

pub mod worker_pool;

pub use worker_pool::{DEFAULT_LIMIT, PoolScope, WorkerPool};
