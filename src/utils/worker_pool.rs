//! Bounded Worker Pool
//!
//! A ticket-based concurrency limiter. The pool owns `limit` tickets; every job
//! must take one before it starts and hands it back when it finishes, so no more
//! than `limit` jobs ever run at the same time.
//!
//! Two launch styles share the same tickets:
//!
//! - [`WorkerPool::execute`] spawns a detached job that may not borrow from the
//!   caller. Pair it with [`WorkerPool::wait`].
//! - [`WorkerPool::scoped`] opens a scope whose jobs may borrow from the caller
//!   (the framebuffer, the scene, the source image of a screen pass). The scope
//!   joins every job and then runs the same barrier as [`WorkerPool::wait`].
//!
//! # Barrier Semantics
//!
//! [`WorkerPool::wait`] drains all `limit` tickets, which can only succeed once
//! every outstanding job has returned its ticket, and then refills the pool.
//! Calling `execute` concurrently with `wait` is a caller error and is not
//! detected.

use std::thread;

use flume::{Receiver, Sender};

/// Concurrency limit used when a pool is created with a limit of zero.
pub const DEFAULT_LIMIT: usize = 100;

/// Capacity token. Holding one grants the right to run a single job.
#[derive(Debug, Clone, Copy, Default)]
struct Ticket;

/// Returns its ticket to the pool when dropped, including during unwinding
/// from a panicking job.
struct TicketGuard {
    ticket: Ticket,
    sender: Sender<Ticket>,
}

impl Drop for TicketGuard {
    fn drop(&mut self) {
        // The pool keeps a receiver alive for its whole lifetime, and a dropped
        // pool has nobody left to hand the ticket to.
        let _ = self.sender.send(self.ticket);
    }
}

/// Bounded-concurrency job launcher with a synchronous drain/reset barrier.
#[derive(Debug)]
pub struct WorkerPool {
    limit: usize,
    sender: Sender<Ticket>,
    receiver: Receiver<Ticket>,
}

impl WorkerPool {
    /// Creates a pool admitting `limit` concurrent jobs.
    ///
    /// A limit of zero falls back to [`DEFAULT_LIMIT`].
    #[must_use]
    pub fn new(limit: usize) -> Self {
        let limit = if limit == 0 { DEFAULT_LIMIT } else { limit };
        let (sender, receiver) = flume::bounded(limit);
        let pool = Self {
            limit,
            sender,
            receiver,
        };
        pool.refill();
        pool
    }

    /// Returns the maximum number of concurrently running jobs.
    #[inline]
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Returns the number of tickets currently available.
    #[inline]
    #[must_use]
    pub fn available(&self) -> usize {
        self.receiver.len()
    }

    /// Blocks until a ticket is available, then runs `job` on its own thread.
    ///
    /// The ticket is returned when `job` finishes, whether it returns normally
    /// or panics.
    pub fn execute<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let guard = self.acquire();
        thread::spawn(move || {
            let _guard = guard;
            job();
        });
    }

    /// Blocks until every ticket is back, then resets the pool to a fresh full
    /// ticket set.
    pub fn wait(&self) {
        for _ in 0..self.limit {
            // `recv` only fails once every sender is gone, and `self` holds one.
            let _ = self.receiver.recv();
        }
        self.refill();
        log::trace!("worker pool drained and refilled ({} tickets)", self.limit);
    }

    /// Runs `f` with a [`PoolScope`] whose jobs may borrow from the caller's
    /// stack. Every job is joined and the pool is drained and refilled before
    /// this returns.
    ///
    /// If a job panics, the panic is propagated after all jobs have finished;
    /// tickets are still returned.
    pub fn scoped<'env, F, R>(&'env self, f: F) -> R
    where
        F: for<'scope> FnOnce(&PoolScope<'scope, 'env>) -> R,
    {
        let result = thread::scope(|scope| {
            let pool_scope = PoolScope { pool: self, scope };
            f(&pool_scope)
        });
        self.wait();
        result
    }

    fn acquire(&self) -> TicketGuard {
        let ticket = self.receiver.recv().unwrap_or_default();
        TicketGuard {
            ticket,
            sender: self.sender.clone(),
        }
    }

    fn refill(&self) {
        // Drop any stray tickets so the pool holds exactly `limit` afterwards.
        while self.receiver.try_recv().is_ok() {}
        for _ in 0..self.limit {
            let _ = self.sender.try_send(Ticket);
        }
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        let threads = thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
        Self::new(threads)
    }
}

/// A launch scope handed out by [`WorkerPool::scoped`].
pub struct PoolScope<'scope, 'env: 'scope> {
    pool: &'scope WorkerPool,
    scope: &'scope thread::Scope<'scope, 'env>,
}

impl<'scope, 'env> PoolScope<'scope, 'env> {
    /// Blocks until a ticket is available, then runs `job` on a scoped thread.
    pub fn execute<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'scope,
    {
        let guard = self.pool.acquire();
        self.scope.spawn(move || {
            let _guard = guard;
            job();
        });
    }

    /// Returns the pool this scope launches on.
    #[inline]
    #[must_use]
    pub fn pool(&self) -> &WorkerPool {
        self.pool
    }
}
