//! Per-context isolation
//!
//! Every thread gets its own [`RandomState`], created lazily on first use and
//! never shared. The remaining hazard is process duplication: after `fork()`
//! the child holds a byte-for-byte copy of each thread's state and would
//! replay its parent's output.
//!
//! Two signals identify the context a record belongs to:
//!
//! - the **process id**, queried on every access, and
//! - a **fork generation**, a process-wide counter bumped by a `pthread_atfork`
//!   child handler (Unix only).
//!
//! A record whose [`ContextIdentity`] no longer matches the caller's is
//! foreign. It is dropped (which wipes it) and replaced by a freshly seeded
//! one; it is never repaired in place.

use std::cell::RefCell;
use std::sync::Once;
use std::sync::atomic::{AtomicU64, Ordering};

use super::entropy::{EntropySource, OsEntropy};
use super::params::RandomParams;
use super::state::RandomState;
use crate::os::{process_id, register_fork_child_handler};

/// Number of `fork()` calls this process descends from, as observed by the
/// child handler.
static FORK_GENERATION: AtomicU64 = AtomicU64::new(0);

static FORK_HANDLER: Once = Once::new();

extern "C" fn on_fork_child() {
    FORK_GENERATION.fetch_add(1, Ordering::SeqCst);
}

fn install_fork_handler() {
    FORK_HANDLER.call_once(|| {
        if !register_fork_child_handler(on_fork_child) {
            tracing::debug!("fork handler unavailable, relying on process id checks");
        }
    });
}

/// Identity of an execution context at a point in time.
///
/// Two identities compare equal only if they were taken in the same process
/// with no duplication in between.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContextIdentity {
    pub process_id: u32,
    pub fork_generation: u64,
}

impl ContextIdentity {
    /// Identity of the calling context.
    ///
    /// The first call in a process registers the fork handler.
    pub fn current() -> Self {
        install_fork_handler();

        Self {
            process_id: process_id(),
            fork_generation: FORK_GENERATION.load(Ordering::SeqCst),
        }
    }
}

/// Holder of at most one live [`RandomState`] for one execution context.
///
/// The slot lazily creates its record from `source` and re-validates the
/// record's owner on every access.
pub struct ContextSlot<E: EntropySource + Clone> {
    source: E,
    params: RandomParams,
    record: Option<RandomState<E>>,
}

impl<E: EntropySource + Clone> ContextSlot<E> {
    /// Creates an empty slot. Nothing is seeded until the first access.
    ///
    /// `params` is used as given; validate it first if it comes from outside.
    pub const fn new(source: E, params: RandomParams) -> Self {
        Self {
            source,
            params,
            record: None,
        }
    }

    /// Returns the record for the calling context.
    pub fn record(&mut self) -> &mut RandomState<E> {
        self.record_for(ContextIdentity::current())
    }

    /// Returns the record for the context `identity`, creating it if the
    /// slot is empty and replacing it if it belongs to another context.
    pub fn record_for(&mut self, identity: ContextIdentity) -> &mut RandomState<E> {
        if let Some(record) = &self.record {
            if record.owner() != identity {
                tracing::debug!(
                    previous_process = record.owner().process_id,
                    process_id = identity.process_id,
                    fork_generation = identity.fork_generation,
                    "discarding random state inherited across process duplication"
                );
                self.record = None;
            }
        }

        let source = &self.source;
        let params = self.params;
        self.record
            .get_or_insert_with(|| RandomState::seeded(source.clone(), params, identity))
    }

    #[cfg(test)]
    fn is_initialized(&self) -> bool {
        self.record.is_some()
    }

    #[cfg(test)]
    fn clear(&mut self) {
        self.record = None;
    }
}

thread_local! {
    static THREAD_SLOT: RefCell<ContextSlot<OsEntropy>> =
        const { RefCell::new(ContextSlot::new(OsEntropy, RandomParams::DEFAULT)) };
}

/// Runs `f` against the calling thread's random state.
///
/// `f` runs against a one-shot state seeded from the OS, wiped right after,
/// when the thread's own state cannot be reached:
///
/// - the thread-local slot has already been torn down (a call from another
///   thread-local destructor), or
/// - the slot is already borrowed further up the stack (a re-entrant call,
///   e.g. from a `tracing` subscriber reacting to one of our events).
pub(crate) fn with_thread_state<R>(mut f: impl FnMut(&mut RandomState<OsEntropy>) -> R) -> R {
    let outcome = THREAD_SLOT.try_with(|slot| match slot.try_borrow_mut() {
        Ok(mut slot) => Some(f(slot.record())),
        Err(_) => None,
    });

    match outcome {
        Ok(Some(value)) => value,
        Ok(None) => {
            tracing::trace!("thread slot in use, using a one-shot random state");
            f(&mut RandomState::new(OsEntropy))
        }
        Err(_) => {
            tracing::trace!("thread slot destroyed, using a one-shot random state");
            f(&mut RandomState::new(OsEntropy))
        }
    }
}
