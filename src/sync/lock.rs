//! Reference-counted lock that cannot be torn down while held.
//!
//! A [`Lock`] is a cheap handle: cloning it (or calling [`Lock::retain`]) adds
//! a reference, dropping it removes one, and the underlying state is freed
//! when the last reference goes away. Every acquisition takes a reference of
//! its own *before* it starts waiting and gives it back only after the lock
//! has been released, so the number of acquisition-held references always
//! equals [`Lock::lock_count`]. Other threads may drop every handle they own
//! while the lock is held; the state stays alive until the holder unlocks.
//!
//! Two ways to hold the lock are offered:
//!
//! - **Guarded**: [`Lock::lock`] / [`Lock::try_lock`] return a [`LockGuard`]
//!   that owns the acquisition reference and unlocks on drop.
//! - **Unguarded**: [`Lock::acquire`] / [`Lock::try_acquire`] paired with
//!   [`Lock::unlock`], for call sites where the release happens in a
//!   different scope. The acquisition reference is parked inside the lock.
//!
//! Unlocking a lock that is not held, or unlocking from a thread that does not
//! hold it, is a programming error and panics. The check is always enabled.
//!
//! # Example
//!
//! ```
//! use airwire::sync::{Discipline, Lock};
//!
//! let lock = Lock::new(Discipline::Reentrant);
//! let outer = lock.lock();
//! let inner = lock.lock();
//! assert_eq!(lock.lock_count(), 2);
//! drop(inner);
//! drop(outer);
//! assert!(!lock.is_locked());
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use parking_lot::{Condvar, Mutex};
use tracing::trace;

/// Acquisition discipline of a [`Lock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Discipline {
    /// Only one acquisition at a time. A holder that locks again blocks
    /// forever.
    #[default]
    Exclusive,
    /// The holding thread may acquire again; each acquisition needs a
    /// matching release.
    Reentrant,
}

#[derive(Default)]
struct LockState {
    owner: Option<ThreadId>,
    /// Reentrancy depth. Kept for the exclusive discipline too (0 or 1).
    lock_count: u32,
    /// Name of the holding thread, for diagnostics.
    holder: Option<String>,
    /// References taken by unguarded acquisitions.
    retained: Vec<Lock>,
}

struct Inner {
    discipline: Discipline,
    state: Mutex<LockState>,
    available: Condvar,
}

impl Drop for Inner {
    fn drop(&mut self) {
        debug_assert_eq!(self.state.get_mut().lock_count, 0);
        trace!(discipline = ?self.discipline, "lock torn down");
    }
}

/// Handle to a shared lock. See the [module documentation](self).
#[derive(Clone)]
pub struct Lock {
    inner: Arc<Inner>,
}

impl Lock {
    /// Creates an unlocked lock with the given discipline.
    pub fn new(discipline: Discipline) -> Self {
        Self {
            inner: Arc::new(Inner {
                discipline,
                state: Mutex::new(LockState::default()),
                available: Condvar::new(),
            }),
        }
    }

    pub fn exclusive() -> Self {
        Self::new(Discipline::Exclusive)
    }

    pub fn reentrant() -> Self {
        Self::new(Discipline::Reentrant)
    }

    /// Adds a reference and returns it as a new handle.
    pub fn retain(&self) -> Lock {
        self.clone()
    }

    /// Gives up this handle's reference.
    ///
    /// Returns `true` when it was the last one and the lock has been torn
    /// down. A held lock is never torn down here because its holder owns a
    /// reference.
    pub fn release(self) -> bool {
        Arc::into_inner(self.inner).is_some()
    }

    /// Blocks until the lock is granted and returns a guard that releases it
    /// on drop.
    pub fn lock(&self) -> LockGuard {
        // Take the acquisition reference before waiting.
        let retained = self.retain();
        retained.wait_and_grant(None);
        LockGuard::new(retained)
    }

    /// Acquires the lock if it is free (or already held by this thread under
    /// the reentrant discipline). Never blocks.
    pub fn try_lock(&self) -> Option<LockGuard> {
        let retained = self.retain();
        if retained.try_grant(None) {
            Some(LockGuard::new(retained))
        } else {
            None
        }
    }

    /// Blocks until the lock is granted. Must be paired with [`Lock::unlock`]
    /// on the same thread.
    pub fn acquire(&self) {
        self.wait_and_grant(Some(self.retain()));
    }

    /// Non-blocking form of [`Lock::acquire`]. On success the acquisition
    /// must be paired with [`Lock::unlock`].
    pub fn try_acquire(&self) -> bool {
        self.try_grant(Some(self.retain()))
    }

    /// Releases one unguarded acquisition made by this thread.
    ///
    /// # Panics
    ///
    /// If the lock is not held, if the calling thread is not the holder, or
    /// if every outstanding acquisition belongs to a [`LockGuard`].
    pub fn unlock(&self) {
        let retained = self.ungrant(true);
        // Dropped after the state mutex is released.
        drop(retained);
    }

    pub fn discipline(&self) -> Discipline {
        self.inner.discipline
    }

    /// Current reentrancy depth.
    pub fn lock_count(&self) -> u32 {
        self.inner.state.lock().lock_count
    }

    pub fn is_locked(&self) -> bool {
        self.lock_count() > 0
    }

    /// Name of the thread holding the lock, or its id when unnamed.
    pub fn holder(&self) -> Option<String> {
        self.inner.state.lock().holder.clone()
    }

    /// Number of live references, including those held by acquisitions.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    fn can_grant(&self, state: &LockState, me: ThreadId) -> bool {
        match state.owner {
            None => true,
            Some(owner) => owner == me && self.inner.discipline == Discipline::Reentrant,
        }
    }

    fn wait_and_grant(&self, retained: Option<Lock>) {
        let me = thread::current().id();
        let mut state = self.inner.state.lock();
        while !self.can_grant(&state, me) {
            self.inner.available.wait(&mut state);
        }
        self.grant(&mut state, me, retained);
    }

    fn try_grant(&self, retained: Option<Lock>) -> bool {
        let me = thread::current().id();
        let mut state = self.inner.state.lock();
        if !self.can_grant(&state, me) {
            return false;
        }
        self.grant(&mut state, me, retained);
        true
    }

    fn grant(&self, state: &mut LockState, me: ThreadId, retained: Option<Lock>) {
        state.owner = Some(me);
        state.lock_count += 1;
        if let Some(retained) = retained {
            state.retained.push(retained);
        }
        if state.holder.is_none() {
            state.holder = Some(holder_name());
        }
        trace!(
            discipline = ?self.inner.discipline,
            depth = state.lock_count,
            "lock acquired"
        );
    }

    fn ungrant(&self, unguarded: bool) -> Option<Lock> {
        let me = thread::current().id();
        let mut state = self.inner.state.lock();

        assert!(state.lock_count > 0, "unlock of a lock that is not held");
        assert_eq!(
            state.owner,
            Some(me),
            "unlock from a thread that does not hold the lock"
        );

        let retained = if unguarded {
            let Some(retained) = state.retained.pop() else {
                panic!("unlock without a matching acquire");
            };
            Some(retained)
        } else {
            None
        };

        state.lock_count -= 1;
        if state.lock_count == 0 {
            state.owner = None;
            state.holder = None;
            self.inner.available.notify_one();
        }

        trace!(
            discipline = ?self.inner.discipline,
            depth = state.lock_count,
            "lock released"
        );

        retained
    }
}

impl fmt::Debug for Lock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Lock")
            .field("discipline", &self.inner.discipline)
            .field("lock_count", &state.lock_count)
            .field("holder", &state.holder)
            .finish()
    }
}

fn holder_name() -> String {
    let current = thread::current();
    match current.name() {
        Some(name) => name.to_string(),
        None => format!("{:?}", current.id()),
    }
}

/// A held acquisition of a [`Lock`].
///
/// Owns a reference to the lock, so the lock outlives the guard no matter
/// which other handles are dropped. Not `Send`: the lock must be released on
/// the thread that acquired it.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct LockGuard {
    lock: Lock,
    _not_send: PhantomData<*const ()>,
}

impl LockGuard {
    fn new(lock: Lock) -> Self {
        Self {
            lock,
            _not_send: PhantomData,
        }
    }

    /// The lock this guard holds.
    pub fn lock(&self) -> &Lock {
        &self.lock
    }

    /// Releases the acquisition. Same as dropping the guard.
    pub fn unlock(self) {
        drop(self);
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        // The guard's own reference is released after this, when `lock` drops.
        self.lock.ungrant(false);
    }
}

impl fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockGuard").field("lock", &self.lock).finish()
    }
}

/// A lock that may be absent.
///
/// Every operation on an absent lock is a no-op, which keeps optional-locking
/// call sites free of presence checks.
#[derive(Clone, Debug, Default)]
pub struct OptionalLock {
    inner: Option<Lock>,
}

impl OptionalLock {
    pub fn none() -> Self {
        Self { inner: None }
    }

    pub fn is_some(&self) -> bool {
        self.inner.is_some()
    }

    pub fn as_lock(&self) -> Option<&Lock> {
        self.inner.as_ref()
    }

    /// Blocks on the lock when present. `None` when absent.
    pub fn lock(&self) -> Option<LockGuard> {
        self.inner.as_ref().map(Lock::lock)
    }

    pub fn acquire(&self) {
        if let Some(lock) = &self.inner {
            lock.acquire();
        }
    }

    pub fn unlock(&self) {
        if let Some(lock) = &self.inner {
            lock.unlock();
        }
    }
}

impl From<Lock> for OptionalLock {
    fn from(lock: Lock) -> Self {
        Self { inner: Some(lock) }
    }
}

impl From<Option<Lock>> for OptionalLock {
    fn from(inner: Option<Lock>) -> Self {
        Self { inner }
    }
}
