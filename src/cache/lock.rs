//! Poison-tolerant access to the in-process stores.
//!
//! A panic while a guard is held leaves the data intact but poisons the lock.
//! The stores keep serving: the cache is rebuilt from the index anyway, and
//! the in-memory index only ever sees whole-record writes.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

pub(crate) fn read_or_recover<'a, T>(
    lock: &'a RwLock<T>,
    owner: &'static str,
    op: &'static str,
) -> RwLockReadGuard<'a, T> {
    lock.read()
        .unwrap_or_else(|poisoned| recovered(poisoned, owner, op, "read"))
}

pub(crate) fn write_or_recover<'a, T>(
    lock: &'a RwLock<T>,
    owner: &'static str,
    op: &'static str,
) -> RwLockWriteGuard<'a, T> {
    lock.write()
        .unwrap_or_else(|poisoned| recovered(poisoned, owner, op, "write"))
}

fn recovered<G>(
    poisoned: PoisonError<G>,
    owner: &'static str,
    op: &'static str,
    access: &'static str,
) -> G {
    warn!(
        target = "cinema::lock",
        owner,
        op,
        access,
        "recovered poisoned lock"
    );
    poisoned.into_inner()
}
