//! Single-assignment value cells backing entity attributes.
//!
//! An [`AsyncField`] moves through `unset -> pending -> resolved`. The first
//! caller of [`ensure_pending`](AsyncField::ensure_pending) owns the load;
//! the first [`resolve`](AsyncField::resolve) wins and later writes are
//! ignored. Readers block on a condition variable until the value lands.
//!
//! A resolved value of `None` means "unavailable" (deleted item, failed
//! remote call). Failures never surface any other way.

use std::fmt;

use parking_lot::{Condvar, Mutex};

/// Observable lifecycle state of an [`AsyncField`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldStatus {
    Unset,
    Pending,
    Resolved,
}

enum Slot<T> {
    Unset,
    Pending,
    Resolved(Option<T>),
}

/// A lazily loaded, write-once value.
pub struct AsyncField<T> {
    slot: Mutex<Slot<T>>,
    ready: Condvar,
}

impl<T> Default for AsyncField<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> AsyncField<T> {
    /// An unset field; nobody has asked for it yet.
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot::Unset),
            ready: Condvar::new(),
        }
    }

    /// A field that is already resolved.
    pub fn resolved(value: Option<T>) -> Self {
        Self {
            slot: Mutex::new(Slot::Resolved(value)),
            ready: Condvar::new(),
        }
    }

    pub fn status(&self) -> FieldStatus {
        match *self.slot.lock() {
            Slot::Unset => FieldStatus::Unset,
            Slot::Pending => FieldStatus::Pending,
            Slot::Resolved(_) => FieldStatus::Resolved,
        }
    }

    pub fn is_unset(&self) -> bool {
        self.status() == FieldStatus::Unset
    }

    pub fn is_resolved(&self) -> bool {
        self.status() == FieldStatus::Resolved
    }

    /// Move `unset -> pending`.
    ///
    /// Returns `true` for exactly one caller per field; that caller must make
    /// sure the field is eventually resolved.
    pub fn ensure_pending(&self) -> bool {
        let mut slot = self.slot.lock();
        if matches!(*slot, Slot::Unset) {
            *slot = Slot::Pending;
            true
        } else {
            false
        }
    }

    /// Store `value` unless the field is already resolved.
    ///
    /// Resolving an unset field schedules and resolves it in one step, which
    /// is how values are seeded from responses that happen to carry them.
    /// Returns whether this call stored the value.
    pub fn resolve(&self, value: Option<T>) -> bool {
        let mut slot = self.slot.lock();
        if matches!(*slot, Slot::Resolved(_)) {
            return false;
        }
        *slot = Slot::Resolved(value);
        self.ready.notify_all();
        true
    }
}

impl<T: Clone> AsyncField<T> {
    /// Block until the field is resolved and return a copy of its value.
    ///
    /// # Panics
    ///
    /// Panics if the field is unset: every read must follow a load trigger.
    /// Entity accessors always trigger one before handing out the field.
    pub fn read(&self) -> Option<T> {
        let mut slot = self.slot.lock();
        loop {
            match &*slot {
                Slot::Resolved(value) => return value.clone(),
                Slot::Unset => panic!("AsyncField read before any load was triggered"),
                Slot::Pending => {}
            }
            self.ready.wait(&mut slot);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for AsyncField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.slot.lock() {
            Slot::Unset => f.write_str("AsyncField(unset)"),
            Slot::Pending => f.write_str("AsyncField(pending)"),
            Slot::Resolved(value) => f.debug_tuple("AsyncField").field(value).finish(),
        }
    }
}
