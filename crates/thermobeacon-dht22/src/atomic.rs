#![allow(unsafe_code)]

use core::cell::Cell;
use core::marker::PhantomData;

use critical_section::{Mutex, RestoreState};

// Set while a bus transaction owns the line, from the reset pulse to the
// last bit.
static IN_FLIGHT: Mutex<Cell<bool>> = Mutex::new(Cell::new(false));

/// A transaction is already in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Busy;

/// Marks a bus transaction as in flight until dropped.
///
/// The claim is taken before the line is touched, so a rejected transaction
/// never drives its line. It may be held across an `.await`.
#[derive(Debug)]
pub(crate) struct InFlight(());

impl InFlight {
    /// Marks a transaction as in flight.
    ///
    /// Fails with [`Busy`] when another transaction already holds the claim.
    pub(crate) fn claim() -> Result<Self, Busy> {
        let busy = critical_section::with(|cs| IN_FLIGHT.borrow(cs).replace(true));
        if busy { Err(Busy) } else { Ok(Self(())) }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        critical_section::with(|cs| IN_FLIGHT.borrow(cs).set(false));
    }
}

/// Scoped critical section covering the timing-critical part of a
/// transaction.
///
/// Preemption stays disabled from [`AtomicSection::scoped_acquire`] until
/// the section is dropped, so the prior state is restored on every exit
/// path, early error returns included.
///
/// Sections must be released in the reverse order they were acquired.
/// They are neither `Send` nor `Sync` and are only ever held as locals
/// inside the driver, never across an `.await`, which keeps that ordering.
pub(crate) struct AtomicSection {
    restore: RestoreState,
    _not_send: PhantomData<*mut ()>,
}

impl AtomicSection {
    /// Disables preemption until the returned section is dropped.
    pub(crate) fn scoped_acquire() -> Self {
        // SAFETY: the matching release happens exactly once in `Drop`, and
        // sections are locals dropped in reverse acquisition order.
        let restore = unsafe { critical_section::acquire() };

        Self {
            restore,
            _not_send: PhantomData,
        }
    }
}

impl Drop for AtomicSection {
    fn drop(&mut self) {
        // SAFETY: `restore` was produced by the acquire in `scoped_acquire`
        // and this is the only place releasing it.
        unsafe { critical_section::release(self.restore) };
    }
}
