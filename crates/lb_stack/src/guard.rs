//! Scoped balance checking for multi-step stack operations.

use std::ops::{Deref, DerefMut};

use crate::config::BalanceCheck;
use crate::stack::ValueStack;

/// Records the stack size when an operation starts and checks the net effect
/// when it ends.
///
/// Call [`BalanceScope::finish`] on the success path. A scope dropped without
/// finishing (an early `?` return) discards whatever the operation left above
/// its entry size.
pub struct BalanceScope<'s, 'lua> {
    stack: &'s mut ValueStack<'lua>,
    label: &'static str,
    entry: usize,
    delta: isize,
    finished: bool,
}

impl<'lua> ValueStack<'lua> {
    /// Opens a scope expected to leave the stack at its current size.
    pub fn balanced(&mut self, label: &'static str) -> BalanceScope<'_, 'lua> {
        self.balanced_with(label, 0)
    }

    /// Opens a scope expected to change the stack size by `delta`.
    pub fn balanced_with(&mut self, label: &'static str, delta: isize) -> BalanceScope<'_, 'lua> {
        let entry = self.size();
        BalanceScope {
            stack: self,
            label,
            entry,
            delta,
            finished: false,
        }
    }
}

impl BalanceScope<'_, '_> {
    pub fn entry_size(&self) -> usize {
        self.entry
    }

    pub fn finish(mut self) {
        self.finished = true;
        let expected = self.entry as isize + self.delta;
        let actual = self.stack.size() as isize;
        if actual == expected {
            return;
        }
        match self.stack.config().balance {
            BalanceCheck::Ignore => {}
            BalanceCheck::Log => log::error!(
                "unbalanced stack after {}: expected {expected} values, found {actual} {}",
                self.label,
                self.stack.dump()
            ),
            BalanceCheck::Panic => panic!(
                "unbalanced stack after {}: expected {expected} values, found {actual}",
                self.label
            ),
        }
    }
}

impl<'lua> Deref for BalanceScope<'_, 'lua> {
    type Target = ValueStack<'lua>;

    fn deref(&self) -> &Self::Target {
        self.stack
    }
}

impl DerefMut for BalanceScope<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.stack
    }
}

impl Drop for BalanceScope<'_, '_> {
    fn drop(&mut self) {
        if self.finished || std::thread::panicking() {
            return;
        }
        let size = self.stack.size();
        if size > self.entry {
            log::trace!("{}: discarding {} values", self.label, size - self.entry);
            let _ = self.stack.pop(size - self.entry);
        }
    }
}
