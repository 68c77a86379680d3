//! Stack handle configuration.

/// Maximum depth the runtime itself allows for one stack.
pub const DEFAULT_CAPACITY: usize = 1_000_000;

/// How reads react when the dynamic type at a slot disagrees with the
/// expected one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Coercion {
    /// Mismatches are silent no-ops and the previous value is kept.
    #[default]
    Permissive,
    /// Mismatches are reported as errors.
    Strict,
}

/// What a [`crate::BalanceScope`] does when an operation leaves the stack at
/// an unexpected size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BalanceCheck {
    Ignore,
    Log,
    Panic,
}

impl Default for BalanceCheck {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Panic
        } else {
            Self::Log
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct StackConfig {
    pub capacity: usize,
    pub open_libs: bool,
    pub coercion: Coercion,
    pub balance: BalanceCheck,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            open_libs: true,
            coercion: Coercion::default(),
            balance: BalanceCheck::default(),
        }
    }
}

impl StackConfig {
    /// Capacities above `i32::MAX` are clamped, since positions are `i32`.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.min(i32::MAX as usize);
        self
    }

    pub fn with_open_libs(mut self, open_libs: bool) -> Self {
        self.open_libs = open_libs;
        self
    }

    pub fn with_coercion(mut self, coercion: Coercion) -> Self {
        self.coercion = coercion;
        self
    }

    pub fn with_balance(mut self, balance: BalanceCheck) -> Self {
        self.balance = balance;
        self
    }

    pub fn strict(self) -> Self {
        self.with_coercion(Coercion::Strict)
    }
}
