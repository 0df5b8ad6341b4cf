//! The money counter.

/// Player money. Only ever goes up, one credit per completed delivery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Economy {
    money: u64,
}

impl Economy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `amount` and returns the new balance. Saturates at `u64::MAX`.
    pub fn credit(&mut self, amount: u64) -> u64 {
        self.money = self.money.saturating_add(amount);
        self.money
    }

    pub fn money(&self) -> u64 {
        self.money
    }
}
