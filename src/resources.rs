use schema::{Currency, CurrencyAmounts};
use serde::{Deserialize, Serialize};

/// The encounter-wide currency pool filled by the reels and drained by abilities.
/// All four counters are unsigned, so they can never go negative; spending is
/// all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePool {
    amounts: CurrencyAmounts,
}

impl ResourcePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_amounts(amounts: CurrencyAmounts) -> Self {
        Self { amounts }
    }

    pub fn get(&self, currency: Currency) -> u32 {
        self.amounts.get(currency)
    }

    pub fn amounts(&self) -> CurrencyAmounts {
        self.amounts
    }

    pub fn total(&self) -> u32 {
        self.amounts.total()
    }

    pub fn can_afford(&self, cost: &CurrencyAmounts) -> bool {
        self.amounts.covers(cost)
    }

    /// First currency the pool cannot cover, with (needed, available).
    pub fn shortfall(&self, cost: &CurrencyAmounts) -> Option<(Currency, u32, u32)> {
        cost.iter()
            .find(|(currency, needed)| self.get(*currency) < *needed)
            .map(|(currency, needed)| (currency, needed, self.get(currency)))
    }

    /// Spend `cost` if every currency covers it. On failure nothing changes.
    pub fn try_spend(&mut self, cost: &CurrencyAmounts) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        for (currency, amount) in cost.iter() {
            *self.amounts.get_mut(currency) -= amount;
        }
        true
    }

    pub fn add(&mut self, income: &CurrencyAmounts) {
        for (currency, amount) in income.iter() {
            let slot = self.amounts.get_mut(currency);
            *slot = slot.saturating_add(amount);
        }
    }

    pub fn clear(&mut self) {
        self.amounts = CurrencyAmounts::ZERO;
    }

    pub fn snapshot(&self) -> CurrencyAmounts {
        self.amounts
    }

    /// Direct write used by snapshot restore.
    pub(crate) fn restore(&mut self, amounts: CurrencyAmounts) {
        self.amounts = amounts;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_failed_spend_leaves_pool_unchanged() {
        let mut pool = ResourcePool::with_amounts(CurrencyAmounts::new(2, 0, 0, 0));
        let cost = CurrencyAmounts::new(3, 0, 0, 0);

        assert!(!pool.try_spend(&cost));
        assert_eq!(pool.amounts(), CurrencyAmounts::new(2, 0, 0, 0));
        assert_eq!(pool.shortfall(&cost), Some((Currency::Attack, 3, 2)));
    }

    #[test]
    fn test_spend_is_all_or_nothing_across_currencies() {
        // Attack is covered but Magic is not: nothing may be deducted.
        let mut pool = ResourcePool::with_amounts(CurrencyAmounts::new(5, 0, 1, 0));
        assert!(!pool.try_spend(&CurrencyAmounts::new(3, 0, 2, 0)));
        assert_eq!(pool.amounts(), CurrencyAmounts::new(5, 0, 1, 0));

        assert!(pool.try_spend(&CurrencyAmounts::new(3, 0, 1, 0)));
        assert_eq!(pool.amounts(), CurrencyAmounts::new(2, 0, 0, 0));
    }

    #[test]
    fn test_add_and_clear() {
        let mut pool = ResourcePool::new();
        pool.add(&CurrencyAmounts::new(1, 2, 3, 4));
        pool.add(&CurrencyAmounts::new(1, 0, 0, 0));
        assert_eq!(pool.amounts(), CurrencyAmounts::new(2, 2, 3, 4));
        assert_eq!(pool.total(), 11);

        pool.clear();
        assert_eq!(pool.amounts(), CurrencyAmounts::ZERO);
    }

    #[test]
    fn test_zero_cost_always_succeeds() {
        let mut pool = ResourcePool::new();
        assert!(pool.try_spend(&CurrencyAmounts::ZERO));
        assert_eq!(pool.shortfall(&CurrencyAmounts::ZERO), None);
    }
}
