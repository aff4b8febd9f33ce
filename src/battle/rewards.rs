use crate::battle::state::BattleState;
use crate::errors::{CommandRejected, CommandResult};
use schema::{LootItem, RewardOffer};
use serde::{Deserialize, Serialize};

/// What the party has accumulated across encounters of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    pub gold: u32,
    pub inventory: Vec<LootItem>,
    pub encounters_cleared: u32,
}

impl RunState {
    pub fn credit(&mut self, gold: u32, item: Option<LootItem>) {
        self.gold = self.gold.saturating_add(gold);
        if let Some(item) = item {
            self.inventory.push(item);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewardSource {
    /// Offered once, before the first player phase of a run.
    StartOfRun,
    EncounterClear,
}

/// A reward handed to the loot panel and not yet answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingReward {
    pub source: RewardSource,
    pub offer: RewardOffer,
}

impl PendingReward {
    /// Check the chosen item against the offer. `None` always passes.
    pub fn accept(&self, item: Option<&LootItem>) -> CommandResult<()> {
        match item {
            Some(item) if !self.offer.loot_pool.contains(item) => Err(CommandRejected::ItemNotOffered),
            _ => Ok(()),
        }
    }
}

/// Gold from every monster of the encounter plus the encounter bonus.
pub fn encounter_offer(state: &BattleState, bonus_gold: u32, loot_pool: &[LootItem]) -> RewardOffer {
    let monster_gold: u32 = state.monsters.iter().map(|monster| monster.gold_reward).sum();
    RewardOffer {
        gold: monster_gold.saturating_add(bonus_gold),
        loot_pool: loot_pool.to_vec(),
    }
}
