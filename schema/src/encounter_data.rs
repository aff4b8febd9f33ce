use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LootItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// What the reward panel is handed when an encounter is cleared
/// (or at the start of a run).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardOffer {
    #[serde(default)]
    pub gold: u32,
    #[serde(default)]
    pub loot_pool: Vec<LootItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterDefinition {
    pub id: String,
    pub name: String,
    /// Monster definition ids in formation order.
    pub monsters: Vec<String>,
    #[serde(default)]
    pub bonus_gold: u32,
    #[serde(default)]
    pub loot_pool: Vec<LootItem>,
}
