use crate::{Element, Tag};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One authored monster attack. Planned intents copy their payload from here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterAttack {
    pub id: String,
    pub damage: u32,
    /// Presentation hint for the attack movement; the engine never reads it.
    #[serde(default)]
    pub speed: u32,
    #[serde(default)]
    pub element: Element,
    #[serde(default)]
    pub is_aoe: bool,
    #[serde(default)]
    pub stuns_target: bool,
    #[serde(default)]
    pub stun_phases: u8,
    #[serde(default)]
    pub applies_bleed: bool,
    #[serde(default)]
    pub bleed_stacks: u32,
}

impl MonsterAttack {
    /// A plain single-target hit with no riders.
    pub fn basic(id: &str, damage: u32) -> Self {
        Self {
            id: id.to_string(),
            damage,
            speed: 0,
            element: Element::Physical,
            is_aoe: false,
            stuns_target: false,
            stun_phases: 0,
            applies_bleed: false,
            bleed_stacks: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterDefinition {
    pub id: String,
    pub name: String,
    pub max_hp: u32,
    #[serde(default)]
    pub defense: u32,
    /// Multiplier per element; elements not listed take 1.0.
    #[serde(default)]
    pub resistances: BTreeMap<Element, f32>,
    #[serde(default)]
    pub tags: BTreeSet<Tag>,
    #[serde(default = "default_modifier")]
    pub attack_modifier: f32,
    /// Authored attack variants; intents pick one uniformly.
    #[serde(default)]
    pub attacks: Vec<MonsterAttack>,
    /// Used when `attacks` is empty.
    pub default_attack: MonsterAttack,
    #[serde(default)]
    pub xp_reward: u32,
    #[serde(default)]
    pub gold_reward: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeroDefinition {
    pub id: String,
    pub name: String,
    pub max_hp: u32,
    #[serde(default)]
    pub max_stamina: u32,
    #[serde(default)]
    pub defense: u32,
    #[serde(default)]
    pub resistances: BTreeMap<Element, f32>,
    #[serde(default)]
    pub tags: BTreeSet<Tag>,
    #[serde(default = "default_modifier")]
    pub attack_modifier: f32,
    /// Ability ids, resolved against the ability table when the party is built.
    pub abilities: Vec<String>,
    /// Maximum damaging casts per turn, if capped.
    #[serde(default)]
    pub damage_attack_limit: Option<u8>,
}

fn default_modifier() -> f32 {
    1.0
}
