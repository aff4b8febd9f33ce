use ordered_float::OrderedFloat;
use schema::{Element, Tag};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Stable instance id of a spawned monster. Unique for the whole run, so
/// snapshots and intents can refer to monsters across deactivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonsterId(pub u32);

impl fmt::Display for MonsterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Reference to any combatant in the battle arena - provides type safety over raw indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatantRef {
    Hero(usize),
    Monster(MonsterId),
}

/// Per-combatant status state. Ticked once at the start of every player phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffects {
    /// Concealed: immune to single-target attacks, not to AoE.
    pub hidden: bool,
    /// Player phases still to be lost to stun.
    pub stun_phases: u8,
    /// Set by the tick when a stun phase is consumed; cleared with the round flags.
    pub stun_locked: bool,
    pub bleed_stacks: u32,
}

impl StatusEffects {
    pub fn is_stunned(&self) -> bool {
        self.stun_locked
    }

    pub fn apply_stun(&mut self, phases: u8) {
        self.stun_phases = self.stun_phases.max(phases);
    }

    pub fn add_bleed(&mut self, stacks: u32) {
        self.bleed_stacks = self.bleed_stacks.saturating_add(stacks);
    }

    /// Consume one pending stun phase, if any. Returns whether the phase is lost.
    pub fn consume_stun(&mut self) -> bool {
        if self.stun_phases > 0 {
            self.stun_phases -= 1;
            self.stun_locked = true;
        }
        self.stun_locked
    }
}

/// Result of routing incoming damage through shield then HP.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageTaken {
    pub absorbed: u32,
    pub hp_lost: u32,
    pub died: bool,
}

/// Shared state of every hero and monster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combatant {
    pub name: String,
    current_hp: u32,
    max_hp: u32,
    shield: u32,
    pub defense: u32,
    pub resistances: BTreeMap<Element, OrderedFloat<f32>>,
    pub tags: BTreeSet<Tag>,
    pub status: StatusEffects,
    pub has_acted_this_round: bool,
}

impl Combatant {
    pub fn new(
        name: &str,
        max_hp: u32,
        defense: u32,
        resistances: &BTreeMap<Element, f32>,
        tags: &BTreeSet<Tag>,
    ) -> Self {
        Self {
            name: name.to_string(),
            current_hp: max_hp,
            max_hp,
            shield: 0,
            defense,
            resistances: resistances
                .iter()
                .map(|(element, value)| (*element, OrderedFloat(*value)))
                .collect(),
            tags: tags.clone(),
            status: StatusEffects::default(),
            has_acted_this_round: false,
        }
    }

    pub fn current_hp(&self) -> u32 {
        self.current_hp
    }

    pub fn max_hp(&self) -> u32 {
        self.max_hp
    }

    pub fn shield(&self) -> u32 {
        self.shield
    }

    pub fn is_alive(&self) -> bool {
        self.current_hp > 0
    }

    pub fn is_hidden(&self) -> bool {
        self.status.hidden
    }

    /// Elemental multiplier for incoming damage; unlisted elements take 1.0.
    pub fn resistance(&self, element: Element) -> f32 {
        self.resistances
            .get(&element)
            .map(|value| value.into_inner())
            .unwrap_or(1.0)
    }

    /// Shield soaks first, the remainder comes off HP.
    pub fn take_damage(&mut self, amount: u32) -> DamageTaken {
        if !self.is_alive() {
            return DamageTaken::default();
        }
        let absorbed = amount.min(self.shield);
        self.shield -= absorbed;
        let hp_lost = (amount - absorbed).min(self.current_hp);
        self.current_hp -= hp_lost;
        DamageTaken {
            absorbed,
            hp_lost,
            died: self.current_hp == 0,
        }
    }

    /// HP loss that ignores shield (bleed). Returns true if this killed the combatant.
    pub fn lose_hp(&mut self, amount: u32) -> bool {
        if !self.is_alive() {
            return false;
        }
        self.current_hp = self.current_hp.saturating_sub(amount);
        self.current_hp == 0
    }

    pub fn add_shield(&mut self, amount: u32) {
        self.shield = self.shield.saturating_add(amount);
    }

    /// Direct write used by snapshot restore.
    pub(crate) fn set_hp(&mut self, hp: u32) {
        self.current_hp = hp.min(self.max_hp);
    }

    pub(crate) fn set_shield(&mut self, shield: u32) {
        self.shield = shield;
    }
}
