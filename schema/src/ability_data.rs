use crate::{CurrencyAmounts, Element, Tag};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Who an ability may be aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetType {
    /// A monster on the opposing side.
    Enemy,
    /// The caster only.
    User,
    /// Any living member of the party, caster included.
    Ally,
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let display_name = match self {
            TargetType::Enemy => "Enemy",
            TargetType::User => "Self",
            TargetType::Ally => "Ally",
        };
        write!(f, "{}", display_name)
    }
}

/// Behavioral switches on an ability. Everything defaults to off except
/// `breaks_hidden`, which is the normal behavior of acting while concealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilityFlags {
    /// Attack-currency cost drops to zero while the caster is hidden.
    pub free_if_hidden: bool,
    /// Casting while hidden reveals the caster.
    pub breaks_hidden: bool,
    /// Casting conceals the caster (the "conceal" ability).
    pub grants_hidden: bool,
    pub usable_once_per_turn: bool,
    /// Damage waits for the presentation's impact signal (or the fail-safe timeout).
    pub impact_sync: bool,
    /// Killing the target with this ability keeps the caster concealed.
    pub lethal_finisher: bool,
}

impl Default for AbilityFlags {
    fn default() -> Self {
        Self {
            free_if_hidden: false,
            breaks_hidden: true,
            grants_hidden: false,
            usable_once_per_turn: false,
            impact_sync: false,
            lethal_finisher: false,
        }
    }
}

/// Immutable, authored description of something a hero can cast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityDefinition {
    pub id: String,
    pub name: String,
    pub target_type: TargetType,
    #[serde(default)]
    pub cost: CurrencyAmounts,
    #[serde(default)]
    pub stamina_cost: u32,
    #[serde(default)]
    pub base_damage: u32,
    #[serde(default)]
    pub shield_amount: u32,
    /// Bleed stacks added to an enemy target that survives the hit.
    #[serde(default)]
    pub bleed_stacks: u32,
    #[serde(default)]
    pub element: Element,
    #[serde(default)]
    pub tags: BTreeSet<Tag>,
    #[serde(default)]
    pub flags: AbilityFlags,
}

impl AbilityDefinition {
    pub fn is_damaging(&self) -> bool {
        self.target_type == TargetType::Enemy && self.base_damage > 0
    }

    /// Abilities that never ask for a target click: self-casts without a shield
    /// (conceal and similar) resolve as soon as they are started.
    pub fn resolves_without_target(&self) -> bool {
        self.target_type == TargetType::User && self.shield_amount == 0
    }

    /// The cost actually charged for this cast.
    pub fn effective_cost(&self, caster_hidden: bool) -> CurrencyAmounts {
        let mut cost = self.cost;
        if self.flags.free_if_hidden && caster_hidden {
            cost.attack = 0;
        }
        cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backstab() -> AbilityDefinition {
        AbilityDefinition {
            id: "backstab".to_string(),
            name: "Backstab".to_string(),
            target_type: TargetType::Enemy,
            cost: CurrencyAmounts::new(2, 0, 1, 0),
            stamina_cost: 0,
            base_damage: 12,
            shield_amount: 0,
            bleed_stacks: 0,
            element: Element::Physical,
            tags: BTreeSet::new(),
            flags: AbilityFlags {
                free_if_hidden: true,
                ..AbilityFlags::default()
            },
        }
    }

    #[test]
    fn free_if_hidden_only_waives_attack_currency() {
        let ability = backstab();
        assert_eq!(ability.effective_cost(false), CurrencyAmounts::new(2, 0, 1, 0));
        assert_eq!(ability.effective_cost(true), CurrencyAmounts::new(0, 0, 1, 0));
    }

    #[test]
    fn default_flags_break_hidden() {
        let flags = AbilityFlags::default();
        assert!(flags.breaks_hidden);
        assert!(!flags.grants_hidden);
        assert!(!flags.impact_sync);
    }
}
