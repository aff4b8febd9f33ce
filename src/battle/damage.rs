//! The damage model shared by hero abilities and monster attacks.
//!
//! `final = round(((base × attacker_modifier) − defense) × resistance × tag_multiplier)`,
//! floored at zero. [`preview`] evaluates it without touching anything;
//! [`apply`] evaluates the same formula and routes the result through the
//! target's shield and HP.

use crate::battle::intents::EnemyIntent;
use crate::combatant::{Combatant, DamageTaken};
use crate::hero::Hero;
use crate::monster::Monster;
use schema::{AbilityDefinition, Tag};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Everything the formula reads, captured by value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageInput {
    pub base_damage: u32,
    pub attacker_modifier: f32,
    pub target_defense: u32,
    pub elemental_resistance: f32,
    pub tag_multiplier: f32,
}

impl DamageInput {
    /// A hero ability aimed at `target`.
    pub fn for_ability(caster: &Hero, ability: &AbilityDefinition, target: &Combatant) -> Self {
        Self {
            base_damage: ability.base_damage,
            attacker_modifier: caster.attack_modifier.into_inner(),
            target_defense: target.defense,
            elemental_resistance: target.resistance(ability.element),
            tag_multiplier: tag_multiplier(&ability.tags, &target.tags),
        }
    }

    /// A planned monster attack landing on a hero. Monster attacks carry no tags.
    pub fn for_intent(attacker: &Monster, intent: &EnemyIntent, target: &Combatant) -> Self {
        Self {
            base_damage: intent.damage,
            attacker_modifier: attacker.attack_modifier.into_inner(),
            target_defense: target.defense,
            elemental_resistance: target.resistance(intent.element),
            tag_multiplier: 1.0,
        }
    }
}

/// Product of every (ability tag, target tag) interaction; 1.0 when nothing interacts.
pub fn tag_multiplier(ability_tags: &BTreeSet<Tag>, target_tags: &BTreeSet<Tag>) -> f32 {
    ability_tags
        .iter()
        .flat_map(|attacking| {
            target_tags
                .iter()
                .map(move |defending| Tag::interaction(*attacking, *defending))
        })
        .product()
}

/// Final damage for `input`. Pure.
pub fn preview(input: &DamageInput) -> u32 {
    let raw = (f64::from(input.base_damage) * f64::from(input.attacker_modifier)
        - f64::from(input.target_defense))
        * f64::from(input.elemental_resistance)
        * f64::from(input.tag_multiplier);
    if raw.is_finite() && raw > 0.0 {
        raw.round().min(f64::from(u32::MAX)) as u32
    } else {
        0
    }
}

/// Outcome of a committed hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageApplication {
    pub damage: u32,
    pub taken: DamageTaken,
}

/// Evaluate the formula and deal the result to `target`, shield first.
pub fn apply(target: &mut Combatant, input: &DamageInput) -> DamageApplication {
    let damage = preview(input);
    let taken = target.take_damage(damage);
    DamageApplication { damage, taken }
}
