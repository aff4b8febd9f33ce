use crate::combatant::Combatant;
use ordered_float::OrderedFloat;
use schema::{AbilityDefinition, HeroDefinition};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A party member for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hero {
    pub id: String,
    pub combatant: Combatant,
    pub stamina: u32,
    pub max_stamina: u32,
    pub attack_modifier: OrderedFloat<f32>,
    pub abilities: Vec<AbilityDefinition>,
    pub xp: u32,

    // Per-turn limits, cleared with the round flags.
    pub damage_attack_limit: Option<u8>,
    pub damage_attacks_this_turn: u8,
    pub abilities_used_this_turn: BTreeSet<String>,
}

impl Hero {
    /// Build a hero from its definition and its already-resolved abilities.
    pub fn from_definition(definition: &HeroDefinition, abilities: Vec<AbilityDefinition>) -> Self {
        Self {
            id: definition.id.clone(),
            combatant: Combatant::new(
                &definition.name,
                definition.max_hp,
                definition.defense,
                &definition.resistances,
                &definition.tags,
            ),
            stamina: definition.max_stamina,
            max_stamina: definition.max_stamina,
            attack_modifier: OrderedFloat(definition.attack_modifier),
            abilities,
            xp: 0,
            damage_attack_limit: definition.damage_attack_limit,
            damage_attacks_this_turn: 0,
            abilities_used_this_turn: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.combatant.name
    }

    pub fn is_alive(&self) -> bool {
        self.combatant.is_alive()
    }

    pub fn is_hidden(&self) -> bool {
        self.combatant.is_hidden()
    }

    pub fn ability(&self, index: usize) -> Option<&AbilityDefinition> {
        self.abilities.get(index)
    }

    /// Clear everything that lasts one round: acted flag, stun lock, per-turn counters.
    pub fn reset_round(&mut self) {
        self.combatant.has_acted_this_round = false;
        self.combatant.status.stun_locked = false;
        self.damage_attacks_this_turn = 0;
        self.abilities_used_this_turn.clear();
    }

    /// Drop everything a previous encounter left behind. HP carries over.
    pub fn prepare_for_encounter(&mut self) {
        self.reset_round();
        self.combatant.status = Default::default();
        self.combatant.set_shield(0);
        self.refill_stamina();
    }

    pub fn refill_stamina(&mut self) {
        self.stamina = self.max_stamina;
    }

    /// The hero may still start a cast this phase.
    pub fn can_act(&self) -> bool {
        self.is_alive() && !self.combatant.status.is_stunned()
    }

    pub fn reached_damage_limit(&self) -> bool {
        self.damage_attack_limit
            .is_some_and(|limit| self.damage_attacks_this_turn >= limit)
    }
}
