use crate::combatant::{Combatant, MonsterId};
use ordered_float::OrderedFloat;
use schema::{MonsterAttack, MonsterDefinition};
use serde::{Deserialize, Serialize};
use std::slice;

/// A spawned monster. Monsters are never removed from the encounter arena,
/// only deactivated, so an undo can bring them back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Monster {
    pub id: MonsterId,
    pub definition_id: String,
    pub combatant: Combatant,
    pub attack_modifier: OrderedFloat<f32>,
    pub attacks: Vec<MonsterAttack>,
    pub default_attack: MonsterAttack,
    pub active: bool,
    /// Formation slot.
    pub position: usize,
    pub xp_reward: u32,
    pub gold_reward: u32,
}

impl Monster {
    pub fn spawn(id: MonsterId, definition: &MonsterDefinition, position: usize) -> Self {
        Self {
            id,
            definition_id: definition.id.clone(),
            combatant: Combatant::new(
                &definition.name,
                definition.max_hp,
                definition.defense,
                &definition.resistances,
                &definition.tags,
            ),
            attack_modifier: OrderedFloat(definition.attack_modifier),
            attacks: definition.attacks.clone(),
            default_attack: definition.default_attack.clone(),
            active: true,
            position,
            xp_reward: definition.xp_reward,
            gold_reward: definition.gold_reward,
        }
    }

    pub fn name(&self) -> &str {
        &self.combatant.name
    }

    pub fn is_active_and_alive(&self) -> bool {
        self.active && self.combatant.is_alive()
    }

    /// Remove from active play; the record stays in the arena.
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Attacks an intent may choose from: the authored list, or the default attack.
    pub fn attack_options(&self) -> &[MonsterAttack] {
        if self.attacks.is_empty() {
            slice::from_ref(&self.default_attack)
        } else {
            &self.attacks
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};

    fn slime(attacks: Vec<MonsterAttack>) -> MonsterDefinition {
        MonsterDefinition {
            id: "slime".to_string(),
            name: "Slime".to_string(),
            max_hp: 12,
            defense: 0,
            resistances: BTreeMap::new(),
            tags: BTreeSet::new(),
            attack_modifier: 1.0,
            attacks,
            default_attack: MonsterAttack::basic("ooze", 2),
            xp_reward: 3,
            gold_reward: 1,
        }
    }

    #[test]
    fn test_default_attack_fallback() {
        let monster = Monster::spawn(MonsterId(1), &slime(vec![]), 0);
        assert_eq!(monster.attack_options().len(), 1);
        assert_eq!(monster.attack_options()[0].id, "ooze");

        let monster = Monster::spawn(
            MonsterId(2),
            &slime(vec![MonsterAttack::basic("slam", 4), MonsterAttack::basic("spit", 3)]),
            1,
        );
        let ids: Vec<_> = monster.attack_options().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["slam", "spit"]);
    }

    #[test]
    fn test_deactivated_monster_is_not_in_play() {
        let mut monster = Monster::spawn(MonsterId(1), &slime(vec![]), 0);
        assert!(monster.is_active_and_alive());
        monster.deactivate();
        assert!(!monster.is_active_and_alive());
        assert!(monster.combatant.is_alive());
    }
}
