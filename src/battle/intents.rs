//! Enemy intent planning.
//!
//! Intents are chosen once per player phase and then locked: a surviving
//! monster keeps its target and payload until the enemy phase executes it.
//! The only permitted change is re-targeting when the planned target has
//! fallen, and a dead monster only ever takes its own intents with it.

use crate::battle::state::{BattleRng, BattleState};
use crate::combatant::MonsterId;
use crate::monster::Monster;
use schema::{Element, MonsterAttack};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EnemyIntent {
    pub enemy: MonsterId,
    pub target_party_index: usize,
    /// Index into the monster's attack options.
    pub attack_index: usize,
    pub attack_id: String,
    pub damage: u32,
    pub element: Element,
    pub is_aoe: bool,
    pub stuns_target: bool,
    pub stun_phases: u8,
    pub applies_bleed: bool,
    pub bleed_stacks: u32,
}

impl EnemyIntent {
    pub fn from_attack(
        enemy: MonsterId,
        target_party_index: usize,
        attack_index: usize,
        attack: &MonsterAttack,
    ) -> Self {
        Self {
            enemy,
            target_party_index,
            attack_index,
            attack_id: attack.id.clone(),
            damage: attack.damage,
            element: attack.element,
            is_aoe: attack.is_aoe,
            stuns_target: attack.stuns_target,
            stun_phases: attack.stun_phases,
            applies_bleed: attack.applies_bleed,
            bleed_stacks: attack.bleed_stacks,
        }
    }
}

/// One intent per monster in play, in formation order: a uniformly random
/// living hero as target, then a uniformly random authored attack.
pub fn plan_enemy_intents(state: &BattleState, rng: &mut BattleRng) -> Vec<EnemyIntent> {
    let living_heroes = state.living_hero_indices();
    if living_heroes.is_empty() {
        return Vec::new();
    }

    state
        .active_monsters()
        .filter_map(|monster| plan_for_monster(monster, &living_heroes, rng))
        .collect()
}

fn plan_for_monster(
    monster: &Monster,
    living_heroes: &[usize],
    rng: &mut BattleRng,
) -> Option<EnemyIntent> {
    let target = living_heroes[rng.pick_index(living_heroes.len(), "intent target")?];
    let options = monster.attack_options();
    let attack_index = rng.pick_index(options.len(), "intent attack")?;
    let intent = EnemyIntent::from_attack(monster.id, target, attack_index, &options[attack_index]);
    tracing::debug!(
        monster = %monster.id,
        target,
        attack = %intent.attack_id,
        damage = intent.damage,
        aoe = intent.is_aoe,
        "planned intent"
    );
    Some(intent)
}

/// Where the intent should land now: its planned target if still standing,
/// otherwise a uniformly random living hero. `None` when the party is gone.
pub fn resolve_target(state: &BattleState, intent: &EnemyIntent, rng: &mut BattleRng) -> Option<usize> {
    if state.is_hero_alive(intent.target_party_index) {
        return Some(intent.target_party_index);
    }
    let living_heroes = state.living_hero_indices();
    let pick = rng.pick_index(living_heroes.len(), "intent retarget")?;
    Some(living_heroes[pick])
}

/// Drop every intent belonging to `enemy`. Returns how many were removed.
pub fn remove_intents_for(intents: &mut Vec<EnemyIntent>, enemy: MonsterId) -> usize {
    let before = intents.len();
    intents.retain(|intent| intent.enemy != enemy);
    before - intents.len()
}
