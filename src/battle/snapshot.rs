//! Value snapshots of the battle for single-step undo within a player phase.
//!
//! The stack always holds the phase baseline at the bottom. A snapshot is
//! pushed immediately before every resource spend it protects; undo pops the
//! most recent one and restores whatever is now on top.

use crate::battle::intents::EnemyIntent;
use crate::battle::state::BattleState;
use crate::combatant::MonsterId;
use schema::CurrencyAmounts;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroSnapshot {
    pub hp: u32,
    pub stamina: u32,
    pub shield: u32,
    pub hidden: bool,
    pub stun_phases: u8,
    pub stun_locked: bool,
    pub bleed_stacks: u32,
    pub has_acted_this_round: bool,
    pub damage_attacks_this_turn: u8,
    pub abilities_used_this_turn: BTreeSet<String>,
    pub xp: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterSnapshot {
    pub instance_id: MonsterId,
    pub active: bool,
    pub hp: u32,
    pub shield: u32,
    pub bleed_stacks: u32,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleSaveState {
    pub heroes: Vec<HeroSnapshot>,
    /// Every monster spawned this encounter, deactivated ones included.
    pub monsters: Vec<MonsterSnapshot>,
    pub resources: CurrencyAmounts,
    pub intents: Vec<EnemyIntent>,
}

impl BattleSaveState {
    pub fn capture(state: &BattleState) -> Self {
        let heroes = state
            .party
            .iter()
            .map(|hero| HeroSnapshot {
                hp: hero.combatant.current_hp(),
                stamina: hero.stamina,
                shield: hero.combatant.shield(),
                hidden: hero.combatant.status.hidden,
                stun_phases: hero.combatant.status.stun_phases,
                stun_locked: hero.combatant.status.stun_locked,
                bleed_stacks: hero.combatant.status.bleed_stacks,
                has_acted_this_round: hero.combatant.has_acted_this_round,
                damage_attacks_this_turn: hero.damage_attacks_this_turn,
                abilities_used_this_turn: hero.abilities_used_this_turn.clone(),
                xp: hero.xp,
            })
            .collect();

        let monsters = state
            .monsters
            .iter()
            .map(|monster| MonsterSnapshot {
                instance_id: monster.id,
                active: monster.active,
                hp: monster.combatant.current_hp(),
                shield: monster.combatant.shield(),
                bleed_stacks: monster.combatant.status.bleed_stacks,
                position: monster.position,
            })
            .collect();

        Self {
            heroes,
            monsters,
            resources: state.resources.snapshot(),
            intents: state.intents.clone(),
        }
    }

    /// Write this snapshot back into `state`.
    pub fn restore(&self, state: &mut BattleState) {
        state.resources.restore(self.resources);

        for (hero, saved) in state.party.iter_mut().zip(&self.heroes) {
            hero.combatant.set_hp(saved.hp);
            hero.combatant.set_shield(saved.shield);
            hero.stamina = saved.stamina;
            hero.combatant.status.hidden = saved.hidden;
            hero.combatant.status.stun_phases = saved.stun_phases;
            hero.combatant.status.stun_locked = saved.stun_locked;
            hero.combatant.status.bleed_stacks = saved.bleed_stacks;
            hero.combatant.has_acted_this_round = saved.has_acted_this_round;
            hero.damage_attacks_this_turn = saved.damage_attacks_this_turn;
            hero.abilities_used_this_turn = saved.abilities_used_this_turn.clone();
            hero.xp = saved.xp;
        }

        for monster in state.monsters.iter_mut() {
            match self.monsters.iter().find(|saved| saved.instance_id == monster.id) {
                Some(saved) => {
                    monster.active = saved.active;
                    monster.combatant.set_hp(saved.hp);
                    monster.combatant.set_shield(saved.shield);
                    monster.combatant.status.bleed_stacks = saved.bleed_stacks;
                    monster.position = saved.position;
                }
                None => monster.deactivate(),
            }
        }

        state.intents = self
            .intents
            .iter()
            .filter(|intent| state.is_monster_in_play(intent.enemy))
            .cloned()
            .collect();
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotStack {
    stack: Vec<BattleSaveState>,
}

impl SnapshotStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Undo is possible while anything sits above the baseline.
    pub fn can_undo(&self) -> bool {
        self.stack.len() > 1
    }

    pub fn clear(&mut self) {
        self.stack.clear();
    }

    pub fn push(&mut self, state: &BattleState) {
        self.stack.push(BattleSaveState::capture(state));
        tracing::debug!(depth = self.stack.len(), "snapshot pushed");
    }

    /// Reset to a single baseline of the current state.
    pub fn begin_player_turn(&mut self, state: &BattleState) {
        self.stack.clear();
        self.push(state);
    }

    /// Drop the top snapshot without restoring anything. Used when a cast
    /// aborts after its checkpoint was taken.
    pub fn discard_top(&mut self) -> Option<BattleSaveState> {
        let dropped = self.stack.pop();
        tracing::debug!(depth = self.stack.len(), "snapshot discarded");
        dropped
    }

    /// Pop the most recent snapshot and restore the new top. Returns the
    /// remaining depth, or `None` when only the baseline is left.
    pub fn undo(&mut self, state: &mut BattleState) -> Option<usize> {
        if !self.can_undo() {
            return None;
        }
        self.stack.pop();
        let top = self.stack.last()?;
        top.restore(state);
        tracing::debug!(depth = self.stack.len(), "snapshot restored");
        Some(self.stack.len())
    }
}
