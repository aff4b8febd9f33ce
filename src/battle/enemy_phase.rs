//! Execution of the locked intents, strictly in planning order.
//!
//! Execution is resumable: an attack that the presentation animates parks
//! the cursor until the impact arrives (or times out), then carries on with
//! the next intent.

use crate::battle::collaborators::{Presentation, RewardFlow};
use crate::battle::commands::{execute_command_batch, BattleCommand};
use crate::battle::controller::{BattleController, DeferredAction, ImpactWait};
use crate::battle::damage::{self, DamageInput};
use crate::battle::intents::{resolve_target, EnemyIntent};
use crate::battle::state::{BattleEvent, BattleOutcome, BattlePhase, BattleState};
use crate::combatant::CombatantRef;
use crate::hero::Hero;
use crate::monster::Monster;

/// Commands for one intent landing. `target` is ignored for AoE intents.
pub fn intent_commands(state: &BattleState, intent: &EnemyIntent, target: Option<usize>) -> Vec<BattleCommand> {
    let mut commands = Vec::new();
    let Some(monster) = state.monster(intent.enemy) else {
        return commands;
    };

    if intent.is_aoe {
        // AoE hits the hidden too, and always strips concealment.
        for (index, hero) in state.party.iter().enumerate().filter(|(_, hero)| hero.is_alive()) {
            if hero.is_hidden() {
                commands.push(BattleCommand::SetHidden {
                    hero: index,
                    hidden: false,
                });
            }
            push_hit(&mut commands, monster, intent, index, hero);
        }
        return commands;
    }

    let Some(index) = target else {
        return commands;
    };
    let Some(hero) = state.hero(index).filter(|hero| hero.is_alive()) else {
        return commands;
    };
    if hero.is_hidden() {
        commands.push(BattleCommand::EmitEvent(BattleEvent::AttackMissed {
            attacker: intent.enemy,
            target: index,
        }));
        return commands;
    }
    push_hit(&mut commands, monster, intent, index, hero);
    commands
}

fn push_hit(
    commands: &mut Vec<BattleCommand>,
    monster: &Monster,
    intent: &EnemyIntent,
    index: usize,
    hero: &Hero,
) {
    let hit = DamageInput::for_intent(monster, intent, &hero.combatant);
    let lethal = damage::preview(&hit) >= hero.combatant.current_hp().saturating_add(hero.combatant.shield());
    commands.push(BattleCommand::DealDamage {
        target: CombatantRef::Hero(index),
        hit,
    });
    if lethal {
        return;
    }
    if intent.stuns_target && intent.stun_phases > 0 {
        commands.push(BattleCommand::ApplyStun {
            hero: index,
            phases: intent.stun_phases,
        });
    }
    if intent.applies_bleed && intent.bleed_stacks > 0 {
        commands.push(BattleCommand::AddBleed {
            target: CombatantRef::Hero(index),
            stacks: intent.bleed_stacks,
        });
    }
}

impl<P: Presentation, R: RewardFlow> BattleController<P, R> {
    /// Run intents from the cursor until one waits on an animation, the
    /// party falls, or the list is exhausted.
    pub(super) fn run_enemy_phase(&mut self) {
        while self.state.phase == BattlePhase::EnemyPhase && self.waiting.is_none() {
            let Some(intent) = self.state.intents.get(self.enemy_cursor).cloned() else {
                self.finish_enemy_phase();
                return;
            };
            if !self.state.is_monster_in_play(intent.enemy) {
                tracing::debug!(monster = %intent.enemy, "intent skipped, monster gone");
                self.enemy_cursor += 1;
                continue;
            }

            let target = if intent.is_aoe {
                None
            } else {
                match resolve_target(&self.state, &intent, &mut self.rng) {
                    Some(target) => Some(target),
                    None => {
                        self.end_battle(BattleOutcome::Defeat);
                        return;
                    }
                }
            };
            if let Some(new_target) = target.filter(|target| *target != intent.target_party_index) {
                let retarget = BattleCommand::RetargetIntent {
                    index: self.enemy_cursor,
                    new_target,
                };
                if let Err(error) = execute_command_batch(vec![retarget], &mut self.state, &mut self.bus) {
                    self.report_execution_error(error);
                }
            }

            let handle = match self.state.monster(intent.enemy) {
                Some(monster) => self.presentation.play_enemy_attack(monster, target),
                None => None,
            };
            match handle {
                Some(handle) => {
                    tracing::debug!(monster = %intent.enemy, handle = handle.0, "waiting for attack impact");
                    self.waiting = Some(ImpactWait {
                        handle,
                        deadline: self.impact_deadline(),
                        action: DeferredAction::EnemyAttack {
                            intent_index: self.enemy_cursor,
                            target,
                        },
                    });
                    return;
                }
                None => self.land_enemy_attack(self.enemy_cursor, target),
            }
        }
    }

    /// Resume after a deferred attack reached its impact.
    pub(super) fn finish_enemy_attack(&mut self, intent_index: usize, target: Option<usize>) {
        self.land_enemy_attack(intent_index, target);
        self.run_enemy_phase();
    }

    fn land_enemy_attack(&mut self, intent_index: usize, target: Option<usize>) {
        if let Some(intent) = self.state.intents.get(intent_index).cloned() {
            let commands = intent_commands(&self.state, &intent, target);
            let hits: Vec<(CombatantRef, u32)> = commands
                .iter()
                .filter_map(|command| match command {
                    BattleCommand::DealDamage { target, hit } => Some((*target, damage::preview(hit))),
                    _ => None,
                })
                .collect();
            if let Err(error) = execute_command_batch(commands, &mut self.state, &mut self.bus) {
                self.report_execution_error(error);
            }
            for (target, amount) in hits {
                self.presentation.on_hit(target, amount);
            }
            self.bus.push(BattleEvent::PartyChanged);
        }
        self.enemy_cursor = intent_index + 1;

        if self.state.party_wiped() {
            self.end_battle(BattleOutcome::Defeat);
        }
    }

    fn finish_enemy_phase(&mut self) {
        tracing::debug!(executed = self.enemy_cursor, "enemy phase complete");
        if self.state.party_wiped() {
            self.end_battle(BattleOutcome::Defeat);
        } else {
            self.enter_player_phase(true);
        }
    }
}
