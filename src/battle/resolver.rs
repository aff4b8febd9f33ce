//! Ability resolution: target selection, the cast pipeline and its effects.
//!
//! A cast goes `begin_ability_use` -> preview click -> confirm click on the
//! same target -> checkpoint, spend, animation, effects. Until the spend
//! everything can be cancelled without a trace; after it the cast is
//! committed and only undo can reverse it.

use crate::battle::collaborators::{Presentation, RewardFlow};
use crate::battle::commands::{execute_command_batch, BattleCommand};
use crate::battle::controller::{BattleController, DeferredAction, ImpactWait};
use crate::battle::damage::{self, DamageInput};
use crate::battle::state::{BattleEvent, BattleState};
use crate::combatant::{CombatantRef, MonsterId};
use crate::errors::{CommandRejected, CommandResult};
use schema::{AbilityDefinition, TargetType};
use serde::{Deserialize, Serialize};

/// An ability chosen by the player but not yet paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAbility {
    pub caster: usize,
    pub ability_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TargetingState {
    #[default]
    Idle,
    AwaitingTarget(PendingAbility),
    /// First click landed; a second click on the same target commits.
    Previewing {
        pending: PendingAbility,
        target: CombatantRef,
        predicted_damage: Option<u32>,
    },
}

impl TargetingState {
    pub fn pending_ability(&self) -> Option<PendingAbility> {
        match self {
            TargetingState::Idle => None,
            TargetingState::AwaitingTarget(pending) | TargetingState::Previewing { pending, .. } => Some(*pending),
        }
    }
}

/// A paid-for cast whose effects have not landed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastInFlight {
    pub caster: usize,
    pub ability_index: usize,
    pub target: Option<CombatantRef>,
}

/// Whether `target` is a legal destination for an ability of `target_type`
/// cast by the hero at `caster`.
pub fn is_valid_target(state: &BattleState, caster: usize, target_type: TargetType, target: CombatantRef) -> bool {
    match (target_type, target) {
        (TargetType::Enemy, CombatantRef::Monster(id)) => state.is_monster_in_play(id),
        (TargetType::User, CombatantRef::Hero(index)) => index == caster && state.is_hero_alive(index),
        (TargetType::Ally, CombatantRef::Hero(index)) => state.is_hero_alive(index),
        _ => false,
    }
}

/// Damage `ability` would deal to `target` right now, without touching anything.
pub fn predicted_damage(state: &BattleState, caster: usize, ability: &AbilityDefinition, target: CombatantRef) -> Option<u32> {
    let CombatantRef::Monster(id) = target else {
        return None;
    };
    if !ability.is_damaging() {
        return None;
    }
    let hero = state.hero(caster)?;
    let monster = state.monster(id)?;
    Some(damage::preview(&DamageInput::for_ability(hero, ability, &monster.combatant)))
}

/// Everything a committed cast does to the battle, in application order.
pub fn cast_effect_commands(state: &BattleState, cast: &CastInFlight, ability: &AbilityDefinition) -> Vec<BattleCommand> {
    let mut commands = Vec::new();
    let Some(hero) = state.hero(cast.caster) else {
        return commands;
    };
    let mut killed_target = false;

    match (ability.target_type, cast.target) {
        (TargetType::Enemy, Some(CombatantRef::Monster(id))) => {
            if let Some(monster) = state.monster(id).filter(|monster| monster.is_active_and_alive()) {
                let hit = DamageInput::for_ability(hero, ability, &monster.combatant);
                let lethal =
                    damage::preview(&hit) >= monster.combatant.current_hp().saturating_add(monster.combatant.shield());
                commands.push(BattleCommand::DealDamage {
                    target: CombatantRef::Monster(id),
                    hit,
                });
                if lethal {
                    killed_target = true;
                    commands.push(BattleCommand::DefeatMonster { monster: id });
                    commands.push(BattleCommand::GrantXp {
                        hero: cast.caster,
                        amount: monster.xp_reward,
                    });
                } else if ability.bleed_stacks > 0 {
                    commands.push(BattleCommand::AddBleed {
                        target: CombatantRef::Monster(id),
                        stacks: ability.bleed_stacks,
                    });
                }
            }
        }
        (TargetType::User | TargetType::Ally, Some(CombatantRef::Hero(index))) if ability.shield_amount > 0 => {
            commands.push(BattleCommand::AddShield {
                hero: index,
                amount: ability.shield_amount,
            });
        }
        _ => {}
    }

    commands.push(BattleCommand::RecordAbilityUse {
        hero: cast.caster,
        ability_id: ability.id.clone(),
        damaging: ability.is_damaging(),
    });

    // Concealment is evaluated after the effects so the finisher knows whether it killed.
    if ability.flags.grants_hidden {
        commands.push(BattleCommand::SetHidden {
            hero: cast.caster,
            hidden: true,
        });
    } else if hero.is_hidden() && ability.flags.breaks_hidden && !(ability.flags.lethal_finisher && killed_target) {
        commands.push(BattleCommand::SetHidden {
            hero: cast.caster,
            hidden: false,
        });
    }

    commands.push(BattleCommand::MarkActed { hero: cast.caster });
    commands
}

impl<P: Presentation, R: RewardFlow> BattleController<P, R> {
    /// Pick an ability for `caster`. Abilities that need no target resolve
    /// immediately; the rest wait for a target click.
    pub fn begin_ability_use(&mut self, caster: usize, ability_index: usize) -> CommandResult<()> {
        self.require_player_control()?;
        if self.targeting != TargetingState::Idle {
            return self.reject(CommandRejected::AbilityAlreadyPending);
        }
        let ability = self.validate_caster(caster, ability_index)?;

        let pending = PendingAbility { caster, ability_index };
        if ability.resolves_without_target() {
            return self.resolve_cast(pending, None);
        }
        tracing::debug!(caster, ability = %ability.id, "ability pending");
        self.set_active_member(Some(caster));
        self.targeting = TargetingState::AwaitingTarget(pending);
        Ok(())
    }

    /// A click on a monster: preview it, confirm it, or cancel the preview.
    pub fn select_enemy_target(&mut self, monster: MonsterId) -> CommandResult<()> {
        if self.state.monster(monster).is_none() {
            return self.reject(CommandRejected::UnknownMonster(monster));
        }
        self.select_target(CombatantRef::Monster(monster))
    }

    /// A click on a party member: preview it, confirm it, or cancel the preview.
    pub fn select_party_target(&mut self, party_index: usize) -> CommandResult<()> {
        if self.state.hero(party_index).is_none() {
            return self.reject(CommandRejected::InvalidPartyIndex(party_index));
        }
        self.select_target(CombatantRef::Hero(party_index))
    }

    /// A click on empty space: drop the pending ability, if any.
    pub fn cancel_pending_ability(&mut self) -> CommandResult<()> {
        self.require_player_control()?;
        if !self.clear_pending_ability() {
            return self.reject(CommandRejected::NoPendingAbility);
        }
        tracing::debug!("pending ability cancelled");
        Ok(())
    }

    /// What `ability_index` of `caster` would deal to `target` if cast now.
    pub fn preview_damage(&self, caster: usize, ability_index: usize, target: CombatantRef) -> Option<u32> {
        let ability = self.state.hero(caster)?.ability(ability_index)?;
        predicted_damage(&self.state, caster, ability, target)
    }

    fn select_target(&mut self, target: CombatantRef) -> CommandResult<()> {
        self.require_player_control()?;
        match self.targeting.clone() {
            TargetingState::Idle => self.reject(CommandRejected::NoPendingAbility),
            TargetingState::AwaitingTarget(pending) => {
                let ability = self.pending_definition(pending)?;
                if !is_valid_target(&self.state, pending.caster, ability.target_type, target) {
                    return self.reject(CommandRejected::InvalidTarget);
                }
                let predicted_damage = predicted_damage(&self.state, pending.caster, &ability, target);
                self.targeting = TargetingState::Previewing {
                    pending,
                    target,
                    predicted_damage,
                };
                self.bus.push(BattleEvent::TargetPreviewed {
                    caster: pending.caster,
                    ability: ability.name.clone(),
                    target,
                    predicted_damage,
                });
                Ok(())
            }
            TargetingState::Previewing {
                pending,
                target: previewed,
                ..
            } => {
                if previewed == target {
                    self.resolve_cast(pending, Some(target))
                } else {
                    tracing::debug!(?previewed, clicked = ?target, "different target clicked, cancelling");
                    self.clear_pending_ability();
                    Ok(())
                }
            }
        }
    }

    fn pending_definition(&self, pending: PendingAbility) -> CommandResult<AbilityDefinition> {
        match self.state.hero(pending.caster).and_then(|hero| hero.ability(pending.ability_index)) {
            Some(ability) => Ok(ability.clone()),
            None => self.reject(CommandRejected::InvalidAbilityIndex {
                caster: pending.caster,
                ability_index: pending.ability_index,
            }),
        }
    }

    /// Every check that must pass before an ability may even be picked.
    fn validate_caster(&self, caster: usize, ability_index: usize) -> CommandResult<AbilityDefinition> {
        let Some(hero) = self.state.hero(caster) else {
            return self.reject(CommandRejected::InvalidPartyIndex(caster));
        };
        let Some(ability) = hero.ability(ability_index) else {
            return self.reject(CommandRejected::InvalidAbilityIndex { caster, ability_index });
        };
        if !hero.is_alive() {
            return self.reject(CommandRejected::CasterDown(caster));
        }
        if hero.combatant.status.is_stunned() {
            return self.reject(CommandRejected::CasterStunned(caster));
        }
        if ability.flags.usable_once_per_turn && hero.abilities_used_this_turn.contains(&ability.id) {
            return self.reject(CommandRejected::OncePerTurn {
                ability: ability.id.clone(),
            });
        }
        if ability.is_damaging() && hero.reached_damage_limit() {
            return self.reject(CommandRejected::DamageAttackLimit {
                caster,
                limit: hero.damage_attack_limit.unwrap_or_default(),
            });
        }
        if ability.target_type == TargetType::Enemy && self.state.active_monsters().next().is_none() {
            return self.reject(CommandRejected::NoLivingEnemy);
        }
        Ok(ability.clone())
    }

    /// Steps 1-5 of a cast: re-check the target, checkpoint, pay, then
    /// either wait for the impact or apply straight away.
    fn resolve_cast(&mut self, pending: PendingAbility, target: Option<CombatantRef>) -> CommandResult<()> {
        let ability = self.pending_definition(pending)?;

        if let Some(target) = target {
            if !is_valid_target(&self.state, pending.caster, ability.target_type, target) {
                self.targeting = TargetingState::AwaitingTarget(pending);
                self.bus.push(BattleEvent::TargetLost { target });
                return self.reject(CommandRejected::StaleTarget);
            }
        }

        self.snapshots.push(&self.state);
        if let Err(reason) = self.pay_for(pending.caster, &ability) {
            self.snapshots.discard_top();
            self.clear_pending_ability();
            return self.reject(reason);
        }
        self.bus.push(BattleEvent::ResourcesChanged {
            amounts: self.state.resources.amounts(),
        });

        self.set_active_member(Some(pending.caster));
        self.targeting = TargetingState::Idle;
        tracing::info!(caster = pending.caster, ability = %ability.id, ?target, "ability cast");
        self.bus.push(BattleEvent::AbilityUsed {
            caster: pending.caster,
            ability: ability.name.clone(),
            target,
        });

        let cast = CastInFlight {
            caster: pending.caster,
            ability_index: pending.ability_index,
            target,
        };
        let handle = match self.state.hero(pending.caster) {
            Some(hero) => self.presentation.play_cast_animation(pending.caster, hero, &ability),
            None => None,
        };
        match handle {
            Some(handle) if ability.flags.impact_sync => {
                tracing::debug!(handle = handle.0, "waiting for cast impact");
                self.waiting = Some(ImpactWait {
                    handle,
                    deadline: self.impact_deadline(),
                    action: DeferredAction::Cast(cast),
                });
                self.sync_undo_availability();
            }
            _ => self.apply_cast(cast),
        }
        Ok(())
    }

    /// Spend currency and stamina together, or neither.
    fn pay_for(&mut self, caster: usize, ability: &AbilityDefinition) -> CommandResult<()> {
        let Some(hero) = self.state.hero(caster) else {
            return Err(CommandRejected::InvalidPartyIndex(caster));
        };
        let cost = ability.effective_cost(hero.is_hidden());
        if hero.stamina < ability.stamina_cost {
            return Err(CommandRejected::InsufficientStamina {
                needed: ability.stamina_cost,
                available: hero.stamina,
            });
        }
        if let Some((currency, needed, available)) = self.state.resources.shortfall(&cost) {
            return Err(CommandRejected::InsufficientResources {
                currency,
                needed,
                available,
            });
        }
        // Covered by the shortfall check, so this cannot fail.
        self.state.resources.try_spend(&cost);
        if let Some(hero) = self.state.hero_mut(caster) {
            hero.stamina -= ability.stamina_cost;
        }
        Ok(())
    }

    /// Steps 6-7 of a cast: effects, bookkeeping, and the victory check.
    pub(super) fn apply_cast(&mut self, cast: CastInFlight) {
        let ability = self
            .state
            .hero(cast.caster)
            .and_then(|hero| hero.ability(cast.ability_index))
            .cloned();
        if let Some(ability) = ability {
            let commands = cast_effect_commands(&self.state, &cast, &ability);
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
        }

        self.waiting = None;
        self.bus.push(BattleEvent::PendingAbilityCleared);
        self.bus.push(BattleEvent::PartyChanged);
        self.sync_undo_availability();
        self.check_battle_over();
    }
}
