use crate::battle::damage::{self, DamageInput};
use crate::battle::intents::remove_intents_for;
use crate::battle::state::{BattleEvent, BattleState, EventBus};
use crate::combatant::{Combatant, CombatantRef, MonsterId};
use crate::errors::ExecutionError;
use crate::hero::Hero;

/// Atomic commands representing final state changes.
///
/// Everything that touches a combatant, or the intent list, goes through
/// one of these; the resolver, the enemy phase and the status tick only
/// decide *which* commands to issue.
#[derive(Debug, Clone, PartialEq)]
pub enum BattleCommand {
    // Combatant modifications
    /// A formula hit, evaluated against the target when it lands.
    DealDamage {
        target: CombatantRef,
        hit: DamageInput,
    },
    /// HP loss that skips the shield.
    Bleed {
        target: CombatantRef,
        amount: u32,
    },
    AddShield {
        hero: usize,
        amount: u32,
    },
    SetHidden {
        hero: usize,
        hidden: bool,
    },
    ApplyStun {
        hero: usize,
        phases: u8,
    },
    AddBleed {
        target: CombatantRef,
        stacks: u32,
    },
    /// Spend one pending stun phase: the hero loses this player phase.
    ConsumeStun {
        hero: usize,
    },
    MarkActed {
        hero: usize,
    },
    RecordAbilityUse {
        hero: usize,
        ability_id: String,
        damaging: bool,
    },
    GrantXp {
        hero: usize,
        amount: u32,
    },

    // Encounter arena
    DefeatMonster {
        monster: MonsterId,
    },
    RetargetIntent {
        index: usize,
        new_target: usize,
    },

    // Battle flow
    EmitEvent(BattleEvent),
}

pub fn execute_command_batch(
    commands: Vec<BattleCommand>,
    state: &mut BattleState,
    bus: &mut EventBus,
) -> Result<(), ExecutionError> {
    for command in commands {
        execute_command(command, state, bus)?;
    }
    Ok(())
}

/// Helper function to execute commands that operate on a single hero
fn execute_hero_command<F>(hero: usize, state: &mut BattleState, operation: F) -> Result<(), ExecutionError>
where
    F: FnOnce(&mut Hero),
{
    let target = state.hero_mut(hero).ok_or(ExecutionError::NoHero(hero))?;
    operation(target);
    Ok(())
}

fn combatant_mut(state: &mut BattleState, target: CombatantRef) -> Result<&mut Combatant, ExecutionError> {
    match target {
        CombatantRef::Hero(index) => state
            .hero_mut(index)
            .map(|hero| &mut hero.combatant)
            .ok_or(ExecutionError::NoHero(index)),
        CombatantRef::Monster(id) => state
            .monster_mut(id)
            .map(|monster| &mut monster.combatant)
            .ok_or(ExecutionError::NoMonster(id)),
    }
}

/// Helper function specifically for DealDamage command with event emission
fn execute_deal_damage_command(
    target: CombatantRef,
    hit: DamageInput,
    state: &mut BattleState,
    bus: &mut EventBus,
) -> Result<(), ExecutionError> {
    let combatant = combatant_mut(state, target)?;
    let taken = damage::apply(combatant, &hit).taken;
    let remaining_hp = combatant.current_hp();

    bus.push(BattleEvent::DamageDealt {
        target,
        amount: taken.absorbed + taken.hp_lost,
        absorbed: taken.absorbed,
        remaining_hp,
    });

    if taken.died {
        if let CombatantRef::Hero(party_index) = target {
            bus.push(BattleEvent::HeroDowned { party_index });
        }
    }
    Ok(())
}

fn execute_bleed_command(
    target: CombatantRef,
    amount: u32,
    state: &mut BattleState,
    bus: &mut EventBus,
) -> Result<(), ExecutionError> {
    let combatant = combatant_mut(state, target)?;
    if !combatant.is_alive() {
        return Ok(());
    }
    let before = combatant.current_hp();
    let died = combatant.lose_hp(amount);
    let remaining_hp = combatant.current_hp();

    bus.push(BattleEvent::BleedDamage {
        target,
        damage: before - remaining_hp,
        remaining_hp,
    });
    if died {
        if let CombatantRef::Hero(party_index) = target {
            bus.push(BattleEvent::HeroDowned { party_index });
        }
    }
    Ok(())
}

fn execute_command(command: BattleCommand, state: &mut BattleState, bus: &mut EventBus) -> Result<(), ExecutionError> {
    match command {
        BattleCommand::EmitEvent(event) => {
            bus.push(event);
            Ok(())
        }
        BattleCommand::DealDamage { target, hit } => execute_deal_damage_command(target, hit, state, bus),
        BattleCommand::Bleed { target, amount } => execute_bleed_command(target, amount, state, bus),
        BattleCommand::AddShield { hero, amount } => {
            let target = state.hero_mut(hero).ok_or(ExecutionError::NoHero(hero))?;
            target.combatant.add_shield(amount);
            bus.push(BattleEvent::ShieldGained {
                target: hero,
                amount,
                new_shield: target.combatant.shield(),
            });
            Ok(())
        }
        BattleCommand::SetHidden { hero, hidden } => {
            let target = state.hero_mut(hero).ok_or(ExecutionError::NoHero(hero))?;
            if target.combatant.status.hidden != hidden {
                target.combatant.status.hidden = hidden;
                bus.push(BattleEvent::ConcealmentChanged { target: hero, hidden });
            }
            Ok(())
        }
        BattleCommand::ApplyStun { hero, phases } => {
            let target = state.hero_mut(hero).ok_or(ExecutionError::NoHero(hero))?;
            target.combatant.status.apply_stun(phases);
            bus.push(BattleEvent::StunApplied { target: hero, phases });
            Ok(())
        }
        BattleCommand::AddBleed { target, stacks } => {
            let combatant = combatant_mut(state, target)?;
            combatant.status.add_bleed(stacks);
            let total_stacks = combatant.status.bleed_stacks;
            bus.push(BattleEvent::BleedApplied {
                target,
                stacks,
                total_stacks,
            });
            Ok(())
        }
        BattleCommand::ConsumeStun { hero } => {
            let target = state.hero_mut(hero).ok_or(ExecutionError::NoHero(hero))?;
            if target.is_alive() && target.combatant.status.consume_stun() {
                target.combatant.has_acted_this_round = true;
                bus.push(BattleEvent::TurnSkipped { target: hero });
            }
            Ok(())
        }
        BattleCommand::MarkActed { hero } => execute_hero_command(hero, state, |target| {
            target.combatant.has_acted_this_round = true;
        }),
        BattleCommand::RecordAbilityUse {
            hero,
            ability_id,
            damaging,
        } => execute_hero_command(hero, state, |target| {
            target.abilities_used_this_turn.insert(ability_id);
            if damaging {
                target.damage_attacks_this_turn = target.damage_attacks_this_turn.saturating_add(1);
            }
        }),
        BattleCommand::GrantXp { hero, amount } => {
            let target = state.hero_mut(hero).ok_or(ExecutionError::NoHero(hero))?;
            target.xp = target.xp.saturating_add(amount);
            bus.push(BattleEvent::XpGranted {
                party_index: hero,
                amount,
            });
            Ok(())
        }
        BattleCommand::DefeatMonster { monster } => {
            let target = state.monster_mut(monster).ok_or(ExecutionError::NoMonster(monster))?;
            if !target.active {
                return Ok(());
            }
            target.deactivate();
            let removed = remove_intents_for(&mut state.intents, monster);
            tracing::debug!(%monster, removed_intents = removed, "monster defeated");
            bus.push(BattleEvent::MonsterDefeated { monster });
            Ok(())
        }
        BattleCommand::RetargetIntent { index, new_target } => {
            let intent = state.intents.get_mut(index).ok_or(ExecutionError::NoIntent(index))?;
            let old_target = std::mem::replace(&mut intent.target_party_index, new_target);
            bus.push(BattleEvent::IntentRetargeted {
                monster: intent.enemy,
                old_target,
                new_target,
            });
            Ok(())
        }
    }
}
