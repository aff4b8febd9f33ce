//! Start-of-player-phase status tick.
//!
//! Bleed and stun are consumed here and nowhere else, once per player phase,
//! before the player regains control. Bleed stacks are not cleared by the
//! tick; they persist until the encounter ends.

use crate::battle::commands::{execute_command_batch, BattleCommand};
use crate::battle::state::{BattleState, EventBus};
use crate::combatant::CombatantRef;
use crate::errors::ExecutionError;

/// What the tick did, so the controller can check for terminal states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusTickReport {
    pub heroes_downed: usize,
    pub monsters_defeated: usize,
}

impl StatusTickReport {
    /// Only a tick that took someone out can end the battle.
    pub fn downed_anyone(&self) -> bool {
        self.heroes_downed > 0 || self.monsters_defeated > 0
    }
}

/// Commands for every hero: bleed first, then stun consumption.
pub fn hero_tick_commands(state: &BattleState, bleed_damage_per_stack: u32) -> Vec<BattleCommand> {
    let mut commands = Vec::new();
    for (index, hero) in state.party.iter().enumerate() {
        if !hero.is_alive() {
            continue;
        }
        let status = &hero.combatant.status;
        if status.bleed_stacks > 0 {
            commands.push(BattleCommand::Bleed {
                target: CombatantRef::Hero(index),
                amount: status.bleed_stacks.saturating_mul(bleed_damage_per_stack),
            });
        }
        if status.stun_phases > 0 {
            commands.push(BattleCommand::ConsumeStun { hero: index });
        }
    }
    commands
}

/// Bleed commands for every monster still in play.
pub fn monster_tick_commands(state: &BattleState, bleed_damage_per_stack: u32) -> Vec<BattleCommand> {
    state
        .active_monsters()
        .filter(|monster| monster.combatant.status.bleed_stacks > 0)
        .map(|monster| BattleCommand::Bleed {
            target: CombatantRef::Monster(monster.id),
            amount: monster
                .combatant
                .status
                .bleed_stacks
                .saturating_mul(bleed_damage_per_stack),
        })
        .collect()
}

/// Run the full tick. Monsters bled to death are deactivated and lose their intents.
pub fn tick_player_phase_start(
    state: &mut BattleState,
    bus: &mut EventBus,
    bleed_damage_per_stack: u32,
) -> Result<StatusTickReport, ExecutionError> {
    let living_heroes = state.living_hero_indices().len();

    let commands = hero_tick_commands(state, bleed_damage_per_stack);
    execute_command_batch(commands, state, bus)?;

    let commands = monster_tick_commands(state, bleed_damage_per_stack);
    execute_command_batch(commands, state, bus)?;

    let bled_out: Vec<BattleCommand> = state
        .monsters
        .iter()
        .filter(|monster| monster.active && !monster.combatant.is_alive())
        .map(|monster| BattleCommand::DefeatMonster { monster: monster.id })
        .collect();
    let monsters_defeated = bled_out.len();
    execute_command_batch(bled_out, state, bus)?;

    let report = StatusTickReport {
        heroes_downed: living_heroes - state.living_hero_indices().len(),
        monsters_defeated,
    };
    if report.downed_anyone() {
        tracing::debug!(?report, "status tick downed combatants");
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::intents::EnemyIntent;
    use crate::battle::state::BattleEvent;
    use crate::battle::tests::common::{create_test_state, TestHeroBuilder, TestMonsterBuilder};
    use pretty_assertions::assert_eq;
    use schema::MonsterAttack;

    #[test]
    fn test_bleed_ticks_and_stacks_persist() {
        let mut state = create_test_state(
            vec![TestHeroBuilder::new("Ayla").with_max_hp(20).build()],
            vec![TestMonsterBuilder::new("Rat").with_max_hp(20).build()],
        );
        state.party[0].combatant.status.bleed_stacks = 3;
        state.party[0].combatant.add_shield(50);
        state.monsters[0].combatant.status.bleed_stacks = 2;
        let mut bus = EventBus::new();

        let report = tick_player_phase_start(&mut state, &mut bus, 2).expect("tick succeeds");

        assert_eq!(report, StatusTickReport::default());
        assert!(!report.downed_anyone());
        assert_eq!(state.party[0].combatant.current_hp(), 14);
        assert_eq!(state.party[0].combatant.shield(), 50);
        assert_eq!(state.party[0].combatant.status.bleed_stacks, 3);
        assert_eq!(state.monsters[0].combatant.current_hp(), 16);
        assert_eq!(state.monsters[0].combatant.status.bleed_stacks, 2);
    }

    #[test]
    fn test_stun_locks_hero_for_one_phase() {
        let mut state = create_test_state(
            vec![TestHeroBuilder::new("Ayla").build()],
            vec![TestMonsterBuilder::new("Rat").build()],
        );
        state.party[0].combatant.status.apply_stun(1);
        let mut bus = EventBus::new();

        tick_player_phase_start(&mut state, &mut bus, 1).expect("tick succeeds");

        let hero = &state.party[0];
        assert!(hero.combatant.status.is_stunned());
        assert!(hero.combatant.has_acted_this_round);
        assert_eq!(hero.combatant.status.stun_phases, 0);
        assert!(!hero.can_act());
        assert_eq!(bus.events(), &[BattleEvent::TurnSkipped { target: 0 }]);

        // The following phase is free again.
        state.party[0].reset_round();
        let mut bus = EventBus::new();
        tick_player_phase_start(&mut state, &mut bus, 1).expect("tick succeeds");
        assert!(state.party[0].can_act());
        assert!(bus.is_empty());
    }

    #[test]
    fn test_monster_bled_to_death_is_deactivated() {
        let mut state = create_test_state(
            vec![TestHeroBuilder::new("Ayla").build()],
            vec![
                TestMonsterBuilder::new("Rat").with_max_hp(2).build(),
                TestMonsterBuilder::new("Bat").build(),
            ],
        );
        let (rat, bat) = (state.monsters[0].id, state.monsters[1].id);
        state.monsters[0].combatant.status.bleed_stacks = 5;
        state.intents = vec![
            EnemyIntent::from_attack(rat, 0, 0, &MonsterAttack::basic("bite", 3)),
            EnemyIntent::from_attack(bat, 0, 0, &MonsterAttack::basic("screech", 1)),
        ];
        let mut bus = EventBus::new();

        let report = tick_player_phase_start(&mut state, &mut bus, 1).expect("tick succeeds");

        assert_eq!(report.monsters_defeated, 1);
        assert!(report.downed_anyone());
        assert!(!state.monsters[0].active);
        assert_eq!(state.intents.len(), 1);
        assert_eq!(state.intents[0].enemy, bat);
        assert!(!state.encounter_cleared());
    }

    #[test]
    fn test_hero_bled_to_death_counts_as_downed() {
        let mut state = create_test_state(
            vec![TestHeroBuilder::new("Ayla").with_hp(1).build()],
            vec![TestMonsterBuilder::new("Rat").build()],
        );
        state.party[0].combatant.status.bleed_stacks = 1;
        state.party[0].combatant.status.apply_stun(2);
        let mut bus = EventBus::new();

        let report = tick_player_phase_start(&mut state, &mut bus, 1).expect("tick succeeds");

        assert_eq!(report.heroes_downed, 1);
        assert!(state.party_wiped());
        // A downed hero does not also consume stun.
        assert!(!bus.events().contains(&BattleEvent::TurnSkipped { target: 0 }));
    }
}
