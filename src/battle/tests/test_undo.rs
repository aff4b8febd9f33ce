#[cfg(test)]
mod tests {
    use crate::battle::resolver::TargetingState;
    use crate::battle::state::BattleEvent;
    use crate::battle::tests::common::{
        ability, assert_ok, controller_in_battle, TestController, TestHeroBuilder, TestMonsterBuilder,
    };
    use crate::combatant::MonsterId;
    use crate::errors::CommandRejected;
    use pretty_assertions::assert_eq;
    use schema::{CurrencyAmounts, MonsterDefinition};

    const RAT: MonsterId = MonsterId(1);
    const BAT: MonsterId = MonsterId(2);

    fn monster(name: &str, max_hp: u32) -> MonsterDefinition {
        TestMonsterBuilder::new(name).with_max_hp(max_hp).definition()
    }

    /// Knight with a 10-damage slash costing one attack, against a rat and a
    /// bat, holding three attack currency.
    fn knight_vs_rat_and_bat(rat_hp: u32) -> TestController {
        let slash = ability("slash").damage(10).cost(CurrencyAmounts::new(1, 0, 0, 0)).build();
        let mut controller = controller_in_battle(
            vec![TestHeroBuilder::new("Knight").with_abilities(vec![slash]).build()],
            vec![monster("Rat", rat_hp), monster("Bat", 30)],
        );
        assert_ok(controller.grant_resources(CurrencyAmounts::new(3, 0, 0, 0)));
        controller.drain_events();
        controller
    }

    fn cast_slash(controller: &mut TestController, target: MonsterId) {
        assert_ok(controller.begin_ability_use(0, 0));
        assert_ok(controller.select_enemy_target(target));
        assert_ok(controller.select_enemy_target(target));
    }

    #[test]
    fn test_undo_returns_to_turn_start_then_refuses() {
        // Arrange: baseline at turn start, then one cast of 10 damage.
        let mut controller = knight_vs_rat_and_bat(30);
        cast_slash(&mut controller, RAT);
        assert_eq!(controller.state().monsters[0].combatant.current_hp(), 20);
        assert!(controller.can_undo());

        // Act
        assert_ok(controller.undo_last_save_state());

        // Assert: pre-cast HP and resources.
        assert_eq!(controller.state().monsters[0].combatant.current_hp(), 30);
        assert_eq!(controller.state().resources.amounts(), CurrencyAmounts::new(3, 0, 0, 0));
        assert!(!controller.can_undo());

        // Only the baseline remains.
        assert_eq!(controller.undo_last_save_state(), Err(CommandRejected::NothingToUndo));
        assert_eq!(controller.state().monsters[0].combatant.current_hp(), 30);
    }

    #[test]
    fn test_undo_restores_state_exactly() {
        let mut controller = knight_vs_rat_and_bat(30);
        let before = controller.state().clone();

        cast_slash(&mut controller, BAT);
        assert_ne!(controller.state(), &before);
        assert_ok(controller.undo_last_save_state());

        assert_eq!(controller.state(), &before);
    }

    #[test]
    fn test_each_undo_drops_one_checkpoint() {
        let mut controller = knight_vs_rat_and_bat(30);
        let before_casts = controller.state().clone();

        cast_slash(&mut controller, RAT);
        cast_slash(&mut controller, BAT);
        assert_eq!(controller.undo_depth(), 3);

        // The most recent checkpoint is popped and the one beneath it restored,
        // which is the state just before the first cast.
        assert_ok(controller.undo_last_save_state());
        assert_eq!(controller.undo_depth(), 2);
        assert_eq!(controller.state(), &before_casts);
        assert!(controller.events().events().contains(&BattleEvent::UndoApplied {
            remaining_snapshots: 2,
        }));

        assert_ok(controller.undo_last_save_state());
        assert_eq!(controller.undo_depth(), 1);
        assert_eq!(controller.state(), &before_casts);
        assert!(!controller.can_undo());
    }

    #[test]
    fn test_undo_brings_back_a_killed_monster_and_its_intent() {
        let mut controller = knight_vs_rat_and_bat(10);
        let intents_before = controller.state().intents.clone();
        assert_eq!(intents_before.len(), 2);

        cast_slash(&mut controller, RAT);
        assert!(!controller.state().is_monster_in_play(RAT));
        assert_eq!(controller.state().intents.len(), 1);
        assert_eq!(controller.state().party[0].xp, 0, "test monsters grant no xp");

        assert_ok(controller.undo_last_save_state());

        let state = controller.state();
        assert!(state.is_monster_in_play(RAT));
        assert_eq!(state.monsters[0].combatant.current_hp(), 10);
        assert_eq!(state.monsters.len(), 2);
        assert_eq!(state.intents, intents_before);
    }

    #[test]
    fn test_income_restarts_undo_history() {
        let mut controller = knight_vs_rat_and_bat(30);
        assert_ok(controller.grant_resources(CurrencyAmounts::new(1, 0, 0, 0)));
        cast_slash(&mut controller, RAT);
        assert!(controller.can_undo());

        assert_ok(controller.grant_resources(CurrencyAmounts::new(1, 0, 0, 0)));

        assert_eq!(controller.undo_depth(), 1);
        assert!(!controller.can_undo());
        assert_eq!(controller.undo_last_save_state(), Err(CommandRejected::NothingToUndo));
        assert_eq!(controller.state().monsters[0].combatant.current_hp(), 20);
    }

    #[test]
    fn test_undo_clears_pending_selection() {
        let mut controller = knight_vs_rat_and_bat(30);
        cast_slash(&mut controller, RAT);
        assert_ok(controller.begin_ability_use(0, 0));
        assert!(matches!(controller.pending(), TargetingState::AwaitingTarget(_)));

        assert_ok(controller.undo_last_save_state());

        assert_eq!(controller.pending(), &TargetingState::Idle);
    }

    #[test]
    fn test_undo_availability_is_announced() {
        let mut controller = knight_vs_rat_and_bat(30);
        cast_slash(&mut controller, RAT);
        assert!(controller
            .drain_events()
            .contains(&BattleEvent::UndoAvailabilityChanged { available: true }));

        assert_ok(controller.undo_last_save_state());
        assert!(controller
            .drain_events()
            .contains(&BattleEvent::UndoAvailabilityChanged { available: false }));
    }

    #[test]
    fn test_enemy_phase_commits_the_turn() {
        let mut controller = knight_vs_rat_and_bat(30);
        cast_slash(&mut controller, RAT);

        assert_ok(controller.end_turn());

        assert_eq!(controller.undo_depth(), 1, "a fresh baseline for the new phase");
        assert_eq!(controller.undo_last_save_state(), Err(CommandRejected::NothingToUndo));
        assert_eq!(controller.state().monsters[0].combatant.current_hp(), 20);
    }
}
