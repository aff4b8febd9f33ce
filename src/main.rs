//! Headless auto-pilot run through the bundled encounters.
//!
//! Usage: `reelcraft-battle [DATA_DIR] [--json]`
//!
//! Each player phase simulates one reel spin, lets every hero that can act
//! cast the first ability that goes through, then ends the turn. Rewards are
//! answered with the first item offered. `--json` dumps the whole event
//! log at the end.

use reelcraft_battle::{
    BattleController, BattleEvent, BattlePhase, BattleResult, CombatantRef, CommandResult, ContentLibrary, CurrencyAmounts,
    EngineConfig, TargetType, TargetingState,
};
use std::path::PathBuf;

const PARTY: [&str; 3] = ["knight", "rogue", "cleric"];
const ROUTE: [&str; 3] = ["cellar", "crypt", "lair"];
const MAX_ROUNDS: u32 = 30;

/// Income of one simulated reel spin.
const SPIN_INCOME: CurrencyAmounts = CurrencyAmounts {
    attack: 3,
    defense: 2,
    magic: 2,
    wild: 0,
};

fn main() -> BattleResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut data_path = PathBuf::from("data");
    let mut dump_json = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--json" => dump_json = true,
            other => data_path = PathBuf::from(other),
        }
    }

    let config_path = data_path.join("engine.ron");
    let config = if config_path.exists() {
        EngineConfig::load(&config_path)?
    } else {
        EngineConfig::default()
    };
    let library = ContentLibrary::load(&data_path)?;
    let party = library.build_party(&PARTY)?;
    let mut controller = BattleController::new(config, party)?;
    let mut log: Vec<BattleEvent> = Vec::new();

    for encounter_id in ROUTE {
        let encounter = library.encounter(encounter_id)?;
        println!("\n### {} ###", encounter.name);

        controller.start_battle(&encounter)?;
        answer_reward(&mut controller)?;
        flush(&mut controller, &mut log);

        while controller.phase() == BattlePhase::PlayerPhase && controller.state().round <= MAX_ROUNDS {
            play_turn(&mut controller);
            flush(&mut controller, &mut log);
        }
        if controller.phase() == BattlePhase::PlayerPhase {
            tracing::warn!(encounter = %encounter_id, rounds = MAX_ROUNDS, "encounter did not finish, stopping");
            break;
        }

        answer_reward(&mut controller)?;
        flush(&mut controller, &mut log);
        if controller.state().party_wiped() {
            break;
        }
    }

    let run = controller.run();
    println!(
        "\nCleared {} encounter(s), {} gold, {} item(s).",
        run.encounters_cleared,
        run.gold,
        run.inventory.len()
    );

    if dump_json {
        match serde_json::to_string_pretty(&log) {
            Ok(json) => println!("{}", json),
            Err(error) => tracing::error!(%error, "failed to serialize event log"),
        }
    }
    Ok(())
}

/// Print the queued events as text and move them to `log`.
fn flush(controller: &mut BattleController, log: &mut Vec<BattleEvent>) {
    controller.events().print_formatted(controller.state());
    log.extend(controller.drain_events());
}

/// Take the first item of a pending offer, or just the gold.
fn answer_reward(controller: &mut BattleController) -> CommandResult<()> {
    let Some(pending) = controller.pending_reward() else {
        return Ok(());
    };
    let item = pending.offer.loot_pool.first().cloned();
    controller.notify_reward_chosen(item)
}

fn play_turn(controller: &mut BattleController) {
    if let Err(reason) = controller.grant_resources(SPIN_INCOME) {
        tracing::debug!(%reason, "spin refused");
        return;
    }

    for caster in 0..controller.state().party.len() {
        if controller.phase() != BattlePhase::PlayerPhase {
            return;
        }
        let ability_count = match controller.state().hero(caster) {
            Some(hero) if hero.can_act() => hero.abilities.len(),
            _ => continue,
        };
        for ability_index in 0..ability_count {
            if try_cast(controller, caster, ability_index) {
                break;
            }
        }
    }

    if controller.phase() == BattlePhase::PlayerPhase {
        if let Err(reason) = controller.end_turn() {
            tracing::debug!(%reason, "end turn refused");
        }
    }
}

/// Start, aim and confirm one ability. Returns whether it was cast.
fn try_cast(controller: &mut BattleController, caster: usize, ability_index: usize) -> bool {
    let Some(target_type) = controller
        .state()
        .hero(caster)
        .and_then(|hero| hero.ability(ability_index))
        .map(|ability| ability.target_type)
    else {
        return false;
    };

    if let Err(reason) = controller.begin_ability_use(caster, ability_index) {
        tracing::debug!(caster, ability_index, %reason, "ability not usable");
        return false;
    }
    if controller.pending() == &TargetingState::Idle {
        return true;
    }

    let state = controller.state();
    let target = match target_type {
        TargetType::Enemy => state
            .active_monsters()
            .next()
            .map(|monster| CombatantRef::Monster(monster.id)),
        TargetType::User => Some(CombatantRef::Hero(caster)),
        TargetType::Ally => state
            .living_hero_indices()
            .into_iter()
            .min_by_key(|index| state.party[*index].combatant.current_hp())
            .map(CombatantRef::Hero),
    };

    // Preview, then confirm on the same target.
    let result = match target {
        Some(target) => click(controller, target).and_then(|()| click(controller, target)),
        None => Ok(()),
    };
    match result {
        Ok(()) if controller.pending() == &TargetingState::Idle => true,
        outcome => {
            if let Err(reason) = outcome {
                tracing::debug!(caster, ability_index, %reason, "cast abandoned");
            }
            if controller.pending() != &TargetingState::Idle {
                if let Err(reason) = controller.cancel_pending_ability() {
                    tracing::debug!(%reason, "cancel refused");
                }
            }
            false
        }
    }
}

fn click(controller: &mut BattleController, target: CombatantRef) -> CommandResult<()> {
    match target {
        CombatantRef::Hero(index) => controller.select_party_target(index),
        CombatantRef::Monster(id) => controller.select_enemy_target(id),
    }
}
