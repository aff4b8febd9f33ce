//! The battle phase state machine.
//!
//! `Idle -> BattleStart -> PlayerPhase <-> EnemyPhase -> BattleEnd -> BattleStart ...`
//!
//! The controller advances only when a command arrives: a click, an impact
//! signal, a clock tick or a reward choice. Every command either completes
//! its mutations and queues its events, or is rejected without touching
//! anything. Ability casting lives in `resolver`, intent execution in
//! `enemy_phase`.

use crate::battle::collaborators::{AnimationHandle, NoPresentation, NoRewardFlow, Presentation, RewardFlow};
use crate::battle::intents::plan_enemy_intents;
use crate::battle::resolver::{CastInFlight, TargetingState};
use crate::battle::rewards::{encounter_offer, PendingReward, RewardSource, RunState};
use crate::battle::snapshot::SnapshotStack;
use crate::battle::state::{BattleEvent, BattleOutcome, BattlePhase, BattleRng, BattleState, EventBus};
use crate::battle::status::tick_player_phase_start;
use crate::combatant::MonsterId;
use crate::config::EngineConfig;
use crate::content::EncounterSetup;
use crate::errors::{CommandRejected, CommandResult, ExecutionError};
use crate::hero::Hero;
use crate::monster::Monster;
use schema::{CurrencyAmounts, LootItem};
use std::time::Duration;

/// Work suspended until the presentation reports an impact or the deadline passes.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct ImpactWait {
    pub handle: AnimationHandle,
    pub deadline: Duration,
    pub action: DeferredAction,
}

#[derive(Debug, Clone, PartialEq)]
pub(super) enum DeferredAction {
    Cast(CastInFlight),
    EnemyAttack { intent_index: usize, target: Option<usize> },
}

pub struct BattleController<P: Presentation = NoPresentation, R: RewardFlow = NoRewardFlow> {
    pub(super) config: EngineConfig,
    pub(super) state: BattleState,
    pub(super) bus: EventBus,
    pub(super) rng: BattleRng,
    pub(super) presentation: P,
    pub(super) reward_flow: R,
    pub(super) snapshots: SnapshotStack,
    pub(super) targeting: TargetingState,
    pub(super) active_member: Option<usize>,
    pub(super) clock: Duration,
    pub(super) waiting: Option<ImpactWait>,
    /// Next intent to execute during the enemy phase.
    pub(super) enemy_cursor: usize,
    pub(super) undo_available: bool,
    run: RunState,
    encounter: Option<EncounterSetup>,
    pending_reward: Option<PendingReward>,
    starting_reward_offered: bool,
    next_monster_id: u32,
}

impl BattleController {
    /// A headless controller: no animations, rewards answered by the caller.
    pub fn new(config: EngineConfig, party: Vec<Hero>) -> CommandResult<Self> {
        Self::with_collaborators(config, party, NoPresentation, NoRewardFlow)
    }
}

impl<P: Presentation, R: RewardFlow> BattleController<P, R> {
    pub fn with_collaborators(
        config: EngineConfig,
        party: Vec<Hero>,
        presentation: P,
        reward_flow: R,
    ) -> CommandResult<Self> {
        if party.len() > config.max_party_size {
            return Err(CommandRejected::PartyFull(config.max_party_size));
        }
        let rng = BattleRng::from_config_seed(config.rng_seed);
        Ok(Self {
            config,
            state: BattleState::new(party),
            bus: EventBus::new(),
            rng,
            presentation,
            reward_flow,
            snapshots: SnapshotStack::new(),
            targeting: TargetingState::Idle,
            active_member: None,
            clock: Duration::ZERO,
            waiting: None,
            enemy_cursor: 0,
            undo_available: false,
            run: RunState::default(),
            encounter: None,
            pending_reward: None,
            starting_reward_offered: false,
            next_monster_id: 1,
        })
    }

    /// Replace the random source, e.g. with a scripted one.
    pub fn with_rng(mut self, rng: BattleRng) -> Self {
        self.rng = rng;
        self
    }

    // --- Queries ---

    pub fn phase(&self) -> BattlePhase {
        self.state.phase
    }

    pub fn state(&self) -> &BattleState {
        &self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn pending(&self) -> &TargetingState {
        &self.targeting
    }

    pub fn active_member(&self) -> Option<usize> {
        self.active_member
    }

    pub fn can_undo(&self) -> bool {
        self.state.phase == BattlePhase::PlayerPhase && !self.is_resolving() && self.snapshots.can_undo()
    }

    pub fn undo_depth(&self) -> usize {
        self.snapshots.depth()
    }

    /// True while an ability or enemy attack waits for its impact.
    pub fn is_resolving(&self) -> bool {
        self.waiting.is_some()
    }

    pub fn clock(&self) -> Duration {
        self.clock
    }

    pub fn run(&self) -> &RunState {
        &self.run
    }

    pub fn pending_reward(&self) -> Option<&PendingReward> {
        self.pending_reward.as_ref()
    }

    pub fn presentation(&self) -> &P {
        &self.presentation
    }

    pub fn reward_flow(&self) -> &R {
        &self.reward_flow
    }

    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    pub fn drain_events(&mut self) -> Vec<BattleEvent> {
        self.bus.drain()
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut BattleState {
        &mut self.state
    }

    // --- Commands ---

    /// Add a hero between encounters.
    pub fn add_party_member(&mut self, hero: Hero) -> CommandResult<()> {
        self.require_between_encounters()?;
        if self.state.party.len() >= self.config.max_party_size {
            return self.reject(CommandRejected::PartyFull(self.config.max_party_size));
        }
        tracing::info!(hero = %hero.name(), "party member joined");
        self.state.party.push(hero);
        self.bus.push(BattleEvent::PartyChanged);
        Ok(())
    }

    /// Spawn `encounter` and open the first player phase, or wait in
    /// `BattleStart` for the start-of-run reward when one is configured.
    pub fn start_battle(&mut self, encounter: &EncounterSetup) -> CommandResult<()> {
        self.require_between_encounters()?;
        if self.pending_reward.is_some() {
            return self.reject(CommandRejected::RewardPending);
        }
        if self.state.party_wiped() {
            return self.reject(CommandRejected::NoLivingHero);
        }

        self.set_phase(BattlePhase::BattleStart);
        self.targeting = TargetingState::Idle;
        self.waiting = None;
        self.snapshots.clear();
        self.sync_undo_availability();

        for hero in self.state.party.iter_mut() {
            hero.prepare_for_encounter();
        }
        self.state.resources.clear();
        self.state.intents.clear();
        self.state.round = 0;
        self.state.encounter_id = Some(encounter.id.clone());
        self.state.monsters = encounter
            .monsters
            .iter()
            .enumerate()
            .map(|(position, definition)| {
                let id = MonsterId(self.next_monster_id);
                self.next_monster_id += 1;
                Monster::spawn(id, definition, position)
            })
            .collect();
        self.encounter = Some(encounter.clone());

        if self.state.monsters.is_empty() {
            tracing::warn!(encounter = %encounter.id, "encounter spawned no monsters");
            self.state.encounter_id = None;
            self.encounter = None;
            self.set_phase(BattlePhase::Idle);
            return Ok(());
        }

        tracing::info!(
            encounter = %encounter.id,
            monsters = self.state.monsters.len(),
            "encounter started"
        );
        self.bus.push(BattleEvent::EncounterStarted {
            encounter_id: encounter.id.clone(),
            monster_count: self.state.monsters.len(),
        });
        self.bus.push(BattleEvent::PartyChanged);
        self.bus.push(BattleEvent::ResourcesChanged {
            amounts: self.state.resources.amounts(),
        });
        self.plan_intents();

        if let Some(offer) = self.config.starting_reward.clone() {
            if !self.starting_reward_offered {
                self.starting_reward_offered = true;
                self.offer_reward(PendingReward {
                    source: RewardSource::StartOfRun,
                    offer,
                });
                return Ok(());
            }
        }
        self.enter_player_phase(false);
        Ok(())
    }

    /// Hand control to the enemies. Unspent currency is lost.
    pub fn end_turn(&mut self) -> CommandResult<()> {
        self.require_player_control()?;
        if self.state.active_monsters().next().is_none() {
            return self.reject(CommandRejected::NoLivingEnemy);
        }

        self.clear_pending_ability();
        self.state.resources.clear();
        self.bus.push(BattleEvent::ResourcesChanged {
            amounts: self.state.resources.amounts(),
        });
        self.snapshots.clear();
        self.sync_undo_availability();

        self.set_phase(BattlePhase::EnemyPhase);
        self.enemy_cursor = 0;
        self.run_enemy_phase();
        Ok(())
    }

    /// Step back to the snapshot below the most recent one.
    pub fn undo_last_save_state(&mut self) -> CommandResult<()> {
        self.require_player_control()?;
        if !self.snapshots.can_undo() {
            return self.reject(CommandRejected::NothingToUndo);
        }

        self.clear_pending_ability();
        let Some(remaining_snapshots) = self.snapshots.undo(&mut self.state) else {
            return self.reject(CommandRejected::NothingToUndo);
        };
        tracing::info!(remaining_snapshots, "undo applied");

        self.bus.push(BattleEvent::UndoApplied { remaining_snapshots });
        self.bus.push(BattleEvent::PartyChanged);
        self.bus.push(BattleEvent::ResourcesChanged {
            amounts: self.state.resources.amounts(),
        });
        self.bus.push(BattleEvent::EnemyIntentsPlanned {
            intents: self.state.intents.clone(),
        });
        self.sync_undo_availability();
        Ok(())
    }

    /// Reel income. Income is a commit point: the undo history restarts from here.
    pub fn grant_resources(&mut self, amounts: CurrencyAmounts) -> CommandResult<()> {
        self.require_player_control()?;
        self.state.resources.add(&amounts);
        tracing::debug!(%amounts, total = %self.state.resources.amounts(), "resources granted");
        self.snapshots.begin_player_turn(&self.state);
        self.bus.push(BattleEvent::ResourcesChanged {
            amounts: self.state.resources.amounts(),
        });
        self.sync_undo_availability();
        Ok(())
    }

    pub fn select_active_member(&mut self, party_index: usize) -> CommandResult<()> {
        if self.state.phase != BattlePhase::PlayerPhase {
            return self.reject(CommandRejected::WrongPhase(self.state.phase));
        }
        let alive = match self.state.hero(party_index) {
            Some(hero) => hero.is_alive(),
            None => return self.reject(CommandRejected::InvalidPartyIndex(party_index)),
        };
        if !alive {
            return self.reject(CommandRejected::CasterDown(party_index));
        }
        self.set_active_member(Some(party_index));
        Ok(())
    }

    /// The presentation reached the impact point of the animation being waited on.
    pub fn notify_animation_impact(&mut self) -> CommandResult<()> {
        match self.waiting.take() {
            Some(wait) => {
                tracing::debug!(handle = wait.handle.0, "impact signalled");
                self.complete_wait(wait);
                Ok(())
            }
            None => self.reject(CommandRejected::NoImpactPending),
        }
    }

    /// Advance simulated time. A wait whose deadline has passed completes as
    /// if its impact had fired.
    pub fn tick(&mut self, dt: Duration) {
        self.clock = self.clock.saturating_add(dt);
        let expired = self
            .waiting
            .as_ref()
            .is_some_and(|wait| wait.deadline <= self.clock);
        if !expired {
            return;
        }
        if let Some(wait) = self.waiting.take() {
            tracing::warn!(
                handle = wait.handle.0,
                timeout_secs = self.config.impact_timeout_secs,
                "impact signal never arrived, applying anyway"
            );
            self.bus.push(BattleEvent::ImpactTimedOut);
            self.complete_wait(wait);
        }
    }

    /// The loot panel answered. `None` takes the gold only.
    pub fn notify_reward_chosen(&mut self, item: Option<LootItem>) -> CommandResult<()> {
        let Some(pending) = self.pending_reward.as_ref() else {
            return self.reject(CommandRejected::NoRewardPending);
        };
        if let Err(reason) = pending.accept(item.as_ref()) {
            return self.reject(reason);
        }
        let Some(pending) = self.pending_reward.take() else {
            return self.reject(CommandRejected::NoRewardPending);
        };

        let gold = pending.offer.gold;
        self.run.credit(gold, item.clone());
        tracing::info!(gold, item = ?item.as_ref().map(|item| &item.id), "reward chosen");
        self.bus.push(BattleEvent::RewardChosen { item, gold });

        if pending.source == RewardSource::StartOfRun && self.state.phase == BattlePhase::BattleStart {
            self.enter_player_phase(false);
        }
        Ok(())
    }

    // --- Internals ---

    pub(super) fn reject<T>(&self, reason: CommandRejected) -> CommandResult<T> {
        tracing::debug!(phase = ?self.state.phase, %reason, "command rejected");
        Err(reason)
    }

    /// Player-phase commands need the phase and no cast in flight.
    pub(super) fn require_player_control(&self) -> CommandResult<()> {
        if self.state.phase != BattlePhase::PlayerPhase {
            return self.reject(CommandRejected::WrongPhase(self.state.phase));
        }
        if self.is_resolving() {
            return self.reject(CommandRejected::Resolving);
        }
        Ok(())
    }

    fn require_between_encounters(&self) -> CommandResult<()> {
        match self.state.phase {
            BattlePhase::Idle | BattlePhase::BattleEnd => Ok(()),
            phase => self.reject(CommandRejected::WrongPhase(phase)),
        }
    }

    /// Re-entrant calls with the current phase do nothing.
    pub(super) fn set_phase(&mut self, to: BattlePhase) {
        let from = self.state.phase;
        if from == to {
            return;
        }
        self.state.phase = to;
        tracing::info!(?from, ?to, round = self.state.round, "phase changed");
        self.bus.push(BattleEvent::PhaseChanged { from, to });
    }

    pub(super) fn set_active_member(&mut self, party_index: Option<usize>) {
        if self.active_member != party_index {
            self.active_member = party_index;
            self.bus.push(BattleEvent::ActiveMemberChanged { party_index });
        }
    }

    pub(super) fn sync_undo_availability(&mut self) {
        let available = self.can_undo();
        if available != self.undo_available {
            self.undo_available = available;
            self.bus.push(BattleEvent::UndoAvailabilityChanged { available });
        }
    }

    /// Drop any target selection in progress. Returns whether one existed.
    pub(super) fn clear_pending_ability(&mut self) -> bool {
        if self.targeting == TargetingState::Idle {
            return false;
        }
        self.targeting = TargetingState::Idle;
        self.bus.push(BattleEvent::PendingAbilityCleared);
        true
    }

    pub(super) fn impact_deadline(&self) -> Duration {
        self.clock.saturating_add(self.config.impact_timeout())
    }

    pub(super) fn report_execution_error(&self, error: ExecutionError) {
        tracing::warn!(%error, "battle command failed");
    }

    fn complete_wait(&mut self, wait: ImpactWait) {
        match wait.action {
            DeferredAction::Cast(cast) => self.apply_cast(cast),
            DeferredAction::EnemyAttack { intent_index, target } => {
                self.finish_enemy_attack(intent_index, target);
            }
        }
    }

    fn plan_intents(&mut self) {
        self.state.intents = plan_enemy_intents(&self.state, &mut self.rng);
        tracing::debug!(count = self.state.intents.len(), "enemy intents planned");
        self.bus.push(BattleEvent::EnemyIntentsPlanned {
            intents: self.state.intents.clone(),
        });
    }

    /// Open a player phase: round flags, stamina, status tick, (re)planning,
    /// a fresh undo baseline and the first hero able to act.
    pub(super) fn enter_player_phase(&mut self, replan: bool) {
        self.set_phase(BattlePhase::PlayerPhase);
        self.state.round += 1;
        self.bus.push(BattleEvent::RoundStarted { round: self.state.round });

        for hero in self.state.party.iter_mut() {
            hero.reset_round();
            if hero.is_alive() {
                hero.refill_stamina();
            }
        }

        let downed_anyone =
            match tick_player_phase_start(&mut self.state, &mut self.bus, self.config.bleed_damage_per_stack) {
                Ok(report) => report.downed_anyone(),
                Err(error) => {
                    self.report_execution_error(error);
                    true
                }
            };
        if downed_anyone && self.check_battle_over() {
            return;
        }

        if replan {
            self.plan_intents();
        }

        self.snapshots.begin_player_turn(&self.state);
        self.sync_undo_availability();

        let first_ready = self.state.party.iter().position(Hero::can_act);
        self.set_active_member(first_ready);
        self.bus.push(BattleEvent::PartyChanged);
    }

    /// End the battle if either side is gone. Returns true if it ended.
    pub(super) fn check_battle_over(&mut self) -> bool {
        if self.state.party_wiped() {
            self.end_battle(BattleOutcome::Defeat);
            true
        } else if self.state.encounter_cleared() {
            self.end_battle(BattleOutcome::Victory);
            true
        } else {
            false
        }
    }

    pub(super) fn end_battle(&mut self, outcome: BattleOutcome) {
        self.waiting = None;
        self.targeting = TargetingState::Idle;
        self.snapshots.clear();
        self.state.intents.clear();
        self.set_active_member(None);
        self.sync_undo_availability();

        self.set_phase(BattlePhase::BattleEnd);
        tracing::info!(?outcome, round = self.state.round, "battle ended");
        self.bus.push(BattleEvent::BattleEnded { outcome });

        if outcome == BattleOutcome::Victory {
            self.run.encounters_cleared += 1;
            let (bonus_gold, loot_pool) = self
                .encounter
                .as_ref()
                .map(|encounter| (encounter.bonus_gold, encounter.loot_pool.clone()))
                .unwrap_or_default();
            let offer = encounter_offer(&self.state, bonus_gold, &loot_pool);
            self.offer_reward(PendingReward {
                source: RewardSource::EncounterClear,
                offer,
            });
        }
    }

    fn offer_reward(&mut self, pending: PendingReward) {
        tracing::info!(source = ?pending.source, gold = pending.offer.gold, "reward offered");
        self.bus.push(BattleEvent::RewardOffered {
            offer: pending.offer.clone(),
        });
        self.reward_flow.offer(&pending.offer);
        self.pending_reward = Some(pending);
    }
}
