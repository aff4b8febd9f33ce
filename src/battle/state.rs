use crate::battle::intents::EnemyIntent;
use crate::combatant::{CombatantRef, MonsterId};
use crate::hero::Hero;
use crate::monster::Monster;
use crate::resources::ResourcePool;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use schema::{CurrencyAmounts, LootItem, RewardOffer};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BattlePhase {
    Idle,
    BattleStart,
    PlayerPhase,
    EnemyPhase,
    BattleEnd,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleOutcome {
    Victory,
    Defeat,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum BattleEvent {
    // Notifications
    PhaseChanged {
        from: BattlePhase,
        to: BattlePhase,
    },
    ActiveMemberChanged {
        party_index: Option<usize>,
    },
    PartyChanged,
    EnemyIntentsPlanned {
        intents: Vec<EnemyIntent>,
    },
    PendingAbilityCleared,

    // Encounter flow
    EncounterStarted {
        encounter_id: String,
        monster_count: usize,
    },
    RoundStarted {
        round: u32,
    },

    // Ability resolution
    AbilityUsed {
        caster: usize,
        ability: String,
        target: Option<CombatantRef>,
    },
    TargetPreviewed {
        caster: usize,
        ability: String,
        target: CombatantRef,
        predicted_damage: Option<u32>,
    },
    TargetLost {
        target: CombatantRef,
    },
    ImpactTimedOut,

    // Combat results
    DamageDealt {
        target: CombatantRef,
        amount: u32,
        absorbed: u32,
        remaining_hp: u32,
    },
    AttackMissed {
        attacker: MonsterId,
        target: usize,
    },
    ShieldGained {
        target: usize,
        amount: u32,
        new_shield: u32,
    },
    ConcealmentChanged {
        target: usize,
        hidden: bool,
    },
    StunApplied {
        target: usize,
        phases: u8,
    },
    BleedApplied {
        target: CombatantRef,
        stacks: u32,
        total_stacks: u32,
    },
    BleedDamage {
        target: CombatantRef,
        damage: u32,
        remaining_hp: u32,
    },
    TurnSkipped {
        target: usize,
    },
    HeroDowned {
        party_index: usize,
    },
    MonsterDefeated {
        monster: MonsterId,
    },
    XpGranted {
        party_index: usize,
        amount: u32,
    },
    IntentRetargeted {
        monster: MonsterId,
        old_target: usize,
        new_target: usize,
    },

    // Economy and undo
    ResourcesChanged {
        amounts: CurrencyAmounts,
    },
    UndoApplied {
        remaining_snapshots: usize,
    },
    UndoAvailabilityChanged {
        available: bool,
    },

    // Rewards and end
    RewardOffered {
        offer: RewardOffer,
    },
    RewardChosen {
        item: Option<LootItem>,
        gold: u32,
    },
    BattleEnded {
        outcome: BattleOutcome,
    },
}

impl BattleEvent {
    /// Formats the event into a human-readable string using battle context.
    /// Returns None for silent events that should not produce user-visible text.
    pub fn format(&self, state: &BattleState) -> Option<String> {
        match self {
            // === Notification Events ===
            BattleEvent::PhaseChanged { to, .. } => match to {
                BattlePhase::PlayerPhase => Some("Your turn!".to_string()),
                BattlePhase::EnemyPhase => Some("The enemies act...".to_string()),
                _ => None,
            },
            BattleEvent::ActiveMemberChanged { .. }
            | BattleEvent::PartyChanged
            | BattleEvent::PendingAbilityCleared
            | BattleEvent::UndoAvailabilityChanged { .. }
            | BattleEvent::ResourcesChanged { .. } => None,
            BattleEvent::EnemyIntentsPlanned { intents } => {
                let lines: Vec<String> = intents
                    .iter()
                    .map(|intent| {
                        let target = if intent.is_aoe {
                            "the whole party".to_string()
                        } else {
                            Self::hero_name(state, intent.target_party_index)
                        };
                        format!(
                            "{} intends {} ({} dmg) on {}",
                            Self::monster_name(state, intent.enemy),
                            intent.attack_id,
                            intent.damage,
                            target
                        )
                    })
                    .collect();
                if lines.is_empty() {
                    None
                } else {
                    Some(lines.join("\n  "))
                }
            }

            // === Encounter Flow Events ===
            BattleEvent::EncounterStarted { encounter_id, monster_count } => Some(format!(
                "Encounter {} begins: {} foe(s) appear!",
                encounter_id, monster_count
            )),
            BattleEvent::RoundStarted { round } => Some(format!("=== Round {} ===", round)),

            // === Ability Events ===
            BattleEvent::AbilityUsed { caster, ability, target } => {
                let caster_name = Self::hero_name(state, *caster);
                match target {
                    Some(target) => Some(format!(
                        "{} used {} on {}!",
                        caster_name,
                        ability,
                        Self::combatant_name(state, *target)
                    )),
                    None => Some(format!("{} used {}!", caster_name, ability)),
                }
            }
            BattleEvent::TargetPreviewed { .. } => None,
            BattleEvent::TargetLost { target } => Some(format!(
                "{} is no longer a valid target.",
                Self::combatant_name(state, *target)
            )),
            BattleEvent::ImpactTimedOut => None,

            // === Combat Result Events ===
            BattleEvent::DamageDealt { target, amount, absorbed, .. } => {
                let name = Self::combatant_name(state, *target);
                if *absorbed > 0 {
                    Some(format!(
                        "{} took {} damage ({} blocked by shield)!",
                        name,
                        amount.saturating_sub(*absorbed),
                        absorbed
                    ))
                } else {
                    Some(format!("{} took {} damage!", name, amount))
                }
            }
            BattleEvent::AttackMissed { attacker, target } => Some(format!(
                "{}'s attack missed the hidden {}!",
                Self::monster_name(state, *attacker),
                Self::hero_name(state, *target)
            )),
            BattleEvent::ShieldGained { target, amount, .. } => Some(format!(
                "{} gained {} shield.",
                Self::hero_name(state, *target),
                amount
            )),
            BattleEvent::ConcealmentChanged { target, hidden } => {
                let name = Self::hero_name(state, *target);
                if *hidden {
                    Some(format!("{} slipped into the shadows.", name))
                } else {
                    Some(format!("{} was revealed!", name))
                }
            }
            BattleEvent::StunApplied { target, phases } => Some(format!(
                "{} is stunned for {} turn(s)!",
                Self::hero_name(state, *target),
                phases
            )),
            BattleEvent::BleedApplied { target, total_stacks, .. } => Some(format!(
                "{} is bleeding ({} stacks).",
                Self::combatant_name(state, *target),
                total_stacks
            )),
            BattleEvent::BleedDamage { target, damage, .. } => Some(format!(
                "{} bleeds for {} damage.",
                Self::combatant_name(state, *target),
                damage
            )),
            BattleEvent::TurnSkipped { target } => Some(format!(
                "{} is stunned and cannot act!",
                Self::hero_name(state, *target)
            )),
            BattleEvent::HeroDowned { party_index } => Some(format!(
                "{} has fallen!",
                Self::hero_name(state, *party_index)
            )),
            BattleEvent::MonsterDefeated { monster } => Some(format!(
                "{} was defeated!",
                Self::monster_name(state, *monster)
            )),
            BattleEvent::XpGranted { party_index, amount } => Some(format!(
                "{} gained {} XP.",
                Self::hero_name(state, *party_index),
                amount
            )),
            BattleEvent::IntentRetargeted { monster, new_target, .. } => Some(format!(
                "{} turns toward {}!",
                Self::monster_name(state, *monster),
                Self::hero_name(state, *new_target)
            )),

            // === Undo Events ===
            BattleEvent::UndoApplied { .. } => Some("Action undone.".to_string()),

            // === Reward and End Events ===
            BattleEvent::RewardOffered { offer } => Some(format!(
                "Reward: {} gold and a choice of {} item(s).",
                offer.gold,
                offer.loot_pool.len()
            )),
            BattleEvent::RewardChosen { item, .. } => match item {
                Some(item) => Some(format!("Took {}.", item.name)),
                None => Some("Left the loot behind.".to_string()),
            },
            BattleEvent::BattleEnded { outcome } => match outcome {
                BattleOutcome::Victory => Some("Victory!".to_string()),
                BattleOutcome::Defeat => Some("The party has been wiped out...".to_string()),
            },
        }
    }

    // --- Private Helper Functions ---

    fn hero_name(state: &BattleState, index: usize) -> String {
        state
            .party
            .get(index)
            .map(|hero| hero.name().to_string())
            .unwrap_or_else(|| format!("party member {}", index))
    }

    fn monster_name(state: &BattleState, id: MonsterId) -> String {
        state
            .monster(id)
            .map(|monster| monster.name().to_string())
            .unwrap_or_else(|| format!("monster {}", id))
    }

    fn combatant_name(state: &BattleState, target: CombatantRef) -> String {
        match target {
            CombatantRef::Hero(index) => Self::hero_name(state, index),
            CombatantRef::Monster(id) => Self::monster_name(state, id),
        }
    }
}

/// Outbound notification queue. Everything a command mutates is applied before
/// its events are readable, so consumers that drain after each command always
/// observe a consistent state.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    events: Vec<BattleEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[BattleEvent] {
        &self.events
    }

    /// Take every queued event, leaving the bus empty.
    pub fn drain(&mut self) -> Vec<BattleEvent> {
        std::mem::take(&mut self.events)
    }

    /// Print all events using their formatted text, skipping silent ones.
    pub fn print_formatted(&self, state: &BattleState) {
        for event in &self.events {
            if let Some(formatted) = event.format(state) {
                println!("  {}", formatted);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl std::fmt::Display for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for event in &self.events {
            writeln!(f, "  {:?}", event)?;
        }
        Ok(())
    }
}

/// Source of the uniform picks the planner makes. Seeded for play,
/// scripted for tests.
#[derive(Debug, Clone)]
pub enum BattleRng {
    Seeded(StdRng),
    Scripted { outcomes: Vec<usize>, index: usize },
}

impl BattleRng {
    pub fn from_seed(seed: u64) -> Self {
        BattleRng::Seeded(StdRng::seed_from_u64(seed))
    }

    pub fn from_os() -> Self {
        BattleRng::Seeded(StdRng::from_os_rng())
    }

    pub fn from_config_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::from_seed(seed),
            None => Self::from_os(),
        }
    }

    /// Each pick consumes the next outcome modulo the choice count; the list cycles.
    pub fn new_for_test(outcomes: Vec<usize>) -> Self {
        BattleRng::Scripted { outcomes, index: 0 }
    }

    /// Uniform index in `0..len`, or `None` when there is nothing to pick from.
    pub fn pick_index(&mut self, len: usize, reason: &str) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let picked = match self {
            BattleRng::Seeded(rng) => rng.random_range(0..len),
            BattleRng::Scripted { outcomes, index } => {
                if outcomes.is_empty() {
                    0
                } else {
                    let outcome = outcomes[*index % outcomes.len()];
                    *index += 1;
                    outcome % len
                }
            }
        };
        tracing::trace!(picked, len, reason, "rng pick");
        Some(picked)
    }
}

/// The whole mutable battle: one arena of heroes, one of monsters, the shared
/// resource pool and the locked intent list.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BattleState {
    pub encounter_id: Option<String>,
    pub round: u32,
    pub phase: BattlePhase,
    pub party: Vec<Hero>,
    pub monsters: Vec<Monster>,
    pub resources: ResourcePool,
    pub intents: Vec<EnemyIntent>,
}

impl BattleState {
    pub fn new(party: Vec<Hero>) -> Self {
        Self {
            encounter_id: None,
            round: 0,
            phase: BattlePhase::Idle,
            party,
            monsters: Vec::new(),
            resources: ResourcePool::new(),
            intents: Vec::new(),
        }
    }

    pub fn hero(&self, index: usize) -> Option<&Hero> {
        self.party.get(index)
    }

    pub fn hero_mut(&mut self, index: usize) -> Option<&mut Hero> {
        self.party.get_mut(index)
    }

    pub fn monster(&self, id: MonsterId) -> Option<&Monster> {
        self.monsters.iter().find(|monster| monster.id == id)
    }

    pub fn monster_mut(&mut self, id: MonsterId) -> Option<&mut Monster> {
        self.monsters.iter_mut().find(|monster| monster.id == id)
    }

    pub fn living_hero_indices(&self) -> Vec<usize> {
        self.party
            .iter()
            .enumerate()
            .filter(|(_, hero)| hero.is_alive())
            .map(|(index, _)| index)
            .collect()
    }

    pub fn is_hero_alive(&self, index: usize) -> bool {
        self.hero(index).is_some_and(Hero::is_alive)
    }

    pub fn is_monster_in_play(&self, id: MonsterId) -> bool {
        self.monster(id).is_some_and(Monster::is_active_and_alive)
    }

    /// Monsters still fighting, in formation order.
    pub fn active_monsters(&self) -> impl Iterator<Item = &Monster> {
        self.monsters.iter().filter(|monster| monster.is_active_and_alive())
    }

    pub fn party_wiped(&self) -> bool {
        !self.party.iter().any(Hero::is_alive)
    }

    pub fn encounter_cleared(&self) -> bool {
        !self.monsters.is_empty() && self.active_monsters().next().is_none()
    }
}
