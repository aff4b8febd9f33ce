use crate::battle::collaborators::{AnimationHandle, Presentation, RewardFlow};
use crate::battle::controller::BattleController;
use crate::battle::damage::DamageInput;
use crate::battle::state::{BattleEvent, BattleRng, BattleState};
use crate::combatant::{CombatantRef, MonsterId};
use crate::config::EngineConfig;
use crate::content::EncounterSetup;
use crate::errors::CommandResult;
use crate::hero::Hero;
use crate::monster::Monster;
use schema::{
    AbilityDefinition, AbilityFlags, CurrencyAmounts, Element, HeroDefinition, MonsterAttack,
    MonsterDefinition, RewardOffer, Tag, TargetType,
};
use std::collections::{BTreeMap, BTreeSet};

/// A builder for test heroes with common defaults.
///
/// # Example
/// ```ignore
/// let rogue = TestHeroBuilder::new("Rogue")
///     .with_max_hp(20)
///     .with_abilities(vec![ability("stab").damage(4).build()])
///     .build();
/// ```
pub struct TestHeroBuilder {
    name: String,
    max_hp: u32,
    current_hp: Option<u32>,
    max_stamina: u32,
    defense: u32,
    resistances: BTreeMap<Element, f32>,
    abilities: Vec<AbilityDefinition>,
    damage_attack_limit: Option<u8>,
}

impl TestHeroBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            max_hp: 30,
            current_hp: None,
            max_stamina: 3,
            defense: 0,
            resistances: BTreeMap::new(),
            abilities: Vec::new(),
            damage_attack_limit: None,
        }
    }

    pub fn with_max_hp(mut self, max_hp: u32) -> Self {
        self.max_hp = max_hp;
        self
    }

    /// Sets the current HP. If not set, HP will be max.
    pub fn with_hp(mut self, hp: u32) -> Self {
        self.current_hp = Some(hp);
        self
    }

    pub fn with_stamina(mut self, max_stamina: u32) -> Self {
        self.max_stamina = max_stamina;
        self
    }

    pub fn with_defense(mut self, defense: u32) -> Self {
        self.defense = defense;
        self
    }

    pub fn with_resistance(mut self, element: Element, multiplier: f32) -> Self {
        self.resistances.insert(element, multiplier);
        self
    }

    pub fn with_abilities(mut self, abilities: Vec<AbilityDefinition>) -> Self {
        self.abilities = abilities;
        self
    }

    pub fn with_damage_limit(mut self, limit: u8) -> Self {
        self.damage_attack_limit = Some(limit);
        self
    }

    pub fn build(self) -> Hero {
        let definition = HeroDefinition {
            id: self.name.to_lowercase(),
            name: self.name,
            max_hp: self.max_hp,
            max_stamina: self.max_stamina,
            defense: self.defense,
            resistances: self.resistances,
            tags: BTreeSet::new(),
            attack_modifier: 1.0,
            abilities: self.abilities.iter().map(|ability| ability.id.clone()).collect(),
            damage_attack_limit: self.damage_attack_limit,
        };
        let mut hero = Hero::from_definition(&definition, self.abilities);
        if let Some(hp) = self.current_hp {
            hero.combatant.set_hp(hp);
        }
        hero
    }
}

/// A hit of exactly `amount` against an unarmored, unresisting target.
pub fn flat_hit(amount: u32) -> DamageInput {
    DamageInput {
        base_damage: amount,
        attacker_modifier: 1.0,
        target_defense: 0,
        elemental_resistance: 1.0,
        tag_multiplier: 1.0,
    }
}

/// A builder for test monster definitions and spawned monsters.
pub struct TestMonsterBuilder {
    definition: MonsterDefinition,
}

impl TestMonsterBuilder {
    /// A 20 HP monster whose only attack is a plain 5-damage strike.
    pub fn new(name: &str) -> Self {
        Self {
            definition: MonsterDefinition {
                id: name.to_lowercase(),
                name: name.to_string(),
                max_hp: 20,
                defense: 0,
                resistances: BTreeMap::new(),
                tags: BTreeSet::new(),
                attack_modifier: 1.0,
                attacks: Vec::new(),
                default_attack: MonsterAttack::basic("strike", 5),
                xp_reward: 0,
                gold_reward: 0,
            },
        }
    }

    pub fn with_max_hp(mut self, max_hp: u32) -> Self {
        self.definition.max_hp = max_hp;
        self
    }

    /// Adds an authored attack variant. Without any, the default strike is used.
    pub fn with_attack(mut self, attack: MonsterAttack) -> Self {
        self.definition.attacks.push(attack);
        self
    }

    pub fn with_attack_modifier(mut self, modifier: f32) -> Self {
        self.definition.attack_modifier = modifier;
        self
    }

    pub fn with_defense(mut self, defense: u32) -> Self {
        self.definition.defense = defense;
        self
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.definition.tags.insert(tag);
        self
    }

    pub fn with_gold(mut self, gold: u32) -> Self {
        self.definition.gold_reward = gold;
        self
    }

    pub fn with_xp(mut self, xp: u32) -> Self {
        self.definition.xp_reward = xp;
        self
    }

    pub fn definition(self) -> MonsterDefinition {
        self.definition
    }

    /// Spawns with a placeholder id; `create_test_state` renumbers.
    pub fn build(self) -> Monster {
        Monster::spawn(MonsterId(0), &self.definition, 0)
    }
}

/// Creates a battle state with the given arenas. Monsters get ids 1, 2, ...
/// and formation slots in list order.
pub fn create_test_state(party: Vec<Hero>, monsters: Vec<Monster>) -> BattleState {
    let mut state = BattleState::new(party);
    state.monsters = monsters
        .into_iter()
        .enumerate()
        .map(|(position, mut monster)| {
            monster.id = MonsterId(position as u32 + 1);
            monster.position = position;
            monster
        })
        .collect();
    state
}

/// Builder for ability definitions. Defaults to a free, enemy-targeted ability with no effect.
pub struct AbilityBuilder {
    definition: AbilityDefinition,
}

pub fn ability(id: &str) -> AbilityBuilder {
    AbilityBuilder {
        definition: AbilityDefinition {
            id: id.to_string(),
            name: id.to_string(),
            target_type: TargetType::Enemy,
            cost: CurrencyAmounts::ZERO,
            stamina_cost: 0,
            base_damage: 0,
            shield_amount: 0,
            bleed_stacks: 0,
            element: Element::Physical,
            tags: BTreeSet::new(),
            flags: AbilityFlags::default(),
        },
    }
}

impl AbilityBuilder {
    pub fn targets(mut self, target_type: TargetType) -> Self {
        self.definition.target_type = target_type;
        self
    }

    pub fn damage(mut self, base_damage: u32) -> Self {
        self.definition.base_damage = base_damage;
        self
    }

    pub fn shield(mut self, amount: u32) -> Self {
        self.definition.shield_amount = amount;
        self
    }

    pub fn bleed(mut self, stacks: u32) -> Self {
        self.definition.bleed_stacks = stacks;
        self
    }

    pub fn cost(mut self, cost: CurrencyAmounts) -> Self {
        self.definition.cost = cost;
        self
    }

    pub fn stamina(mut self, stamina_cost: u32) -> Self {
        self.definition.stamina_cost = stamina_cost;
        self
    }

    pub fn tag(mut self, tag: Tag) -> Self {
        self.definition.tags.insert(tag);
        self
    }

    pub fn once_per_turn(mut self) -> Self {
        self.definition.flags.usable_once_per_turn = true;
        self
    }

    pub fn impact_sync(mut self) -> Self {
        self.definition.flags.impact_sync = true;
        self
    }

    pub fn free_if_hidden(mut self) -> Self {
        self.definition.flags.free_if_hidden = true;
        self
    }

    pub fn grants_hidden(mut self) -> Self {
        self.definition.flags.grants_hidden = true;
        self
    }

    pub fn keeps_hidden(mut self) -> Self {
        self.definition.flags.breaks_hidden = false;
        self
    }

    pub fn lethal_finisher(mut self) -> Self {
        self.definition.flags.lethal_finisher = true;
        self
    }

    pub fn build(self) -> AbilityDefinition {
        self.definition
    }
}

/// An encounter built straight from monster definitions.
pub fn encounter(id: &str, monsters: Vec<MonsterDefinition>) -> EncounterSetup {
    EncounterSetup {
        id: id.to_string(),
        name: id.to_string(),
        monsters,
        bonus_gold: 0,
        loot_pool: Vec::new(),
    }
}

/// What the recording presentation was asked to play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayedAnimation {
    Cast { caster: usize, ability: String },
    EnemyAttack { monster: MonsterId, target: Option<usize> },
}

/// Presentation double: records every request and, when `animate` is set,
/// hands out handles so the engine waits for an impact.
#[derive(Debug, Default)]
pub struct RecordingPresentation {
    pub animate: bool,
    pub played: Vec<PlayedAnimation>,
    pub hits: Vec<(CombatantRef, u32)>,
    next_handle: u64,
}

impl RecordingPresentation {
    pub fn animated() -> Self {
        Self {
            animate: true,
            ..Self::default()
        }
    }

    fn handle(&mut self) -> Option<AnimationHandle> {
        if !self.animate {
            return None;
        }
        self.next_handle += 1;
        Some(AnimationHandle(self.next_handle))
    }
}

impl Presentation for RecordingPresentation {
    fn play_cast_animation(&mut self, caster: usize, _hero: &Hero, ability: &AbilityDefinition) -> Option<AnimationHandle> {
        self.played.push(PlayedAnimation::Cast {
            caster,
            ability: ability.id.clone(),
        });
        self.handle()
    }

    fn play_enemy_attack(&mut self, monster: &Monster, target: Option<usize>) -> Option<AnimationHandle> {
        self.played.push(PlayedAnimation::EnemyAttack {
            monster: monster.id,
            target,
        });
        self.handle()
    }

    fn on_hit(&mut self, target: CombatantRef, damage: u32) {
        self.hits.push((target, damage));
    }
}

/// Reward panel double that remembers every offer it was shown.
#[derive(Debug, Default)]
pub struct RecordingRewardFlow {
    pub offers: Vec<RewardOffer>,
}

impl RewardFlow for RecordingRewardFlow {
    fn offer(&mut self, offer: &RewardOffer) {
        self.offers.push(offer.clone());
    }
}

pub type TestController = BattleController<RecordingPresentation, RecordingRewardFlow>;

/// A controller with recording collaborators and a scripted rng.
pub fn controller_with(
    config: EngineConfig,
    party: Vec<Hero>,
    presentation: RecordingPresentation,
    rng_outcomes: Vec<usize>,
) -> TestController {
    BattleController::with_collaborators(config, party, presentation, RecordingRewardFlow::default())
        .expect("party fits the configured size")
        .with_rng(BattleRng::new_for_test(rng_outcomes))
}

/// A headless-style controller already in its first player phase against `monsters`.
pub fn controller_in_battle(party: Vec<Hero>, monsters: Vec<MonsterDefinition>) -> TestController {
    let mut controller = controller_with(
        EngineConfig::default(),
        party,
        RecordingPresentation::default(),
        vec![0],
    );
    assert_ok(controller.start_battle(&encounter("test", monsters)));
    controller.drain_events();
    controller
}

/// Helper function to assert that a command was accepted.
/// Provides clear error messages in tests when commands are unexpectedly rejected.
pub fn assert_ok<T>(result: CommandResult<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("Expected Ok but got rejection: {}", err),
    }
}

/// True if any queued event matches `predicate`.
pub fn has_event(events: &[BattleEvent], predicate: impl Fn(&BattleEvent) -> bool) -> bool {
    events.iter().any(predicate)
}
