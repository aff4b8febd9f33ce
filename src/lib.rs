//! Reelcraft Battle Engine
//!
//! Turn-based party-versus-monsters combat for a slot-reel RPG. The reels
//! produce currency, heroes spend it on abilities, monsters telegraph their
//! attacks a phase in advance, and the player may undo any cast made since
//! the last reel spin.
//!
//! The engine is headless: a presentation layer and a reward panel plug in
//! through the traits in [`battle::collaborators`], and every state change is
//! reported on the controller's event queue.

// --- MODULE DECLARATIONS ---
pub mod battle;
pub mod combatant;
pub mod config;
pub mod content;
pub mod errors;
pub mod hero;
pub mod monster;
pub mod resources;

// --- PUBLIC API RE-EXPORTS ---

// --- From the `schema` crate ---
// Authored data definitions and the small shared enums.
pub use schema::{
    AbilityDefinition,
    AbilityFlags,
    Currency,
    CurrencyAmounts,
    Element,
    EncounterDefinition,
    HeroDefinition,
    LootItem,
    MonsterAttack,
    MonsterDefinition,
    RewardOffer,
    Tag,
    TargetType,
};

// --- From this crate's modules (`src/`) ---

// The controller and the types its commands and queries speak.
pub use battle::collaborators::{AnimationHandle, NoPresentation, NoRewardFlow, Presentation, RewardFlow};
pub use battle::controller::BattleController;
pub use battle::intents::EnemyIntent;
pub use battle::resolver::{PendingAbility, TargetingState};
pub use battle::rewards::{PendingReward, RewardSource, RunState};
pub use battle::state::{BattleEvent, BattleOutcome, BattlePhase, BattleRng, BattleState, EventBus};

// Runtime combatants.
pub use combatant::{Combatant, CombatantRef, MonsterId, StatusEffects};
pub use hero::Hero;
pub use monster::Monster;
pub use resources::ResourcePool;

// Loading.
pub use config::EngineConfig;
pub use content::{ContentLibrary, EncounterSetup};

// Crate-specific error and result types.
pub use errors::{
    BattleEngineError, BattleResult, CommandRejected, CommandResult, ConfigError, ContentError, ContentResult,
    ExecutionError,
};
