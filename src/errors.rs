use crate::battle::state::BattlePhase;
use crate::combatant::MonsterId;
use schema::Currency;
use thiserror::Error;

/// Main error type for the Reelcraft battle engine
#[derive(Debug, Error)]
pub enum BattleEngineError {
    /// A command was refused; battle state is unchanged
    #[error("command rejected: {0}")]
    Command(#[from] CommandRejected),
    /// Authored content could not be loaded or cross-referenced
    #[error("content error: {0}")]
    Content(#[from] ContentError),
    /// Engine configuration could not be loaded
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    /// An internal battle command referenced something that is not in the arena
    #[error("execution error: {0}")]
    Execution(#[from] ExecutionError),
}

/// Why a player or collaborator command was refused.
/// A rejected command never mutates battle state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandRejected {
    #[error("command not valid during {0:?}")]
    WrongPhase(BattlePhase),
    #[error("an ability is still resolving")]
    Resolving,
    #[error("an ability is already pending")]
    AbilityAlreadyPending,
    #[error("no ability is pending")]
    NoPendingAbility,
    #[error("invalid party index: {0}")]
    InvalidPartyIndex(usize),
    #[error("invalid ability index {ability_index} for party member {caster}")]
    InvalidAbilityIndex { caster: usize, ability_index: usize },
    #[error("unknown monster: {0}")]
    UnknownMonster(MonsterId),
    #[error("party member {0} is down")]
    CasterDown(usize),
    #[error("party member {0} is stunned this phase")]
    CasterStunned(usize),
    #[error("{ability} can only be used once per turn")]
    OncePerTurn { ability: String },
    #[error("party member {caster} reached the damage attack limit of {limit}")]
    DamageAttackLimit { caster: usize, limit: u8 },
    #[error("target is not valid for this ability")]
    InvalidTarget,
    #[error("target fell before the cast committed")]
    StaleTarget,
    #[error("not enough {currency}: need {needed}, have {available}")]
    InsufficientResources {
        currency: Currency,
        needed: u32,
        available: u32,
    },
    #[error("not enough stamina: need {needed}, have {available}")]
    InsufficientStamina { needed: u32, available: u32 },
    #[error("no living enemy remains")]
    NoLivingEnemy,
    #[error("no living party member")]
    NoLivingHero,
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("no impact is being awaited")]
    NoImpactPending,
    #[error("no reward choice is pending")]
    NoRewardPending,
    #[error("a reward choice is still pending")]
    RewardPending,
    #[error("chosen item is not in the offered loot pool")]
    ItemNotOffered,
    #[error("party is full ({0} members)")]
    PartyFull(usize),
}

/// Errors related to authored content loading
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("hero {hero} references unknown ability {ability}")]
    UnknownAbility { hero: String, ability: String },
    #[error("unknown hero: {0}")]
    UnknownHero(String),
    #[error("encounter {encounter} references unknown monster {monster}")]
    UnknownMonster { encounter: String, monster: String },
    #[error("unknown encounter: {0}")]
    UnknownEncounter(String),
    #[error("duplicate id: {0}")]
    DuplicateId(String),
}

/// Errors related to engine configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("impact timeout must be a positive, representable number of seconds, got {0}")]
    InvalidTimeout(f32),
}

/// Error types for internal command execution
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("no party member at index {0}")]
    NoHero(usize),
    #[error("no monster with id {0}")]
    NoMonster(MonsterId),
    #[error("no intent at index {0}")]
    NoIntent(usize),
}

/// Type alias for Results using BattleEngineError
pub type BattleResult<T> = Result<T, BattleEngineError>;

/// Type alias for command results
pub type CommandResult<T> = Result<T, CommandRejected>;

/// Type alias for Results using ContentError
pub type ContentResult<T> = Result<T, ContentError>;
