//! Seams to the systems the engine drives but does not own.
//!
//! The controller is generic over these traits, so a headless run, a test
//! fixture and a real presentation layer all plug in the same way.
use crate::combatant::CombatantRef;
use crate::hero::Hero;
use crate::monster::Monster;
use schema::{AbilityDefinition, RewardOffer};
use serde::{Deserialize, Serialize};

/// Opaque token for an animation the presentation layer started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnimationHandle(pub u64);

/// Presentation-side playback of casts and enemy attacks.
///
/// Returning a handle tells the engine an animation is running and that
/// damage should wait for `notify_animation_impact` (or the fail-safe
/// timeout). Returning `None` means there is nothing to wait for.
pub trait Presentation {
    /// Play the cast animation of `ability` on the hero at `caster`.
    fn play_cast_animation(&mut self, caster: usize, hero: &Hero, ability: &AbilityDefinition) -> Option<AnimationHandle>;

    /// Move `monster` toward the hero at `target`; the peak of the movement is the impact.
    fn play_enemy_attack(&mut self, monster: &Monster, target: Option<usize>) -> Option<AnimationHandle>;

    /// A hit landed. Purely cosmetic.
    fn on_hit(&mut self, _target: CombatantRef, _damage: u32) {}
}

/// Headless presentation: nothing ever animates, so nothing ever waits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPresentation;

impl Presentation for NoPresentation {
    fn play_cast_animation(&mut self, _caster: usize, _hero: &Hero, _ability: &AbilityDefinition) -> Option<AnimationHandle> {
        None
    }

    fn play_enemy_attack(&mut self, _monster: &Monster, _target: Option<usize>) -> Option<AnimationHandle> {
        None
    }
}

/// The loot panel. The choice comes back later through
/// `BattleController::notify_reward_chosen`.
pub trait RewardFlow {
    fn offer(&mut self, offer: &RewardOffer);
}

/// Reward sink that shows nothing; the caller still has to choose.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRewardFlow;

impl RewardFlow for NoRewardFlow {
    fn offer(&mut self, _offer: &RewardOffer) {}
}
