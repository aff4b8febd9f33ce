use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumIter, IntoEnumIterator};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    EnumIter, Display,
)]
pub enum Element {
    #[default]
    Physical,
    Fire,
    Ice,
    Lightning,
    Poison,
    Holy,
    Shadow,
}

/// Descriptive tags carried by abilities and by combatants.
/// Pairs of (ability tag, target tag) may scale damage, see [`Tag::interaction`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, EnumIter,
    Display,
)]
pub enum Tag {
    Fire,
    Ice,
    Holy,
    Undead,
    Beast,
    Armored,
    Piercing,
    Blunt,
}

impl Tag {
    /// Damage multiplier when an ability tagged `attacking` hits a target tagged `defending`.
    /// Returns: 2.0 = weakness, 1.0 = no interaction, 0.5 = resisted, 0.0 = immune
    pub fn interaction(attacking: Tag, defending: Tag) -> f32 {
        use Tag::*;

        match (attacking, defending) {
            // Fire
            (Fire, Ice) | (Fire, Beast) => 2.0,
            (Fire, Fire) => 0.0,
            (Fire, _) => 1.0,

            // Ice
            (Ice, Fire) => 2.0,
            (Ice, Ice) => 0.0,
            (Ice, _) => 1.0,

            // Holy
            (Holy, Undead) => 2.0,
            (Holy, Holy) => 0.5,
            (Holy, _) => 1.0,

            // Piercing / Blunt against armor
            (Piercing, Armored) => 0.5,
            (Blunt, Armored) => 1.5,
            (Piercing, _) | (Blunt, _) => 1.0,

            // Tags that only describe targets never scale damage
            (Undead, _) | (Beast, _) | (Armored, _) => 1.0,
        }
    }
}

/// The four currencies produced by the reels and spent by abilities.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, EnumIter,
    Display,
)]
pub enum Currency {
    Attack,
    Defense,
    Magic,
    Wild,
}

/// One non-negative amount per [`Currency`]. Used for ability costs, reel
/// income and the pool balance itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencyAmounts {
    pub attack: u32,
    pub defense: u32,
    pub magic: u32,
    pub wild: u32,
}

impl CurrencyAmounts {
    pub const ZERO: CurrencyAmounts = CurrencyAmounts {
        attack: 0,
        defense: 0,
        magic: 0,
        wild: 0,
    };

    pub fn new(attack: u32, defense: u32, magic: u32, wild: u32) -> Self {
        Self {
            attack,
            defense,
            magic,
            wild,
        }
    }

    pub fn get(&self, currency: Currency) -> u32 {
        match currency {
            Currency::Attack => self.attack,
            Currency::Defense => self.defense,
            Currency::Magic => self.magic,
            Currency::Wild => self.wild,
        }
    }

    pub fn get_mut(&mut self, currency: Currency) -> &mut u32 {
        match currency {
            Currency::Attack => &mut self.attack,
            Currency::Defense => &mut self.defense,
            Currency::Magic => &mut self.magic,
            Currency::Wild => &mut self.wild,
        }
    }

    /// Iterate `(currency, amount)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Currency, u32)> + '_ {
        Currency::iter().map(move |currency| (currency, self.get(currency)))
    }

    pub fn total(&self) -> u32 {
        self.iter().map(|(_, amount)| amount).sum()
    }

    pub fn is_zero(&self) -> bool {
        self.total() == 0
    }

    /// True when every currency in `self` covers the matching amount in `cost`.
    pub fn covers(&self, cost: &CurrencyAmounts) -> bool {
        Currency::iter().all(|currency| self.get(currency) >= cost.get(currency))
    }
}

impl fmt::Display for CurrencyAmounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ATK {} / DEF {} / MAG {} / WILD {}",
            self.attack, self.defense, self.magic, self.wild
        )
    }
}
