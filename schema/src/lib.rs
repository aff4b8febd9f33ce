// Reelcraft Schema - Shared authored-data definitions
// This crate contains the immutable, designer-authored records (abilities,
// monsters, heroes, encounters, loot) that the battle engine consumes and
// that the RON content files deserialize into.

// Re-export the main types
pub use ability_data::*;
pub use combat_types::*;
pub use encounter_data::*;
pub use monster_data::*;

pub mod ability_data;
pub mod combat_types;
pub mod encounter_data;
pub mod monster_data;
