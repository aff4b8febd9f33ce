pub mod collaborators;
pub mod commands;
pub mod controller;
pub mod damage;
pub mod enemy_phase;
pub mod intents;
pub mod resolver;
pub mod rewards;
pub mod snapshot;
pub mod state;
pub mod status;

#[cfg(test)]
mod tests;
