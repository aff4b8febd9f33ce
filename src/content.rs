//! Authored gameplay data: abilities, heroes, monsters and encounters,
//! loaded from RON tables and cross-checked once at load time.

use crate::errors::{ContentError, ContentResult};
use crate::hero::Hero;
use schema::{AbilityDefinition, EncounterDefinition, HeroDefinition, LootItem, MonsterDefinition};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const ABILITIES_FILE: &str = "abilities.ron";
pub const HEROES_FILE: &str = "heroes.ron";
pub const MONSTERS_FILE: &str = "monsters.ron";
pub const ENCOUNTERS_FILE: &str = "encounters.ron";

/// An encounter with its monster ids already resolved to definitions,
/// ready to hand to `BattleController::start_battle`.
#[derive(Debug, Clone, PartialEq)]
pub struct EncounterSetup {
    pub id: String,
    pub name: String,
    pub monsters: Vec<MonsterDefinition>,
    pub bonus_gold: u32,
    pub loot_pool: Vec<LootItem>,
}

#[derive(Debug, Clone, Default)]
pub struct ContentLibrary {
    abilities: BTreeMap<String, AbilityDefinition>,
    heroes: BTreeMap<String, HeroDefinition>,
    monsters: BTreeMap<String, MonsterDefinition>,
    encounters: BTreeMap<String, EncounterDefinition>,
}

impl ContentLibrary {
    /// Load all four tables from `data_path`.
    pub fn load(data_path: &Path) -> ContentResult<Self> {
        let abilities = read_table::<AbilityDefinition>(&data_path.join(ABILITIES_FILE))?;
        let heroes = read_table::<HeroDefinition>(&data_path.join(HEROES_FILE))?;
        let monsters = read_table::<MonsterDefinition>(&data_path.join(MONSTERS_FILE))?;
        let encounters = read_table::<EncounterDefinition>(&data_path.join(ENCOUNTERS_FILE))?;
        Self::from_tables(abilities, heroes, monsters, encounters)
    }

    /// Build a library from in-memory RON text, one string per table.
    pub fn from_ron_strs(
        abilities: &str,
        heroes: &str,
        monsters: &str,
        encounters: &str,
    ) -> ContentResult<Self> {
        Self::from_tables(
            parse_table(abilities, ABILITIES_FILE)?,
            parse_table(heroes, HEROES_FILE)?,
            parse_table(monsters, MONSTERS_FILE)?,
            parse_table(encounters, ENCOUNTERS_FILE)?,
        )
    }

    pub fn from_tables(
        abilities: Vec<AbilityDefinition>,
        heroes: Vec<HeroDefinition>,
        monsters: Vec<MonsterDefinition>,
        encounters: Vec<EncounterDefinition>,
    ) -> ContentResult<Self> {
        let library = Self {
            abilities: index_by_id(abilities, |a| &a.id)?,
            heroes: index_by_id(heroes, |h| &h.id)?,
            monsters: index_by_id(monsters, |m| &m.id)?,
            encounters: index_by_id(encounters, |e| &e.id)?,
        };
        library.validate()?;
        Ok(library)
    }

    fn validate(&self) -> ContentResult<()> {
        for hero in self.heroes.values() {
            if let Some(missing) = hero.abilities.iter().find(|id| !self.abilities.contains_key(*id)) {
                return Err(ContentError::UnknownAbility {
                    hero: hero.id.clone(),
                    ability: missing.clone(),
                });
            }
        }
        for encounter in self.encounters.values() {
            if let Some(missing) = encounter.monsters.iter().find(|id| !self.monsters.contains_key(*id)) {
                return Err(ContentError::UnknownMonster {
                    encounter: encounter.id.clone(),
                    monster: missing.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn ability(&self, id: &str) -> Option<&AbilityDefinition> {
        self.abilities.get(id)
    }

    pub fn monster(&self, id: &str) -> Option<&MonsterDefinition> {
        self.monsters.get(id)
    }

    pub fn hero_ids(&self) -> impl Iterator<Item = &str> {
        self.heroes.keys().map(String::as_str)
    }

    pub fn encounter_ids(&self) -> impl Iterator<Item = &str> {
        self.encounters.keys().map(String::as_str)
    }

    /// Instantiate a fresh hero with its abilities resolved.
    pub fn build_hero(&self, id: &str) -> ContentResult<Hero> {
        let definition = self
            .heroes
            .get(id)
            .ok_or_else(|| ContentError::UnknownHero(id.to_string()))?;
        let abilities = definition
            .abilities
            .iter()
            .map(|ability_id| {
                self.abilities
                    .get(ability_id)
                    .cloned()
                    .ok_or_else(|| ContentError::UnknownAbility {
                        hero: definition.id.clone(),
                        ability: ability_id.clone(),
                    })
            })
            .collect::<ContentResult<Vec<_>>>()?;
        Ok(Hero::from_definition(definition, abilities))
    }

    pub fn build_party(&self, ids: &[&str]) -> ContentResult<Vec<Hero>> {
        ids.iter().map(|id| self.build_hero(id)).collect()
    }

    pub fn encounter(&self, id: &str) -> ContentResult<EncounterSetup> {
        let definition = self
            .encounters
            .get(id)
            .ok_or_else(|| ContentError::UnknownEncounter(id.to_string()))?;
        let monsters = definition
            .monsters
            .iter()
            .map(|monster_id| {
                self.monsters
                    .get(monster_id)
                    .cloned()
                    .ok_or_else(|| ContentError::UnknownMonster {
                        encounter: definition.id.clone(),
                        monster: monster_id.clone(),
                    })
            })
            .collect::<ContentResult<Vec<_>>>()?;
        Ok(EncounterSetup {
            id: definition.id.clone(),
            name: definition.name.clone(),
            monsters,
            bonus_gold: definition.bonus_gold,
            loot_pool: definition.loot_pool.clone(),
        })
    }
}

fn read_table<T: DeserializeOwned>(path: &Path) -> ContentResult<Vec<T>> {
    let content = fs::read_to_string(path).map_err(|source| ContentError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_table(&content, &path.display().to_string())
}

fn parse_table<T: DeserializeOwned>(content: &str, origin: &str) -> ContentResult<Vec<T>> {
    ron::from_str(content).map_err(|source| ContentError::Parse {
        path: origin.to_string(),
        source,
    })
}

fn index_by_id<T>(
    items: Vec<T>,
    id_of: impl Fn(&T) -> &String,
) -> ContentResult<BTreeMap<String, T>> {
    let mut map = BTreeMap::new();
    for item in items {
        let id = id_of(&item).clone();
        if map.insert(id.clone(), item).is_some() {
            return Err(ContentError::DuplicateId(id));
        }
    }
    Ok(map)
}
