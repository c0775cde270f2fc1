//! Weapon shop economy
//!
//! Players spend hunt coins on one shield, one sword and one helmet. Prices
//! are checked against the whole loadout: swapping a slot only costs the
//! difference the new pick makes to the loadout total.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeaponCategory {
    Shield,
    Sword,
    Helmet,
}

impl WeaponCategory {
    pub const ALL: [WeaponCategory; 3] = [
        WeaponCategory::Shield,
        WeaponCategory::Sword,
        WeaponCategory::Helmet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WeaponCategory::Shield => "shield",
            WeaponCategory::Sword => "sword",
            WeaponCategory::Helmet => "helmet",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "shield" | "shields" => Some(WeaponCategory::Shield),
            "sword" | "swords" => Some(WeaponCategory::Sword),
            "helmet" | "helmets" => Some(WeaponCategory::Helmet),
            _ => None,
        }
    }
}

/// A catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weapon {
    pub id: String,
    pub name: String,
    pub category: WeaponCategory,
    pub cost: u32,
    pub damage_bonus: u32,
    #[serde(default)]
    pub description: String,
    /// Icon key for the host UI
    #[serde(default)]
    pub icon: String,
}

impl Weapon {
    fn new(
        id: &str,
        name: &str,
        category: WeaponCategory,
        cost: u32,
        damage_bonus: u32,
        description: &str,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            category,
            cost,
            damage_bonus,
            description: description.to_string(),
            icon: id.to_string(),
        }
    }
}

/// Selected weapon id per slot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loadout {
    pub shield: Option<String>,
    pub sword: Option<String>,
    pub helmet: Option<String>,
}

impl Loadout {
    pub fn get(&self, category: WeaponCategory) -> Option<&str> {
        match category {
            WeaponCategory::Shield => self.shield.as_deref(),
            WeaponCategory::Sword => self.sword.as_deref(),
            WeaponCategory::Helmet => self.helmet.as_deref(),
        }
    }

    pub fn set(&mut self, category: WeaponCategory, id: impl Into<String>) {
        let slot = match category {
            WeaponCategory::Shield => &mut self.shield,
            WeaponCategory::Sword => &mut self.sword,
            WeaponCategory::Helmet => &mut self.helmet,
        };
        *slot = Some(id.into());
    }

    /// All three slots filled: the shop's proceed button is enabled
    pub fn is_complete(&self) -> bool {
        WeaponCategory::ALL.iter().all(|c| self.get(*c).is_some())
    }
}

/// Static weapon list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeaponCatalog {
    weapons: Vec<Weapon>,
}

impl Default for WeaponCatalog {
    fn default() -> Self {
        use WeaponCategory::*;
        Self::new(vec![
            Weapon::new("wooden-shield", "Wooden Shield", Shield, 0, 0, "Basic protection for beginners"),
            Weapon::new("iron-shield", "Iron Shield", Shield, 15, 5, "Sturdy metal protection"),
            Weapon::new("gold-shield", "Gold Shield", Shield, 25, 10, "Gleaming golden defense"),
            Weapon::new("rusty-sword", "Rusty Sword", Sword, 0, 0, "A dull blade, but free!"),
            Weapon::new("iron-sword", "Iron Sword", Sword, 20, 5, "Sharp and reliable steel"),
            Weapon::new("diamond-sword", "Diamond Sword", Sword, 35, 10, "Razor-sharp crystal blade"),
            Weapon::new("cloth-cap", "Cloth Cap", Helmet, 0, 0, "Better than nothing..."),
            Weapon::new("steel-helmet", "Steel Helmet", Helmet, 18, 5, "Solid metal protection"),
            Weapon::new("crystal-helm", "Crystal Helm", Helmet, 30, 10, "Magical crystal headgear"),
        ])
    }
}

impl WeaponCatalog {
    pub fn new(weapons: Vec<Weapon>) -> Self {
        Self { weapons }
    }

    /// Parse a JSON array of weapons; ids must be unique
    pub fn from_json(json: &str) -> Result<Self> {
        let catalog: WeaponCatalog = serde_json::from_str(json)?;
        let mut ids: Vec<&str> = catalog.weapons.iter().map(|w| w.id.as_str()).collect();
        ids.sort_unstable();
        if let Some(dup) = ids.windows(2).find(|w| w[0] == w[1]) {
            return Err(GameError::InvalidTuning(format!("duplicate weapon id '{}'", dup[0])));
        }
        Ok(catalog)
    }

    pub fn weapons(&self) -> &[Weapon] {
        &self.weapons
    }

    pub fn in_category(&self, category: WeaponCategory) -> impl Iterator<Item = &Weapon> {
        self.weapons.iter().filter(move |w| w.category == category)
    }

    pub fn find(&self, id: &str) -> Option<&Weapon> {
        self.weapons.iter().find(|w| w.id == id)
    }

    /// Cost of the weapon picked for `category` (0 if unset or unknown)
    pub fn selected_cost(&self, loadout: &Loadout, category: WeaponCategory) -> u32 {
        loadout
            .get(category)
            .and_then(|id| self.find(id))
            .map_or(0, |w| w.cost)
    }

    /// Sum of the costs of every selected weapon
    pub fn total_cost(&self, loadout: &Loadout) -> u32 {
        WeaponCategory::ALL
            .iter()
            .fold(0u32, |acc, c| acc.saturating_add(self.selected_cost(loadout, *c)))
    }

    /// Loadout cost if `weapon` replaced the current pick in its slot
    pub fn cost_with(&self, weapon: &Weapon, loadout: &Loadout) -> u32 {
        self.total_cost(loadout)
            .saturating_sub(self.selected_cost(loadout, weapon.category))
            .saturating_add(weapon.cost)
    }

    /// Can the player switch to `weapon` with `total_coins`?
    ///
    /// The current pick is always affordable, even with no coins left.
    pub fn can_afford(&self, weapon: &Weapon, loadout: &Loadout, total_coins: u32) -> bool {
        if loadout.get(weapon.category) == Some(weapon.id.as_str()) {
            return true;
        }
        self.cost_with(weapon, loadout) <= total_coins
    }

    /// Battle damage bonus granted by the loadout
    pub fn damage_bonus(&self, loadout: &Loadout) -> u32 {
        WeaponCategory::ALL
            .iter()
            .filter_map(|c| loadout.get(*c).and_then(|id| self.find(id)))
            .fold(0u32, |acc, w| acc.saturating_add(w.damage_bonus))
    }
}
