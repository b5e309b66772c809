//! Consumable items that activate effects.

use serde::Serialize;
use thiserror::Error;

use super::EffectKind;

pub const BOOST_ITEM_ID: &str = "boost_x2";
pub const SHIELD_ITEM_ID: &str = "shield_1h";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
    pub description: String,
    pub qty: u32,
    pub effect: EffectKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    #[error("Unknown item: {0}")]
    UnknownItem(String),
    #[error("Item unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone)]
pub struct Inventory {
    items: Vec<InventoryItem>,
}

impl Inventory {
    pub fn new(items: Vec<InventoryItem>) -> Self {
        Self { items }
    }

    /// The starter kit: one boost and one shield.
    pub fn starter() -> Self {
        Self::new(vec![
            InventoryItem {
                id: BOOST_ITEM_ID.to_string(),
                name: "Boost x2 (1h)".to_string(),
                description: "Doubles counted distance for one hour.".to_string(),
                qty: 1,
                effect: EffectKind::Boost,
            },
            InventoryItem {
                id: SHIELD_ITEM_ID.to_string(),
                name: "Shield (1h)".to_string(),
                description: "Prevents being matched into duels for one hour.".to_string(),
                qty: 1,
                effect: EffectKind::Shield,
            },
        ])
    }

    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    pub fn get(&self, item_id: &str) -> Option<&InventoryItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    /// Take one unit of `item_id`. Nothing changes on error.
    pub fn consume(&mut self, item_id: &str) -> Result<InventoryItem, InventoryError> {
        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| InventoryError::UnknownItem(item_id.to_string()))?;

        if item.qty == 0 {
            return Err(InventoryError::Unavailable(item_id.to_string()));
        }
        item.qty -= 1;
        Ok(item.clone())
    }
}

impl Default for Inventory {
    fn default() -> Self {
        Self::starter()
    }
}
