//! Schema-evolution units, applied on every start-up.

pub mod v001_users;
pub mod v002_items;
pub mod v003_notes;
pub mod v004_ownership;
pub mod v005_friendships;
pub mod v006_unique_item_instances;

use crate::migrations::Migration;

/// Every schema unit the binary ships. Order here does not matter; the
/// runner sorts by name.
pub fn units() -> Vec<Box<dyn Migration>> {
    vec![
        Box::new(v001_users::UNIT),
        Box::new(v002_items::UNIT),
        Box::new(v003_notes::UNIT),
        Box::new(v004_ownership::UNIT),
        Box::new(v005_friendships::UNIT),
        Box::new(v006_unique_item_instances::UniqueItemInstances),
    ]
}
