//! Single-pass queries over the live entity list.

use river_crossing_core::{EntityId, TILE_LENGTH};

use crate::{entity::Kind, Slot};

/// Outcome of the cargo-eaten check.
///
/// Cargo is ranked by insertion order: the first piece is small, the second
/// medium and every later piece large. A piece is eaten when it shares a row
/// with the next larger piece while the hero is more than a tile away.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CargoEaten {
    /// Smallest cargo.
    pub small: Option<EntityId>,
    /// Medium cargo.
    pub medium: Option<EntityId>,
    /// Last large cargo inspected.
    pub large: Option<EntityId>,
    /// The small cargo was eaten by the medium one.
    pub small_eaten: bool,
    /// The medium cargo was eaten by the large one.
    pub medium_eaten: bool,
}

impl CargoEaten {
    /// Reports whether anything was eaten.
    #[must_use]
    pub const fn any(&self) -> bool {
        self.small_eaten || self.medium_eaten
    }
}

pub(crate) fn cargo_eaten(slots: &[Slot], hero_y: f64) -> CargoEaten {
    let mut result = CargoEaten::default();
    let mut small_y = None;
    let mut medium_y = None;
    let unattended = |y: f64| (y - hero_y).abs() > TILE_LENGTH;

    for slot in slots.iter().filter(|slot| slot.entity.is(Kind::Cargo)) {
        let y = slot.entity.position().y;
        match (small_y, medium_y) {
            (None, _) => {
                result.small = Some(slot.id);
                small_y = Some(y);
            }
            (Some(_), None) => {
                result.medium = Some(slot.id);
                medium_y = Some(y);
            }
            (Some(small), Some(medium)) => {
                result.large = Some(slot.id);
                if small == medium && unattended(small) {
                    result.small_eaten = true;
                }
                if medium == y && unattended(medium) {
                    result.medium_eaten = true;
                }
            }
        }
    }

    result
}

/// Last cargo in list order flagged as carried.
pub(crate) fn carried_cargo(slots: &[Slot]) -> Option<EntityId> {
    slots
        .iter()
        .rev()
        .find(|slot| {
            slot.entity
                .as_cargo()
                .is_some_and(|cargo| cargo.is_carried())
        })
        .map(|slot| slot.id)
}

pub(crate) fn count(slots: &[Slot], kind: Kind) -> usize {
    slots.iter().filter(|slot| slot.entity.is(kind)).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cargo::Cargo, Entity};
    use glam::DVec2;
    use river_crossing_core::Image;
    use std::rc::Rc;

    fn slots(rows: &[f64]) -> Vec<Slot> {
        let image = Rc::new(Image::new("cargo.png", 64, 64));
        rows.iter()
            .enumerate()
            .map(|(index, y)| Slot {
                id: EntityId::new(index as u32),
                entity: Entity::cargo(
                    DVec2::new(index as f64 * 128.0, *y),
                    Rc::clone(&image),
                    Cargo::new("cargo", "cargo", 0.0, Rc::clone(&image)),
                ),
            })
            .collect()
    }

    #[test]
    fn small_is_eaten_when_left_with_medium() {
        let eaten = cargo_eaten(&slots(&[32.0, 32.0, 992.0]), 992.0);
        assert!(eaten.small_eaten);
        assert!(!eaten.medium_eaten);
        assert!(eaten.any());
    }

    #[test]
    fn medium_is_eaten_when_left_with_large() {
        let eaten = cargo_eaten(&slots(&[992.0, 32.0, 32.0]), 992.0);
        assert!(!eaten.small_eaten);
        assert!(eaten.medium_eaten);
    }

    #[test]
    fn hero_presence_protects_cargo() {
        let eaten = cargo_eaten(&slots(&[992.0, 992.0, 992.0]), 928.0);
        assert!(!eaten.any());
    }

    #[test]
    fn small_and_large_may_share_a_row() {
        let eaten = cargo_eaten(&slots(&[32.0, 992.0, 32.0]), 992.0);
        assert!(!eaten.any());
    }

    #[test]
    fn two_cargo_never_eat_each_other() {
        let eaten = cargo_eaten(&slots(&[32.0, 32.0]), 992.0);
        assert_eq!(eaten.large, None);
        assert!(!eaten.any());
    }

    #[test]
    fn every_later_cargo_counts_as_large() {
        let eaten = cargo_eaten(&slots(&[992.0, 32.0, 992.0, 32.0]), 992.0);
        assert_eq!(eaten.large, Some(EntityId::new(3)));
        assert!(eaten.medium_eaten);
    }

    #[test]
    fn carried_cargo_is_found_by_flag() {
        let mut slots = slots(&[32.0, 992.0]);
        assert_eq!(carried_cargo(&slots), None);
        slots[1]
            .entity
            .as_cargo_mut()
            .expect("cargo")
            .set_carried(true);
        assert_eq!(carried_cargo(&slots), Some(EntityId::new(1)));
    }
}
