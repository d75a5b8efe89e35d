//! `RobotStore`: robots in insertion order with an id index.

use fg_core::RobotId;

use crate::{Map, Robot};

/// Holds every managed robot.
///
/// `robots` keeps insertion order, which is the order the tick loop moves
/// robots in and therefore decides who wins a contested cell.  `index` maps
/// each id to its slot in `robots`.
///
/// Re-inserting an existing id replaces the record in its current slot
/// (upsert); only removal followed by insertion moves a robot to the back.
#[derive(Default)]
pub struct RobotStore {
    robots: Vec<Robot>,
    index:  Map<RobotId, usize>,
}

impl RobotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `robot`, replacing any robot with the same id in place.
    /// Returns the slot the robot now occupies.
    pub fn upsert(&mut self, robot: Robot) -> usize {
        match self.index.get(&robot.id) {
            Some(&slot) => {
                self.robots[slot] = robot;
                slot
            }
            None => {
                let slot = self.robots.len();
                self.index.insert(robot.id.clone(), slot);
                self.robots.push(robot);
                slot
            }
        }
    }

    /// Remove and return the robot with `id`.  Later slots shift down by one.
    pub fn remove(&mut self, id: &str) -> Option<Robot> {
        let slot = self.index.remove(id)?;
        let robot = self.robots.remove(slot);
        for s in self.index.values_mut() {
            if *s > slot {
                *s -= 1;
            }
        }
        Some(robot)
    }

    #[inline]
    pub fn get(&self, id: &str) -> Option<&Robot> {
        self.index.get(id).map(|&slot| &self.robots[slot])
    }

    #[inline]
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Robot> {
        self.index.get(id).map(|&slot| &mut self.robots[slot])
    }

    /// Robots in insertion order.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Robot> {
        self.robots.iter()
    }

    #[inline]
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Robot> {
        self.robots.iter_mut()
    }

    /// Mutable access by slot, for loops that also track slots.
    #[inline]
    pub(crate) fn slot_mut(&mut self, slot: usize) -> &mut Robot {
        &mut self.robots[slot]
    }

    pub fn len(&self) -> usize {
        self.robots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.robots.is_empty()
    }
}
