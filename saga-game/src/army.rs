//! Army slots and the troop snapshots carried between scenarios.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::stream::{Decode, Encode, StreamError, StreamReader, StreamWriter};

/// Monster identifier as used by the rest of the engine. Zero is "no monster".
pub type MonsterId = i32;

/// Number of slots in a hero's army.
pub const ARMY_SLOTS: usize = 5;

/// One army slot: a monster type and how many of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Troop {
    pub monster: MonsterId,
    pub count: u32,
}

impl Troop {
    pub const EMPTY: Self = Self {
        monster: 0,
        count: 0,
    };

    #[must_use]
    pub const fn new(monster: MonsterId, count: u32) -> Self {
        Self { monster, count }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.monster == 0 || self.count == 0
    }
}

impl Encode for Troop {
    fn encode<W: Write>(&self, out: &mut StreamWriter<W>) -> Result<(), StreamError> {
        out.write(&self.monster)?.write(&self.count)?;
        Ok(())
    }
}

impl Decode for Troop {
    fn decode<R: Read>(input: &mut StreamReader<R>) -> Result<Self, StreamError> {
        let monster = input.read()?;
        let count = input.read()?;
        Ok(Self { monster, count })
    }
}

/// A hero's army: a fixed row of slots, some of which may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Troops {
    slots: SmallVec<[Troop; ARMY_SLOTS]>,
}

impl Default for Troops {
    fn default() -> Self {
        Self {
            slots: SmallVec::from_elem(Troop::EMPTY, ARMY_SLOTS),
        }
    }
}

impl Troops {
    /// Build an army from explicit slots. Missing slots are left empty and
    /// anything past [`ARMY_SLOTS`] is dropped.
    #[must_use]
    pub fn from_slots<I>(troops: I) -> Self
    where
        I: IntoIterator<Item = Troop>,
    {
        let mut slots: SmallVec<[Troop; ARMY_SLOTS]> =
            troops.into_iter().take(ARMY_SLOTS).collect();
        slots.resize(ARMY_SLOTS, Troop::EMPTY);
        Self { slots }
    }

    /// Number of slots, empty ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Troop::is_empty)
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Troop> {
        self.slots.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Troop> {
        self.slots.iter()
    }

    /// Place `troop` in `index`, returning the previous occupant.
    pub fn set(&mut self, index: usize, troop: Troop) -> Option<Troop> {
        self.slots
            .get_mut(index)
            .map(|slot| std::mem::replace(slot, troop))
    }

    /// Total number of creatures across all slots.
    #[must_use]
    pub fn headcount(&self) -> u64 {
        self.slots.iter().map(|troop| u64::from(troop.count)).sum()
    }
}
