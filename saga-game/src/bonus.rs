//! Starting bonuses offered before each campaign scenario.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::stream::{Decode, Encode, StreamError, StreamReader, StreamWriter};

/// What a scenario bonus grants. Discriminants are the persisted values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum BonusKind {
    #[default]
    Resources = 0,
    Artifact = 1,
    Troop = 2,
    Spell = 3,
    StartingRace = 4,
    PrimarySkill = 5,
    SecondarySkill = 6,
    StartingRaceAndArmy = 7,
}

impl BonusKind {
    pub const ALL: [Self; 8] = [
        Self::Resources,
        Self::Artifact,
        Self::Troop,
        Self::Spell,
        Self::StartingRace,
        Self::PrimarySkill,
        Self::SecondarySkill,
        Self::StartingRaceAndArmy,
    ];

    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }
}

impl std::fmt::Display for BonusKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Resources => "resources",
            Self::Artifact => "artifact",
            Self::Troop => "troop",
            Self::Spell => "spell",
            Self::StartingRace => "starting_race",
            Self::PrimarySkill => "primary_skill",
            Self::SecondarySkill => "secondary_skill",
            Self::StartingRaceAndArmy => "starting_race_and_army",
        };
        f.write_str(label)
    }
}

/// The bonus selected for the active scenario.
///
/// `subtype` names the resource, artifact, monster, spell, race or skill the
/// bonus refers to; `amount` is its quantity where one applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct ScenarioBonus {
    pub kind: BonusKind,
    #[serde(default)]
    pub subtype: i32,
    #[serde(default)]
    pub amount: i32,
}

impl ScenarioBonus {
    #[must_use]
    pub const fn new(kind: BonusKind, subtype: i32, amount: i32) -> Self {
        Self {
            kind,
            subtype,
            amount,
        }
    }
}

impl Encode for ScenarioBonus {
    fn encode<W: Write>(&self, out: &mut StreamWriter<W>) -> Result<(), StreamError> {
        out.write(&self.kind.code())?
            .write(&self.subtype)?
            .write(&self.amount)?;
        Ok(())
    }
}

impl Decode for ScenarioBonus {
    fn decode<R: Read>(input: &mut StreamReader<R>) -> Result<Self, StreamError> {
        let code: i32 = input.read()?;
        let kind = BonusKind::from_code(code).ok_or(StreamError::InvalidValue {
            field: "bonus kind",
            value: code,
        })?;
        let subtype = input.read()?;
        let amount = input.read()?;
        Ok(Self {
            kind,
            subtype,
            amount,
        })
    }
}
