//! Saga Campaign Engine
//!
//! Platform-agnostic campaign progress tracking for the Saga strategy game.
//! This crate records scenario completion, awards, elapsed days and the army
//! carried between scenarios, and reads/writes that record in the binary save
//! format.

pub mod army;
pub mod bonus;
pub mod campaign;
pub mod conditions;
pub mod progress;
pub mod session;
pub mod storage;
pub mod stream;

use std::sync::Arc;

// Re-export commonly used types
pub use army::{ARMY_SLOTS, MonsterId, Troop, Troops};
pub use bonus::{BonusKind, ScenarioBonus};
pub use campaign::{
    AwardId, AwardKind, CampaignAward, CampaignCatalog, CampaignDefinition, CampaignId,
    CatalogError, ScenarioDefinition, ScenarioId, ScenarioLossCondition,
    ScenarioVictoryCondition,
};
pub use conditions::{current_loss_condition, current_victory_condition};
pub use progress::{CampaignProgress, ProgressError};
pub use session::{Advance, CampaignSession, ScenarioOutcome, SessionError};
pub use storage::{FileStorage, StorageError};
pub use stream::{ByteOrder, Decode, Encode, StreamError, StreamReader, StreamWriter};

/// Trait for abstracting campaign definition loading
/// Platform-specific implementations should provide this
pub trait CatalogLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load every campaign definition
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded.
    fn load_catalog(&self) -> Result<CampaignCatalog, Self::Error>;
}

/// Loads the catalog compiled into this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledCatalog;

impl CatalogLoader for BundledCatalog {
    type Error = CatalogError;

    fn load_catalog(&self) -> Result<CampaignCatalog, Self::Error> {
        CampaignCatalog::bundled()
    }
}

/// Trait for abstracting save/load of campaign progress
pub trait ProgressStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Save campaign progress into a named slot
    ///
    /// # Errors
    ///
    /// Returns an error if the progress cannot be saved.
    fn save_progress(&self, slot: &str, progress: &CampaignProgress) -> Result<(), Self::Error>;

    /// Load campaign progress from a named slot
    ///
    /// # Errors
    ///
    /// Returns an error if the slot exists but cannot be read.
    fn load_progress(&self, slot: &str) -> Result<Option<CampaignProgress>, Self::Error>;

    /// Delete a saved slot
    ///
    /// # Errors
    ///
    /// Returns an error if the slot cannot be deleted.
    fn delete_save(&self, slot: &str) -> Result<(), Self::Error>;
}

/// Main engine for starting, saving and resuming campaigns
pub struct CampaignEngine<L, S>
where
    L: CatalogLoader,
    S: ProgressStorage,
{
    loader: L,
    storage: S,
}

impl<L, S> CampaignEngine<L, S>
where
    L: CatalogLoader,
    S: ProgressStorage,
{
    /// Create a new engine with the provided catalog loader and storage
    pub const fn new(loader: L, storage: S) -> Self {
        Self { loader, storage }
    }

    /// Start a campaign from its first scenario
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded or lacks the campaign.
    pub fn start_campaign(
        &self,
        campaign: CampaignId,
        bonus: ScenarioBonus,
    ) -> anyhow::Result<CampaignSession>
    where
        L::Error: Into<anyhow::Error>,
    {
        let catalog = self.loader.load_catalog().map_err(Into::into)?;
        Ok(CampaignSession::start(Arc::new(catalog), campaign, bonus)?)
    }

    /// Save a session's progress
    ///
    /// # Errors
    ///
    /// Returns an error if the progress cannot be saved.
    pub fn save_session(&self, slot: &str, session: &CampaignSession) -> Result<(), S::Error> {
        self.storage.save_progress(slot, session.progress())
    }

    /// Load a session, pairing the stored progress with a freshly loaded catalog
    ///
    /// # Errors
    ///
    /// Returns an error if the progress or the catalog cannot be loaded.
    pub fn load_session(&self, slot: &str) -> anyhow::Result<Option<CampaignSession>>
    where
        L::Error: Into<anyhow::Error>,
        S::Error: Into<anyhow::Error>,
    {
        let Some(progress) = self.storage.load_progress(slot).map_err(Into::into)? else {
            return Ok(None);
        };
        let catalog = self.loader.load_catalog().map_err(Into::into)?;
        Ok(Some(CampaignSession::from_progress(
            progress,
            Arc::new(catalog),
        )))
    }

    /// Delete a saved slot
    ///
    /// # Errors
    ///
    /// Returns an error if the slot cannot be deleted.
    pub fn delete_session(&self, slot: &str) -> Result<(), S::Error> {
        self.storage.delete_save(slot)
    }
}
