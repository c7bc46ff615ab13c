//! The set of covers built from one config document.
//!
//! Covers are independent; the set only owns them and resolves ids.

use std::collections::BTreeMap;
use std::sync::Arc;

use cover_traits::clock::Clock;
use cover_traits::{CommandPublisher, PositionStore};
use eyre::WrapErr;

use crate::config::{ControllerCfg, CoverSpec};
use crate::cover::Cover;
use crate::error::{CoverError, Result};
use crate::state::CoverState;

#[derive(Debug, Default)]
pub struct CoverSet {
    covers: BTreeMap<String, Arc<Cover>>,
}

impl CoverSet {
    /// Build every configured cover, sharing one transport, store and clock.
    /// Positions are not loaded; see `restore_all` or `load`.
    pub fn from_config(
        cfg: &cover_config::Config,
        publisher: Arc<dyn CommandPublisher + Send + Sync>,
        store: Arc<dyn PositionStore + Send + Sync>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Result<Self> {
        let timing = ControllerCfg::from(&cfg.controller);
        let mut covers = BTreeMap::new();
        for (key, cover_cfg) in &cfg.covers {
            let spec = CoverSpec::from_config(key, cover_cfg);
            let id = spec.id.clone();
            let cover = Cover::builder()
                .with_spec(spec)
                .with_timing(timing.clone())
                .with_shared_publisher(Arc::clone(&publisher))
                .with_shared_store(Arc::clone(&store))
                .with_shared_clock(Arc::clone(&clock))
                .build()
                .wrap_err_with(|| format!("build cover {key:?}"))?;
            if covers.insert(id.clone(), Arc::new(cover)).is_some() {
                eyre::bail!("duplicate cover id {id:?}");
            }
        }
        Ok(Self { covers })
    }

    /// Build all covers and restore their persisted positions.
    pub fn load(
        cfg: &cover_config::Config,
        publisher: Arc<dyn CommandPublisher + Send + Sync>,
        store: Arc<dyn PositionStore + Send + Sync>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Result<Self> {
        let set = Self::from_config(cfg, publisher, store, clock)?;
        set.restore_all()?;
        Ok(set)
    }

    pub fn restore_all(&self) -> Result<()> {
        for cover in self.covers.values() {
            cover.restore()?;
        }
        tracing::info!(covers = self.covers.len(), "positions restored");
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Cover>> {
        self.covers.get(id)
    }

    /// Like `get`, but an unknown id is a `CoverError::UnknownCover`.
    pub fn cover(&self, id: &str) -> Result<Arc<Cover>> {
        self.covers
            .get(id)
            .cloned()
            .ok_or_else(|| eyre::Report::new(CoverError::UnknownCover(id.to_string())))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.covers.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Cover>> {
        self.covers.values()
    }

    pub fn len(&self) -> usize {
        self.covers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.covers.is_empty()
    }

    pub fn states(&self) -> Vec<CoverState> {
        self.covers.values().map(|c| c.state()).collect()
    }
}
