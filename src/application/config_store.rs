//! Runtime-mutable model parameters.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use tracing::info;

use crate::domain::{ModelConfig, ModelConfigPatch, Timeframe};
use crate::error::{Error, Result};

/// Owns the per-timeframe [`ModelConfig`]s. Readers get clones, so a patch
/// never changes a run that already took its snapshot.
pub struct ModelConfigStore {
    configs: RwLock<BTreeMap<Timeframe, ModelConfig>>,
}

impl ModelConfigStore {
    #[must_use]
    pub fn new(configs: BTreeMap<Timeframe, ModelConfig>) -> Self {
        Self {
            configs: RwLock::new(configs),
        }
    }

    /// Tracked timeframes in ascending interval order.
    #[must_use]
    pub fn timeframes(&self) -> Vec<Timeframe> {
        self.configs.read().keys().copied().collect()
    }

    #[must_use]
    pub fn contains(&self, timeframe: Timeframe) -> bool {
        self.configs.read().contains_key(&timeframe)
    }

    pub fn snapshot(&self, timeframe: Timeframe) -> Result<ModelConfig> {
        self.configs
            .read()
            .get(&timeframe)
            .cloned()
            .ok_or(Error::UnknownTimeframe(timeframe))
    }

    #[must_use]
    pub fn all(&self) -> BTreeMap<Timeframe, ModelConfig> {
        self.configs.read().clone()
    }

    /// Validate and apply a partial update. The stored config is unchanged
    /// when validation fails.
    pub fn patch(&self, timeframe: Timeframe, patch: &ModelConfigPatch) -> Result<ModelConfig> {
        let mut configs = self.configs.write();
        let current = configs
            .get(&timeframe)
            .ok_or(Error::UnknownTimeframe(timeframe))?;
        let next = current.patched(patch)?;
        configs.insert(timeframe, next.clone());
        info!(timeframe = %timeframe, "Model config updated");
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    fn store() -> ModelConfigStore {
        ModelConfigStore::new(BTreeMap::from([
            (Timeframe::D1, ModelConfig::new("b")),
            (Timeframe::H4, ModelConfig::new("a")),
        ]))
    }

    #[test]
    fn timeframes_are_ordered() {
        assert_eq!(store().timeframes(), vec![Timeframe::H4, Timeframe::D1]);
    }

    #[test]
    fn patch_applies_and_snapshot_is_detached() {
        let store = store();
        let before = store.snapshot(Timeframe::H4).unwrap();
        let patch = ModelConfigPatch {
            slow_length: Some(40),
            ..Default::default()
        };
        let after = store.patch(Timeframe::H4, &patch).unwrap();
        assert_eq!(after.slow_length, 40);
        assert_eq!(before.slow_length, 26);
        assert_eq!(store.snapshot(Timeframe::H4).unwrap().slow_length, 40);
    }

    #[test]
    fn invalid_patch_leaves_config_untouched() {
        let store = store();
        let patch = ModelConfigPatch {
            fast_length: Some(100),
            ..Default::default()
        };
        assert!(matches!(
            store.patch(Timeframe::H4, &patch),
            Err(Error::Config(ConfigError::InvalidValue { field: "fast_length", .. }))
        ));
        assert_eq!(store.snapshot(Timeframe::H4).unwrap().fast_length, 12);
    }

    #[test]
    fn unknown_timeframe_is_an_error() {
        assert!(matches!(
            store().snapshot(Timeframe::M15),
            Err(Error::UnknownTimeframe(Timeframe::M15))
        ));
    }
}
