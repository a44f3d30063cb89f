//! Builder for `ZoneController`, with optional restore from persisted state.

use crate::config::Params;
use crate::controller::ZoneController;
use crate::error::{BuildError, Result};
use crate::persist::PersistedState;

#[derive(Debug, Default)]
pub struct ZoneControllerBuilder {
    params: Option<Params>,
    persisted: Option<PersistedState>,
}

impl ZoneControllerBuilder {
    pub fn params(mut self, params: Params) -> Self {
        self.params = Some(params);
        self
    }

    /// Seed bias and last-sent memory from a previous run.
    pub fn restore(mut self, persisted: PersistedState) -> Self {
        self.persisted = Some(persisted);
        self
    }

    /// Validate and construct. Missing params fall back to the defaults.
    pub fn try_build(self) -> Result<ZoneController> {
        let mut ctl = ZoneController::new(self.params.unwrap_or_default())?;
        if let Some(persisted) = self.persisted {
            if !persisted.bias_c.is_finite() {
                return Err(eyre::Report::new(BuildError::PersistedState(
                    "bias_c must be finite".into(),
                )));
            }
            if persisted.last_sent_c.is_some_and(|c| !c.is_finite()) {
                return Err(eyre::Report::new(BuildError::PersistedState(
                    "last_sent_c must be finite".into(),
                )));
            }
            ctl.restore(&persisted);
        }
        Ok(ctl)
    }
}
