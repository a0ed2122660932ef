use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::{BridgeError, CompanionBridge, Verb};

/// One command received by a [`RecordingBridge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub verb: Verb,
    pub arg: Option<PathBuf>,
}

/// In-memory companion for tests. Records commands, simulates liveness, and
/// can time out chosen verbs. Liveness probes are counted, not recorded.
#[derive(Debug, Default)]
pub struct RecordingBridge {
    alive: bool,
    probes: usize,
    calls: Vec<Call>,
    timeouts: HashSet<Verb>,
}

impl RecordingBridge {
    pub fn alive() -> Self {
        Self {
            alive: true,
            ..Self::default()
        }
    }

    pub fn dead() -> Self {
        Self::default()
    }

    pub fn set_alive(&mut self, alive: bool) {
        self.alive = alive;
    }

    /// Make every call of `verb` fail with [`BridgeError::Timeout`].
    pub fn time_out(&mut self, verb: Verb) {
        self.timeouts.insert(verb);
    }

    pub fn clear_failures(&mut self) {
        self.timeouts.clear();
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn verbs(&self) -> Vec<Verb> {
        self.calls.iter().map(|c| c.verb).collect()
    }

    pub fn take_calls(&mut self) -> Vec<Call> {
        std::mem::take(&mut self.calls)
    }

    pub fn probes(&self) -> usize {
        self.probes
    }

    fn record(&mut self, verb: Verb, arg: Option<&Path>) -> Result<(), BridgeError> {
        self.calls.push(Call {
            verb,
            arg: arg.map(Path::to_path_buf),
        });
        if self.timeouts.contains(&verb) {
            return Err(BridgeError::Timeout);
        }
        Ok(())
    }
}

impl CompanionBridge for RecordingBridge {
    fn is_alive(&mut self) -> bool {
        self.probes += 1;
        self.alive
    }

    fn update_model(&mut self, model: &Path) -> Result<(), BridgeError> {
        self.record(Verb::UpdateModel, Some(model))
    }

    fn close_maps(&mut self) -> Result<(), BridgeError> {
        self.record(Verb::CloseMaps, None)
    }

    fn auto_load_maps(&mut self, maps: &Path) -> Result<(), BridgeError> {
        self.record(Verb::AutoLoadMaps, Some(maps))
    }

    fn auto_load_anom_maps(&mut self, maps: &Path) -> Result<(), BridgeError> {
        self.record(Verb::AutoLoadAnomMaps, Some(maps))
    }

    fn quit(&mut self) -> Result<(), BridgeError> {
        self.record(Verb::Quit, None)?;
        self.alive = false;
        Ok(())
    }
}
