//! Bridge to the companion visualization process.
//!
//! The companion is reachable only through a handful of remote verbs. A display
//! update is always `update_model`, `close_maps`, then one map-loading verb, and
//! nothing is sent unless the companion answers the liveness probe first.

pub mod error;
pub mod fake;
pub mod process;
pub mod rpc;
pub mod xmlrpc;

use std::fmt;
use std::path::Path;

use beamwatch_core::{ArtifactPaths, MapKind};

pub use error::BridgeError;
pub use fake::{Call, RecordingBridge};
pub use process::CompanionProcess;
pub use rpc::XmlRpcBridge;

// ── Verbs ──

/// The fixed remote verb set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    IsAlive,
    UpdateModel,
    CloseMaps,
    AutoLoadMaps,
    AutoLoadAnomMaps,
    Quit,
}

impl Verb {
    /// Remote method name.
    pub fn as_str(self) -> &'static str {
        match self {
            Verb::IsAlive => "is_alive",
            Verb::UpdateModel => "update_model",
            Verb::CloseMaps => "close_maps",
            Verb::AutoLoadMaps => "auto_load_maps",
            Verb::AutoLoadAnomMaps => "auto_load_anom_maps",
            Verb::Quit => "quit",
        }
    }

    pub fn load_maps(kind: MapKind) -> Self {
        match kind {
            MapKind::Standard => Verb::AutoLoadMaps,
            MapKind::Anomalous => Verb::AutoLoadAnomMaps,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Bridge seam ──

/// Commands understood by the companion. Implemented by [`XmlRpcBridge`]
/// (real transport) and [`RecordingBridge`] (tests).
///
/// Every call must be time-bounded; none may block the polling loop indefinitely.
pub trait CompanionBridge {
    /// Short liveness probe. `false` covers "not started", "exited" and "not answering".
    fn is_alive(&mut self) -> bool;
    fn update_model(&mut self, model: &Path) -> Result<(), BridgeError>;
    fn close_maps(&mut self) -> Result<(), BridgeError>;
    fn auto_load_maps(&mut self, maps: &Path) -> Result<(), BridgeError>;
    fn auto_load_anom_maps(&mut self, maps: &Path) -> Result<(), BridgeError>;
    fn quit(&mut self) -> Result<(), BridgeError>;
}

impl<B: CompanionBridge + ?Sized> CompanionBridge for Box<B> {
    fn is_alive(&mut self) -> bool {
        (**self).is_alive()
    }

    fn update_model(&mut self, model: &Path) -> Result<(), BridgeError> {
        (**self).update_model(model)
    }

    fn close_maps(&mut self) -> Result<(), BridgeError> {
        (**self).close_maps()
    }

    fn auto_load_maps(&mut self, maps: &Path) -> Result<(), BridgeError> {
        (**self).auto_load_maps(maps)
    }

    fn auto_load_anom_maps(&mut self, maps: &Path) -> Result<(), BridgeError> {
        (**self).auto_load_anom_maps(maps)
    }

    fn quit(&mut self) -> Result<(), BridgeError> {
        (**self).quit()
    }
}

/// Bridge used when no companion is configured: never alive, never called.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedBridge;

impl CompanionBridge for DetachedBridge {
    fn is_alive(&mut self) -> bool {
        false
    }

    fn update_model(&mut self, _model: &Path) -> Result<(), BridgeError> {
        Err(BridgeError::Detached)
    }

    fn close_maps(&mut self) -> Result<(), BridgeError> {
        Err(BridgeError::Detached)
    }

    fn auto_load_maps(&mut self, _maps: &Path) -> Result<(), BridgeError> {
        Err(BridgeError::Detached)
    }

    fn auto_load_anom_maps(&mut self, _maps: &Path) -> Result<(), BridgeError> {
        Err(BridgeError::Detached)
    }

    fn quit(&mut self) -> Result<(), BridgeError> {
        Ok(())
    }
}

// ── Update sequence ──

/// Result of one display update against the companion.
#[derive(Debug)]
pub enum PushOutcome {
    /// All three commands succeeded.
    Pushed,
    /// Companion not alive; nothing was sent.
    Skipped,
    /// `verb` failed; the remaining commands of this update were not sent.
    Abandoned { verb: Verb, error: BridgeError },
}

impl PushOutcome {
    pub fn is_pushed(&self) -> bool {
        matches!(self, PushOutcome::Pushed)
    }
}

/// Send one group to the companion: probe, load model, close old maps, load new maps.
///
/// Maps are never loaded unless the close before them succeeded, so a failure
/// stops the sequence. Nothing is retried within the call.
pub fn push_group<B: CompanionBridge + ?Sized>(
    bridge: &mut B,
    paths: &ArtifactPaths,
    map_kind: MapKind,
) -> PushOutcome {
    if !bridge.is_alive() {
        tracing::debug!("companion not alive, skipping update");
        return PushOutcome::Skipped;
    }

    if let Err(error) = bridge.update_model(&paths.model) {
        return abandoned(Verb::UpdateModel, error);
    }
    if let Err(error) = bridge.close_maps() {
        return abandoned(Verb::CloseMaps, error);
    }
    let load = Verb::load_maps(map_kind);
    let result = match map_kind {
        MapKind::Standard => bridge.auto_load_maps(&paths.maps),
        MapKind::Anomalous => bridge.auto_load_anom_maps(&paths.maps),
    };
    if let Err(error) = result {
        return abandoned(load, error);
    }
    PushOutcome::Pushed
}

fn abandoned(verb: Verb, error: BridgeError) -> PushOutcome {
    tracing::warn!(%verb, %error, "companion command failed, update abandoned");
    PushOutcome::Abandoned { verb, error }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beamwatch_core::Layout;

    fn paths() -> ArtifactPaths {
        Layout::Flat.paths(Path::new("/data"), "a")
    }

    #[test]
    fn dead_companion_gets_no_commands() {
        let mut bridge = RecordingBridge::dead();
        let out = push_group(&mut bridge, &paths(), MapKind::Standard);
        assert!(matches!(out, PushOutcome::Skipped));
        assert!(bridge.calls().is_empty());
        assert_eq!(bridge.probes(), 1);
    }

    #[test]
    fn live_companion_gets_fixed_sequence() {
        let mut bridge = RecordingBridge::alive();
        let out = push_group(&mut bridge, &paths(), MapKind::Standard);
        assert!(out.is_pushed());
        assert_eq!(
            bridge.verbs(),
            vec![Verb::UpdateModel, Verb::CloseMaps, Verb::AutoLoadMaps]
        );
        assert_eq!(bridge.calls()[0].arg.as_deref(), Some(Path::new("/data/a.pdb")));
        assert_eq!(bridge.calls()[1].arg, None);
        assert_eq!(bridge.calls()[2].arg.as_deref(), Some(Path::new("/data/a.mtz")));
    }

    #[test]
    fn anomalous_maps_use_anom_verb() {
        let mut bridge = RecordingBridge::alive();
        push_group(&mut bridge, &paths(), MapKind::Anomalous);
        assert_eq!(
            bridge.verbs(),
            vec![Verb::UpdateModel, Verb::CloseMaps, Verb::AutoLoadAnomMaps]
        );
    }

    #[test]
    fn failed_close_stops_before_loading_maps() {
        let mut bridge = RecordingBridge::alive();
        bridge.time_out(Verb::CloseMaps);
        let out = push_group(&mut bridge, &paths(), MapKind::Standard);
        assert!(matches!(
            out,
            PushOutcome::Abandoned {
                verb: Verb::CloseMaps,
                error: BridgeError::Timeout
            }
        ));
        assert_eq!(bridge.verbs(), vec![Verb::UpdateModel, Verb::CloseMaps]);
    }

    #[test]
    fn bridge_usable_after_timeout() {
        let mut bridge = RecordingBridge::alive();
        bridge.time_out(Verb::UpdateModel);
        assert!(!push_group(&mut bridge, &paths(), MapKind::Standard).is_pushed());
        bridge.clear_failures();
        bridge.take_calls();
        assert!(push_group(&mut bridge, &paths(), MapKind::Standard).is_pushed());
        assert_eq!(bridge.verbs().len(), 3);
    }

    #[test]
    fn detached_bridge_never_pushes() {
        let mut bridge = DetachedBridge;
        assert!(matches!(
            push_group(&mut bridge, &paths(), MapKind::Standard),
            PushOutcome::Skipped
        ));
        assert!(bridge.quit().is_ok());
    }

    #[test]
    fn boxed_bridge_delegates() {
        let mut bridge: Box<dyn CompanionBridge> = Box::new(RecordingBridge::alive());
        assert!(push_group(&mut bridge, &paths(), MapKind::Standard).is_pushed());
    }

    #[test]
    fn verb_names_match_remote_methods() {
        assert_eq!(Verb::AutoLoadAnomMaps.to_string(), "auto_load_anom_maps");
        assert_eq!(Verb::IsAlive.as_str(), "is_alive");
        assert_eq!(Verb::load_maps(MapKind::Standard), Verb::AutoLoadMaps);
    }
}
