//! The polling state machine.
//!
//! `PollController` is the single owner of the history, the cursor, the mode
//! flag, the companion bridge and the display sink. Every operation takes
//! `&mut self`, so ticks and user navigation are serialized by construction.

use beamwatch_bridge::{push_group, CompanionBridge, PushOutcome};
use beamwatch_core::summary::SummaryTable;
use beamwatch_core::{ArtifactGroup, ArtifactGroupStore, DirectoryScanner, MapKind};

use crate::sink::{DisplaySink, NavigationState, PresentedGroup};

// ── Modes and outcomes ──

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Every tick jumps to the newest group.
    Automatic,
    /// The cursor moves only on explicit navigation.
    Manual,
}

/// Result of a navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Cursor moved and this group was presented.
    Moved(String),
    /// Already at the boundary; nothing presented.
    Boundary,
    /// Navigation is only honored in manual mode.
    Disabled,
}

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Groups appended to the history by this tick's scan.
    pub discovered: usize,
    /// Tag presented by this tick, if any.
    pub presented: Option<String>,
}

// ── Controller ──

pub struct PollController<B, S> {
    scanner: DirectoryScanner,
    store: ArtifactGroupStore,
    mode: Mode,
    map_kind: MapKind,
    bridge: B,
    sink: S,
    /// Tag most recently handed to the sink.
    presented: Option<String>,
}

impl<B: CompanionBridge, S: DisplaySink> PollController<B, S> {
    /// Starts in automatic mode with an empty history.
    pub fn new(scanner: DirectoryScanner, map_kind: MapKind, bridge: B, sink: S) -> Self {
        Self {
            scanner,
            store: ArtifactGroupStore::new(),
            mode: Mode::Automatic,
            map_kind,
            bridge,
            sink,
            presented: None,
        }
    }

    /// Scan, record, and in automatic mode present the newest group.
    pub fn tick(&mut self) -> TickReport {
        let found = self.scanner.scan(self.store.tracked());
        let discovered = self.store.record_new_groups(found);
        if discovered > 0 {
            tracing::info!(discovered, total = self.store.len(), "new complete groups");
        }

        let mut report = TickReport {
            discovered,
            presented: None,
        };
        match self.mode {
            Mode::Automatic => {
                // The first group lands under the cursor, so move_to_latest has
                // nothing to report; present it anyway.
                let target = self
                    .store
                    .move_to_latest()
                    .or_else(|| self.unpresented_current());
                if let Some(group) = target {
                    self.present(&group);
                    report.presented = Some(group.tag);
                }
            }
            Mode::Manual if discovered > 0 => {
                self.sink.navigation_changed(self.navigation_state());
            }
            Mode::Manual => {}
        }
        report
    }

    /// Suspend automatic updates. Returns false if already manual.
    pub fn stop(&mut self) -> bool {
        if self.mode == Mode::Manual {
            return false;
        }
        self.mode = Mode::Manual;
        tracing::info!("automatic updates stopped");
        self.sink.navigation_changed(self.navigation_state());
        true
    }

    /// Resume automatic updates and jump to the newest group. Returns the tag presented, if any.
    pub fn start(&mut self) -> Option<String> {
        if self.mode == Mode::Automatic {
            return None;
        }
        self.mode = Mode::Automatic;
        tracing::info!("automatic updates started");
        let target = self
            .store
            .move_to_latest()
            .or_else(|| self.unpresented_current());
        let presented = target.map(|group| {
            self.present(&group);
            group.tag
        });
        self.sink.navigation_changed(self.navigation_state());
        presented
    }

    pub fn toggle_automatic(&mut self) -> Mode {
        match self.mode {
            Mode::Automatic => {
                self.stop();
            }
            Mode::Manual => {
                self.start();
            }
        }
        self.mode
    }

    // ── Navigation ──

    pub fn go_previous(&mut self) -> Navigation {
        self.navigate(ArtifactGroupStore::move_previous)
    }

    pub fn go_next(&mut self) -> Navigation {
        self.navigate(ArtifactGroupStore::move_next)
    }

    pub fn go_latest(&mut self) -> Navigation {
        self.navigate(ArtifactGroupStore::move_to_latest)
    }

    pub fn can_go_previous(&self) -> bool {
        self.mode == Mode::Manual && !self.store.at_start()
    }

    pub fn can_go_next(&self) -> bool {
        self.mode == Mode::Manual && !self.store.at_latest()
    }

    pub fn navigation_state(&self) -> NavigationState {
        NavigationState {
            mode: self.mode,
            can_go_previous: self.can_go_previous(),
            can_go_next: self.can_go_next(),
        }
    }

    // ── Accessors ──

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn store(&self) -> &ArtifactGroupStore {
        &self.store
    }

    pub fn scanner(&self) -> &DirectoryScanner {
        &self.scanner
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut B {
        &mut self.bridge
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    // ── Shutdown ──

    /// Tell a live companion to quit. Failures are logged only.
    pub fn shutdown(&mut self) {
        if !self.bridge.is_alive() {
            return;
        }
        if let Err(e) = self.bridge.quit() {
            tracing::warn!(error = %e, "companion did not acknowledge quit");
        }
    }

    // ── Presentation ──

    fn navigate(
        &mut self,
        step: fn(&mut ArtifactGroupStore) -> Option<ArtifactGroup>,
    ) -> Navigation {
        if self.mode == Mode::Automatic {
            return Navigation::Disabled;
        }
        let outcome = match step(&mut self.store) {
            Some(group) => {
                self.present(&group);
                Navigation::Moved(group.tag)
            }
            None => Navigation::Boundary,
        };
        self.sink.navigation_changed(self.navigation_state());
        outcome
    }

    fn unpresented_current(&self) -> Option<ArtifactGroup> {
        let current = self.store.current()?;
        if self.presented.as_deref() == Some(current.tag.as_str()) {
            return None;
        }
        Some(current.clone())
    }

    /// Hand `group` to the sink, then to the companion.
    fn present(&mut self, group: &ArtifactGroup) {
        let paths = self.scanner.paths(&group.tag);
        let summary = SummaryTable::load(&paths.summary);
        let presented = PresentedGroup {
            group: group.clone(),
            paths,
            summary,
            position: self.store.cursor().map_or(0, |c| c + 1),
            total: self.store.len(),
        };
        self.sink.present(&presented);
        self.presented = Some(group.tag.clone());

        match push_group(&mut self.bridge, &presented.paths, self.map_kind) {
            PushOutcome::Pushed => tracing::debug!(tag = %group.tag, "companion updated"),
            PushOutcome::Skipped => tracing::debug!(tag = %group.tag, "companion not available"),
            PushOutcome::Abandoned { .. } => {}
        }
    }
}
