use beamwatch_core::summary::SummaryTable;
use beamwatch_core::{ArtifactGroup, ArtifactPaths};

use crate::controller::Mode;

/// Everything a display needs to show one group.
#[derive(Debug, Clone)]
pub struct PresentedGroup {
    pub group: ArtifactGroup,
    pub paths: ArtifactPaths,
    pub summary: SummaryTable,
    /// 1-based position in the history.
    pub position: usize,
    pub total: usize,
}

/// Which navigation affordances the presentation layer should enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationState {
    pub mode: Mode,
    pub can_go_previous: bool,
    pub can_go_next: bool,
}

/// Consumer of presented groups (terminal printer, GUI, ...).
pub trait DisplaySink {
    fn present(&mut self, group: &PresentedGroup);
    fn navigation_changed(&mut self, state: NavigationState);
}

impl<S: DisplaySink + ?Sized> DisplaySink for Box<S> {
    fn present(&mut self, group: &PresentedGroup) {
        (**self).present(group)
    }

    fn navigation_changed(&mut self, state: NavigationState) {
        (**self).navigation_changed(state)
    }
}

/// Sink that keeps everything it receives. Used by tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub presented: Vec<PresentedGroup>,
    pub navigation: Vec<NavigationState>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn presented_tags(&self) -> Vec<&str> {
        self.presented.iter().map(|p| p.group.tag.as_str()).collect()
    }

    pub fn last_navigation(&self) -> Option<NavigationState> {
        self.navigation.last().copied()
    }
}

impl DisplaySink for RecordingSink {
    fn present(&mut self, group: &PresentedGroup) {
        self.presented.push(group.clone());
    }

    fn navigation_changed(&mut self, state: NavigationState) {
        self.navigation.push(state);
    }
}
