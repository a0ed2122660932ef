pub mod controller;
pub mod runner;
pub mod sink;

pub use controller::{Mode, Navigation, PollController, TickReport};
pub use runner::{run, RunStats, UserCommand};
pub use sink::{DisplaySink, NavigationState, PresentedGroup, RecordingSink};
