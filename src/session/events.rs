//! Events for the `bootdeploy` session state machine.
//!
//! This modules is private and restricted to the [`session`](crate::session)
//! scope. The public interface of the state machine is provided by
//! [`session`](crate::session).
//!
//! Refer to the [`state_machine`](super::state_machine) module for an overview
//! of states, events and transitions.

use std::path::PathBuf;

use crate::{error::DeployError, settings::Settings};

// =============================================================================
// Crate-Public Interface
// =============================================================================

// DeployEvent =================================================================

/// Event fired from the `Init` state, once the settings are complete enough
/// for the run to go ahead. Triggers the transition to the `Deploy` state.
#[derive(Debug)]
pub(crate) struct DeployEvent {
    pub settings: Settings,
}

// RebootEvent =================================================================

/// Event fired when every image has been copied to the board volume. Triggers
/// the transition to the `Reboot` state.
#[derive(Debug)]
pub(crate) struct RebootEvent {
    pub settings: Settings,
    /// Paths written on the volume by the deployment.
    pub copied: Vec<PathBuf>,
}

// DoneEvent ===================================================================

/// Event fired when the run completes and is about to terminate. It triggers
/// a transition to the `Done` state.
///
/// This event can happen at any state, either because the board was rebooted
/// or because an error aborted the run.
#[derive(Debug)]
pub(crate) struct DoneEvent {
    pub settings: Settings,
    /// The error that aborted the run, if any.
    pub error: Option<DeployError>,
}

// ExitEvent ===================================================================

/// The last event of a run. It terminates the event loop with an `exit
/// status` that can be used as the process exit code.
#[derive(Debug)]
pub(crate) struct ExitEvent {
    pub settings: Settings,
    pub error: Option<DeployError>,
}

// Events enum ==================================================================

/// Events that can be triggered within the session state machine.
///
/// Each possible value holds an `event`, which in turn may hold additional data
/// for the state transition. Such data is passed by the origin state for
/// potential use by the target state.
#[derive(Debug)]
pub(crate) enum Event {
    Deploy(DeployEvent),
    Reboot(RebootEvent),
    Done(DoneEvent),
    Exit(ExitEvent),
}
