//! States for the `bootdeploy` session state machine.
//!
//! This modules is private and restricted to the [`session`](crate::session)
//! scope. The public interface of the state machine is provided by
//! [`session`](crate::session).
//!
//! Refer to the [`state_machine`](super::state_machine) module for an overview
//! of states, events and transitions.

use std::path::PathBuf;

use console::style;
use log::{debug, info};

use super::events::*;
use super::state_machine::Backends;

use crate::{
    deployer::deploy_images, error::DeployError, settings::Settings, signaler::signal_reboot,
};

// =============================================================================
// Crate-Public Interface
// =============================================================================

/// Trait adding the ability for a state to be `run` after a transition into it.
pub(crate) trait Runnable {
    /// A state implements this method so it can be `run` after the state
    /// machine transitions into it.
    ///
    /// During this call, the state does its work with the given `backends`
    /// and, when finished, requests a transition to a `new state` by returning
    /// the appropriate `event`. The `event` is consumed to create the `new
    /// state` using the corresponding [`From`] trait implementation.
    fn run(&mut self, settings: &Settings, backends: &mut Backends) -> Event;
}

// Init State ==================================================================

/// The initial state of the session state machine.
///
///  * **[`DeployEvent`] => [`DeployState`]** when a serial port was given,
///  * **[`DoneEvent`] => [`DoneState`]** otherwise. Nothing is copied to the
///    volume if the board cannot be rebooted afterwards.
#[derive(Debug)]
pub(crate) struct InitState {}
impl Runnable for InitState {
    fn run(&mut self, settings: &Settings, _backends: &mut Backends) -> Event {
        info!("=> Init");
        match settings.path {
            Some(_) => Event::Deploy(DeployEvent {
                settings: settings.clone(),
            }),
            None => Event::Done(DoneEvent {
                settings: settings.clone(),
                error: Some(DeployError::NoPort),
            }),
        }
    }
}

// Deploy State ================================================================

/// Copies the images to the board volume.
///
///  * **[`RebootEvent`] => [`RebootState`]** when all images were copied,
///  * **[`DoneEvent`] => [`DoneState`]** on the first copy error.
#[derive(Debug)]
pub(crate) struct DeployState {}
impl Runnable for DeployState {
    fn run(&mut self, settings: &Settings, backends: &mut Backends) -> Event {
        info!("=> Deploy");
        match deploy_images(
            settings,
            backends.copier.as_mut(),
            backends.delay.as_mut(),
        ) {
            Ok(copied) => Event::Reboot(RebootEvent {
                settings: settings.clone(),
                copied,
            }),
            Err(error) => Event::Done(DoneEvent {
                settings: settings.clone(),
                error: Some(error),
            }),
        }
    }
}

// Reboot State ================================================================

/// Sends the reboot command over the board serial console. Always ends the
/// run with a [`DoneEvent`], carrying the error if the command could not be
/// sent.
#[derive(Debug)]
pub(crate) struct RebootState {
    /// Paths written on the volume by the deployment.
    pub copied: Vec<PathBuf>,
}
impl Runnable for RebootState {
    fn run(&mut self, settings: &Settings, backends: &mut Backends) -> Event {
        info!("=> Reboot");
        debug!("images on the volume: {:?}", self.copied);
        let error = signal_reboot(settings, backends.opener.as_mut(), backends.delay.as_mut())
            .err();
        Event::Done(DoneEvent {
            settings: settings.clone(),
            error,
        })
    }
}

// Done State ==================================================================

/// Reached when the run completes and is about to terminate (normally or
/// abnormally).
///
/// This state goes into a 2-phase execution. During the initial phase, it runs
/// like any other state and reports the error that aborted the run, if any.
/// It then triggers the [`ExitEvent`] to cause the state machine to terminate
/// and exit.
#[derive(Debug)]
pub(crate) struct DoneState {
    /// The error that aborted the run.
    pub error: Option<DeployError>,
    /// When `true` instructs the session state machine to exit its event loop.
    pub should_exit: bool,
}
impl Runnable for DoneState {
    fn run(&mut self, settings: &Settings, _backends: &mut Backends) -> Event {
        info!(
            "=> Done with{}errors",
            if self.error.is_some() { " " } else { " no " }
        );
        match &self.error {
            Some(error) => {
                eprintln!("{}", style(format!("[BD] 💥 {}", error.headline())).red());
                eprintln!("     {} {}", style("-->").cyan(), error);
            }
            None => println!("[BD] ✅ Images deployed and reboot requested"),
        }

        Event::Exit(ExitEvent {
            settings: settings.clone(),
            error: self.error.take(),
        })
    }
}
