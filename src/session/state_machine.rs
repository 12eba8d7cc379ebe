//! `bootdeploy` session state machine.
//!
//! A session copies the images to the board volume and then reboots the board
//! through its serial console. The two steps are strictly ordered: the serial
//! port is not even opened unless every image made it to the volume.
//!
//! ```text
//!            START
//!              |
//!              v
//!          .-------.   no port
//!          | Init  |-------------------------.
//!          '-------'                         |
//!              |                             |
//!              v                             |
//!         .--------.   copy error            |
//!         | Deploy |---------------------.   |
//!         '--------'                     |   |
//!              |                         |   |
//!              v                         v   v
//!         .--------.   port error    .----------.
//!         | Reboot |---------------->|   Done   |---> END (exit 1)
//!         '--------'                 '----------'
//!              |                          ^
//!              '--------------------------'---> END (exit 0)
//! ```

use super::events::*;
use super::states::*;
use crate::{
    error::DeployError,
    settings::Settings,
    utils::{Delay, FsCopier, ImageCopier, PortOpener, SerialPortOpener, ThreadSleep},
};

// =============================================================================
// Public Interface
// =============================================================================

/// What a session uses to reach the board: the copier for the volume, the
/// opener for the serial console and the delay for every pause in between.
pub struct Backends {
    pub copier: Box<dyn ImageCopier>,
    pub opener: Box<dyn PortOpener>,
    pub delay: Box<dyn Delay>,
}
impl Backends {
    /// The real filesystem, real serial ports and real sleeps.
    pub fn system(settings: &Settings) -> Self {
        Backends {
            copier: Box::new(FsCopier::new(settings.progress)),
            opener: Box::new(SerialPortOpener),
            delay: Box::new(ThreadSleep),
        }
    }
}

/// Represents the `bootdeploy` session state machine. Use the `factory()`
/// function to get an instance then run it by calling its `run()` method.
pub struct Session {
    sm: SessionStates,
    backends: Backends,
}
impl Session {
    /// The session event loop runs until the `Done` state is reached and its
    /// `should_exit` flag is set. At such point, the event loop terminates and
    /// returns an exit code indicating no errors when equal to **`0`**;
    /// otherwise **`1`**.
    pub fn run(&mut self) -> i8 {
        loop {
            self.sm = self.sm.step(&mut self.backends);
            if let SessionStates::Done(sm) = &self.sm {
                if sm.state.should_exit {
                    return if sm.state.error.is_some() { 1 } else { 0 };
                }
            }
        }
    }

    /// The error that aborted the session, once it has run.
    pub fn error(&self) -> Option<&DeployError> {
        match &self.sm {
            SessionStates::Done(sm) => sm.state.error.as_ref(),
            _ => None,
        }
    }
}

/// Factory function for the `bootdeploy` session state machine. Use it to get
/// an instance of the state machine, which you can run by invoking its `run()`
/// method.
pub fn factory(settings: Settings, backends: Backends) -> Session {
    Session {
        sm: SessionStates::Init(SessionSM::new(settings)),
        backends,
    }
}

// =============================================================================
// Private stuff
// =============================================================================

/// The raw state machine, holding the settings shared by all states and the
/// current state.
#[derive(Debug)]
struct SessionSM<S: Runnable> {
    settings: Settings,
    state: S,
}
impl<S: Runnable> SessionSM<S> {
    fn run(&mut self, backends: &mut Backends) -> Event {
        self.state.run(&self.settings, backends)
    }
}

/// The state machine starts in the `InitState`.
impl SessionSM<InitState> {
    fn new(settings: Settings) -> Self {
        SessionSM {
            settings,
            state: InitState {},
        }
    }
}

/// An enum wrapper around the states of the session state machine.
enum SessionStates {
    Init(SessionSM<InitState>),
    Deploy(SessionSM<DeployState>),
    Reboot(SessionSM<RebootState>),
    Done(SessionSM<DoneState>),
}
impl SessionStates {
    /// The unit of work in the state machine event loop. It runs the current
    /// state and turns the event it returns into the next state. State
    /// transitions from events are implemented using the rust `From`/`Into`
    /// pattern, so a transition without a `From` implementation does not
    /// compile.
    fn step(&mut self, backends: &mut Backends) -> Self {
        match self {
            SessionStates::Init(sm) => {
                let event = sm.run(backends);
                match event {
                    Event::Deploy(ev) => SessionStates::Deploy(ev.into()),
                    Event::Done(ev) => SessionStates::Done(ev.into()),
                    _ => unreachable!("illegal event {:#?} at current state {:#?}", event, sm),
                }
            }
            SessionStates::Deploy(sm) => {
                let event = sm.run(backends);
                match event {
                    Event::Reboot(ev) => SessionStates::Reboot(ev.into()),
                    Event::Done(ev) => SessionStates::Done(ev.into()),
                    _ => unreachable!("illegal event {:#?} at current state {:#?}", event, sm),
                }
            }
            SessionStates::Reboot(sm) => {
                let event = sm.run(backends);
                match event {
                    Event::Done(ev) => SessionStates::Done(ev.into()),
                    _ => unreachable!("illegal event {:#?} at current state {:#?}", event, sm),
                }
            }
            SessionStates::Done(sm) => {
                let event = sm.run(backends);
                match event {
                    Event::Exit(ev) => SessionStates::Done(ev.into()),
                    _ => unreachable!("illegal event {:#?} at current state {:#?}", event, sm),
                }
            }
        }
    }
}

// -----------------------------------------------------------------------------
// State from Event transitions
// -----------------------------------------------------------------------------

impl From<DeployEvent> for SessionSM<DeployState> {
    fn from(event: DeployEvent) -> SessionSM<DeployState> {
        SessionSM {
            settings: event.settings,
            state: DeployState {},
        }
    }
}

impl From<RebootEvent> for SessionSM<RebootState> {
    fn from(event: RebootEvent) -> SessionSM<RebootState> {
        SessionSM {
            settings: event.settings,
            state: RebootState {
                copied: event.copied,
            },
        }
    }
}

impl From<DoneEvent> for SessionSM<DoneState> {
    fn from(event: DoneEvent) -> SessionSM<DoneState> {
        SessionSM {
            settings: event.settings,
            state: DoneState {
                error: event.error,
                should_exit: false,
            },
        }
    }
}
impl From<ExitEvent> for SessionSM<DoneState> {
    fn from(event: ExitEvent) -> SessionSM<DoneState> {
        SessionSM {
            settings: event.settings,
            state: DoneState {
                error: event.error,
                should_exit: true,
            },
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use super::*;
    use crate::testing::{Journal, Step};
    use crate::{ImageSpec, SettingsBuilder, Variant};

    fn backends(journal: &Journal) -> Backends {
        Backends {
            copier: Box::new(journal.copier()),
            opener: Box::new(journal.opener()),
            delay: Box::new(journal.delay()),
        }
    }

    fn single_image() -> SettingsBuilder {
        SettingsBuilder::new()
            .images(vec![ImageSpec::new("app.bin", Duration::ZERO)])
            .destination("/mnt/VOL")
            .path("/dev/ttyACM0")
    }

    #[test]
    fn deploys_then_reboots() {
        let journal = Journal::default();
        let mut session = factory(single_image().finalize(), backends(&journal));

        assert_eq!(session.run(), 0);
        assert!(session.error().is_none());

        let steps = journal.steps();
        assert_eq!(
            steps[0],
            Step::Copy(PathBuf::from("app.bin"), PathBuf::from("/mnt/VOL"))
        );
        assert_eq!(steps[1], Step::Open("/dev/ttyACM0".into()));
        assert_eq!(journal.writes().concat(), b"reboot\n");
        assert_eq!(journal.writes().len(), 7);
    }

    #[test]
    fn copy_failure_never_opens_the_port() {
        let journal = Journal::default();
        journal.fail_copy_of("app.bin");
        let mut session = factory(single_image().finalize(), backends(&journal));

        assert_eq!(session.run(), 1);
        assert!(matches!(session.error(), Some(DeployError::Copy { .. })));
        assert!(session.error().unwrap().to_string().contains("app.bin"));
        assert!(!journal
            .steps()
            .iter()
            .any(|step| matches!(step, Step::Open(_) | Step::Write(_))));
    }

    #[test]
    fn dual_variant_second_image_failure_keeps_bootloader() {
        let journal = Journal::default();
        journal.fail_copy_of("build/bin/tfm_s_ns_signed.bin");
        let settings = SettingsBuilder::new()
            .variant(Variant::Dual)
            .path("/dev/ttyACM0")
            .finalize();
        let mut session = factory(settings, backends(&journal));

        assert_eq!(session.run(), 1);
        match session.error() {
            Some(DeployError::Copy { path, .. }) => {
                assert_eq!(path, &PathBuf::from("build/bin/tfm_s_ns_signed.bin"))
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        let copies = journal
            .steps()
            .into_iter()
            .filter(|step| matches!(step, Step::Copy(..)))
            .count();
        assert_eq!(copies, 2);
        assert!(journal.writes().is_empty());
    }

    #[test]
    fn port_open_failure_exits_with_error() {
        let journal = Journal::default();
        journal.fail_open();
        let mut session = factory(single_image().finalize(), backends(&journal));

        assert_eq!(session.run(), 1);
        match session.error() {
            Some(DeployError::PortOpen { port, .. }) => assert_eq!(port, "/dev/ttyACM0"),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(journal.writes().is_empty());
    }

    #[test]
    fn write_failure_exits_with_error() {
        let journal = Journal::default();
        journal.fail_write_at(0);
        let mut session = factory(single_image().finalize(), backends(&journal));

        assert_eq!(session.run(), 1);
        assert!(matches!(
            session.error(),
            Some(DeployError::PortWrite { offset: 0, .. })
        ));
    }

    #[test]
    fn missing_port_copies_nothing() {
        let journal = Journal::default();
        let settings = SettingsBuilder::new().finalize();
        let mut session = factory(settings, backends(&journal));

        assert_eq!(session.run(), 1);
        assert!(matches!(session.error(), Some(DeployError::NoPort)));
        assert!(journal.steps().is_empty());
    }
}
