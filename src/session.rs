//! A `bootdeploy` run: deploy the images, then reboot the board.
//!
//! **Example** - Executing the session state machine event loop:
//! ```no_run
//! use bootdeploy::{self as bd, Backends};
//!
//! let settings = bd::SettingsBuilder::new().path("/dev/ttyACM0").finalize();
//! let backends = Backends::system(&settings);
//! let mut session = bd::factory(settings, backends);
//! let status = session.run(); // status code returned after the `Exit` event
//! std::process::exit(status.into());
//! ```

mod events;
mod state_machine;
mod states;

pub use state_machine::{factory, Backends, Session};
