//! In-memory stand-ins for the volume, the serial console and the clock. They
//! all record what they are asked to do into a shared [`Journal`].

use std::cell::RefCell;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use crate::utils::{ByteSink, Delay, ImageCopier, PortOpener};
use crate::Settings;

#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) enum Step {
    Copy(PathBuf, PathBuf),
    Pause(Duration),
    Open(String),
    Write(Vec<u8>),
}

#[derive(Default)]
struct Inner {
    steps: Vec<Step>,
    fail_copy: Option<PathBuf>,
    fail_open: bool,
    fail_write_at: Option<usize>,
    writes: usize,
}

#[derive(Default, Clone)]
pub(crate) struct Journal {
    inner: Rc<RefCell<Inner>>,
}
impl Journal {
    pub fn steps(&self) -> Vec<Step> {
        self.inner.borrow().steps.clone()
    }

    /// Bytes written to the console, one entry per write.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.steps()
            .into_iter()
            .filter_map(|step| match step {
                Step::Write(bytes) => Some(bytes),
                _ => None,
            })
            .collect()
    }

    pub fn fail_copy_of(&self, source: impl Into<PathBuf>) {
        self.inner.borrow_mut().fail_copy = Some(source.into());
    }

    pub fn fail_open(&self) {
        self.inner.borrow_mut().fail_open = true;
    }

    pub fn fail_write_at(&self, index: usize) {
        self.inner.borrow_mut().fail_write_at = Some(index);
    }

    pub fn copier(&self) -> FakeCopier {
        FakeCopier(self.clone())
    }

    pub fn opener(&self) -> FakeOpener {
        FakeOpener(self.clone())
    }

    pub fn delay(&self) -> FakeDelay {
        FakeDelay(self.clone())
    }

    fn record(&self, step: Step) {
        self.inner.borrow_mut().steps.push(step);
    }
}

pub(crate) struct FakeCopier(Journal);
impl ImageCopier for FakeCopier {
    fn copy(&mut self, source: &Path, destination: &Path) -> io::Result<PathBuf> {
        self.0
            .record(Step::Copy(source.to_path_buf(), destination.to_path_buf()));
        if self.0.inner.borrow().fail_copy.as_deref() == Some(source) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "device disconnected"));
        }
        Ok(destination.join(source.file_name().unwrap_or_default()))
    }
}

pub(crate) struct FakeDelay(Journal);
impl Delay for FakeDelay {
    fn pause(&mut self, duration: Duration) {
        self.0.record(Step::Pause(duration));
    }
}

pub(crate) struct FakeOpener(Journal);
impl PortOpener for FakeOpener {
    fn open(&mut self, settings: &Settings) -> Result<Box<dyn ByteSink>, serialport::Error> {
        if self.0.inner.borrow().fail_open {
            return Err(serialport::Error::new(
                serialport::ErrorKind::NoDevice,
                "no such device",
            ));
        }
        let name = settings.path.clone().unwrap_or_default();
        self.0.record(Step::Open(name.clone()));
        Ok(Box::new(FakeSink {
            name,
            journal: self.0.clone(),
        }))
    }
}

struct FakeSink {
    name: String,
    journal: Journal,
}
impl ByteSink for FakeSink {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        let failing = {
            let mut inner = self.journal.inner.borrow_mut();
            let index = inner.writes;
            inner.writes += 1;
            inner.fail_write_at == Some(index)
        };
        if failing {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"));
        }
        self.journal.record(Step::Write(bytes.to_vec()));
        Ok(())
    }
}
