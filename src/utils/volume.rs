//! Copying image files onto the board volume.

use std::fs::{self, File, FileTimes, Metadata};
use std::io::{self, prelude::*};
use std::path::{Path, PathBuf};

use filetime::FileTime;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, trace, warn};

//==============================================================================
// Public Interface
//==============================================================================

/// Copies one image file to a destination.
pub trait ImageCopier {
    /// Copies `source` to `destination` and returns the path actually
    /// written. When `destination` is a directory the file keeps its name
    /// inside it; otherwise `destination` is the target file itself.
    fn copy(&mut self, source: &Path, destination: &Path) -> io::Result<PathBuf>;
}

/// Copies image files on the local filesystem, the way `cp -P --preserve`
/// would: symbolic links are copied as links, never followed, and the copy
/// gets the permissions and timestamps of the original.
#[derive(Debug, Default, Clone)]
pub struct FsCopier {
    /// Display a progress bar for every file being copied.
    pub progress: bool,
}
impl FsCopier {
    pub fn new(progress: bool) -> Self {
        FsCopier { progress }
    }
}
impl ImageCopier for FsCopier {
    fn copy(&mut self, source: &Path, destination: &Path) -> io::Result<PathBuf> {
        let target = target_path(source, destination)?;
        let metadata = fs::symlink_metadata(source)?;

        if metadata.file_type().is_symlink() {
            debug!("`{}` is a symbolic link, copying the link", source.display());
            clear_target(&target, true)?;
            copy_link(source, &target, &metadata)?;
        } else {
            clear_target(&target, false)?;
            self.copy_file(source, &target, &metadata)?;
        }

        Ok(target)
    }
}

//==============================================================================
// Private stuff
//==============================================================================

const CHUNK_SIZE: usize = 64 * 1024;

impl FsCopier {
    fn copy_file(&self, source: &Path, target: &Path, metadata: &Metadata) -> io::Result<u64> {
        let mut input = File::open(source)?;
        let mut output = File::create(target)?;

        let size = metadata.len();
        let pb = if self.progress {
            ProgressBar::new(size)
        } else {
            ProgressBar::hidden()
        };
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "[BD] 💾 Copying [{elapsed_precise}] [{bar:40.cyan/blue}] \
                     {bytes}/{total_bytes} {msg}",
                )
                .progress_chars("=>-"),
        );
        pb.set_message(file_name(source));

        let mut chunk: Vec<u8> = vec![0; CHUNK_SIZE];
        let mut written: u64 = 0;
        loop {
            let bytes_in = input.read(&mut chunk)?;
            if bytes_in == 0 {
                break;
            }
            output.write_all(&chunk[..bytes_in])?;
            written += bytes_in as u64;
            trace!("{} bytes written to `{}`", written, target.display());
            pb.set_position(written);
        }
        output.flush()?;

        let times = FileTimes::new()
            .set_accessed(metadata.accessed()?)
            .set_modified(metadata.modified()?);
        output.set_times(times)?;
        drop(output);

        // FAT volumes have no notion of unix modes, losing them is not worth
        // failing the deployment.
        if let Err(e) = fs::set_permissions(target, metadata.permissions()) {
            warn!(
                "could not preserve permissions on `{}`: {}",
                target.display(),
                e
            );
        }

        pb.finish_with_message(format!("{} copied", file_name(source)));
        debug!(
            "copied {} bytes from `{}` to `{}`",
            written,
            source.display(),
            target.display()
        );
        Ok(written)
    }
}

fn target_path(source: &Path, destination: &Path) -> io::Result<PathBuf> {
    if destination.is_dir() {
        match source.file_name() {
            Some(name) => Ok(destination.join(name)),
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "source path has no file name",
            )),
        }
    } else {
        Ok(destination.to_path_buf())
    }
}

/// Removes a symbolic link sitting at `target` so it gets replaced instead of
/// written through. With `any_file`, a regular file is removed as well.
fn clear_target(target: &Path, any_file: bool) -> io::Result<()> {
    match fs::symlink_metadata(target) {
        Ok(m) if m.file_type().is_symlink() || (any_file && m.is_file()) => {
            trace!("removing existing `{}`", target.display());
            fs::remove_file(target)
        }
        _ => Ok(()),
    }
}

/// Recreates the link at `target`, pointing where `source` points, with the
/// timestamps of the link itself.
#[cfg(unix)]
fn copy_link(source: &Path, target: &Path, metadata: &Metadata) -> io::Result<()> {
    let link = fs::read_link(source)?;
    std::os::unix::fs::symlink(link, target)?;
    filetime::set_symlink_file_times(
        target,
        FileTime::from_last_access_time(metadata),
        FileTime::from_last_modification_time(metadata),
    )
}

#[cfg(not(unix))]
fn copy_link(_source: &Path, _target: &Path, _metadata: &Metadata) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Other,
        "symbolic links cannot be copied on this platform",
    ))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// =============================================================================
// Unit Tests
// =============================================================================
