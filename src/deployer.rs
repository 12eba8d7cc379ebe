//! The image deployer: drops the firmware images on the board volume.

use std::path::PathBuf;
use std::time::Duration;

use console::style;
use log::{debug, info};

use crate::{
    error::DeployError,
    settings::Settings,
    utils::{Delay, ImageCopier},
};

/// Copies every image of `settings`, in order, to the destination and waits
/// for each image's settle pause once it has been copied.
///
/// The first failure stops the deployment. Images copied before it stay on
/// the volume. Returns the paths written on the volume.
pub fn deploy_images(
    settings: &Settings,
    copier: &mut dyn ImageCopier,
    delay: &mut dyn Delay,
) -> Result<Vec<PathBuf>, DeployError> {
    let mut copied = Vec::with_capacity(settings.images.len());

    for image in &settings.images {
        info!(
            "Copying `{}` to `{}`",
            image.source.display(),
            settings.destination.display()
        );
        let target = copier
            .copy(&image.source, &settings.destination)
            .map_err(|source| DeployError::Copy {
                path: image.source.clone(),
                destination: settings.destination.clone(),
                source,
            })?;
        println!(
            "[BD] 📦 {} -> {}",
            style(image.source.display()).cyan(),
            style(target.display()).green()
        );

        if image.settle > Duration::ZERO {
            debug!("letting the volume settle for {:?}", image.settle);
            delay.pause(image.settle);
        }
        copied.push(target);
    }

    Ok(copied)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::testing::{Journal, Step};
    use crate::{ImageSpec, SettingsBuilder, Variant};

    #[test]
    fn copies_single_image_without_pause() {
        let journal = Journal::default();
        let settings = SettingsBuilder::new()
            .images(vec![ImageSpec::new("app.bin", Duration::ZERO)])
            .destination("/mnt/VOL")
            .finalize();

        let copied = deploy_images(&settings, &mut journal.copier(), &mut journal.delay()).unwrap();

        assert_eq!(copied, vec![PathBuf::from("/mnt/VOL/app.bin")]);
        assert_eq!(
            journal.steps(),
            vec![Step::Copy(PathBuf::from("app.bin"), PathBuf::from("/mnt/VOL"))]
        );
    }

    #[test]
    fn dual_variant_settles_after_each_image() {
        let journal = Journal::default();
        let settings = SettingsBuilder::new()
            .variant(Variant::Dual)
            .destination("/mnt/VOL")
            .finalize();

        deploy_images(&settings, &mut journal.copier(), &mut journal.delay()).unwrap();

        assert_eq!(
            journal.steps(),
            vec![
                Step::Copy(PathBuf::from("build/bin/bl2.bin"), PathBuf::from("/mnt/VOL")),
                Step::Pause(Duration::from_millis(100)),
                Step::Copy(
                    PathBuf::from("build/bin/tfm_s_ns_signed.bin"),
                    PathBuf::from("/mnt/VOL")
                ),
                Step::Pause(Duration::from_secs(1)),
            ]
        );
    }

    #[test]
    fn failure_stops_at_failing_image() {
        let journal = Journal::default();
        journal.fail_copy_of("build/bin/tfm_s_ns_signed.bin");
        let settings = SettingsBuilder::new().variant(Variant::Dual).finalize();

        let err = deploy_images(&settings, &mut journal.copier(), &mut journal.delay()).unwrap_err();

        match err {
            DeployError::Copy {
                path, destination, ..
            } => {
                assert_eq!(path, Path::new("build/bin/tfm_s_ns_signed.bin"));
                assert_eq!(destination, Path::new("/media/V2M-MPS3/SOFTWARE"));
            }
            other => panic!("unexpected error {:?}", other),
        }
        // The bootloader went through, nothing is undone and no settle pause
        // follows the failed copy.
        assert_eq!(
            journal.steps(),
            vec![
                Step::Copy(
                    PathBuf::from("build/bin/bl2.bin"),
                    PathBuf::from("/media/V2M-MPS3/SOFTWARE")
                ),
                Step::Pause(Duration::from_millis(100)),
                Step::Copy(
                    PathBuf::from("build/bin/tfm_s_ns_signed.bin"),
                    PathBuf::from("/media/V2M-MPS3/SOFTWARE")
                ),
            ]
        );
    }
}
