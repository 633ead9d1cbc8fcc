//! Atomic publication of writer output.
//!
//! Output is written to a temporary file or directory next to the
//! destination and renamed into place once complete, so a failed
//! conversion never leaves partial output behind.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::{Builder, NamedTempFile};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::format::{Format, OverwritePolicy};
use crate::olx::Package;

/// File that marks a directory as an OLX package.
pub const PACKAGE_MARKER: &str = "course.xml";

/// How an existing package destination is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PackageTarget {
    Missing,
    EmptyDir,
    Package,
}

/// The directory a destination will be created in.
fn parent_dir(dest: &Path) -> &Path {
    match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Check that a single-file destination can be written.
pub fn check_file_destination(format: Format, dest: &Path, policy: OverwritePolicy) -> Result<()> {
    let Ok(meta) = fs::metadata(dest) else {
        return Ok(());
    };
    if meta.is_dir() {
        return Err(Error::format(
            format,
            format!("destination {} is a directory", dest.display()),
        ));
    }
    match policy {
        OverwritePolicy::Replace => Ok(()),
        OverwritePolicy::Refuse => Err(Error::format(
            format,
            format!("destination {} already exists", dest.display()),
        )),
    }
}

fn check_package_destination(dest: &Path, policy: OverwritePolicy) -> Result<PackageTarget> {
    let Ok(meta) = fs::metadata(dest) else {
        return Ok(PackageTarget::Missing);
    };
    if !meta.is_dir() {
        return Err(Error::format(
            Format::Olx,
            format!("destination {} is not a directory", dest.display()),
        ));
    }
    if fs::read_dir(dest)?.next().is_none() {
        return Ok(PackageTarget::EmptyDir);
    }
    if !dest.join(PACKAGE_MARKER).is_file() {
        return Err(Error::format(
            Format::Olx,
            format!(
                "destination {} is a non-empty directory without {PACKAGE_MARKER}",
                dest.display()
            ),
        ));
    }
    match policy {
        OverwritePolicy::Replace => Ok(PackageTarget::Package),
        OverwritePolicy::Refuse => Err(Error::format(
            Format::Olx,
            format!("destination {} already holds a package", dest.display()),
        )),
    }
}

/// Write a single file atomically.
pub fn publish_file(
    format: Format,
    dest: &Path,
    contents: &[u8],
    policy: OverwritePolicy,
) -> Result<()> {
    check_file_destination(format, dest, policy)?;
    let dir = parent_dir(dest);
    fs::create_dir_all(dir)?;

    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(contents)?;
    staged.as_file().sync_all()?;
    staged.persist(dest).map_err(|err| err.error)?;

    info!(path = %dest.display(), bytes = contents.len(), "published {format} file");
    Ok(())
}

/// Write a package directory atomically.
///
/// The package is staged in a sibling temporary directory. An existing
/// package is moved aside before the swap and removed after it.
pub fn publish_package(dest: &Path, package: &Package, policy: OverwritePolicy) -> Result<()> {
    let target = check_package_destination(dest, policy)?;
    let dir = parent_dir(dest);
    fs::create_dir_all(dir)?;

    let staged = Builder::new().prefix(".mu-").tempdir_in(dir)?;
    package.write_to(staged.path())?;
    debug!(path = %staged.path().display(), files = package.len(), "staged package");

    match target {
        PackageTarget::Missing => fs::rename(staged.path(), dest)?,
        PackageTarget::EmptyDir => {
            fs::remove_dir(dest)?;
            fs::rename(staged.path(), dest)?;
        }
        PackageTarget::Package => {
            let aside = Builder::new().prefix(".mu-old-").tempdir_in(dir)?;
            let old = aside.path().join("package");
            fs::rename(dest, &old)?;
            if let Err(err) = fs::rename(staged.path(), dest) {
                fs::rename(&old, dest)?;
                return Err(err.into());
            }
        }
    }

    info!(path = %dest.display(), files = package.len(), "published OLX package");
    Ok(())
}
