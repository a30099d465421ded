//! Filesystem helpers shared by the resources.
//!
//! Staging writes go to an in-progress name inside the staging directory and
//! are renamed to their final name only once complete.

use std::{
    ffi::CString,
    fs::{self, File},
    io,
    os::unix::fs::chown,
    path::{Path, PathBuf},
};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::{Error, Result};

/// Produce `staging/<final_name>` by letting `fill` write an in-progress file.
pub fn stage_file<F>(staging: &Path, prefix: &str, final_name: &str, fill: F) -> Result<PathBuf>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    let mut tmp = tempfile::Builder::new()
        .prefix(prefix)
        .suffix(".backup.in_progress")
        .tempfile_in(staging)?;
    fill(tmp.as_file_mut())?;
    tmp.as_file().sync_all()?;

    let result = staging.join(final_name);
    tmp.persist(&result).map_err(|err| Error::Io(err.error))?;
    Ok(result)
}

/// Stage a copy of the regular file `src` as `staging/<final_name>`.
pub fn stage_copy(staging: &Path, src: &Path, prefix: &str, final_name: &str) -> Result<PathBuf> {
    stage_file(staging, prefix, final_name, |out| {
        let mut input = File::open(src)?;
        io::copy(&mut input, out)?;
        Ok(())
    })
}

/// Produce the directory `staging/<final_name>` by letting `fill` populate an
/// in-progress directory. A failure leaves nothing behind.
pub fn stage_dir<F>(staging: &Path, prefix: &str, final_name: &str, fill: F) -> Result<PathBuf>
where
    F: FnOnce(&Path) -> Result<()>,
{
    let tmp = tempfile::Builder::new()
        .prefix(prefix)
        .suffix("-inprogress")
        .tempdir_in(staging)?;
    fill(tmp.path())?;

    let result = staging.join(final_name);
    fs::rename(tmp.path(), &result)?;
    // The in-progress path is gone; dropping `tmp` finds nothing to remove.
    drop(tmp);
    Ok(result)
}

/// Copy every regular file directly inside `src` into the directory `dst`.
/// Symlinks to regular files are copied by content.
pub fn copy_dir_files(src: &Path, dst: &Path) -> Result<usize> {
    let mut copied = 0usize;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let path = entry.path();
        let is_file = fs::metadata(&path).map(|m| m.is_file()).unwrap_or(false);
        if !is_file {
            warn!(path = %path.display(), "skipping non-regular entry");
            continue;
        }
        fs::copy(&path, dst.join(entry.file_name()))?;
        copied += 1;
    }
    Ok(copied)
}

/// Recursively copy `src` into `dst`, creating directories as needed and
/// overwriting files that already exist. Symlinks are followed.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<usize> {
    let mut copied = 0usize;
    for entry in WalkDir::new(src).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|err| Error::Io(io::Error::from(err)))?;
        let rel = entry.path().strip_prefix(src).map_err(|_| {
            Error::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} escaped {}", entry.path().display(), src.display()),
            ))
        })?;
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &target)?;
            copied += 1;
        } else {
            warn!(path = %entry.path().display(), "skipping non-regular entry");
        }
    }
    Ok(copied)
}

/// Remove a directory tree, treating an absent tree as already removed.
pub fn remove_tree_if_present(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => {
            debug!(path = %path.display(), "removed");
            Ok(())
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(Error::Io(err).into()),
    }
}

/// Resolve an account name to `(uid, gid)`. The gid is that of the group with
/// the same name, falling back to the account's primary group.
pub fn lookup_account(name: &str) -> Result<(u32, u32)> {
    let c_name = CString::new(name).map_err(|_| Error::UnknownAccount(name.to_string()))?;

    let (uid, primary_gid) = {
        let pw = unsafe { libc::getpwnam(c_name.as_ptr()) };
        if pw.is_null() {
            return Err(Error::UnknownAccount(name.to_string()).into());
        }
        unsafe { ((*pw).pw_uid, (*pw).pw_gid) }
    };

    let gr = unsafe { libc::getgrnam(c_name.as_ptr()) };
    let gid = if gr.is_null() {
        primary_gid
    } else {
        unsafe { (*gr).gr_gid }
    };

    Ok((uid, gid))
}

/// Hand `root` and everything below it to `owner`.
pub fn chown_tree(root: &Path, owner: &str) -> Result<()> {
    let (uid, gid) = lookup_account(owner)?;
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|err| Error::Io(io::Error::from(err)))?;
        chown(entry.path(), Some(uid), Some(gid))?;
    }
    debug!(path = %root.display(), owner, "ownership reassigned");
    Ok(())
}
