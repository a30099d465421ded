//! Zip packaging of a staging directory and read-only access for restore.
//!
//! Members are flat, named by their path relative to the staging root with
//! `/` separators. Only regular files are stored.

use std::{
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::{result::ZipError, write::SimpleFileOptions, CompressionMethod, ZipArchive, ZipWriter};

use crate::{Error, Result};

/// Pack every regular file under `src` into a deflated zip at `dst`.
///
/// The archive is written under a temporary name beside `dst` and renamed into
/// place once complete. Returns the number of members written.
pub fn pack_dir(src: &Path, dst: &Path) -> Result<usize> {
    let parent = dst
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let tmp = tempfile::Builder::new()
        .prefix(".archive-")
        .suffix(".zip.in_progress")
        .tempfile_in(parent)?;

    let mut zip = ZipWriter::new(tmp.reopen()?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut written = 0usize;

    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry.map_err(|err| Error::Io(io::Error::from(err)))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = member_name(src, entry.path())?;
        zip.start_file(name.as_str(), options)
            .map_err(Error::from)?;
        let mut input = File::open(entry.path())?;
        io::copy(&mut input, &mut zip)?;
        debug!(member = %name, "archived");
        written += 1;
    }

    zip.finish().map_err(Error::from)?.sync_all()?;
    persist(tmp, dst)?;
    Ok(written)
}

fn persist(tmp: NamedTempFile, dst: &Path) -> Result<()> {
    tmp.persist(dst).map_err(|err| Error::Io(err.error))?;
    Ok(())
}

fn member_name(root: &Path, path: &Path) -> Result<String> {
    let rel = path
        .strip_prefix(root)
        .map_err(|_| {
            Error::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is outside {}", path.display(), root.display()),
            ))
        })?;
    Ok(rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/"))
}

/// An archive opened for restore.
pub struct BackupArchive {
    path: PathBuf,
    zip: ZipArchive<File>,
}

impl std::fmt::Debug for BackupArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackupArchive")
            .field("path", &self.path)
            .field("members", &self.zip.len())
            .finish()
    }
}

impl BackupArchive {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let zip = ZipArchive::new(file).map_err(Error::from)?;
        Ok(Self {
            path: path.to_path_buf(),
            zip,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Member names in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.zip.file_names().map(String::from).collect();
        names.sort();
        names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.zip.file_names().any(|n| n == name)
    }

    /// Stream member `name` into `out`.
    pub fn copy_entry<W: Write + ?Sized>(&mut self, name: &str, out: &mut W) -> Result<u64> {
        let mut member = match self.zip.by_name(name) {
            Ok(member) => member,
            Err(ZipError::FileNotFound) => {
                return Err(Error::MissingEntry(name.to_string()).into())
            }
            Err(err) => return Err(Error::Archive(err).into()),
        };
        Ok(io::copy(&mut member, out)?)
    }

    pub fn read_entry(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.copy_entry(name, &mut buf)?;
        Ok(buf)
    }

    /// Overwrite `dest` with member `name`.
    pub fn write_entry_to(&mut self, name: &str, dest: &Path) -> Result<()> {
        let data = self.read_entry(name)?;
        fs::write(dest, data)?;
        Ok(())
    }

    /// Extract every member whose name starts with `prefix` under `dest`,
    /// recreating relative paths. Returns the number of files written.
    pub fn extract_prefix(&mut self, prefix: &str, dest: &Path) -> Result<usize> {
        let mut extracted = 0usize;
        for index in 0..self.zip.len() {
            let mut member = self.zip.by_index(index).map_err(Error::from)?;
            if !member.name().starts_with(prefix) {
                continue;
            }
            let Some(rel) = member.enclosed_name() else {
                warn!(member = member.name(), "skipping member with unsafe path");
                continue;
            };
            let target = dest.join(rel);
            if member.is_dir() {
                fs::create_dir_all(&target)?;
                continue;
            }
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = File::create(&target)?;
            io::copy(&mut member, &mut out)?;
            extracted += 1;
        }
        Ok(extracted)
    }
}
