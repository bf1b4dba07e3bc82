//! Subtree extraction from zip archives
//!
//! The template archive contains one subtree per template id under a
//! `templates/` root. Extraction selects only the entries below the
//! requested subtree, strips the prefix, and materializes the rest
//! into the destination directory. The archive is scanned before any
//! write so a misconfigured template id never leaves a partial tree
//! behind.

use crate::error::{Error, Result};
use camino::Utf8Path;
use std::fs;
use std::io::Cursor;
use tracing::debug;
use zip::ZipArchive;

/// Extract the entries under `subtree` from `buffer` into `dest`.
///
/// The buffer is consumed; exactly one extraction owns it per pipeline
/// run. `dest` is expected to be a fresh (or empty) directory owned by
/// the caller; merging into a populated one is not supported.
///
/// # Errors
/// `Error::Extraction` for every failure mode: an unreadable archive,
/// no entry matching the subtree, an unsafe entry path, or a failed
/// write (disk full, permission denied).
pub fn extract_subtree(subtree: &str, buffer: Vec<u8>, dest: &Utf8Path) -> Result<()> {
    let prefix = format!("{}/", subtree.trim_matches('/'));
    let mut archive = ZipArchive::new(Cursor::new(buffer))
        .map_err(|source| Error::extraction(format!("unreadable archive: {source}")))?;

    // scan first: fail on an empty selection before touching the disk
    let mut selected = Vec::new();
    for index in 0..archive.len() {
        let entry = read_entry(&mut archive, index)?;
        if entry.name().starts_with(&prefix) {
            if entry.enclosed_name().is_none() {
                return Err(Error::extraction(format!(
                    "unsafe path in archive: {}",
                    entry.name()
                )));
            }
            selected.push(index);
        }
    }

    if selected.is_empty() {
        return Err(Error::extraction(format!(
            "no entries under '{}' in the archive",
            subtree
        )));
    }

    debug!(
        "extracting {} entries under '{}' to {}",
        selected.len(),
        subtree,
        dest
    );

    for index in selected {
        let mut entry = read_entry(&mut archive, index)?;
        let relative = &entry.name()[prefix.len()..];
        if relative.is_empty() {
            // the subtree's own directory entry
            create_dir(dest)?;
            continue;
        }

        let target = dest.join(relative);
        if entry.is_dir() {
            create_dir(&target)?;
            continue;
        }

        if let Some(parent) = target.parent() {
            create_dir(parent)?;
        }
        let mut file = fs::File::create(&target)
            .map_err(|source| Error::extraction(format!("cannot create {target}: {source}")))?;
        std::io::copy(&mut entry, &mut file)
            .map_err(|source| Error::extraction(format!("cannot write {target}: {source}")))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&target, fs::Permissions::from_mode(mode)).map_err(|source| {
                Error::extraction(format!("cannot set permissions on {target}: {source}"))
            })?;
        }
    }

    Ok(())
}

fn read_entry<'a>(
    archive: &'a mut ZipArchive<Cursor<Vec<u8>>>,
    index: usize,
) -> Result<zip::read::ZipFile<'a>> {
    archive
        .by_index(index)
        .map_err(|source| Error::extraction(format!("unreadable archive entry: {source}")))
}

fn create_dir(path: &Utf8Path) -> Result<()> {
    fs::create_dir_all(path)
        .map_err(|source| Error::extraction(format!("cannot create directory {path}: {source}")))
}
