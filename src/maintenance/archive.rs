//! Tar archive creation for backups
//!
//! - Standard tar format, no compression
//! - Deterministic entry ordering
//! - Leftover `*.tmp` files of interrupted writes are skipped
//! - fsync archive and its directory after creation

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Read};
use std::path::{Path, PathBuf};

use tar::{Archive, Builder, Header};

use super::errors::{MaintenanceError, MaintenanceResult};
use super::manifest::{BackupManifest, BACKUP_MANIFEST_FILE};

/// Writes `manifest` plus every file under `source_dir` (as `prefix/...`)
/// into a new archive at `output_path`.
///
/// Refuses to overwrite an existing archive. Returns the archive size.
pub(crate) fn create_tar_archive(
    source_dir: &Path,
    prefix: &str,
    manifest: &BackupManifest,
    mtime: u64,
    output_path: &Path,
) -> MaintenanceResult<u64> {
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(output_path)
        .map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => MaintenanceError::ArchiveExists(output_path.to_path_buf()),
            _ => MaintenanceError::io(output_path, e),
        })?;

    let mut builder = Builder::new(BufWriter::new(file));

    let manifest_json = manifest.to_json()?;
    let mut header = Header::new_gnu();
    header.set_size(manifest_json.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(mtime);
    header.set_cksum();
    builder
        .append_data(&mut header, BACKUP_MANIFEST_FILE, manifest_json.as_bytes())
        .map_err(|e| MaintenanceError::io(output_path, e))?;

    let mut entries = Vec::new();
    collect_entries(source_dir, prefix, &mut entries)?;
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    for (archive_path, fs_path) in entries {
        if fs_path.is_dir() {
            builder
                .append_dir(&archive_path, &fs_path)
                .map_err(|e| MaintenanceError::io(&fs_path, e))?;
        } else {
            let mut f = File::open(&fs_path).map_err(|e| MaintenanceError::io(&fs_path, e))?;
            builder
                .append_file(&archive_path, &mut f)
                .map_err(|e| MaintenanceError::io(&fs_path, e))?;
        }
    }

    let writer = builder
        .into_inner()
        .map_err(|e| MaintenanceError::io(output_path, e))?;
    let file = writer
        .into_inner()
        .map_err(|e| MaintenanceError::io(output_path, e.into_error()))?;
    file.sync_all()
        .map_err(|e| MaintenanceError::io(output_path, e))?;

    if let Some(parent) = output_path.parent() {
        fsync_dir(parent)?;
    }

    let size = file
        .metadata()
        .map_err(|e| MaintenanceError::io(output_path, e))?
        .len();
    Ok(size)
}

/// Reads the manifest back out of an archive.
pub fn read_archive_manifest(archive_path: &Path) -> MaintenanceResult<BackupManifest> {
    let file = File::open(archive_path).map_err(|e| MaintenanceError::io(archive_path, e))?;
    let mut archive = Archive::new(file);

    let entries = archive
        .entries()
        .map_err(|e| MaintenanceError::io(archive_path, e))?;
    for entry in entries {
        let mut entry = entry.map_err(|e| MaintenanceError::io(archive_path, e))?;
        let is_manifest = entry
            .path()
            .map(|p| &*p == Path::new(BACKUP_MANIFEST_FILE))
            .unwrap_or(false);
        if is_manifest {
            let mut json = String::new();
            entry
                .read_to_string(&mut json)
                .map_err(|e| MaintenanceError::io(archive_path, e))?;
            return BackupManifest::from_json(&json);
        }
    }

    Err(MaintenanceError::Manifest(format!(
        "{} has no {}",
        archive_path.display(),
        BACKUP_MANIFEST_FILE
    )))
}

/// Deletes a partial archive if it exists
pub(crate) fn cleanup_partial_archive(archive_path: &Path) {
    if archive_path.exists() {
        let _ = fs::remove_file(archive_path);
    }
}

fn collect_entries(
    current_dir: &Path,
    prefix: &str,
    entries: &mut Vec<(String, PathBuf)>,
) -> MaintenanceResult<()> {
    let dir_entries = fs::read_dir(current_dir)
        .map_err(|e| MaintenanceError::io(current_dir, e))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| MaintenanceError::io(current_dir, e))?;

    for entry in dir_entries {
        let fs_path = entry.path();
        let file_name = entry.file_name().to_string_lossy().into_owned();
        if file_name.ends_with(".tmp") {
            continue;
        }

        let archive_path = format!("{}/{}", prefix, file_name);
        entries.push((archive_path.clone(), fs_path.clone()));

        if fs_path.is_dir() {
            collect_entries(&fs_path, &archive_path, entries)?;
        }
    }

    Ok(())
}

fn fsync_dir(path: &Path) -> MaintenanceResult<()> {
    let dir = OpenOptions::new()
        .read(true)
        .open(path)
        .map_err(|e| MaintenanceError::io(path, e))?;
    dir.sync_all().map_err(|e| MaintenanceError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::io::Write;
    use tempfile::TempDir;

    fn source(tmp: &TempDir) -> PathBuf {
        let dir = tmp.path().join("CostaDelInkaDB");
        fs::create_dir_all(dir.join("Pagos")).unwrap();
        let mut f = File::create(dir.join("Pagos").join("documents.json")).unwrap();
        f.write_all(b"[]").unwrap();
        let mut f = File::create(dir.join("Pagos").join("collection.json")).unwrap();
        f.write_all(b"{}").unwrap();
        File::create(dir.join("Pagos").join("documents.json.tmp")).unwrap();
        dir
    }

    fn manifest() -> BackupManifest {
        BackupManifest::new("CostaDelInkaDB", vec!["Pagos".into()], Utc::now())
    }

    fn entry_names(path: &Path) -> Vec<String> {
        let mut archive = Archive::new(File::open(path).unwrap());
        archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_archive_layout() {
        let tmp = TempDir::new().unwrap();
        let src = source(&tmp);
        let out = tmp.path().join("backup.tar");

        let size = create_tar_archive(&src, "CostaDelInkaDB", &manifest(), 0, &out).unwrap();
        assert!(size > 0);

        let names = entry_names(&out);
        assert_eq!(names[0], BACKUP_MANIFEST_FILE);
        assert!(names.contains(&"CostaDelInkaDB/Pagos/documents.json".to_string()));
        assert!(names.contains(&"CostaDelInkaDB/Pagos/collection.json".to_string()));
        assert!(!names.iter().any(|n| n.ends_with(".tmp")));
    }

    #[test]
    fn test_manifest_read_back() {
        let tmp = TempDir::new().unwrap();
        let src = source(&tmp);
        let out = tmp.path().join("backup.tar");
        let m = manifest();
        create_tar_archive(&src, "CostaDelInkaDB", &m, 0, &out).unwrap();
        assert_eq!(read_archive_manifest(&out).unwrap(), m);
    }

    #[test]
    fn test_existing_archive_not_overwritten() {
        let tmp = TempDir::new().unwrap();
        let src = source(&tmp);
        let out = tmp.path().join("backup.tar");
        fs::write(&out, b"older").unwrap();

        let result = create_tar_archive(&src, "CostaDelInkaDB", &manifest(), 0, &out);
        assert!(matches!(result, Err(MaintenanceError::ArchiveExists(_))));
        assert_eq!(fs::read(&out).unwrap(), b"older");
    }

    #[test]
    fn test_cleanup_partial_archive() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("partial.tar");
        fs::write(&out, b"partial").unwrap();
        cleanup_partial_archive(&out);
        assert!(!out.exists());
        // Missing file is fine
        cleanup_partial_archive(&out);
    }
}
