//! # Workbook File I/O
//!
//! Reads and writes `.vqf` workbook files with the safety a shared sales
//! drive needs: saves are atomic (a half-written workbook can never replace
//! a good one), loads check the schema version, and an advisory edit lock
//! keeps two preparers from clobbering each other's quote revisions.
//!
//! ## Edit locks
//!
//! The lock is a `.vqf.lock` sidecar next to the workbook, holding who is
//! editing which quotation ([`EditLockInfo`]: preparer, quote reference,
//! machine, process), backed by an OS-level lock on the sidecar itself.
//! A lock left behind by a crashed session is taken over once the process
//! is gone or the lock has aged out, and a preparer re-opening their own
//! workbook on the same machine is never locked out by their earlier
//! session.
//!
//! ## Example
//!
//! ```rust,no_run
//! use quote_core::file_io::{save_workbook, load_workbook_with_lock_check, FileLock};
//! use quote_core::workbook::QuoteWorkbook;
//! use std::path::Path;
//!
//! let path = Path::new("acme.vqf");
//!
//! // See who, if anyone, is editing before opening
//! let (mut workbook, holder) = load_workbook_with_lock_check(path).unwrap();
//! assert!(holder.is_none());
//!
//! // Take the edit lock for this preparer, then save
//! let lock = FileLock::acquire(path, &workbook.meta).unwrap();
//! workbook.touch();
//! save_workbook(&workbook, path).unwrap();
//!
//! // Lock is released when dropped
//! drop(lock);
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::errors::{QuoteError, QuoteResult};
use crate::workbook::{QuoteWorkbook, WorkbookMetadata, SCHEMA_VERSION};

/// Hours after which an edit lock counts as abandoned
const STALE_LOCK_HOURS: i64 = 24;

/// Sidecar metadata describing an active editing session on a workbook.
///
/// Written as JSON to the `.vqf.lock` file so other preparers can see who
/// holds the workbook and which quotation they are working on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditLockInfo {
    /// Preparer identity, taken from the workbook metadata
    pub prepared_by: String,
    /// Quote reference being edited
    pub quote_ref: String,
    /// Machine name where the session started
    pub machine: String,
    /// Process ID of the editing session
    pub pid: u32,
    /// When the session took the lock
    pub locked_at: DateTime<Utc>,
}

impl EditLockInfo {
    /// Describe the current process editing the given workbook.
    pub fn for_session(meta: &WorkbookMetadata) -> Self {
        EditLockInfo {
            prepared_by: meta.prepared_by.clone(),
            quote_ref: meta.quote_ref.clone(),
            machine: machine_name(),
            pid: std::process::id(),
            locked_at: Utc::now(),
        }
    }

    fn read_from(lock_path: &Path) -> QuoteResult<Self> {
        let contents = fs::read_to_string(lock_path).map_err(|e| {
            QuoteError::file_error("read lock", lock_path.display().to_string(), e.to_string())
        })?;
        serde_json::from_str(&contents).map_err(|e| QuoteError::SerializationError {
            reason: e.to_string(),
        })
    }

    /// Whether the session that wrote this lock is gone: its process has
    /// exited on this machine, or the lock has aged past
    /// [`STALE_LOCK_HOURS`] (covers crashes on other machines, where the
    /// process cannot be checked).
    fn is_abandoned(&self) -> bool {
        if self.machine == machine_name() && !process_alive(self.pid) {
            return true;
        }
        (Utc::now() - self.locked_at).num_hours() > STALE_LOCK_HOURS
    }

    /// Whether this lock was taken by the same preparer on this machine.
    /// Such a lock is a leftover of our own earlier session and may be
    /// taken over instead of locking the preparer out of their own work.
    fn same_preparer_here(&self, meta: &WorkbookMetadata) -> bool {
        self.prepared_by == meta.prepared_by && self.machine == machine_name()
    }
}

fn machine_name() -> String {
    #[cfg(windows)]
    let name = std::env::var("COMPUTERNAME").ok();
    #[cfg(not(windows))]
    let name = std::env::var("HOSTNAME")
        .ok()
        .or_else(|| std::env::var("HOST").ok());

    name.unwrap_or_else(|| "unknown".to_string())
}

#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    Path::new(&format!("/proc/{}", pid)).exists()
}

#[cfg(windows)]
fn process_alive(pid: u32) -> bool {
    use std::process::Command;
    match Command::new("tasklist")
        .args(["/FI", &format!("PID eq {}", pid), "/NH"])
        .output()
    {
        Ok(output) => String::from_utf8_lossy(&output.stdout).contains(&pid.to_string()),
        // If we cannot ask, assume the session is still live
        Err(_) => true,
    }
}

/// Edit-lock guard for a workbook file. Releases the lock when dropped.
///
/// Combines an OS-level exclusive lock on the sidecar (process safety) with
/// the [`EditLockInfo`] JSON inside it (so other preparers see a name, not
/// just a locked file).
#[derive(Debug)]
pub struct FileLock {
    /// Path to the workbook being edited
    workbook_path: PathBuf,
    /// Path to the lock sidecar
    lock_path: PathBuf,
    /// Open handle holding the OS-level lock
    _lock_file: File,
    /// The session recorded in the sidecar
    pub info: EditLockInfo,
}

impl FileLock {
    /// Take the edit lock on a workbook before saving changes.
    ///
    /// A live lock held by a different preparer fails with
    /// [`QuoteError::FileLocked`], naming the holder and when they started.
    /// An abandoned lock, or one left by the same preparer on this machine,
    /// is taken over.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the .vqf workbook file
    /// * `meta` - Workbook metadata identifying the preparer and quote
    pub fn acquire(path: &Path, meta: &WorkbookMetadata) -> QuoteResult<Self> {
        let lock_path = lock_path_for(path);

        // A readable sidecar means someone may still be editing
        if lock_path.exists() {
            if let Ok(existing) = EditLockInfo::read_from(&lock_path) {
                if !existing.is_abandoned() && !existing.same_preparer_here(meta) {
                    return Err(QuoteError::file_locked(
                        path.display().to_string(),
                        format!("{} ({})", existing.prepared_by, existing.machine),
                        existing.locked_at.to_rfc3339(),
                    ));
                }
                // Abandoned session, or our own earlier one: take it over
            }
        }

        let info = EditLockInfo::for_session(meta);

        let mut lock_file = OpenOptions::new()
            .write(true)
            .read(true)
            .create(true)
            .truncate(true)
            .open(&lock_path)
            .map_err(|e| {
                QuoteError::file_error("create lock", lock_path.display().to_string(), e.to_string())
            })?;

        // Non-blocking OS-level lock; losing this race means another
        // process slipped in between the sidecar check and now
        lock_file.try_lock_exclusive().map_err(|_| {
            QuoteError::file_locked(
                path.display().to_string(),
                "another process".to_string(),
                "unknown".to_string(),
            )
        })?;

        let json = serde_json::to_string_pretty(&info).map_err(|e| {
            QuoteError::SerializationError {
                reason: e.to_string(),
            }
        })?;
        lock_file.write_all(json.as_bytes()).map_err(|e| {
            QuoteError::file_error("write lock", lock_path.display().to_string(), e.to_string())
        })?;
        lock_file.sync_all().map_err(|e| {
            QuoteError::file_error("sync lock", lock_path.display().to_string(), e.to_string())
        })?;

        Ok(FileLock {
            workbook_path: path.to_path_buf(),
            lock_path,
            _lock_file: lock_file,
            info,
        })
    }

    /// Report who currently holds the edit lock, without taking it.
    ///
    /// Returns `None` when the workbook is free to edit (no sidecar, or an
    /// abandoned one).
    pub fn holder(path: &Path) -> Option<EditLockInfo> {
        let info = EditLockInfo::read_from(&lock_path_for(path)).ok()?;
        if info.is_abandoned() {
            None
        } else {
            Some(info)
        }
    }

    /// Path to the workbook this lock guards
    pub fn workbook_path(&self) -> &Path {
        &self.workbook_path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // Remove the sidecar; the OS lock goes with the file handle
        let _ = fs::remove_file(&self.lock_path);
    }
}

/// Sidecar path for a workbook: the full file name plus `.lock`
fn lock_path_for(workbook_path: &Path) -> PathBuf {
    let mut name = workbook_path.as_os_str().to_os_string();
    name.push(".lock");
    PathBuf::from(name)
}

/// Save a workbook with atomic write semantics.
///
/// The JSON is written to a `.vqf.tmp` sibling, synced to disk, and then
/// renamed over the target, so an interrupted save leaves the previous
/// workbook intact rather than a truncated file.
pub fn save_workbook(workbook: &QuoteWorkbook, path: &Path) -> QuoteResult<()> {
    let json = serde_json::to_string_pretty(workbook).map_err(|e| {
        QuoteError::SerializationError {
            reason: e.to_string(),
        }
    })?;

    let tmp_path = path.with_extension("vqf.tmp");

    let mut tmp_file = File::create(&tmp_path).map_err(|e| {
        QuoteError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;
    tmp_file.write_all(json.as_bytes()).map_err(|e| {
        QuoteError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;
    tmp_file.sync_all().map_err(|e| {
        QuoteError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        QuoteError::file_error("rename to final", path.display().to_string(), e.to_string())
    })
}

/// Load a workbook from a `.vqf` file.
///
/// # Returns
///
/// * `Ok(QuoteWorkbook)` - Successfully loaded workbook
/// * `Err(QuoteError::VersionMismatch)` - File version is incompatible
/// * `Err(QuoteError::SerializationError)` - Invalid JSON
/// * `Err(QuoteError::FileError)` - I/O error
pub fn load_workbook(path: &Path) -> QuoteResult<QuoteWorkbook> {
    let contents = fs::read_to_string(path).map_err(|e| {
        QuoteError::file_error("read", path.display().to_string(), e.to_string())
    })?;

    let workbook: QuoteWorkbook =
        serde_json::from_str(&contents).map_err(|e| QuoteError::SerializationError {
            reason: format!("Invalid JSON in {}: {}", path.display(), e),
        })?;

    validate_version(&workbook.meta.version)?;

    Ok(workbook)
}

/// Load a workbook together with whoever currently holds its edit lock.
///
/// A caller that intends to modify the workbook should treat a `Some`
/// holder as read-only access and not save over the holder's session.
pub fn load_workbook_with_lock_check(path: &Path) -> QuoteResult<(QuoteWorkbook, Option<EditLockInfo>)> {
    let workbook = load_workbook(path)?;
    let holder = FileLock::holder(path);
    Ok((workbook, holder))
}

/// Leading major.minor of a semver-style version string.
fn version_pair(version: &str) -> Option<(u32, u32)> {
    let mut parts = version.split('.').map(|p| p.parse::<u32>().ok());
    let major = parts.next().flatten()?;
    let minor = parts.next().flatten()?;
    Some((major, minor))
}

/// Validate that a file version is compatible with the current schema.
fn validate_version(file_version: &str) -> QuoteResult<()> {
    let mismatch = || QuoteError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };

    let (file_major, file_minor) = version_pair(file_version).ok_or_else(mismatch)?;
    let (major, minor) = version_pair(SCHEMA_VERSION).ok_or_else(mismatch)?;

    if file_major != major {
        return Err(mismatch());
    }
    // Pre-1.0, a newer minor than we understand is also a breaking change
    if major == 0 && file_minor > minor {
        return Err(mismatch());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::temp_dir;

    fn temp_workbook_path(name: &str) -> PathBuf {
        temp_dir().join(format!("voltquote_test_{}.vqf", name))
    }

    fn meta_for(prepared_by: &str) -> WorkbookMetadata {
        QuoteWorkbook::new(prepared_by, "Q-TEST-001", "Test Client").meta
    }

    /// Plant a lock sidecar as if `prepared_by` were editing from `pid`.
    fn plant_lock(path: &Path, prepared_by: &str, pid: u32) {
        let info = EditLockInfo {
            prepared_by: prepared_by.to_string(),
            quote_ref: "Q-TEST-001".to_string(),
            machine: machine_name(),
            pid,
            locked_at: Utc::now(),
        };
        fs::write(
            lock_path_for(path),
            serde_json::to_string_pretty(&info).unwrap(),
        )
        .unwrap();
    }

    fn cleanup(path: &Path) {
        let _ = fs::remove_file(lock_path_for(path));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_lock_sidecar_path() {
        let workbook_path = Path::new("/path/to/quotes.vqf");
        assert_eq!(
            lock_path_for(workbook_path),
            Path::new("/path/to/quotes.vqf.lock")
        );
    }

    #[test]
    fn test_lock_records_editing_session() {
        let path = temp_workbook_path("session");
        File::create(&path).unwrap();

        let lock = FileLock::acquire(&path, &meta_for("alice@example.com")).unwrap();
        assert_eq!(lock.info.prepared_by, "alice@example.com");
        assert_eq!(lock.info.quote_ref, "Q-TEST-001");
        assert!(lock.info.pid > 0);
        assert_eq!(lock.workbook_path(), path.as_path());

        // Other preparers can see who holds the workbook and which quote
        let sidecar = fs::read_to_string(lock_path_for(&path)).unwrap();
        assert!(sidecar.contains("alice@example.com"));
        assert!(sidecar.contains("Q-TEST-001"));

        drop(lock);
        cleanup(&path);
    }

    #[test]
    fn test_lock_released_on_drop() {
        let path = temp_workbook_path("release");
        File::create(&path).unwrap();

        let lock = FileLock::acquire(&path, &meta_for("alice@example.com")).unwrap();
        assert!(lock_path_for(&path).exists());

        drop(lock);
        assert!(!lock_path_for(&path).exists());

        cleanup(&path);
    }

    #[test]
    fn test_other_preparer_is_locked_out() {
        let path = temp_workbook_path("locked_out");
        File::create(&path).unwrap();

        // Alice is editing from a live process (ours)
        plant_lock(&path, "alice@example.com", std::process::id());

        let err = FileLock::acquire(&path, &meta_for("bob@example.com")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_LOCKED");
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("alice@example.com"));

        cleanup(&path);
    }

    #[test]
    fn test_same_preparer_takes_over_own_lock() {
        let path = temp_workbook_path("takeover_self");
        File::create(&path).unwrap();

        // Alice's earlier session on this machine still looks live
        plant_lock(&path, "alice@example.com", std::process::id());

        // Re-opening her own workbook must not lock her out
        let lock = FileLock::acquire(&path, &meta_for("alice@example.com")).unwrap();
        assert_eq!(lock.info.prepared_by, "alice@example.com");

        drop(lock);
        cleanup(&path);
    }

    #[test]
    fn test_abandoned_session_lock_is_taken_over() {
        let path = temp_workbook_path("takeover_dead");
        File::create(&path).unwrap();

        // Alice's session crashed; its process is gone
        plant_lock(&path, "alice@example.com", u32::MAX);

        let lock = FileLock::acquire(&path, &meta_for("bob@example.com")).unwrap();
        assert_eq!(lock.info.prepared_by, "bob@example.com");

        drop(lock);
        cleanup(&path);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = temp_workbook_path("roundtrip");

        let workbook = QuoteWorkbook::new("Test Seller", "Q-TEST-001", "Test Client");
        save_workbook(&workbook, &path).unwrap();

        let loaded = load_workbook(&path).unwrap();
        assert_eq!(loaded.meta.prepared_by, "Test Seller");
        assert_eq!(loaded.meta.quote_ref, "Q-TEST-001");
        assert_eq!(loaded.meta.client, "Test Client");

        cleanup(&path);
    }

    #[test]
    fn test_saved_quote_outputs_survive_reload() {
        use crate::assumptions::CostAssumptions;
        use crate::inputs::ProjectInputs;
        use crate::workbook::QuoteRecord;

        let path = temp_workbook_path("outputs");

        let mut workbook = QuoteWorkbook::new("Seller", "Q-1", "Client");
        let id = workbook.add_quote(QuoteRecord::new(
            "Option A",
            ProjectInputs {
                power_mw: 1.0,
                standby_hours: 2.0,
                ..Default::default()
            },
            CostAssumptions::default(),
        ));
        let saved_outputs = workbook.quotes[&id].outputs.clone();

        save_workbook(&workbook, &path).unwrap();
        let loaded = load_workbook(&path).unwrap();

        // Outputs are persisted verbatim, including optional-field absence
        assert_eq!(loaded.quotes[&id].outputs, saved_outputs);
        assert_eq!(loaded.quotes[&id].outputs.roi_years, None);

        cleanup(&path);
    }

    #[test]
    fn test_atomic_save_leaves_no_tmp_file() {
        let path = temp_workbook_path("atomic");
        let tmp_path = path.with_extension("vqf.tmp");

        let workbook = QuoteWorkbook::new("Test", "Q-TEST", "Client");
        save_workbook(&workbook, &path).unwrap();

        assert!(!tmp_path.exists());
        assert!(path.exists());

        cleanup(&path);
    }

    #[test]
    fn test_version_validation() {
        assert!(validate_version(SCHEMA_VERSION).is_ok());

        // Same major.minor, any patch
        assert!(validate_version("0.1.0").is_ok());
        assert!(validate_version("0.1.5").is_ok());

        // Different major
        assert!(validate_version("1.0.0").is_err());

        // Newer minor (in 0.x) is a breaking change
        assert!(validate_version("0.2.0").is_err());

        // Unparseable
        assert!(validate_version("not-a-version").is_err());
    }

    #[test]
    fn test_load_with_lock_check() {
        let path = temp_workbook_path("lock_check");

        let workbook = QuoteWorkbook::new("Test", "Q-TEST", "Client");
        save_workbook(&workbook, &path).unwrap();

        // Nobody editing: workbook is free
        let (loaded, holder) = load_workbook_with_lock_check(&path).unwrap();
        assert_eq!(loaded.meta.quote_ref, "Q-TEST");
        assert!(holder.is_none());

        // Carol starts editing from a live process
        plant_lock(&path, "carol@example.com", std::process::id());
        let (_, holder) = load_workbook_with_lock_check(&path).unwrap();
        assert_eq!(holder.unwrap().prepared_by, "carol@example.com");

        cleanup(&path);
    }
}
