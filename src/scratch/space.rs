use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use super::guard::ScratchGuard;

/// Category of scratch resource; each kind gets its own directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScratchKind {
    /// Uploaded audio files, saved once before transcription
    Upload,
    /// Per-session live audio chunk files
    LiveAudio,
    /// Concatenated video output awaiting delivery
    MergedVideo,
}

impl ScratchKind {
    pub const ALL: [ScratchKind; 3] = [
        ScratchKind::Upload,
        ScratchKind::LiveAudio,
        ScratchKind::MergedVideo,
    ];

    pub fn dir_name(&self) -> &'static str {
        match self {
            ScratchKind::Upload => "uploads",
            ScratchKind::LiveAudio => "live",
            ScratchKind::MergedVideo => "merged",
        }
    }
}

/// A scratch file allocated by [`ScratchSpace`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScratchHandle {
    path: PathBuf,
}

impl ScratchHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScratchError {
    #[error("failed to allocate scratch file in {dir}: {source}")]
    Allocate {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to remove scratch file {path}: {source}")]
    Release {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone)]
struct ScratchEntry {
    kind: ScratchKind,
    owner: String,
}

/// Owner of every temporary file the pipeline creates.
///
/// Names are unique for the lifetime of the process: a monotonically
/// increasing counter plus a per-process tag, and the file itself is created
/// with `create_new` so a stale file from another process can never be handed
/// out twice. Only this type deletes scratch files.
///
/// A path is tracked before its file is created and untracked before its file
/// is deleted. The lock only guards the map; file IO happens outside it.
pub struct ScratchSpace {
    root: PathBuf,
    instance: String,
    next_id: AtomicU64,
    live: Mutex<HashMap<PathBuf, ScratchEntry>>,
}

impl ScratchSpace {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, ScratchError> {
        let root = root.into();

        for kind in ScratchKind::ALL {
            let dir = root.join(kind.dir_name());
            fs::create_dir_all(&dir).map_err(|source| ScratchError::Allocate {
                dir: dir.clone(),
                source,
            })?;
        }

        let instance = uuid::Uuid::new_v4().simple().to_string()[..8].to_string();

        info!("Scratch space ready at {} (instance {})", root.display(), instance);

        Ok(Self {
            root,
            instance,
            next_id: AtomicU64::new(0),
            live: Mutex::new(HashMap::new()),
        })
    }

    pub fn dir(&self, kind: ScratchKind) -> PathBuf {
        self.root.join(kind.dir_name())
    }

    /// Allocate a fresh, empty scratch file.
    ///
    /// `owner` ends up in the file name and is used by [`ScratchSpace::owned_by`];
    /// it is sanitised to `[A-Za-z0-9_-]`.
    pub fn allocate(
        &self,
        kind: ScratchKind,
        owner: &str,
        extension: &str,
    ) -> Result<ScratchHandle, ScratchError> {
        let dir = self.dir(kind);
        let owner_tag = sanitize(owner);
        let extension = sanitize(extension.trim_start_matches('.'));

        loop {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            let path = dir.join(format!(
                "{}-{:06}-{}.{}",
                owner_tag, id, self.instance, extension
            ));

            self.lock_live().insert(
                path.clone(),
                ScratchEntry {
                    kind,
                    owner: owner.to_string(),
                },
            );

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => {
                    debug!("Allocated scratch file {}", path.display());
                    return Ok(ScratchHandle { path });
                }
                Err(e) => {
                    self.lock_live().remove(&path);
                    // Leftover from an earlier run; take the next number
                    if e.kind() == io::ErrorKind::AlreadyExists {
                        continue;
                    }
                    return Err(ScratchError::Allocate { dir, source: e });
                }
            }
        }
    }

    /// Allocate a file that is released automatically when the guard drops
    pub fn allocate_guard(
        self: &Arc<Self>,
        kind: ScratchKind,
        owner: &str,
        extension: &str,
    ) -> Result<ScratchGuard, ScratchError> {
        let handle = self.allocate(kind, owner, extension)?;
        Ok(ScratchGuard::new(Arc::clone(self), handle))
    }

    /// Remove the file behind `handle`.
    ///
    /// Returns `Ok(true)` if this call released it and `Ok(false)` if it was
    /// already released. A file that cannot be deleted is untracked anyway,
    /// so the next [`ScratchSpace::sweep`] collects it.
    pub fn release(&self, handle: &ScratchHandle) -> Result<bool, ScratchError> {
        if self.lock_live().remove(&handle.path).is_none() {
            return Ok(false);
        }

        match fs::remove_file(&handle.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                warn!(
                    "Failed to remove scratch file {}, leaving it for the next sweep: {}",
                    handle.path.display(),
                    source
                );
                return Err(ScratchError::Release {
                    path: handle.path.clone(),
                    source,
                });
            }
        }

        debug!("Released scratch file {}", handle.path.display());

        Ok(true)
    }

    pub fn is_live(&self, path: &Path) -> bool {
        self.lock_live().contains_key(path)
    }

    pub fn live_count(&self) -> usize {
        self.lock_live().len()
    }

    pub fn live_count_of(&self, kind: ScratchKind) -> usize {
        self.lock_live().values().filter(|e| e.kind == kind).count()
    }

    /// Paths currently allocated on behalf of `owner`
    pub fn owned_by(&self, owner: &str) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .lock_live()
            .iter()
            .filter(|(_, e)| e.owner == owner)
            .map(|(p, _)| p.clone())
            .collect();
        paths.sort();
        paths
    }

    /// Delete untracked files in the kind directories: leftovers from an
    /// earlier process and files whose release failed. Returns the number of
    /// files removed.
    pub fn sweep(&self) -> usize {
        let mut removed = 0;

        for kind in ScratchKind::ALL {
            let dir = self.dir(kind);
            let files: Vec<PathBuf> = match fs::read_dir(&dir) {
                Ok(entries) => entries
                    .flatten()
                    .map(|entry| entry.path())
                    .filter(|path| path.is_file())
                    .collect(),
                Err(e) => {
                    warn!("Cannot read scratch dir {}: {}", dir.display(), e);
                    continue;
                }
            };

            // Listed before the check, so a tracked-later path already existed
            // and its allocation moved on to the next number
            let stale: Vec<PathBuf> = {
                let live = self.lock_live();
                files
                    .into_iter()
                    .filter(|path| !live.contains_key(path))
                    .collect()
            };

            for path in stale {
                match fs::remove_file(&path) {
                    Ok(()) => removed += 1,
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => warn!("Failed to sweep {}: {}", path.display(), e),
                }
            }
        }

        if removed > 0 {
            info!("Swept {} stale scratch files", removed);
        }

        removed
    }

    fn lock_live(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, ScratchEntry>> {
        // A panic while holding the lock cannot leave the map half-updated
        self.live.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn sanitize(s: &str) -> String {
    let cleaned: String = s
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "scratch".to_string()
    } else {
        cleaned
    }
}
