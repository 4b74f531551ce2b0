use std::{
    collections::BTreeMap,
    fs::{self, File, OpenOptions},
    io::{BufReader, Write},
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use anyhow::{Context, Result, anyhow, bail};
use hashbrown::{HashMap, HashSet};
use loadgen_protocol::{
    Document,
    codec::{FrameRead, encode_frame, read_frame},
};
use log::{debug, info, warn};

use crate::{
    DocumentStore,
    batch::{CommitReceipt, DocumentId, MAX_BATCH_WRITES, StagedWrite, WriteBatch},
    ids::DocumentIdGenerator,
};

pub const LOG_FILE_NAME: &str = "documents.log";

/// Embedded document database backed by a single append-only log.
///
/// Every commit is one checksummed frame holding all of its writes, so a
/// batch is either fully present after a crash or not at all. Opening the
/// store replays the log and cuts off a torn tail.
pub struct LocalStore {
    path: PathBuf,
    ids: DocumentIdGenerator,
    state: Mutex<LogState>,
}

struct LogState {
    file: File,
    /// Bytes of valid frames on disk.
    len: u64,
    frames: u64,
    index: HashMap<String, HashSet<DocumentId>>,
}

/// Contents of a store log, per collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSummary {
    pub collections: BTreeMap<String, u64>,
    pub frames: u64,
    /// Bytes after the last valid frame.
    pub torn_bytes: u64,
}

impl StoreSummary {
    pub fn documents(&self, collection: &str) -> u64 {
        self.collections.get(collection).copied().unwrap_or(0)
    }
}

/// Result of walking a log from the start.
struct Replay {
    valid_len: u64,
    file_len: u64,
    frames: u64,
    index: HashMap<String, HashSet<DocumentId>>,
}

pub fn log_path(root: &Path, project_id: &str) -> Result<PathBuf> {
    if project_id.is_empty()
        || project_id == "."
        || project_id == ".."
        || project_id.contains(['/', '\\'])
    {
        bail!("invalid project id {project_id:?} for a local store");
    }
    Ok(root.join(project_id).join(LOG_FILE_NAME))
}

/// Walk every valid frame of the log at `path`, handing its writes to `visit`.
fn replay<F>(path: &Path, mut visit: F) -> Result<Replay>
where
    F: FnMut(Vec<StagedWrite>),
{
    let mut replay = Replay {
        valid_len: 0,
        file_len: 0,
        frames: 0,
        index: HashMap::new(),
    };

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(replay),
        Err(e) => return Err(e).with_context(|| format!("failed to open {}", path.display())),
    };
    replay.file_len = file.metadata()?.len();

    let mut reader = BufReader::new(file);
    loop {
        match read_frame::<_, Vec<StagedWrite>>(&mut reader)
            .with_context(|| format!("failed to read {}", path.display()))?
        {
            FrameRead::Frame(writes, n) => {
                replay.valid_len += n as u64;
                replay.frames += 1;
                for w in &writes {
                    replay
                        .index
                        .entry(w.collection.clone())
                        .or_default()
                        .insert(w.id.clone());
                }
                visit(writes);
            }
            FrameRead::End => break,
            FrameRead::Torn => {
                debug!(
                    "[store] torn frame in {} at offset {}",
                    path.display(),
                    replay.valid_len
                );
                break;
            }
        }
    }

    Ok(replay)
}

impl LocalStore {
    /// Open (or create) the store for `project_id` under `root`.
    pub fn open(root: &Path, project_id: &str) -> Result<Self> {
        let path = log_path(root, project_id)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let log = replay(&path, |_| {})?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;

        if log.file_len > log.valid_len {
            warn!(
                "[store] discarding {} torn bytes at the end of {}",
                log.file_len - log.valid_len,
                path.display()
            );
            file.set_len(log.valid_len)
                .with_context(|| format!("failed to truncate {}", path.display()))?;
        }

        info!("[store] opened {} ({} frames)", path.display(), log.frames);

        Ok(Self {
            path,
            ids: DocumentIdGenerator::new(),
            state: Mutex::new(LogState {
                file,
                len: log.valid_len,
                frames: log.frames,
                index: log.index,
            }),
        })
    }

    /// Summarize the log for `project_id` without opening it for writing.
    pub fn scan(root: &Path, project_id: &str) -> Result<StoreSummary> {
        let path = log_path(root, project_id)?;
        let mut summary = StoreSummary::default();

        let log = replay(&path, |writes| {
            for w in writes {
                *summary.collections.entry(w.collection).or_insert(0) += 1;
            }
        })?;

        summary.frames = log.frames;
        summary.torn_bytes = log.file_len - log.valid_len;
        Ok(summary)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All documents currently in `collection`, in commit order.
    pub fn read_collection(&self, collection: &str) -> Result<Vec<(DocumentId, Document)>> {
        // Hold the lock so no frame is half-written while we read.
        let _state = self.lock()?;
        let mut docs = Vec::new();
        replay(&self.path, |writes| {
            docs.extend(
                writes
                    .into_iter()
                    .filter(|w| w.collection == collection)
                    .map(|w| (w.id, w.document)),
            );
        })?;
        Ok(docs)
    }

    /// Number of committed frames, one per successful commit or add.
    pub fn frames(&self) -> Result<u64> {
        Ok(self.lock()?.frames)
    }

    fn lock(&self) -> Result<MutexGuard<'_, LogState>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("local store lock poisoned"))
    }
}

impl LogState {
    fn check_creates(&self, writes: &[StagedWrite]) -> Result<()> {
        let mut seen: HashSet<(&str, &DocumentId)> = HashSet::with_capacity(writes.len());
        for w in writes {
            let exists = self
                .index
                .get(w.collection.as_str())
                .is_some_and(|ids| ids.contains(&w.id));
            if exists || !seen.insert((w.collection.as_str(), &w.id)) {
                bail!("document {}/{} already exists", w.collection, w.id);
            }
        }
        Ok(())
    }

    fn append(&mut self, writes: Vec<StagedWrite>) -> Result<()> {
        let frame = encode_frame(&writes)?;

        if let Err(e) = self.file.write_all(&frame) {
            // Drop whatever part of the frame reached the file.
            if let Err(trunc) = self.file.set_len(self.len) {
                warn!("[store] failed to roll back partial frame: {trunc}");
            }
            return Err(e).context("failed to append commit frame");
        }

        self.len += frame.len() as u64;
        self.frames += 1;
        for w in writes {
            self.index.entry(w.collection).or_default().insert(w.id);
        }
        Ok(())
    }
}

impl DocumentStore for LocalStore {
    fn new_document_id(&self, _collection: &str) -> DocumentId {
        self.ids.next_id()
    }

    fn commit(&self, batch: WriteBatch) -> Result<CommitReceipt> {
        let n = batch.len();
        if n > MAX_BATCH_WRITES {
            bail!("batch of {n} writes exceeds the limit of {MAX_BATCH_WRITES}");
        }

        let mut state = self.lock()?;
        state.check_creates(batch.writes())?;
        if n > 0 {
            state.append(batch.into_writes())?;
        }

        Ok(CommitReceipt::now(n))
    }

    fn add(&self, collection: &str, document: Document) -> Result<DocumentId> {
        let id = self.new_document_id(collection);
        let mut batch = WriteBatch::new();
        batch.create(collection, id.clone(), document);
        self.commit(batch)?;
        Ok(id)
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
