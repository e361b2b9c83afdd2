//! Batch groups: bounded accumulation of URL records with automatic rollover.
//!
//! A [`BatchGroup`] owns a background consumer task fed by a bounded channel.
//! The consumer is the only thing touching the buffer and batch counter; every
//! time the buffer reaches capacity it hands the batch to a separately spawned
//! flush task and keeps accumulating. [`BatchGroup::close`] flushes the rest
//! and waits for all of those flush tasks before returning.

mod accumulator;
mod flush;
mod registry;

pub use self::accumulator::{Accumulator, Batch, MAX_URLSET_SIZE};
pub use self::registry::Registry;
use self::flush::Flusher;
use crate::error::{ErrorKind, Result};
use crate::models::UrlRecord;
use exn::{OptionExt, ResultExt};
use mapgen_compress::Compression;
use mapgen_storage::backend::LocalBackend;
use mapgen_storage::{BackendHandle, validate_path};
use std::num::NonZeroUsize;
use std::path::{Component, Path};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinError, JoinHandle, JoinSet};

/// Tuning for a [`BatchGroup`].
#[derive(Clone, Copy, Debug)]
pub struct GroupOptions {
    /// Records per sitemap file, `1..=50_000`.
    pub capacity: usize,
    pub compression: Compression,
    /// Records that may be queued for the consumer before `add` waits.
    pub intake_buffer: usize,
}
impl Default for GroupOptions {
    fn default() -> Self {
        Self {
            capacity: MAX_URLSET_SIZE,
            compression: Compression::Gzip,
            intake_buffer: 1024,
        }
    }
}

#[derive(Debug)]
enum Command {
    Add(UrlRecord),
    Close(oneshot::Sender<Result<Vec<String>>>),
}

/// Clonable producer handle for a [`BatchGroup`].
///
/// Any number of tasks may add records concurrently; deliveries are
/// serialized into the group's single consumer in arrival order.
#[derive(Clone, Debug)]
pub struct UrlSender {
    sender: mpsc::Sender<Command>,
}
impl UrlSender {
    /// Queue a record. Only waits for room in the intake channel, never for a
    /// flush.
    ///
    /// # Errors
    ///
    /// [`Closed`](ErrorKind::Closed) once the group has been closed.
    pub async fn add(&self, record: UrlRecord) -> Result<()> {
        self.sender.send(Command::Add(record)).await.map_err(|_| ErrorKind::Closed)?;
        Ok(())
    }
}

/// One family of sequentially numbered sitemap files: `site_1.xml.gz`,
/// `site_2.xml.gz`, ...
///
/// # Examples
///
/// ```
/// use mapgen_sitemap::{BatchGroup, GroupOptions, Registry, UrlRecord};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let folder = tempfile::tempdir()?;
/// let registry = Registry::new();
/// let group = BatchGroup::in_folder(folder.path(), "site.xml.gz", registry.clone(), GroupOptions::default())?;
/// group.add(UrlRecord::new("https://example.com/")).await?;
/// assert_eq!(group.close().await?, vec!["site_1.xml.gz"]);
/// assert_eq!(registry.names(), vec!["site_1.xml.gz"]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct BatchGroup {
    name: String,
    sender: UrlSender,
    consumer: JoinHandle<()>,
}
impl BatchGroup {
    /// Create a group writing into `backend` and spawn its consumer.
    ///
    /// The protocol suffix for the chosen compression (`.xml.gz` by default)
    /// is stripped from `name` once, so `"site.xml.gz"` and `"site"` name the
    /// same group. Successfully written file names are appended to
    /// `registry`.
    ///
    /// # Errors
    ///
    /// [`Configuration`](ErrorKind::Configuration) if the name is empty or not a
    /// single path component, if the capacity is out of range, or if no Tokio
    /// runtime is running.
    pub fn new(backend: BackendHandle, name: &str, registry: Registry, options: GroupOptions) -> Result<Self> {
        let name = sanitize_name(name, options.compression)?;
        let capacity = NonZeroUsize::new(options.capacity)
            .filter(|capacity| capacity.get() <= MAX_URLSET_SIZE)
            .ok_or_raise(|| {
                ErrorKind::Configuration(format!(
                    "capacity must be between 1 and {MAX_URLSET_SIZE}, got {}",
                    options.capacity
                ))
            })?;
        let runtime = tokio::runtime::Handle::try_current()
            .or_raise(|| ErrorKind::Configuration("batch groups need a running Tokio runtime".to_string()))?;

        let (sender, receiver) = mpsc::channel(options.intake_buffer.max(1));
        let flusher = Flusher {
            backend,
            name: name.clone(),
            compression: options.compression,
            registry,
        };
        tracing::debug!(group = %name, capacity = capacity.get(), backend = flusher.backend.name(), "Starting batch group");
        let consumer = runtime.spawn(consume(receiver, flusher, capacity));
        Ok(Self {
            name,
            sender: UrlSender { sender },
            consumer,
        })
    }

    /// Create a group writing into an existing local folder.
    ///
    /// # Errors
    ///
    /// [`Configuration`](ErrorKind::Configuration) if `folder` does not exist,
    /// is not a directory, or cannot be read, plus everything [`new`](Self::new)
    /// rejects.
    pub fn in_folder(folder: impl AsRef<Path>, name: &str, registry: Registry, options: GroupOptions) -> Result<Self> {
        let folder = folder.as_ref();
        let backend = LocalBackend::new(name, folder)
            .or_raise(|| ErrorKind::Configuration(format!("output folder {} is not usable", folder.display())))?;
        Self::new(Arc::new(backend), name, registry, options)
    }

    /// The sanitized name, without any `.xml` suffix.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sender(&self) -> UrlSender {
        self.sender.clone()
    }

    /// See [`UrlSender::add`].
    pub async fn add(&self, record: UrlRecord) -> Result<()> {
        self.sender.add(record).await
    }

    /// Flush whatever is buffered as the final batch (an empty buffer still
    /// produces a file), then wait for every flush of this group to finish.
    ///
    /// Returns the file names written by this group in batch order.
    ///
    /// # Errors
    ///
    /// The error of the lowest-numbered batch that failed to flush, even when
    /// later batches succeeded. [`Task`](ErrorKind::Task) if the consumer
    /// itself died.
    pub async fn close(self) -> Result<Vec<String>> {
        let (reply, response) = oneshot::channel();
        self.sender.sender.send(Command::Close(reply)).await.map_err(|_| ErrorKind::Closed)?;
        match response.await {
            Ok(result) => result,
            Err(_) => match self.consumer.await {
                Err(err) => Err(err).or_raise(|| ErrorKind::Task),
                Ok(()) => exn::bail!(ErrorKind::Closed),
            },
        }
    }
}

fn sanitize_name(name: &str, compression: Compression) -> Result<String> {
    let stripped = name.replacen(compression.xml_suffix(), "", 1);
    let invalid = || ErrorKind::Configuration(format!("invalid batch group name: {name:?}"));
    let path = validate_path(&stripped).or_raise(invalid)?;
    let mut components = path.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) => Ok(name.to_string_lossy().into_owned()),
        _ => exn::bail!(invalid()),
    }
}

type FlushOutcome = (u64, Result<String>);

async fn consume(mut receiver: mpsc::Receiver<Command>, flusher: Flusher, capacity: NonZeroUsize) {
    let mut accumulator = Accumulator::new(capacity);
    let mut in_flight: JoinSet<FlushOutcome> = JoinSet::new();
    let mut finished: Vec<FlushOutcome> = Vec::new();

    let reply = loop {
        match receiver.recv().await {
            Some(Command::Add(record)) => {
                if let Some(batch) = accumulator.push(record) {
                    let flusher = flusher.clone();
                    in_flight.spawn(async move {
                        let number = batch.number;
                        (number, flusher.flush(batch).await)
                    });
                }
                while let Some(joined) = in_flight.try_join_next() {
                    finished.push(reap(joined));
                }
            },
            Some(Command::Close(reply)) => break Some(reply),
            None => break None,
        }
    };
    receiver.close();

    let Some(reply) = reply else {
        // Every handle was dropped without closing: nobody is waiting for
        // the result, but started flushes still run to completion.
        if accumulator.buffered() > 0 {
            tracing::warn!(group = %flusher.name, records = accumulator.buffered(), "Batch group dropped without close, discarding buffered records");
        }
        in_flight.detach_all();
        return;
    };

    let mut late = 0usize;
    while let Ok(command) = receiver.try_recv() {
        if matches!(command, Command::Add(_)) {
            late += 1;
        }
    }
    if late > 0 {
        tracing::warn!(group = %flusher.name, records = late, "Discarding records added after close");
    }

    let last = accumulator.finish();
    let number = last.number;
    finished.push((number, flusher.flush(last).await));
    while let Some(joined) = in_flight.join_next().await {
        finished.push(reap(joined));
    }
    finished.sort_by_key(|(number, _)| *number);
    tracing::debug!(group = %flusher.name, batches = finished.len(), "Batch group closed");

    let result = finished.into_iter().map(|(_, result)| result).collect();
    // The caller may have given up waiting; nothing left to do either way.
    let _ = reply.send(result);
}

fn reap(joined: std::result::Result<FlushOutcome, JoinError>) -> FlushOutcome {
    match joined {
        Ok((number, Ok(name))) => (number, Ok(name)),
        Ok((number, Err(err))) => {
            tracing::warn!(batch = number, error = %err, "Sitemap flush failed");
            (number, Err(err))
        },
        Err(err) => {
            tracing::warn!(error = %err, "Sitemap flush task failed");
            (u64::MAX, Err(err).or_raise(|| ErrorKind::Task))
        },
    }
}
