//! Background selection with last-submitted-wins publication.
//!
//! Each [`Dispatcher::submit`] gets a fresh generation number and cancels
//! whatever was running before it. A finished job publishes only if no newer
//! job has been submitted in the meantime, so a slow stale search can never
//! overwrite a newer result.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, instrument};

use crate::core::catalog::ItemId;
use crate::core::matcher::MatchedInventoryEntry;
use crate::core::selector::{
    CancelToken, ComboResult, DEFAULT_MAX_SLOTS, DEFAULT_THRESHOLD, SelectError, Selector,
};

/// Owned inputs for one selection
#[derive(Debug, Clone)]
pub struct SelectionJob
{
    pub inventory: Vec<MatchedInventoryEntry>,
    pub threshold: u64,
    pub max_slots: usize,
    pub excluded: Vec<ItemId>,
    pub pinned: Vec<ItemId>,
    pub parallel: bool,
}

impl SelectionJob
{
    pub fn new(inventory: Vec<MatchedInventoryEntry>) -> Self
    {
        Self {
            inventory,
            threshold: DEFAULT_THRESHOLD,
            max_slots: DEFAULT_MAX_SLOTS,
            excluded: Vec::new(),
            pinned: Vec::new(),
            parallel: false,
        }
    }

    fn selector(&self) -> Selector<'_>
    {
        let mut selector = Selector::new(&self.inventory)
            .threshold(self.threshold)
            .max_slots(self.max_slots)
            .exclude(
                self.excluded
                    .iter()
                    .cloned(),
            )
            .parallel(self.parallel);

        for id in &self.pinned
        {
            selector = selector.pin(id.clone());
        }

        selector
    }

    /// Run in the calling thread
    pub fn run(
        &self,
        cancel: &CancelToken,
    ) -> Result<Option<ComboResult>, SelectError>
    {
        self.selector()
            .run(cancel)
    }
}

/// A result that made it to the shared slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published
{
    pub generation: u64,
    pub result: Result<Option<ComboResult>, SelectError>,
}

/// How a submitted job ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement
{
    Published(Published),

    /// Finished, but a newer job had been submitted
    Superseded,

    /// Stopped early by a newer submission
    Cancelled,
}

/// Handle for one submitted job
#[derive(Debug)]
pub struct Ticket
{
    generation: u64,
    done: Receiver<Settlement>,
}

impl Ticket
{
    pub fn generation(&self) -> u64
    {
        self.generation
    }

    /// Block until the job settles.
    ///
    /// A worker that disappeared without reporting counts as cancelled.
    pub fn wait(self) -> Settlement
    {
        self.done
            .recv()
            .unwrap_or(Settlement::Cancelled)
    }
}

#[derive(Debug, Default)]
struct Shared
{
    latest: AtomicU64,
    running: Mutex<Option<CancelToken>>,
    published: Mutex<Option<Published>>,
}

impl Shared
{
    fn publish(
        &self,
        generation: u64,
        result: Result<Option<ComboResult>, SelectError>,
    ) -> Settlement
    {
        let mut slot = lock(&self.published);

        if generation
            != self
                .latest
                .load(Ordering::SeqCst)
        {
            debug!(generation, "stale selection discarded");
            return Settlement::Superseded;
        }

        let published = Published { generation, result };
        *slot = Some(published.clone());
        Settlement::Published(published)
    }
}

/// Runs selections on the rayon pool; newest submission wins
#[derive(Debug, Clone, Default)]
pub struct Dispatcher
{
    shared: Arc<Shared>,
}

impl Dispatcher
{
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Queue `job`, cancelling the previous one.
    #[instrument(skip_all, fields(items = job.inventory.len()))]
    pub fn submit(
        &self,
        job: SelectionJob,
    ) -> Ticket
    {
        let cancel = CancelToken::new();

        // Generation and running token move together under one lock
        let generation = {
            let mut running = lock(&self.shared.running);
            if let Some(previous) = running.replace(cancel.clone())
            {
                previous.cancel();
            }

            self.shared
                .latest
                .fetch_add(1, Ordering::SeqCst)
                + 1
        };

        let (tx, rx) = mpsc::channel();
        let shared = Arc::clone(&self.shared);

        rayon::spawn(move || {
            let settlement = match job.run(&cancel)
            {
                Err(SelectError::Cancelled) => Settlement::Cancelled,
                result => shared.publish(generation, result),
            };

            debug!(generation, ?settlement, "selection settled");

            // The caller may have dropped its ticket
            let _ = tx.send(settlement);
        });

        Ticket { generation, done: rx }
    }

    /// Newest published outcome, if any
    pub fn latest(&self) -> Option<Published>
    {
        lock(&self.shared.published).clone()
    }

    /// Cancel whatever is running without submitting a replacement
    pub fn cancel(&self)
    {
        if let Some(running) = lock(&self.shared.running).take()
        {
            running.cancel();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T>
{
    mutex
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}
