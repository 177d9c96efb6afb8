//! Cheapest-qualifying sacrifice search.
//!
//! Exhaustive depth-first enumeration of multisets of at most `max_slots`
//! units drawn from the matched inventory, pruned with a greedy value
//! ceiling. Two bests are tracked side by side:
//!
//! - primary: combinations reaching the threshold, ranked by
//!   `(acquisition cost asc, item count asc)`;
//! - fallback: everything else, ranked by
//!   `(total desc, acquisition cost asc, item count asc)`.
//!
//! Remaining ties go to the combination found first. Distinct items are
//! visited by reference value descending (id ascending on equal value), and
//! each item's unit count is tried from the largest feasible down to zero.
//! The primary best wins whenever one exists.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use rayon::prelude::*;
use serde::Serialize;
use smallvec::SmallVec;
use tracing::{debug, instrument, trace};

use crate::core::catalog::{ItemId, ItemRecord};
use crate::core::matcher::MatchedInventoryEntry;

/// Ritual slot count in the game
pub const DEFAULT_MAX_SLOTS: usize = 5;

/// Value a sacrifice must reach for the long-timer reward
pub const DEFAULT_THRESHOLD: u64 = 400_000;

/// Nodes visited between cancellation checks
const CANCEL_POLL_INTERVAL: u64 = 4_096;

/// Chosen sacrifice
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComboResult
{
    /// Pinned items first, then search order; units of one item are adjacent
    pub items: Vec<ItemRecord>,

    /// Sum of reference values
    pub total: u64,

    /// Sum of effective acquisition costs
    pub acquisition_cost: u64,
}

impl ComboResult
{
    pub fn len(&self) -> usize
    {
        self.items
            .len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.items
            .is_empty()
    }

    pub fn qualifies(
        &self,
        threshold: u64,
    ) -> bool
    {
        self.total >= threshold
    }

    /// How many units of `id` were selected
    pub fn count_of(
        &self,
        id: &ItemId,
    ) -> usize
    {
        self.items
            .iter()
            .filter(|item| &item.id == id)
            .count()
    }

    /// Adjacent units collapsed into `(item, count)` pairs
    pub fn grouped(&self) -> Vec<(&ItemRecord, usize)>
    {
        self.items
            .iter()
            .dedup_by_with_count(|a, b| a.id == b.id)
            .map(|(count, item)| (item, count))
            .collect()
    }
}

/// Shared flag a running search polls; clones observe the same flag
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken
{
    pub fn new() -> Self
    {
        Self::default()
    }

    pub fn cancel(&self)
    {
        self.0
            .store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool
    {
        self.0
            .load(Ordering::SeqCst)
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum SelectError
{
    #[error("selection cancelled")]
    Cancelled,

    #[error("pinned item `{0}` is not in the matched inventory")]
    UnknownPin(ItemId),

    #[error("item `{id}` pinned {requested} times but only {available} available")]
    PinExceedsAvailable
    {
        id: ItemId,
        requested: u32,
        available: u32,
    },

    #[error("{pins} pinned items do not fit in {slots} slots")]
    TooManyPins
    {
        pins: usize,
        slots: usize,
    },
}

/// Find the cheapest combination reaching `threshold`, or the most valuable
/// one when nothing can.
///
/// Returns `None` only for an empty inventory.
pub fn select_best(
    inventory: &[MatchedInventoryEntry],
    threshold: u64,
    max_slots: usize,
) -> Option<ComboResult>
{
    let outcome = Selector::new(inventory)
        .threshold(threshold)
        .max_slots(max_slots)
        .run(&CancelToken::new());

    // No pins and a token nobody else holds: the search cannot fail
    outcome.unwrap_or_default()
}

/// Configurable selection over one matched inventory
#[derive(Debug, Clone)]
pub struct Selector<'a>
{
    inventory: &'a [MatchedInventoryEntry],
    threshold: u64,
    max_slots: usize,
    excluded: IndexSet<ItemId>,
    pinned: Vec<ItemId>,
    parallel: bool,
}

impl<'a> Selector<'a>
{
    pub fn new(inventory: &'a [MatchedInventoryEntry]) -> Self
    {
        Self {
            inventory,
            threshold: DEFAULT_THRESHOLD,
            max_slots: DEFAULT_MAX_SLOTS,
            excluded: IndexSet::new(),
            pinned: Vec::new(),
            parallel: false,
        }
    }

    pub fn threshold(
        mut self,
        threshold: u64,
    ) -> Self
    {
        self.threshold = threshold;
        self
    }

    pub fn max_slots(
        mut self,
        max_slots: usize,
    ) -> Self
    {
        self.max_slots = max_slots;
        self
    }

    /// Keep these items out of the free part of the search.
    ///
    /// Pinned units of an excluded item still count.
    pub fn exclude<I>(
        mut self,
        ids: I,
    ) -> Self
    where
        I: IntoIterator<Item = ItemId>,
    {
        self.excluded
            .extend(ids);
        self
    }

    /// Force one unit of `id` into the combination; repeat to pin more.
    pub fn pin(
        mut self,
        id: ItemId,
    ) -> Self
    {
        self.pinned
            .push(id);
        self
    }

    /// Split the top-level branch across the rayon pool.
    pub fn parallel(
        mut self,
        parallel: bool,
    ) -> Self
    {
        self.parallel = parallel;
        self
    }

    /// Run the search.
    ///
    /// # Errors
    /// [`SelectError::Cancelled`] when `cancel` fires mid-search; pin
    /// errors when the pinned multiset is not feasible.
    #[instrument(skip_all, fields(threshold = self.threshold, slots = self.max_slots, parallel = self.parallel))]
    pub fn run(
        &self,
        cancel: &CancelToken,
    ) -> Result<Option<ComboResult>, SelectError>
    {
        if cancel.is_cancelled()
        {
            return Err(SelectError::Cancelled);
        }

        let mut pool = self.pool();
        let pinned = self.take_pins(&mut pool)?;

        let mut units: Vec<Unit<'a>> = pool
            .into_values()
            .filter(|u| u.available > 0 && !self.excluded.contains(&u.item.id))
            .collect();

        if units.is_empty() && pinned.is_empty()
        {
            debug!("nothing to select from");
            return Ok(None);
        }

        // Highest value first tightens the ceiling early
        units.sort_by(|a, b| {
            b.value
                .cmp(&a.value)
                .then_with(|| a.item.id.cmp(&b.item.id))
        });

        let mut start = Partial::default();
        for item in &pinned
        {
            start.add(item.value(), item.cost(), 1);
        }

        let search = Search {
            units: &units,
            threshold: self.threshold,
            max_slots: self.max_slots,
            cancel,
        };

        let tracker = if self.parallel
        {
            search.run_parallel(start)?
        }
        else
        {
            search.run(start, 0, None)?
        };

        let Some(best) = tracker.into_best()
        else
        {
            return Ok(None);
        };

        let mut items: Vec<ItemRecord> = pinned
            .into_iter()
            .cloned()
            .collect();

        for &(index, take) in &best.picks
        {
            for _ in 0..take
            {
                items.push(units[index].item.clone());
            }
        }

        debug!(
            total = best.state.total,
            cost = best.state.cost,
            items = items.len(),
            qualifies = best.state.total >= self.threshold,
            "selection finished"
        );

        Ok(Some(ComboResult {
            items,
            total: best.state.total,
            acquisition_cost: best.state.cost,
        }))
    }

    /// Distinct items with their summed availability
    fn pool(&self) -> IndexMap<&'a ItemId, Unit<'a>>
    {
        let mut pool: IndexMap<&'a ItemId, Unit<'a>> = IndexMap::new();

        for entry in self.inventory
        {
            pool.entry(&entry.item.id)
                .and_modify(|u| u.available = u.available.saturating_add(entry.count))
                .or_insert_with(|| Unit {
                    item: &entry.item,
                    value: entry
                        .item
                        .value(),
                    cost: entry
                        .item
                        .cost(),
                    available: entry.count,
                });
        }

        pool
    }

    /// Validate pins and withdraw them from the pool
    fn take_pins(
        &self,
        pool: &mut IndexMap<&'a ItemId, Unit<'a>>,
    ) -> Result<Vec<&'a ItemRecord>, SelectError>
    {
        if self
            .pinned
            .len()
            > self.max_slots
        {
            return Err(SelectError::TooManyPins {
                pins: self
                    .pinned
                    .len(),
                slots: self.max_slots,
            });
        }

        let mut taken = Vec::with_capacity(self.pinned.len());

        for id in self
            .pinned
            .iter()
            .unique()
        {
            let requested = self
                .pinned
                .iter()
                .filter(|p| *p == id)
                .count();

            let unit = pool
                .get_mut(id)
                .ok_or_else(|| SelectError::UnknownPin(id.clone()))?;

            let requested = u32::try_from(requested).unwrap_or(u32::MAX);
            if requested > unit.available
            {
                return Err(SelectError::PinExceedsAvailable {
                    id: id.clone(),
                    requested,
                    available: unit.available,
                });
            }

            unit.available -= requested;
            taken.extend(std::iter::repeat_n(unit.item, requested as usize));
        }

        Ok(taken)
    }
}

/// One distinct item as the search sees it
#[derive(Debug, Clone, Copy)]
struct Unit<'a>
{
    item: &'a ItemRecord,
    value: u64,
    cost: u64,
    available: u32,
}

/// Running sums of a partial combination
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Partial
{
    total: u64,
    cost: u64,
    used: usize,
}

impl Partial
{
    fn add(
        &mut self,
        value: u64,
        cost: u64,
        units: u32,
    )
    {
        let n = u64::from(units);
        self.total = self
            .total
            .saturating_add(value.saturating_mul(n));
        self.cost = self
            .cost
            .saturating_add(cost.saturating_mul(n));
        self.used += units as usize;
    }

    fn remove_one(
        &mut self,
        unit: &Unit<'_>,
    )
    {
        self.total = self
            .total
            .saturating_sub(unit.value);
        self.cost = self
            .cost
            .saturating_sub(unit.cost);
        self.used -= 1;
    }

    fn primary_key(&self) -> (u64, usize)
    {
        (self.cost, self.used)
    }

    /// Lexicographic "strictly better" for the fallback ranking
    fn beats_fallback(
        &self,
        other: &Partial,
    ) -> bool
    {
        self.total > other.total
            || (self.total == other.total && self.primary_key() < other.primary_key())
    }
}

/// Units of item `index` currently taken
#[derive(Debug, Clone, Copy)]
struct Frame
{
    index: usize,
    take: u32,
}

#[derive(Debug, Clone)]
struct Best
{
    state: Partial,
    picks: SmallVec<[(usize, u32); DEFAULT_MAX_SLOTS]>,
}

impl Best
{
    fn capture(
        state: &Partial,
        root: Option<Frame>,
        stack: &[Frame],
    ) -> Self
    {
        let picks = root
            .iter()
            .chain(stack)
            .filter(|f| f.take > 0)
            .map(|f| (f.index, f.take))
            .collect();

        Self { state: *state, picks }
    }
}

#[derive(Debug, Default)]
struct Tracker
{
    primary: Option<Best>,
    fallback: Option<Best>,
}

impl Tracker
{
    fn offer(
        &mut self,
        state: &Partial,
        threshold: u64,
        root: Option<Frame>,
        stack: &[Frame],
    )
    {
        if state.total >= threshold
        {
            let better = self
                .primary
                .as_ref()
                .is_none_or(|b| state.primary_key() < b.state.primary_key());

            if better
            {
                self.primary = Some(Best::capture(state, root, stack));
            }
        }
        else if self
            .primary
            .is_none()
        {
            let better = self
                .fallback
                .as_ref()
                .is_none_or(|b| state.beats_fallback(&b.state));

            if better
            {
                self.fallback = Some(Best::capture(state, root, stack));
            }
        }
    }

    /// Fold a later branch in; on equal rank the earlier branch stays.
    fn merge(
        self,
        later: Tracker,
    ) -> Tracker
    {
        let primary = match (self.primary, later.primary)
        {
            (Some(a), Some(b)) if b.state.primary_key() < a.state.primary_key() => Some(b),
            (Some(a), _) => Some(a),
            (None, b) => b,
        };

        let fallback = match (self.fallback, later.fallback)
        {
            (Some(a), Some(b)) if b.state.beats_fallback(&a.state) => Some(b),
            (Some(a), _) => Some(a),
            (None, b) => b,
        };

        Tracker { primary, fallback }
    }

    fn into_best(self) -> Option<Best>
    {
        self.primary
            .or(self.fallback)
    }
}

struct Search<'s, 'a>
{
    units: &'s [Unit<'a>],
    threshold: u64,
    max_slots: usize,
    cancel: &'s CancelToken,
}

impl Search<'_, '_>
{
    /// Best total reachable by filling `slots` from `units[from..]`.
    ///
    /// Units are sorted by value, so the greedy fill is exact.
    fn ceiling(
        &self,
        from: usize,
        mut slots: usize,
    ) -> u64
    {
        let mut extra = 0u64;

        for unit in &self.units[from..]
        {
            if slots == 0
            {
                break;
            }

            let take = (unit.available as usize).min(slots);
            extra = extra.saturating_add(
                unit.value
                    .saturating_mul(take as u64),
            );
            slots -= take;
        }

        extra
    }

    /// True when nothing under this node can strictly improve either track
    fn prunable(
        &self,
        tracker: &Tracker,
        state: &Partial,
        index: usize,
    ) -> bool
    {
        let slots_left = self
            .max_slots
            .saturating_sub(state.used);
        let ceiling = state
            .total
            .saturating_add(self.ceiling(index, slots_left));
        let can_qualify = ceiling >= self.threshold;

        match &tracker.primary
        {
            // Extensions only add cost and items
            Some(best) => !can_qualify || state.primary_key() >= best.state.primary_key(),
            None =>
            {
                !can_qualify
                    && tracker
                        .fallback
                        .as_ref()
                        .is_some_and(|fb| {
                            ceiling < fb.state.total
                                || (ceiling == fb.state.total && state.cost > fb.state.cost)
                        })
            }
        }
    }

    /// Explicit-stack DFS over `units[from..]`, starting from `start`.
    ///
    /// `root` is a fixed choice made by the caller; it is reported in picks
    /// but never backtracked.
    fn run(
        &self,
        start: Partial,
        from: usize,
        root: Option<Frame>,
    ) -> Result<Tracker, SelectError>
    {
        let mut tracker = Tracker::default();
        let mut stack: Vec<Frame> = Vec::with_capacity(
            self.units
                .len()
                .saturating_sub(from),
        );
        let mut state = start;
        let mut index = from;
        let mut visited = 0u64;

        'search: loop
        {
            visited += 1;
            if visited % CANCEL_POLL_INTERVAL == 0 && self.cancel.is_cancelled()
            {
                return Err(SelectError::Cancelled);
            }

            if !self.prunable(&tracker, &state, index)
            {
                if index == self.units.len() || state.used >= self.max_slots
                {
                    tracker.offer(&state, self.threshold, root, &stack);
                }
                else
                {
                    let unit = &self.units[index];
                    let slots_left = u32::try_from(self.max_slots - state.used).unwrap_or(u32::MAX);
                    let take = unit
                        .available
                        .min(slots_left);

                    state.add(unit.value, unit.cost, take);
                    stack.push(Frame { index, take });
                    index += 1;
                    continue 'search;
                }
            }

            // Backtrack to the deepest frame with a smaller take left to try
            while let Some(frame) = stack.last_mut()
            {
                if frame.take == 0
                {
                    stack.pop();
                    continue;
                }

                state.remove_one(&self.units[frame.index]);
                frame.take -= 1;
                index = frame.index + 1;
                continue 'search;
            }

            break;
        }

        trace!(visited, "search exhausted");
        Ok(tracker)
    }

    /// One rayon task per unit count of the most valuable item, merged in
    /// the order the sequential search would visit them.
    fn run_parallel(
        &self,
        start: Partial,
    ) -> Result<Tracker, SelectError>
    {
        let Some(first) = self
            .units
            .first()
        else
        {
            return self.run(start, 0, None);
        };

        if start.used >= self.max_slots
        {
            return self.run(start, 0, None);
        }

        let slots_left = u32::try_from(self.max_slots - start.used).unwrap_or(u32::MAX);
        let max_take = first
            .available
            .min(slots_left);

        let branches: Vec<Result<Tracker, SelectError>> = (0..=max_take)
            .rev()
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|take| {
                let mut state = start;
                state.add(first.value, first.cost, take);
                self.run(state, 1, Some(Frame { index: 0, take }))
            })
            .collect();

        let mut merged = Tracker::default();
        for branch in branches
        {
            merged = merged.merge(branch?);
        }

        Ok(merged)
    }
}
