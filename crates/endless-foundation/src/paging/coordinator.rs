//! Per-direction fetch gate.
//!
//! Each direction walks `Idle -> InFlight -> (CompensationPending ->) Idle`.
//! Triggers are only honoured from `Idle`; anything else is reported as a
//! [`TriggerSkipped`] reason and changes nothing.

use std::fmt;

use web_time::{Duration, Instant};

use super::direction::{FetchDirection, ListShape};
use super::error::InvariantViolation;
use super::page_store::PageStore;

/// Fetch state of one direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeState {
    Idle,
    InFlight { ticket: u64 },
    /// The fetch committed but its scroll write has not been applied yet.
    ///
    /// Entered when a commit arms the compensator, left when the compensator
    /// settles. Blocks triggers in this direction only.
    CompensationPending,
}

impl EdgeState {
    pub fn is_idle(&self) -> bool {
        matches!(self, EdgeState::Idle)
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, EdgeState::InFlight { .. })
    }
}

/// Why a trigger did not dispatch a fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerSkipped {
    InFlight,
    CompensationPending,
    /// The cursor for this direction is absent.
    Terminal,
    /// The initial page has not been committed yet.
    NotLoaded,
    TornDown,
    /// The list shape never loads in this direction.
    DirectionDisabled,
}

impl fmt::Display for TriggerSkipped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            TriggerSkipped::InFlight => "fetch already in flight",
            TriggerSkipped::CompensationPending => "scroll compensation pending",
            TriggerSkipped::Terminal => "no more pages",
            TriggerSkipped::NotLoaded => "initial page not loaded",
            TriggerSkipped::TornDown => "controller disposed",
            TriggerSkipped::DirectionDisabled => "direction not loaded by this list",
        };
        f.write_str(reason)
    }
}

/// A dispatched fetch. Handed back to the coordinator when the fetch settles.
#[derive(Clone, Debug)]
pub struct FetchTicket<C> {
    id: u64,
    generation: u64,
    direction: FetchDirection,
    cursor: Option<C>,
    initial: bool,
    dispatched_at: Instant,
}

impl<C> FetchTicket<C> {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn direction(&self) -> FetchDirection {
        self.direction
    }

    pub fn cursor(&self) -> Option<&C> {
        self.cursor.as_ref()
    }

    /// Whether this is the first-page fetch rather than an edge fetch.
    pub fn is_initial(&self) -> bool {
        self.initial
    }

    pub fn elapsed(&self) -> Duration {
        self.dispatched_at.elapsed()
    }
}

#[derive(Debug)]
pub struct FetchCoordinator {
    edges: [EdgeState; 2],
    initial: Option<u64>,
    generation: u64,
    next_ticket: u64,
    torn_down: bool,
}

impl Default for FetchCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchCoordinator {
    pub fn new() -> Self {
        Self {
            edges: [EdgeState::Idle; 2],
            initial: None,
            generation: 0,
            next_ticket: 1,
            torn_down: false,
        }
    }

    pub fn state(&self, direction: FetchDirection) -> EdgeState {
        self.edges[direction.slot()]
    }

    pub fn is_in_flight(&self, direction: FetchDirection) -> bool {
        self.state(direction).is_in_flight()
    }

    pub fn is_loading_initial(&self) -> bool {
        self.initial.is_some()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Checks whether a trigger in `direction` would dispatch, without changing state.
    pub fn check<T, C>(
        &self,
        direction: FetchDirection,
        shape: ListShape,
        store: &PageStore<T, C>,
    ) -> Result<(), TriggerSkipped> {
        if self.torn_down {
            return Err(TriggerSkipped::TornDown);
        }
        if !shape.loads(direction) {
            return Err(TriggerSkipped::DirectionDisabled);
        }
        if store.is_empty() {
            return Err(TriggerSkipped::NotLoaded);
        }
        match self.state(direction) {
            EdgeState::InFlight { .. } => return Err(TriggerSkipped::InFlight),
            EdgeState::CompensationPending => return Err(TriggerSkipped::CompensationPending),
            EdgeState::Idle => {}
        }
        if store.is_terminal(direction) {
            return Err(TriggerSkipped::Terminal);
        }
        Ok(())
    }

    /// Moves `direction` to `InFlight` and returns the ticket for the fetch to issue.
    ///
    /// The window cap is not consulted here: growth in one direction is what makes
    /// room by evicting on the other, which the store decides at commit time.
    pub fn begin<T, C: Clone>(
        &mut self,
        direction: FetchDirection,
        shape: ListShape,
        store: &PageStore<T, C>,
    ) -> Result<FetchTicket<C>, TriggerSkipped> {
        self.check(direction, shape, store)?;
        let ticket = self.issue(direction, store.cursor(direction).cloned(), false);
        self.edges[direction.slot()] = EdgeState::InFlight { ticket: ticket.id };
        log::debug!("{direction} fetch #{} dispatched", ticket.id);
        Ok(ticket)
    }

    /// Starts the first-page fetch. Edge states stay `Idle` while it runs.
    pub fn begin_initial<C>(&mut self, cursor: Option<C>) -> Result<FetchTicket<C>, TriggerSkipped> {
        if self.torn_down {
            return Err(TriggerSkipped::TornDown);
        }
        if self.initial.is_some() {
            return Err(TriggerSkipped::InFlight);
        }
        let ticket = self.issue(FetchDirection::Forward, cursor, true);
        self.initial = Some(ticket.id);
        log::debug!("initial fetch #{} dispatched", ticket.id);
        Ok(ticket)
    }

    fn issue<C>(&mut self, direction: FetchDirection, cursor: Option<C>, initial: bool) -> FetchTicket<C> {
        let id = self.next_ticket;
        self.next_ticket += 1;
        FetchTicket {
            id,
            generation: self.generation,
            direction,
            cursor,
            initial,
            dispatched_at: Instant::now(),
        }
    }

    /// Whether a settled fetch still belongs to the live controller state.
    pub fn accepts<C>(&self, ticket: &FetchTicket<C>) -> bool {
        if self.torn_down || ticket.generation != self.generation {
            return false;
        }
        if ticket.initial {
            return self.initial == Some(ticket.id);
        }
        self.state(ticket.direction) == EdgeState::InFlight { ticket: ticket.id }
    }

    /// Whether the ticket's cursor still matches the store's edge. An eviction on
    /// the opposite side can move the edge while the fetch runs; committing the
    /// result then would open a gap.
    pub fn is_current<T, C: PartialEq>(&self, ticket: &FetchTicket<C>, store: &PageStore<T, C>) -> bool {
        ticket.initial || ticket.cursor.as_ref() == store.cursor(ticket.direction)
    }

    /// Settles an accepted fetch. `compensating` parks the direction in
    /// `CompensationPending` until [`settled`](Self::settled) is called.
    pub fn finish<C>(&mut self, ticket: &FetchTicket<C>, compensating: bool) {
        debug_assert!(self.accepts(ticket), "finish on a stale ticket");
        let next = if compensating {
            EdgeState::CompensationPending
        } else {
            EdgeState::Idle
        };
        if ticket.initial {
            self.initial = None;
        } else {
            self.edges[ticket.direction.slot()] = next;
        }
        log::debug!(
            "{} fetch #{} settled after {:?} -> {:?}",
            if ticket.initial { "initial".to_string() } else { ticket.direction.to_string() },
            ticket.id,
            ticket.elapsed(),
            next
        );
    }

    /// Marks `direction` as waiting for a scroll write outside of an edge fetch
    /// (the initial page, or a hydrated one).
    /// Returns whether the direction is now held.
    pub fn hold(&mut self, direction: FetchDirection) -> bool {
        if !self.state(direction).is_idle() {
            return false;
        }
        self.edges[direction.slot()] = EdgeState::CompensationPending;
        true
    }

    /// Called once the compensator has written the scroll offset for `direction`.
    pub fn settled(&mut self, direction: FetchDirection) -> Result<(), InvariantViolation> {
        let slot = direction.slot();
        if self.edges[slot] != EdgeState::CompensationPending {
            return Err(InvariantViolation::CompensationNotPending { direction });
        }
        self.edges[slot] = EdgeState::Idle;
        log::trace!("{direction} compensation settled");
        Ok(())
    }

    /// Drops every in-flight fetch; their completions will be ignored.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.edges = [EdgeState::Idle; 2];
        self.initial = None;
    }

    pub fn tear_down(&mut self) {
        self.reset();
        self.torn_down = true;
    }
}
