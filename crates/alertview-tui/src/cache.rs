//! In-process alert cache.
//!
//! The cache is the only owner of alert state on the UI side. It applies
//! optimistic read-flag changes immediately and reconciles them when the
//! matching network call completes, or when a poll snapshot arrives.
//!
//! ## Pending set
//!
//! Every optimistic flip records the alert id under a [`MutationId`]. While an
//! id is pending, a [`AlertCache::replace`] keeps it Read even if the snapshot
//! says otherwise: the snapshot may have been fetched before the mark-read
//! reached the server. Acknowledgment and revert only touch entries that still
//! belong to the mutation that created them.
//!
//! A mark-all also covers ids that were already pending when it was issued.
//! Its success settles those entries as server-confirmed; if one of them fails
//! on its own first, the entry is handed to the mark-all instead of reverting.

use std::collections::{HashMap, HashSet};

use alertview_core::{Alert, AlertId};
use tracing::{debug, warn};

/// Identifies one optimistic mutation (a mark-one or a mark-all).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MutationId(u64);

impl std::fmt::Display for MutationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "m{}", self.0)
    }
}

/// Ids flipped by one optimistic mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkTicket {
    pub mutation: MutationId,
    pub ids: Vec<AlertId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingMark {
    mutation: MutationId,
    /// The server already reported the alert as read.
    confirmed: bool,
    /// In-flight mark-alls issued while this entry was pending, oldest first
    covered_by: Vec<MutationId>,
}

impl PendingMark {
    fn new(mutation: MutationId) -> Self {
        Self {
            mutation,
            confirmed: false,
            covered_by: Vec::new(),
        }
    }
}

/// What a [`AlertCache::replace`] did, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaceSummary {
    pub generation: u64,
    pub total: usize,
    pub added: usize,
    pub removed: usize,
    /// Pending ids whose optimistic Read flag overrode the snapshot
    pub inherited: usize,
    pub duplicates: usize,
}

/// Alert cache with optimistic read-flag tracking.
#[derive(Debug, Clone, Default)]
pub struct AlertCache {
    /// Alerts by id
    entries: HashMap<AlertId, Alert>,
    /// Server order of the last snapshot
    order: Vec<AlertId>,
    /// Optimistically read ids awaiting acknowledgment
    pending: HashMap<AlertId, PendingMark>,
    /// Incremented on every full replacement
    generation: u64,
    /// Incremented on every observable change
    revision: u64,
    /// Unread entries, maintained on every flag change
    unread: usize,
    next_mutation: u64,
}

impl AlertCache {
    /// Create an empty cache (generation 0).
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole alert set with a poll snapshot.
    ///
    /// Pending ids present in the snapshot inherit their optimistic Read
    /// flag. Pending ids absent from the snapshot are forgotten.
    pub fn replace(&mut self, snapshot: Vec<Alert>) -> ReplaceSummary {
        let mut summary = ReplaceSummary {
            generation: self.generation + 1,
            ..Default::default()
        };

        let mut entries = HashMap::with_capacity(snapshot.len());
        let mut order = Vec::with_capacity(snapshot.len());

        for mut alert in snapshot {
            if entries.contains_key(&alert.id) {
                warn!(alert_id = %alert.id, "duplicate alert id in snapshot, keeping first");
                summary.duplicates += 1;
                continue;
            }

            if let Some(pending) = self.pending.get_mut(&alert.id) {
                if alert.is_read {
                    pending.confirmed = true;
                } else {
                    alert.is_read = true;
                    summary.inherited += 1;
                }
            }

            if !self.entries.contains_key(&alert.id) {
                summary.added += 1;
            }
            order.push(alert.id);
            entries.insert(alert.id, alert);
        }

        summary.removed = self
            .order
            .iter()
            .filter(|id| !entries.contains_key(id))
            .count();

        self.pending.retain(|id, _| entries.contains_key(id));
        self.unread = entries.values().filter(|a| !a.is_read).count();
        self.entries = entries;
        self.order = order;
        self.generation = summary.generation;
        self.revision += 1;
        summary.total = self.order.len();

        debug!(
            generation = summary.generation,
            total = summary.total,
            added = summary.added,
            removed = summary.removed,
            inherited = summary.inherited,
            "alert cache replaced"
        );
        summary
    }

    /// Optimistically mark one alert read.
    ///
    /// Returns `None` (and changes nothing) if the alert is unknown or
    /// already Read, so a second click never starts a second request.
    pub fn begin_mark_read(&mut self, id: AlertId) -> Option<MarkTicket> {
        let is_unread = self.entries.get(&id).is_some_and(|a| !a.is_read);
        if !is_unread {
            return None;
        }

        let mutation = self.allocate_mutation();
        self.set_read(id, true);
        self.pending.insert(id, PendingMark::new(mutation));
        self.revision += 1;

        Some(MarkTicket {
            mutation,
            ids: vec![id],
        })
    }

    /// Optimistically mark every Unread alert read.
    ///
    /// Always returns a ticket, possibly with no ids: the server may hold
    /// unread alerts this cache has not seen yet.
    pub fn begin_mark_all(&mut self) -> MarkTicket {
        let mutation = self.allocate_mutation();
        let ids: Vec<AlertId> = self
            .order
            .iter()
            .copied()
            .filter(|id| self.entries.get(id).is_some_and(|a| !a.is_read))
            .collect();

        for pending in self.pending.values_mut() {
            if !pending.confirmed {
                pending.covered_by.push(mutation);
            }
        }
        for &id in &ids {
            self.set_read(id, true);
            self.pending.insert(id, PendingMark::new(mutation));
        }
        if !ids.is_empty() {
            self.revision += 1;
        }

        MarkTicket { mutation, ids }
    }

    /// The server acknowledged a mutation. The flags are already correct,
    /// so only the pending entries go away.
    ///
    /// For a mark-all, entries it covered are settled as confirmed, so a late
    /// failure of their own request no longer reverts them.
    pub fn acknowledge(&mut self, ticket: &MarkTicket) -> usize {
        let cleared = self
            .owned_ids(ticket)
            .into_iter()
            .filter(|id| self.release(*id, ticket.mutation).is_some())
            .count();
        let mut settled = 0;
        for pending in self.pending.values_mut() {
            if pending.covered_by.contains(&ticket.mutation) {
                pending.confirmed = true;
                pending.covered_by.clear();
                settled += 1;
            }
        }
        debug!(mutation = %ticket.mutation, cleared, settled, "mutation acknowledged");
        cleared
    }

    /// The server rejected a mutation: flip its ids back to Unread.
    ///
    /// Ids that no longer belong to this mutation, that vanished in a later
    /// snapshot, or that the server already showed as read are left alone.
    /// An id still covered by an in-flight mark-all passes to that mark-all
    /// and stays Read. Returns the ids actually reverted.
    pub fn revert(&mut self, ticket: &MarkTicket) -> Vec<AlertId> {
        for pending in self.pending.values_mut() {
            pending.covered_by.retain(|m| *m != ticket.mutation);
        }

        let mut reverted = Vec::new();
        for id in self.owned_ids(ticket) {
            let Some(mut pending) = self.release(id, ticket.mutation) else {
                continue;
            };
            if pending.confirmed {
                continue;
            }
            if let Some(owner) = pending.covered_by.pop() {
                debug!(alert_id = %id, mutation = %owner, "pending mark handed to mark-all");
                pending.mutation = owner;
                self.pending.insert(id, pending);
                continue;
            }
            if self.set_read(id, false) {
                reverted.push(id);
            }
        }
        if !reverted.is_empty() {
            self.revision += 1;
        }
        debug!(mutation = %ticket.mutation, reverted = reverted.len(), "mutation reverted");
        reverted
    }

    /// Number of Unread entries.
    pub fn unread_count(&self) -> usize {
        self.unread
    }

    /// Recount Unread entries from scratch.
    pub fn recount_unread(&self) -> usize {
        self.entries.values().filter(|a| !a.is_read).count()
    }

    /// Get an alert by id.
    pub fn get(&self, id: AlertId) -> Option<&Alert> {
        self.entries.get(&id)
    }

    /// Alerts in server order.
    pub fn alerts(&self) -> impl Iterator<Item = &Alert> + '_ {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    /// Whether an id has an unacknowledged optimistic mutation.
    pub fn is_pending(&self, id: AlertId) -> bool {
        self.pending.contains_key(&id)
    }

    /// Ids with unacknowledged optimistic mutations.
    pub fn pending_ids(&self) -> HashSet<AlertId> {
        self.pending.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of full replacements so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Changes whenever anything observable changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether at least one snapshot has been applied.
    pub fn is_loaded(&self) -> bool {
        self.generation > 0
    }

    fn allocate_mutation(&mut self) -> MutationId {
        self.next_mutation += 1;
        MutationId(self.next_mutation)
    }

    /// The ticket's ids plus, in server order, any ids handed to its
    /// mutation after it was issued.
    fn owned_ids(&self, ticket: &MarkTicket) -> Vec<AlertId> {
        let handed = self.order.iter().copied().filter(|id| {
            !ticket.ids.contains(id)
                && self
                    .pending
                    .get(id)
                    .is_some_and(|p| p.mutation == ticket.mutation)
        });
        ticket.ids.iter().copied().chain(handed).collect()
    }

    /// Remove the pending entry for `id` if `mutation` owns it.
    fn release(&mut self, id: AlertId, mutation: MutationId) -> Option<PendingMark> {
        match self.pending.get(&id) {
            Some(pending) if pending.mutation == mutation => self.pending.remove(&id),
            _ => None,
        }
    }

    /// Set one flag, keeping the unread counter in step. Returns whether the
    /// flag changed.
    fn set_read(&mut self, id: AlertId, is_read: bool) -> bool {
        let Some(alert) = self.entries.get_mut(&id) else {
            return false;
        };
        if alert.is_read == is_read {
            return false;
        }
        alert.is_read = is_read;
        if is_read {
            self.unread = self.unread.saturating_sub(1);
        } else {
            self.unread += 1;
        }
        true
    }
}
