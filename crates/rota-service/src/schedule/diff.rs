//! Reconciles an old and a new version of a nested shift collection into an
//! add/update/delete patch.

use std::collections::{HashMap, HashSet};

use rota_core::types::RecordId;
use serde::{Deserialize, Serialize};

use super::model::{ClientAssignment, StaffAssignment, Task};

/// An entry of a nested shift collection that can be diffed by identity.
pub trait Reconcile: Clone + PartialEq {
    /// Persistence-assigned identity; `None` for entries not yet stored.
    #[must_use]
    fn identity(&self) -> Option<&RecordId>;

    /// Copy of the entry with its identity removed.
    #[must_use]
    fn without_identity(&self) -> Self;

    /// Whether `self` still refers to the same thing as `previous`. When it
    /// does not, the entry is replaced rather than updated.
    #[must_use]
    fn same_anchor(&self, _previous: &Self) -> bool {
        true
    }
}

impl Reconcile for ClientAssignment {
    fn identity(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }

    fn without_identity(&self) -> Self {
        Self {
            id: None,
            ..self.clone()
        }
    }

    fn same_anchor(&self, previous: &Self) -> bool {
        self.client == previous.client
    }
}

impl Reconcile for StaffAssignment {
    fn identity(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }

    fn without_identity(&self) -> Self {
        Self {
            id: None,
            ..self.clone()
        }
    }

    fn same_anchor(&self, previous: &Self) -> bool {
        self.staff == previous.staff
    }
}

impl Reconcile for Task {
    fn identity(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }

    fn without_identity(&self) -> Self {
        Self {
            id: None,
            ..self.clone()
        }
    }
}

/// Changes needed to turn one version of a collection into another.
///
/// An identity appears in at most one of `update` and `delete`; `add` entries
/// never carry one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulePatch<T> {
    pub add: Vec<T>,
    pub update: Vec<T>,
    pub delete: Vec<RecordId>,
}

impl<T> Default for SchedulePatch<T> {
    fn default() -> Self {
        Self {
            add: Vec::new(),
            update: Vec::new(),
            delete: Vec::new(),
        }
    }
}

impl<T> SchedulePatch<T> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.update.is_empty() && self.delete.is_empty()
    }
}

/// ## Summary
/// Computes the patch turning `old` into `new`.
///
/// - A `new` entry whose identity is known and whose anchor is unchanged is an
///   update when any field differs, otherwise nothing.
/// - A known identity whose anchor changed is deleted and the entry re-added
///   without identity.
/// - Entries without identity are added.
/// - An identity `old` does not know, or one already claimed by an earlier
///   entry, is stripped and the entry added.
/// - Old identities left unclaimed are deleted, in `old` order.
///
/// Entries of `old` without identity are ignored.
#[must_use]
pub fn diff<T: Reconcile>(old: &[T], new: &[T]) -> SchedulePatch<T> {
    let index: HashMap<&RecordId, &T> = old
        .iter()
        .filter_map(|entry| entry.identity().map(|id| (id, entry)))
        .collect();
    let mut claimed: HashSet<&RecordId> = HashSet::with_capacity(index.len());
    let mut patch = SchedulePatch::default();

    for entry in new {
        let Some(id) = entry.identity() else {
            patch.add.push(entry.clone());
            continue;
        };

        let Some(&previous) = index.get(id) else {
            tracing::warn!(%id, "Identity unknown to the stored collection, adding as new");
            patch.add.push(entry.without_identity());
            continue;
        };

        if !claimed.insert(id) {
            tracing::warn!(%id, "Identity used more than once, adding duplicate as new");
            patch.add.push(entry.without_identity());
            continue;
        }

        if !entry.same_anchor(previous) {
            tracing::trace!(%id, "Anchor changed, replacing entry");
            patch.add.push(entry.without_identity());
            patch.delete.push(id.clone());
            continue;
        }

        if entry != previous {
            patch.update.push(entry.clone());
        }
    }

    for id in old.iter().filter_map(Reconcile::identity) {
        if claimed.insert(id) {
            patch.delete.push(id.clone());
        }
    }

    tracing::trace!(
        add = patch.add.len(),
        update = patch.update.len(),
        delete = patch.delete.len(),
        "Computed collection patch"
    );

    patch
}
