//! Slot table with lowest-free-label reuse.
//!
//! Labels are used directly as indices into parallel arrays (pin states), so
//! the label space is kept dense: a new entry always takes the lowest free
//! slot, and the table only grows when no interior slot is free.

use std::collections::BTreeSet;

/// A dense table of optional entries addressed by integer label.
#[derive(Debug, Clone)]
pub struct Labeling<T> {
    slots: Vec<Option<T>>,
    /// Indices of empty slots below `slots.len()`
    free: BTreeSet<usize>,
}

impl<T> Labeling<T> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: BTreeSet::new(),
        }
    }

    /// The label the next [`Labeling::add`] would return.
    pub fn next_available_label(&self) -> usize {
        self.next_available_label_from(0)
    }

    /// The lowest label at or above `hint` that is free, or the end of the
    /// table if every slot from `hint` on is taken.
    pub fn next_available_label_from(&self, hint: usize) -> usize {
        self.free
            .range(hint..)
            .next()
            .copied()
            .unwrap_or(self.slots.len())
    }

    /// Store `value` under the lowest free label.
    pub fn add(&mut self, value: T) -> usize {
        self.add_from(0, value)
    }

    /// Store `value` under the lowest free label at or above `hint`.
    pub fn add_from(&mut self, hint: usize, value: T) -> usize {
        let label = self.next_available_label_from(hint);
        if label < self.slots.len() {
            self.free.remove(&label);
            self.slots[label] = Some(value);
        } else {
            self.slots.push(Some(value));
        }
        label
    }

    /// Empty the slot under `label`, freeing the label for reuse.
    ///
    /// Returns `false` if the slot was already empty or out of range. Other
    /// entries keep their labels either way.
    pub fn remove(&mut self, label: usize) -> bool {
        self.take(label).is_some()
    }

    /// Empty the slot under `label` and return what it held.
    pub fn take(&mut self, label: usize) -> Option<T> {
        let value = self.slots.get_mut(label)?.take()?;
        self.free.insert(label);
        Some(value)
    }

    /// Get the entry under `label`.
    pub fn get(&self, label: usize) -> Option<&T> {
        self.slots.get(label)?.as_ref()
    }

    /// Get the entry under `label` mutably.
    pub fn get_mut(&mut self, label: usize) -> Option<&mut T> {
        self.slots.get_mut(label)?.as_mut()
    }

    /// Check whether `label` holds an entry.
    pub fn contains(&self, label: usize) -> bool {
        self.get(label).is_some()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of slots, live or empty. Every live label is below this.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Iterate over live entries in label order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(label, slot)| slot.as_ref().map(|value| (label, value)))
    }

    /// Iterate over live labels in order.
    pub fn labels(&self) -> impl Iterator<Item = usize> + '_ {
        self.iter().map(|(label, _)| label)
    }

    /// Drop every entry and shrink the table to nothing.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}

impl<T> Default for Labeling<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for Labeling<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            slots: iter.into_iter().map(Some).collect(),
            free: BTreeSet::new(),
        }
    }
}
