//! Keeps the current record, the history collection and the two storage slots
//! consistent.
//!
//! Every mutation runs the whole reconciliation inline: fold the current
//! record into history, write the draft slot when the record is today's, then
//! write history behind the empty-collection guard. Nothing here returns an
//! error; storage problems are logged and the in-memory state stays
//! authoritative.

use crate::clock::Clock;
use crate::dates;
use crate::models::{
    ActivityEntry, DailyRecord, IntakeEntry, JournalView, PendingActivity, PendingEntries,
    MAX_WATER, PendingIntake, RecordPatch, RecoverySnapshot, generate_id,
};
use crate::storage::{Slot, SlotStore, StoreError};
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Meal,
    Misc,
    Activity,
}

pub struct JournalController<S, C> {
    store: S,
    clock: C,
    current: DailyRecord,
    history: Vec<DailyRecord>,
    selected: String,
    initialized: bool,
    // Stored history held something that could not be fully adopted.
    history_partial: bool,
    pending: PendingEntries,
}

impl<S: SlotStore, C: Clock> JournalController<S, C> {
    /// Uninitialized controller holding a blank record for today. Mutations
    /// before [`initialize`](Self::initialize) never touch storage.
    pub fn new(store: S, clock: C) -> Self {
        let today = dates::date_key(clock.today());
        Self {
            store,
            clock,
            current: DailyRecord::new(today.clone()),
            history: Vec::new(),
            selected: today,
            initialized: false,
            history_partial: false,
            pending: PendingEntries::default(),
        }
    }

    pub fn open(store: S, clock: C) -> Self {
        let mut controller = Self::new(store, clock);
        controller.initialize();
        controller
    }

    /// Startup load. Precedence for today's record is history, then the
    /// draft slot, then a blank record.
    pub fn initialize(&mut self) {
        if self.initialized {
            return;
        }

        let (history, complete) = self.load_history();
        self.history = history;
        self.history_partial = !complete;
        let today = self.today_key();

        let from_history = self
            .history
            .iter()
            .find(|record| record.date_key == today)
            .cloned();
        let current = match from_history {
            Some(record) => record,
            None => self
                .load_draft(&today)
                .unwrap_or_else(|| DailyRecord::new(today.clone())),
        };

        self.current = current;
        self.selected = today;
        self.initialized = true;
        debug!(
            history_len = self.history.len(),
            date = %self.selected,
            "journal initialized"
        );
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn current(&self) -> &DailyRecord {
        &self.current
    }

    pub fn history(&self) -> &[DailyRecord] {
        &self.history
    }

    pub fn selected_date(&self) -> &str {
        &self.selected
    }

    pub fn pending(&self) -> &PendingEntries {
        &self.pending
    }

    pub fn today_key(&self) -> String {
        dates::date_key(self.clock.today())
    }

    pub fn view(&self) -> JournalView {
        let today = self.today_key();
        JournalView {
            is_today: self.selected == today,
            today,
            selected_date: self.selected.clone(),
            date_label: dates::display_date(&self.selected),
            record: self.current.clone(),
            pending: self.pending.clone(),
        }
    }

    /// True once the wall-clock date has moved past the selected date.
    pub fn date_rolled_over(&self) -> bool {
        self.selected != self.today_key()
    }

    pub fn select_date(&mut self, date: NaiveDate) {
        let key = dates::date_key(date);
        if key == self.selected {
            return;
        }

        let record = self
            .history
            .iter()
            .find(|record| record.date_key == key)
            .cloned()
            .unwrap_or_else(|| DailyRecord::new(key.clone()));

        self.selected = key;
        self.current = record;
        self.reconcile();
    }

    pub fn reset_to_today(&mut self) {
        let today = self.clock.today();
        self.select_date(today);
    }

    pub fn set_protein_goal(&mut self, goal: impl Into<String>) {
        self.current.protein_goal = goal.into();
        self.reconcile();
    }

    pub fn set_ketosis(&mut self, value: bool) {
        self.current.ketosis = value;
        self.reconcile();
    }

    pub fn set_followed_plan(&mut self, value: bool) {
        self.current.followed_plan = value;
        self.reconcile();
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.current.notes = notes.into();
        self.reconcile();
    }

    pub fn set_water_intake(&mut self, count: u8) {
        self.current.water_intake = count.min(MAX_WATER);
        self.reconcile();
    }

    /// Clicking the pip that is currently the top one steps down to it;
    /// any other pip fills up to and including itself.
    pub fn toggle_water(&mut self, pip: u8) {
        if pip >= MAX_WATER {
            return;
        }
        let next = if self.current.water_intake == pip + 1 {
            pip
        } else {
            pip + 1
        };
        self.set_water_intake(next);
    }

    pub fn apply_patch(&mut self, patch: RecordPatch) {
        if patch.is_empty() {
            return;
        }
        if let Some(goal) = patch.protein_goal {
            self.current.protein_goal = goal;
        }
        if let Some(value) = patch.ketosis {
            self.current.ketosis = value;
        }
        if let Some(value) = patch.followed_plan {
            self.current.followed_plan = value;
        }
        if let Some(notes) = patch.notes {
            self.current.notes = notes;
        }
        if let Some(count) = patch.water_intake {
            self.current.water_intake = count.min(MAX_WATER);
        }
        self.reconcile();
    }

    pub fn set_pending_meal(&mut self, pending: PendingIntake) {
        self.pending.meal = pending;
    }

    pub fn set_pending_misc(&mut self, pending: PendingIntake) {
        self.pending.misc = pending;
    }

    pub fn set_pending_activity(&mut self, pending: PendingActivity) {
        self.pending.activity = pending;
    }

    pub fn add_pending_meal(&mut self) -> Option<IntakeEntry> {
        let entry = take_intake(&mut self.pending.meal, self.clock.now())?;
        self.current.meal_entries.insert(0, entry.clone());
        self.reconcile();
        Some(entry)
    }

    pub fn add_pending_misc(&mut self) -> Option<IntakeEntry> {
        let entry = take_intake(&mut self.pending.misc, self.clock.now())?;
        self.current.misc_entries.insert(0, entry.clone());
        self.reconcile();
        Some(entry)
    }

    pub fn add_pending_activity(&mut self) -> Option<ActivityEntry> {
        if self.pending.activity.kind.trim().is_empty() {
            return None;
        }
        let pending = std::mem::take(&mut self.pending.activity);
        let entry = ActivityEntry {
            id: generate_id(),
            kind: pending.kind,
            duration: pending.duration,
        };
        self.current.activity_entries.insert(0, entry.clone());
        self.reconcile();
        Some(entry)
    }

    pub fn remove_meal(&mut self, id: &str) -> bool {
        self.remove_entry(EntryKind::Meal, id)
    }

    pub fn remove_misc(&mut self, id: &str) -> bool {
        self.remove_entry(EntryKind::Misc, id)
    }

    pub fn remove_activity(&mut self, id: &str) -> bool {
        self.remove_entry(EntryKind::Activity, id)
    }

    /// Writes history to storage unless doing so would replace stored
    /// records with an empty collection, or drop stored records that could
    /// not be read at startup. Returns whether the write happened.
    pub fn persist_history(&self) -> bool {
        if !self.initialized {
            return false;
        }

        if self.history_partial {
            warn!("stored history was only partly readable, leaving it untouched");
            return false;
        }

        if self.history.is_empty() {
            match self.store.load(Slot::History) {
                Ok(Some(stored)) if holds_records(&stored) => {
                    warn!("refusing to overwrite stored history with an empty collection");
                    return false;
                }
                Ok(_) => {}
                Err(err) => {
                    warn!("skipping history write, stored history unreadable: {err}");
                    return false;
                }
            }
        }

        match self.write_json(Slot::History, &self.history) {
            Ok(()) => true,
            Err(err) => {
                error!("{err}");
                false
            }
        }
    }

    pub fn recovery_snapshot(&self) -> RecoverySnapshot {
        let read = |slot: Slot| match self.store.load(slot) {
            Ok(value) => value,
            Err(err) => {
                error!("{err}");
                None
            }
        };
        RecoverySnapshot {
            log: read(Slot::Draft),
            history: read(Slot::History),
        }
    }

    fn remove_entry(&mut self, kind: EntryKind, id: &str) -> bool {
        let before = self.entry_count(kind);
        match kind {
            EntryKind::Meal => self.current.meal_entries.retain(|entry| entry.id != id),
            EntryKind::Misc => self.current.misc_entries.retain(|entry| entry.id != id),
            EntryKind::Activity => self.current.activity_entries.retain(|entry| entry.id != id),
        }
        if self.entry_count(kind) == before {
            return false;
        }
        self.reconcile();
        true
    }

    fn entry_count(&self, kind: EntryKind) -> usize {
        match kind {
            EntryKind::Meal => self.current.meal_entries.len(),
            EntryKind::Misc => self.current.misc_entries.len(),
            EntryKind::Activity => self.current.activity_entries.len(),
        }
    }

    fn reconcile(&mut self) {
        if !self.initialized {
            debug!("journal not initialized, skipping reconciliation");
            return;
        }

        let key = self.current.date_key.clone();
        self.history.retain(|record| record.date_key != key);
        self.history.insert(0, self.current.clone());
        sort_history(&mut self.history);

        if key == self.today_key() {
            if let Err(err) = self.write_json(Slot::Draft, &self.current) {
                error!("{err}");
            }
        }

        self.persist_history();
        debug!(date = %key, history_len = self.history.len(), "record reconciled");
    }

    /// Reads stored history record by record. The flag is false when the
    /// slot held anything that was not adopted.
    fn load_history(&self) -> (Vec<DailyRecord>, bool) {
        let raw = match self.store.load(Slot::History) {
            Ok(Some(raw)) if !raw.trim().is_empty() => raw,
            Ok(_) => return (Vec::new(), true),
            Err(err) => {
                error!("{err}");
                return (Vec::new(), false);
            }
        };
        let items = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(items)) => items,
            Ok(Value::Null) => return (Vec::new(), true),
            Ok(_) => {
                error!("stored history is not a list");
                return (Vec::new(), false);
            }
            Err(err) => {
                error!("failed to parse stored history: {err}");
                return (Vec::new(), false);
            }
        };

        let stored = items.len();
        let mut history: Vec<DailyRecord> = items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<DailyRecord>(item) {
                Ok(record) if !record.date_key.trim().is_empty() => Some(record),
                Ok(_) => {
                    warn!("skipping stored record without a date");
                    None
                }
                Err(err) => {
                    warn!("skipping unreadable stored record: {err}");
                    None
                }
            })
            .collect();
        let complete = history.len() == stored;
        dedupe_history(&mut history);
        (history, complete)
    }

    fn load_draft(&self, today: &str) -> Option<DailyRecord> {
        let raw = match self.store.load(Slot::Draft) {
            Ok(raw) => raw?,
            Err(err) => {
                error!("{err}");
                return None;
            }
        };
        let fields = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) => {
                warn!("stored draft is not a record, ignoring");
                return None;
            }
            Err(err) => {
                error!("failed to parse stored draft: {err}");
                return None;
            }
        };
        if fields.get("date").and_then(Value::as_str) != Some(today) {
            debug!("stored draft belongs to another day, ignoring");
            return None;
        }
        match DailyRecord::merged(today, fields) {
            Ok(record) => Some(record),
            Err(err) => {
                error!("failed to merge stored draft: {err}");
                None
            }
        }
    }

    fn write_json<T: serde::Serialize + ?Sized>(&self, slot: Slot, value: &T) -> Result<(), StoreError> {
        let text = serde_json::to_string(value).map_err(|source| StoreError::Encode {
            key: slot.key(),
            source,
        })?;
        self.store.save(slot, &text)
    }
}

fn take_intake(pending: &mut PendingIntake, now: NaiveDateTime) -> Option<IntakeEntry> {
    if pending.source.trim().is_empty() {
        return None;
    }
    let pending = std::mem::take(pending);
    Some(pending.into_entry(generate_id(), || dates::clock_time(now)))
}

/// Descending by date key; fixed-width keys compare like dates.
pub fn sort_history(history: &mut [DailyRecord]) {
    history.sort_by(|a, b| b.date_key.cmp(&a.date_key));
}

// Stored data written by hand could repeat a date; the first occurrence wins.
fn dedupe_history(history: &mut Vec<DailyRecord>) {
    let mut seen = std::collections::HashSet::new();
    history.retain(|record| seen.insert(record.date_key.clone()));
    sort_history(history);
}

fn holds_records(stored: &str) -> bool {
    let trimmed = stored.trim();
    if trimmed.is_empty() {
        return false;
    }
    match serde_json::from_str::<Vec<Value>>(trimmed) {
        Ok(items) => !items.is_empty(),
        Err(_) => trimmed != "null",
    }
}
