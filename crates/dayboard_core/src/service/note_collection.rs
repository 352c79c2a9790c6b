//! Note collection use-cases, editor session and auto-save commits.
//!
//! # Responsibility
//! - Own the note list and apply create/update/tag/favorite/delete intents.
//! - Run the single editor session and commit its debounced edits.
//! - Derive the note grid view with tag index and card projections.
//!
//! # Invariants
//! - New notes are appended; storage order is creation order.
//! - Title, content and tag changes bump `modified_at`; favorite changes do
//!   not.
//! - Deleting a note cancels its pending auto-save and closes its editor.
//! - Unknown ids are ignored and reported as `false`.
//! - A store failure is logged; in-memory state stays authoritative.

use crate::clock::{SharedClock, Timestamp};
use crate::config::EngineConfig;
use crate::model::note::{NewNote, Note, NoteId, NotePatch, TagValidationError};
use crate::port::store::NoteStore;
use crate::service::autosave::{AutoSaveScheduler, AutoSaveStatus};
use crate::view::badge::{preview, relative_label, word_count};
use crate::view::filter::{note_matches, NoteQuery};
use crate::view::sort::sort_notes;
use crate::view::tag_index::{all_tags, tag_counts};
use log::{debug, info, warn};
use std::collections::BTreeMap;

/// One visible note with its card projections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteCard<'a> {
    pub note: &'a Note,
    pub preview: String,
    pub word_count: usize,
    /// Relative label of `modified_at`.
    pub modified_label: String,
}

/// Derived note grid for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteView<'a> {
    pub items: Vec<NoteCard<'a>>,
    /// Distinct tags across all notes, for the tag filter bar.
    pub all_tags: Vec<String>,
    pub tag_counts: BTreeMap<String, usize>,
    pub total: usize,
    pub favorites: usize,
}

impl NoteView<'_> {
    pub fn ids(&self) -> Vec<NoteId> {
        self.items.iter().map(|card| card.note.id).collect()
    }
}

/// In-memory note collection with editor session and auto-save.
pub struct NoteCollection {
    clock: SharedClock,
    untitled_title: String,
    preview_chars: usize,
    notes: Vec<Note>,
    editor: Option<NoteId>,
    autosave: AutoSaveScheduler,
    store: Option<Box<dyn NoteStore>>,
}

impl NoteCollection {
    pub fn new(clock: SharedClock) -> Self {
        Self::with_config(clock, &EngineConfig::default())
    }

    pub fn with_config(clock: SharedClock, config: &EngineConfig) -> Self {
        Self {
            clock,
            untitled_title: config.untitled_note_title.clone(),
            preview_chars: config.preview_chars,
            notes: Vec::new(),
            editor: None,
            autosave: AutoSaveScheduler::new(config.autosave_delay()),
            store: None,
        }
    }

    /// Mirrors every successful mutation to `store`.
    pub fn set_store(&mut self, store: impl NoteStore + 'static) {
        self.store = Some(Box::new(store));
    }

    /// Creates and appends one note. Invalid tags in the input are dropped.
    pub fn create(&mut self, input: NewNote) -> Note {
        let note = Note::create(input, &self.untitled_title, self.clock.now());
        self.notes.push(note.clone());
        info!(
            "event=note_create module=notes status=ok note_id={} tags={} total={}",
            note.id,
            note.tags.len(),
            self.notes.len()
        );
        self.persist(&note);
        note
    }

    /// Adds an already built note, e.g. one restored from a store. Returns
    /// `false` when the id is already present.
    pub fn insert(&mut self, note: Note) -> bool {
        if self.get(note.id).is_some() {
            debug!("event=note_insert module=notes status=ignored note_id={}", note.id);
            return false;
        }
        self.notes.push(note);
        true
    }

    /// Applies a content patch. Returns `false` for an unknown id or an
    /// empty patch.
    pub fn update(&mut self, id: NoteId, patch: NotePatch) -> bool {
        let now = self.clock.now();
        self.apply_patch(id, patch, now)
    }

    fn apply_patch(&mut self, id: NoteId, patch: NotePatch, at: Timestamp) -> bool {
        let placeholder = self.untitled_title.clone();
        self.modify(id, "note_update", |note| {
            if note.apply(patch, &placeholder) {
                note.modified_at = at;
                true
            } else {
                false
            }
        })
    }

    /// Removes the note, cancelling its auto-save and closing its editor.
    pub fn delete(&mut self, id: NoteId) -> bool {
        if self.autosave.forget(id) {
            debug!("event=autosave_cancel module=notes status=ok note_id={id} reason=delete");
        }
        if self.editor == Some(id) {
            self.editor = None;
        }

        let before = self.notes.len();
        self.notes.retain(|note| note.id != id);
        if self.notes.len() == before {
            debug!("event=note_delete module=notes status=ignored note_id={id}");
            return false;
        }
        info!(
            "event=note_delete module=notes status=ok note_id={id} total={}",
            self.notes.len()
        );
        if let Some(store) = self.store.as_mut() {
            if let Err(err) = store.remove_note(id) {
                warn!("event=note_store_remove module=notes status=error note_id={id} error={err}");
            }
        }
        true
    }

    /// Adds one tag to a note.
    ///
    /// Returns `Ok(true)` when the tag set changed, `Ok(false)` for an
    /// unknown note or an already present tag.
    ///
    /// # Errors
    /// - `TagValidationError` for empty or whitespace-containing input.
    pub fn add_tag(&mut self, id: NoteId, raw: &str) -> Result<bool, TagValidationError> {
        let now = self.clock.now();
        let mut outcome = Ok(false);
        self.modify(id, "note_add_tag", |note| match note.add_tag(raw) {
            Ok(true) => {
                note.modified_at = now;
                outcome = Ok(true);
                true
            }
            Ok(false) => false,
            Err(err) => {
                outcome = Err(err);
                false
            }
        });
        if let Err(err) = &outcome {
            debug!("event=note_add_tag module=notes status=rejected note_id={id} reason={err}");
        }
        outcome
    }

    /// Removes an exact tag match. Returns whether a tag was removed.
    pub fn remove_tag(&mut self, id: NoteId, tag: &str) -> bool {
        let now = self.clock.now();
        self.modify(id, "note_remove_tag", |note| {
            if note.remove_tag(tag) {
                note.modified_at = now;
                true
            } else {
                false
            }
        })
    }

    /// Sets the favorite flag without touching `modified_at`.
    pub fn set_favorite(&mut self, id: NoteId, is_favorite: bool) -> bool {
        self.modify(id, "note_favorite", |note| {
            let changed = note.is_favorite != is_favorite;
            note.is_favorite = is_favorite;
            changed
        })
    }

    pub fn toggle_favorite(&mut self, id: NoteId) -> bool {
        self.modify(id, "note_favorite", |note| {
            note.is_favorite = !note.is_favorite;
            true
        })
    }

    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Note> {
        self.notes.iter()
    }

    pub fn all_tags(&self) -> Vec<String> {
        all_tags(&self.notes)
    }

    /// Opens the editor on `id`. A previously open editor is closed first,
    /// dropping its uncommitted edit. Returns `false` for an unknown id.
    pub fn open_editor(&mut self, id: NoteId) -> bool {
        if self.get(id).is_none() {
            debug!("event=editor_open module=notes status=ignored note_id={id}");
            return false;
        }
        if self.editor != Some(id) {
            self.close_editor();
        }
        self.editor = Some(id);
        debug!("event=editor_open module=notes status=ok note_id={id}");
        true
    }

    /// Closes the editor and cancels its pending auto-save.
    pub fn close_editor(&mut self) -> bool {
        let Some(id) = self.editor.take() else {
            return false;
        };
        if self.autosave.cancel_for(id).is_some() {
            debug!("event=autosave_cancel module=notes status=ok note_id={id} reason=close");
        }
        true
    }

    pub fn editor(&self) -> Option<NoteId> {
        self.editor
    }

    /// Note under edit with its pending edit applied, as the editor shows it.
    pub fn editor_draft(&self) -> Option<Note> {
        let id = self.editor?;
        let mut draft = self.get(id)?.clone();
        if let Some(pending) = self.autosave.pending(id) {
            draft.apply(pending.clone(), &self.untitled_title);
        }
        Some(draft)
    }

    /// Records an editor change and restarts the auto-save countdown.
    ///
    /// Returns the commit deadline, or `None` when no editor is open or the
    /// edit is empty.
    pub fn edit(&mut self, edit: NotePatch) -> Option<Timestamp> {
        let id = self.editor?;
        if edit.is_empty() {
            return None;
        }
        let due_at = self.autosave.schedule(id, edit, self.clock.now());
        debug!("event=autosave_schedule module=notes status=ok note_id={id}");
        Some(due_at)
    }

    /// Commits the editor's pending edit immediately.
    pub fn save_now(&mut self) -> bool {
        let Some(id) = self.editor else {
            return false;
        };
        match self.autosave.cancel_for(id) {
            Some(patch) => {
                let now = self.clock.now();
                self.commit(id, patch, now)
            }
            None => false,
        }
    }

    /// Commits every auto-save whose deadline has passed, stamped with that
    /// deadline. Returns the number of committed notes.
    pub fn tick(&mut self) -> usize {
        let due = self.autosave.take_due(self.clock.now());
        let mut committed = 0;
        for edit in due {
            if self.commit(edit.note_id, edit.patch, edit.due_at) {
                committed += 1;
            }
        }
        committed
    }

    pub fn autosave_status(&self, id: NoteId) -> AutoSaveStatus {
        self.autosave.status(id)
    }

    pub fn next_autosave_due(&self) -> Option<Timestamp> {
        self.autosave.next_due()
    }

    /// Filter, then sort, then project cards.
    pub fn view(&self, query: &NoteQuery) -> NoteView<'_> {
        let now = self.clock.now();
        let visible = self.notes.iter().filter(|note| note_matches(note, query));
        let items = sort_notes(visible, query.sort)
            .into_iter()
            .map(|note| NoteCard {
                note,
                preview: preview(&note.content, self.preview_chars),
                word_count: word_count(&note.content),
                modified_label: relative_label(note.modified_at, now),
            })
            .collect();
        NoteView {
            items,
            all_tags: all_tags(&self.notes),
            tag_counts: tag_counts(&self.notes),
            total: self.notes.len(),
            favorites: self.notes.iter().filter(|note| note.is_favorite).count(),
        }
    }

    fn commit(&mut self, id: NoteId, patch: NotePatch, at: Timestamp) -> bool {
        let applied = self.apply_patch(id, patch, at);
        if applied {
            self.autosave.mark_committed(id, at);
            info!("event=autosave_commit module=notes status=ok note_id={id}");
        } else {
            debug!("event=autosave_commit module=notes status=ignored note_id={id}");
        }
        applied
    }

    /// Runs `change` on note `id`; persists when it reports a change.
    fn modify(&mut self, id: NoteId, event: &str, change: impl FnOnce(&mut Note) -> bool) -> bool {
        let Some(note) = self.notes.iter_mut().find(|note| note.id == id) else {
            debug!("event={event} module=notes status=ignored note_id={id}");
            return false;
        };
        if !change(note) {
            return false;
        }
        let snapshot = note.clone();
        info!("event={event} module=notes status=ok note_id={id}");
        self.persist(&snapshot);
        true
    }

    fn persist(&mut self, note: &Note) {
        if let Some(store) = self.store.as_mut() {
            if let Err(err) = store.save_note(note) {
                warn!(
                    "event=note_store_save module=notes status=error note_id={} error={err}",
                    note.id
                );
            }
        }
    }
}
