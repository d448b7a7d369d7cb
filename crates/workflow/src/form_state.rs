//! Lightweight draft state for simple entity forms.
//!
//! Entities that don't need the full workflow coordinator (teams, lines,
//! roles, ...) get a small load/update/reset helper instead.

/// Draft state for an edit form over an entity of type `T`.
#[derive(Debug, Default)]
pub struct FormState<T: Clone> {
    original: Option<T>,
    draft: Option<T>,
    dirty: bool,
}

impl<T: Clone> FormState<T> {
    pub fn new() -> Self {
        Self {
            original: None,
            draft: None,
            dirty: false,
        }
    }

    /// Load an entity into the form, replacing any previous draft.
    pub fn load(&mut self, entity: T) {
        self.draft = Some(entity.clone());
        self.original = Some(entity);
        self.dirty = false;
    }

    /// The current draft, if one is loaded.
    pub fn draft(&self) -> Option<&T> {
        self.draft.as_ref()
    }

    /// Apply a field mutation to the draft. No-op when nothing is loaded.
    pub fn update(&mut self, mutate: impl FnOnce(&mut T)) -> bool {
        match self.draft.as_mut() {
            Some(draft) => {
                mutate(draft);
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Discard edits, restoring the draft to the loaded entity.
    pub fn reset(&mut self) {
        self.draft = self.original.clone();
        self.dirty = false;
    }

    /// Whether the draft has uncommitted edits.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Take the draft out for submission, clearing the form.
    pub fn take(&mut self) -> Option<T> {
        self.original = None;
        self.dirty = false;
        self.draft.take()
    }
}
