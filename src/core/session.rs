use std::path::Path;

use anyhow::Result;
use thiserror::Error;

use crate::core::persistence::{self, LoadReport};
use crate::core::store::{PlaylistStore, StoreError};
use crate::desktop::LinkOpener;
use crate::models::{is_web_url, LinkRecord, Mood};

/// Recoverable failures of a single user action. None of them change state.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("that doesn't look like a valid URL: {0}")]
    InvalidUrl(String),
    #[error("a title is required")]
    EmptyTitle,
    #[error("pick a song first")]
    NoSelection,
    #[error("choose happy, chill or energetic to add into")]
    NoTarget,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("could not open link: {0:#}")]
    Launch(anyhow::Error),
}

/// What a shell shows: the store, the selected mood and its display copy.
pub struct Session {
    store: PlaylistStore,
    current: Mood,
    view: Vec<LinkRecord>,
    now_playing: Option<String>,
}

impl Session {
    /// Takes ownership of `store` and shows `mood`.
    pub fn new(store: PlaylistStore, mood: Mood) -> Self {
        let mut session = Self {
            store,
            current: mood,
            view: Vec::new(),
            now_playing: None,
        };
        session.show(mood);
        session
    }

    pub fn store(&self) -> &PlaylistStore {
        &self.store
    }

    pub fn current(&self) -> Mood {
        self.current
    }

    pub fn view(&self) -> &[LinkRecord] {
        &self.view
    }

    pub fn now_playing(&self) -> Option<&str> {
        self.now_playing.as_deref()
    }

    /// Switches to `mood` and rebuilds the display copy.
    pub fn show(&mut self, mood: Mood) {
        self.current = mood;
        self.view = self.store.get(mood).into_owned();
    }

    /// The editable mood an add goes into: `explicit` if given, otherwise the
    /// current mood. `None` while `mixed` is shown and nothing was picked.
    pub fn add_target(&self, explicit: Option<Mood>) -> Option<Mood> {
        explicit
            .into_iter()
            .chain(Some(self.current))
            .find(|m| !m.is_derived())
    }

    /// Appends a link to `target` and refreshes the view.
    ///
    /// The URL must be `http(s)` and the trimmed title non-empty; `target`
    /// must be editable. Nothing changes when any check fails.
    pub fn add(&mut self, target: Mood, url: &str, title: &str) -> Result<(), ActionError> {
        let url = url.trim();
        if !is_web_url(url) {
            return Err(ActionError::InvalidUrl(url.to_string()));
        }
        let title = title.trim();
        if title.is_empty() {
            return Err(ActionError::EmptyTitle);
        }
        if target.is_derived() {
            return Err(ActionError::NoTarget);
        }

        self.store.add(target, LinkRecord::new(title, url))?;
        self.refresh();
        Ok(())
    }

    /// Deletes the displayed item at `index`.
    ///
    /// In the `mixed` view only the display copy loses the item; the source
    /// mood keeps it and it comes back on the next refresh.
    pub fn delete(&mut self, index: usize) -> Result<LinkRecord, ActionError> {
        let shown = self.view.get(index).cloned().ok_or(ActionError::NoSelection)?;

        if self.current.is_derived() {
            self.view.remove(index);
        } else {
            self.store.remove_item(self.current, index, &shown)?;
            self.refresh();
        }

        self.now_playing = None;
        Ok(shown)
    }

    /// The displayed item at `index`, or `NoSelection`.
    pub fn selected(&self, index: usize) -> Result<&LinkRecord, ActionError> {
        self.view.get(index).ok_or(ActionError::NoSelection)
    }

    /// Opens the displayed item at `index` with `opener`.
    pub fn open(&mut self, index: usize, opener: &dyn LinkOpener) -> Result<(), ActionError> {
        let item = self.selected(index)?.clone();
        self.now_playing = Some(item.title);
        opener.open(&item.url).map_err(ActionError::Launch)
    }

    /// Replaces the store with the links saved at `path`. On error the
    /// previous links stay in place.
    pub fn load(&mut self, path: &Path) -> Result<LoadReport> {
        let result = persistence::load_file(&mut self.store, path);
        self.refresh();
        result
    }

    /// Writes the editable moods to `path`. The in-memory store is unaffected
    /// whether or not this succeeds.
    pub fn save(&self, path: &Path) -> Result<()> {
        persistence::save_file(&self.store, path)
    }

    fn refresh(&mut self) {
        self.show(self.current);
    }
}
