use std::borrow::Cow;

use thiserror::Error;

use crate::models::{LinkRecord, Mood};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("'mixed' is derived from the other moods and cannot be edited directly")]
    DerivedMood,
    #[error("no item #{} in '{mood}' (it has {len})", .index + 1)]
    IndexOutOfRange { mood: Mood, index: usize, len: usize },
}

/// Mood playlists. The three editable moods always exist; `mixed` is
/// computed from them on every read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaylistStore {
    lists: [Vec<LinkRecord>; 3],
}

impl PlaylistStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Links of `mood`. For `mixed` this is `happy ++ chill ++ energetic`
    /// evaluated now.
    pub fn get(&self, mood: Mood) -> Cow<'_, [LinkRecord]> {
        match mood.slot() {
            Some(slot) => Cow::Borrowed(&self.lists[slot]),
            None => Cow::Owned(self.lists.concat()),
        }
    }

    /// Like [`get`](Self::get) for a raw key. Unknown keys are empty.
    pub fn get_by_key(&self, key: &str) -> Cow<'_, [LinkRecord]> {
        match key.parse::<Mood>() {
            Ok(mood) => self.get(mood),
            Err(_) => Cow::Borrowed(&[]),
        }
    }

    /// Number of links in `mood`; for `mixed`, the total across all moods.
    pub fn len(&self, mood: Mood) -> usize {
        match mood.slot() {
            Some(slot) => self.lists[slot].len(),
            None => self.lists.iter().map(Vec::len).sum(),
        }
    }

    /// True when no editable mood holds a link.
    pub fn is_empty(&self) -> bool {
        self.lists.iter().all(Vec::is_empty)
    }

    /// Appends `record` to the end of an editable mood.
    pub fn add(&mut self, mood: Mood, record: LinkRecord) -> Result<(), StoreError> {
        let slot = mood.slot().ok_or(StoreError::DerivedMood)?;
        log::debug!("add {} to {}", record.summary(), mood);
        self.lists[slot].push(record);
        Ok(())
    }

    /// Removes the record at `index`. See [`remove_item`](Self::remove_item).
    pub fn remove(&mut self, mood: Mood, index: usize) -> Result<Option<LinkRecord>, StoreError> {
        let shown = match mood.slot() {
            Some(slot) => match self.lists[slot].get(index) {
                Some(record) => record.clone(),
                None => {
                    return Err(StoreError::IndexOutOfRange {
                        mood,
                        index,
                        len: self.lists[slot].len(),
                    })
                }
            },
            None => return Ok(None),
        };
        self.remove_item(mood, index, &shown)
    }

    /// Removes `shown`, which a view displayed at `index`.
    ///
    /// The first entry equal to `shown` is removed; if none matches, the
    /// entry at `index` is removed instead. `mixed` owns no data, so nothing
    /// changes there and `Ok(None)` is returned.
    pub fn remove_item(
        &mut self,
        mood: Mood,
        index: usize,
        shown: &LinkRecord,
    ) -> Result<Option<LinkRecord>, StoreError> {
        let Some(slot) = mood.slot() else {
            log::debug!("remove from mixed leaves the source lists untouched");
            return Ok(None);
        };
        let list = &mut self.lists[slot];

        let position = match list.iter().position(|r| r == shown) {
            Some(pos) => pos,
            None if index < list.len() => index,
            None => {
                return Err(StoreError::IndexOutOfRange {
                    mood,
                    index,
                    len: list.len(),
                })
            }
        };

        let removed = list.remove(position);
        log::debug!("removed {} from {}", removed.summary(), mood);
        Ok(Some(removed))
    }

    /// Empties every editable mood.
    pub fn clear(&mut self) {
        self.lists.iter_mut().for_each(Vec::clear);
    }

    /// Editable links in persistence order.
    pub fn iter(&self) -> impl Iterator<Item = (Mood, &LinkRecord)> + '_ {
        Mood::EDITABLE
            .into_iter()
            .zip(self.lists.iter())
            .flat_map(|(mood, list)| list.iter().map(move |record| (mood, record)))
    }
}
