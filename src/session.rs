use crate::data::Cat;
use crate::stack::{card_transform, CardTransform};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Swiping,
    Summary,
}

/// A button-triggered swipe waiting for the card to animate out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSwipe {
    pub liked: bool,
    pub target_id: String,
}

/// Stamp of one fetch-to-summary session. Bumped on every load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SessionToken(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Ready(usize),
    Empty,
    /// The completion belonged to an earlier session and was dropped.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwipeOutcome {
    pub cursor: usize,
    pub liked: bool,
    pub exhausted: bool,
}

#[derive(Debug, Clone)]
pub struct SwipeSession {
    phase: Phase,
    items: Vec<Cat>,
    liked: Vec<Cat>,
    liked_indices: Vec<usize>,
    cursor: usize,
    pending_swipe: Option<PendingSwipe>,
    selected: Option<Cat>,
    token: SessionToken,
}

impl Default for SwipeSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SwipeSession {
    pub fn new() -> Self {
        Self {
            phase: Phase::Loading,
            items: Vec::new(),
            liked: Vec::new(),
            liked_indices: Vec::new(),
            cursor: 0,
            pending_swipe: None,
            selected: None,
            token: SessionToken(0),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn items(&self) -> &[Cat] {
        &self.items
    }

    pub fn liked(&self) -> &[Cat] {
        &self.liked
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn pending_swipe(&self) -> Option<&PendingSwipe> {
        self.pending_swipe.as_ref()
    }

    pub fn selected(&self) -> Option<&Cat> {
        self.selected.as_ref()
    }

    pub fn token(&self) -> SessionToken {
        self.token
    }

    pub fn current(&self) -> Option<&Cat> {
        self.items.get(self.cursor)
    }

    pub fn remaining(&self) -> usize {
        self.items.len() - self.cursor
    }

    /// Throws the current session away and enters `Loading`. The returned
    /// token must accompany the matching `complete_load`.
    pub fn begin_load(&mut self) -> SessionToken {
        self.token = SessionToken(self.token.0 + 1);
        self.phase = Phase::Loading;
        self.items.clear();
        self.liked.clear();
        self.liked_indices.clear();
        self.cursor = 0;
        self.pending_swipe = None;
        self.selected = None;
        self.token
    }

    pub fn complete_load(&mut self, token: SessionToken, batch: Vec<Cat>) -> LoadOutcome {
        if token != self.token || self.phase != Phase::Loading {
            return LoadOutcome::Stale;
        }

        self.cursor = 0;
        self.liked.clear();
        self.liked_indices.clear();

        if batch.is_empty() {
            self.items.clear();
            self.phase = Phase::Summary;
            LoadOutcome::Empty
        } else {
            let count = batch.len();
            self.items = batch;
            self.phase = Phase::Swiping;
            LoadOutcome::Ready(count)
        }
    }

    pub fn swipe(&mut self, liked: bool) -> Option<SwipeOutcome> {
        if self.phase != Phase::Swiping || self.cursor >= self.items.len() {
            return None;
        }

        let index = self.cursor;
        if liked && !self.liked_indices.contains(&index) {
            self.liked.push(self.items[index].clone());
            self.liked_indices.push(index);
        }
        self.cursor += 1;

        if self
            .pending_swipe
            .as_ref()
            .map_or(false, |pending| pending.target_id == self.items[index].id)
        {
            self.pending_swipe = None;
        }

        Some(SwipeOutcome {
            cursor: self.cursor,
            liked,
            exhausted: self.cursor == self.items.len(),
        })
    }

    pub fn request_swipe(&mut self, liked: bool) -> Option<&PendingSwipe> {
        if self.phase != Phase::Swiping {
            return None;
        }
        let target_id = self.current()?.id.clone();
        self.pending_swipe = Some(PendingSwipe { liked, target_id });
        self.pending_swipe.as_ref()
    }

    pub fn clear_pending_swipe(&mut self) -> Option<PendingSwipe> {
        self.pending_swipe.take()
    }

    /// Moves to `Summary` once every card of the session `token` is gone.
    /// Returns whether the phase changed.
    pub fn finish(&mut self, token: SessionToken) -> bool {
        if token != self.token
            || self.phase != Phase::Swiping
            || self.cursor != self.items.len()
        {
            return false;
        }
        self.phase = Phase::Summary;
        true
    }

    pub fn select(&mut self, cat: &Cat) -> bool {
        match self.items.iter().find(|item| *item == cat) {
            Some(item) => {
                self.selected = Some(item.clone());
                true
            }
            None => false,
        }
    }

    pub fn deselect(&mut self) -> Option<Cat> {
        self.selected.take()
    }

    pub fn card_transform(&self, index: i64) -> CardTransform {
        card_transform(index, self.cursor as i64)
    }
}
