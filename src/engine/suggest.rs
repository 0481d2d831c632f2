//! Suggestion dropdown state.
//!
//! Keyboard and pointer both drive the active entry. Keyboard wins while keys
//! are in use: once arrow keys pick an entry, pointer enter/leave events are
//! ignored until the pointer actually moves over the list.

/// Visible state of the list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListState {
	/// Hidden. Entries may still be held.
	Closed,
	/// Shown, nothing active.
	Open,
	/// Shown with an active entry.
	Navigating(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Owner {
	Keyboard,
	Pointer,
}

/// Server-ranked suggestions plus open/active state.
#[derive(Debug)]
pub struct SuggestionList {
	items: Vec<String>,
	state: ListState,
	owner: Owner,
}

impl Default for SuggestionList {
	fn default() -> Self {
		Self {
			items: Vec::new(),
			state: ListState::Closed,
			owner: Owner::Keyboard,
		}
	}
}

/// Render-ready copy of the list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SuggestionSnapshot {
	/// Entries in server order; empty while hidden.
	pub items: Vec<String>,
	/// Active entry, if any.
	pub active: Option<usize>,
}

impl SuggestionList {
	/// Replaces the entries with a freshly fetched list.
	pub fn replace(&mut self, items: Vec<String>) {
		self.items = items;
		self.owner = Owner::Keyboard;
		self.state = if self.items.is_empty() {
			ListState::Closed
		} else {
			ListState::Open
		};
	}

	/// Closes the list and forgets its entries.
	pub fn clear(&mut self) {
		self.items.clear();
		self.state = ListState::Closed;
	}

	/// Current state.
	pub fn state(&self) -> ListState {
		self.state
	}

	/// Whether the list is shown.
	pub fn is_open(&self) -> bool {
		self.state != ListState::Closed
	}

	/// Active entry index; `None` stands for "nothing selected".
	pub fn active_index(&self) -> Option<usize> {
		match self.state {
			ListState::Navigating(i) => Some(i),
			_ => None,
		}
	}

	/// Entries held, shown or not.
	pub fn items(&self) -> &[String] {
		&self.items
	}

	/// Moves the active entry down, reopening a dismissed list.
	pub fn move_down(&mut self) {
		let Some(last) = self.items.len().checked_sub(1) else {
			return;
		};
		let next = match self.state {
			ListState::Navigating(i) => (i + 1).min(last),
			_ => 0,
		};
		self.owner = Owner::Keyboard;
		self.state = ListState::Navigating(next);
	}

	/// Moves the active entry up. Does nothing while the list is closed.
	pub fn move_up(&mut self) {
		let next = match self.state {
			ListState::Closed => return,
			ListState::Open => 0,
			ListState::Navigating(i) => i.saturating_sub(1),
		};
		self.owner = Owner::Keyboard;
		self.state = ListState::Navigating(next);
	}

	/// Makes entry `index` active from a pointer hover. Ignored while the
	/// keyboard holds the active entry.
	pub fn hover(&mut self, index: usize) {
		if self.owner == Owner::Keyboard && self.active_index().is_some() {
			return;
		}
		self.point_at(index);
	}

	/// Pointer moved over entry `index`; takes the active entry back from the
	/// keyboard.
	pub fn pointer_moved(&mut self, index: usize) {
		if self.owner == Owner::Pointer && self.state == ListState::Navigating(index) {
			return;
		}
		self.point_at(index);
	}

	fn point_at(&mut self, index: usize) {
		if !self.is_open() || index >= self.items.len() {
			return;
		}
		self.owner = Owner::Pointer;
		self.state = ListState::Navigating(index);
	}

	/// Pointer left entry `index`.
	pub fn unhover(&mut self, index: usize) {
		if self.owner == Owner::Pointer && self.state == ListState::Navigating(index) {
			self.state = ListState::Open;
		}
	}

	/// Emits the active entry, or the typed text when nothing is active, and
	/// closes the list. Blank text emits nothing.
	pub fn confirm(&mut self, typed: &str) -> Option<String> {
		let chosen = match self.active_index() {
			Some(i) => self.items[i].clone(),
			None => typed.trim().to_owned(),
		};
		self.clear();
		(!chosen.trim().is_empty()).then_some(chosen)
	}

	/// Pointer pick of entry `index`.
	///
	/// Resolves against held entries even when the list was dismissed a
	/// moment earlier, so an outside-click dismissal racing the pick cannot
	/// swallow it.
	pub fn select(&mut self, index: usize) -> Option<String> {
		let chosen = self.items.get(index).cloned()?;
		self.clear();
		Some(chosen)
	}

	/// Hides the list, keeping its entries.
	pub fn dismiss(&mut self) {
		self.state = ListState::Closed;
	}

	/// Shows held entries again (input regained focus).
	pub fn reopen(&mut self) {
		if self.state == ListState::Closed && !self.items.is_empty() {
			self.state = ListState::Open;
		}
	}

	/// What the dropdown should draw.
	pub fn snapshot(&self) -> SuggestionSnapshot {
		if !self.is_open() {
			return SuggestionSnapshot::default();
		}
		SuggestionSnapshot {
			items: self.items.clone(),
			active: self.active_index(),
		}
	}
}
