//! Input debouncing.
//!
//! The scheduler never owns a timer. Each accepted keystroke yields a
//! [`Ticket`]; the host arms a timer for [`QUIET_PERIOD`] and hands the ticket
//! back through [`Debouncer::fire`] once it expires. Only the newest pending
//! ticket produces text, so a timer that could not be cleared in time fires
//! into nothing.

use std::time::Duration;

/// Quiet period after the last keystroke before a trigger fires.
pub const QUIET_PERIOD: Duration = Duration::from_millis(180);

/// Handle for one scheduled trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

#[derive(Debug)]
struct Pending {
	ticket: Ticket,
	text: String,
}

/// Coalesces rapid input changes into a single delayed trigger.
#[derive(Debug, Default)]
pub struct Debouncer {
	issued: u64,
	pending: Option<Pending>,
}

impl Debouncer {
	/// Schedules a trigger for `text`, discarding any earlier pending one.
	///
	/// Blank input cancels the pending trigger and returns `None`: nothing
	/// should be armed.
	pub fn on_input(&mut self, text: &str) -> Option<Ticket> {
		if text.trim().is_empty() {
			self.cancel();
			return None;
		}
		self.issued += 1;
		let ticket = Ticket(self.issued);
		self.pending = Some(Pending {
			ticket,
			text: text.to_owned(),
		});
		Some(ticket)
	}

	/// Consumes the trigger for `ticket` if it is still the pending one.
	pub fn fire(&mut self, ticket: Ticket) -> Option<String> {
		match self.pending.take() {
			Some(p) if p.ticket == ticket => Some(p.text),
			other => {
				self.pending = other;
				None
			}
		}
	}

	/// Drops the pending trigger, if any.
	pub fn cancel(&mut self) {
		self.pending = None;
	}

	/// Whether a trigger is waiting for its quiet period to elapse.
	pub fn is_pending(&self) -> bool {
		self.pending.is_some()
	}
}
