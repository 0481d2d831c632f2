//! Generation gating for cancellable lookups.
//!
//! Every lookup class (suggestions, graph, search, upload) owns one
//! [`FetchGate`]. Issuing a lookup bumps the gate's generation; a resolution
//! may touch visible state only while its generation is still the newest one
//! issued. Cancellation is logical: superseded lookups run to completion and
//! their outcome is dropped on arrival.

use std::fmt;

/// Identifies one issued lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl fmt::Display for Generation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// A suggestion lookup tagged with the generation it was issued under.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SuggestionRequest {
	/// Text the suggestions are requested for.
	pub text: String,
	/// Generation the request was issued under.
	pub generation: Generation,
}

/// What a resolution means for visible state.
#[derive(Debug, PartialEq)]
pub enum Resolution<T, E> {
	/// Current generation succeeded: apply `T`.
	Apply(T),
	/// Current generation failed: report `E`, keep visible state.
	Failed(E),
	/// A newer generation exists (or the gate was invalidated): drop silently.
	Stale,
}

/// Issues generations and filters resolutions for one lookup class.
#[derive(Debug, Default)]
pub struct FetchGate {
	latest: u64,
	in_flight: bool,
}

impl FetchGate {
	/// Starts a new lookup, superseding any outstanding one.
	pub fn issue(&mut self) -> Generation {
		self.latest += 1;
		self.in_flight = true;
		Generation(self.latest)
	}

	/// Starts a suggestion lookup for `text`.
	pub fn issue_request(&mut self, text: impl Into<String>) -> SuggestionRequest {
		SuggestionRequest {
			text: text.into(),
			generation: self.issue(),
		}
	}

	/// Whether `generation` is the newest one issued and not invalidated.
	pub fn is_current(&self, generation: Generation) -> bool {
		generation.0 == self.latest && self.in_flight
	}

	/// Filters the outcome of the lookup issued under `generation`.
	pub fn resolve<T, E>(&mut self, generation: Generation, outcome: Result<T, E>) -> Resolution<T, E> {
		if !self.is_current(generation) {
			return Resolution::Stale;
		}
		self.in_flight = false;
		match outcome {
			Ok(value) => Resolution::Apply(value),
			Err(err) => Resolution::Failed(err),
		}
	}

	/// Makes every outstanding generation stale without issuing a new lookup.
	pub fn invalidate(&mut self) {
		self.latest += 1;
		self.in_flight = false;
	}

	/// Whether the current lookup is still outstanding.
	pub fn is_loading(&self) -> bool {
		self.in_flight
	}
}
