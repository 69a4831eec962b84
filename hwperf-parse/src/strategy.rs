//! Ordered fallback cascades.
//!
//! Vendor reports change layout between tool versions. Each known layout gets one
//! [`Strategy`]; a cascade is tried in order and the hits are logged by name.

use regex::Regex;
use tracing::debug;

/// One named extraction technique.
pub struct Strategy<T, C: ?Sized> {
	pub name: &'static str,
	pub apply: fn(&str, &C) -> Option<T>,
}

impl<T, C: ?Sized> Strategy<T, C> {
	pub const fn new(name: &'static str, apply: fn(&str, &C) -> Option<T>) -> Self { Self { name, apply } }
}

/// Values where a later strategy may fill what an earlier one left empty.
pub trait FillMissing {
	fn fill_missing(&mut self, other: Self);
	fn is_complete(&self) -> bool;
}

/// First strategy that returns anything wins.
pub fn first_hit<T, C: ?Sized>(chain: &[Strategy<T, C>], text: &str, ctx: &C) -> Option<T> {
	chain.iter().find_map(|s| {
		let out = (s.apply)(text, ctx);
		if out.is_some() { debug!(strategy = s.name, "strategy hit"); }
		out
	})
}

/// Run strategies in order, each one only filling fields still missing.
pub fn fill_in_order<T: Default + FillMissing, C: ?Sized>(chain: &[Strategy<T, C>], text: &str, ctx: &C) -> T {
	let mut acc = T::default();
	for s in chain {
		if acc.is_complete() { break; }
		if let Some(found) = (s.apply)(text, ctx) {
			debug!(strategy = s.name, "strategy hit");
			acc.fill_missing(found);
		}
	}
	acc
}

/// Compile a pattern literal.
#[allow(clippy::expect_used)]
pub(crate) fn compiled(pattern: &str) -> Regex { Regex::new(pattern).expect("pattern literal compiles") }

pub(crate) fn fill<T>(slot: &mut Option<T>, value: Option<T>) {
	if slot.is_none() { *slot = value; }
}

/// Cells of a `| a | b | c |` row, trimmed. `None` for lines that are not table rows.
pub(crate) fn pipe_cells(line: &str) -> Option<Vec<&str>> {
	let line = line.trim();
	if !line.starts_with('|') { return None; }
	let mut cells: Vec<&str> = line.split('|').map(str::trim).collect();
	// leading and trailing pieces around the outer pipes
	cells.remove(0);
	cells.pop();
	Some(cells)
}

/// First capture group of the first match, as a number.
pub(crate) fn capture_f64(re: &Regex, text: &str) -> Option<f64> { re.captures(text).and_then(|c| number(&c[1])) }

pub(crate) fn number(s: &str) -> Option<f64> { s.trim().parse::<f64>().ok().filter(|v| v.is_finite()) }
