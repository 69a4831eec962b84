//! Report bundles: one timestamped directory per run holding raw artifacts, parsed metrics and
//! a markdown summary, plus listing and pairwise comparison.

pub mod compare;
pub mod store;
pub mod summary;

pub use compare::{compare, Comparison, DeltaRow};
pub use store::{bundle_name, sanitize_label, Bundle, BundleMeta, BundleStore, BundleWriter};
pub use summary::render_summary;
