// crates/edon-evaluator/src/lib.rs
// ============================================================================
// Module: EDON Policy Evaluator
// Description: The pure governance function that turns a proposed action
// and its intent contract into a decision.
// Purpose: Isolate policy logic from I/O so it can be tested and reasoned
// about as a pure function of its inputs.
// ============================================================================

//! ## Overview
//! `edon-evaluator` has exactly one public entry point worth calling in
//! anger: [`evaluate`]. Everything else in this crate exists to support
//! it: the sliding-window [`history::ActionHistory`] it consults for
//! loop/rate checks, and the private rule functions in `rules` that
//! implement each step of the fourteen-step evaluation order in turn.
//! Nothing here touches the filesystem, the network, or a clock other
//! than the one passed in.

mod history;
mod rules;

pub use history::ActionHistory;
pub use rules::evaluate;
