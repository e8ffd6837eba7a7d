//! The signup, deadline and access-code workflow.
//!
//! Every operation takes a sea-orm connection and, where the calendar matters,
//! an explicit `today` so handlers and tests agree on what "now" means.

pub mod access;
pub mod claim;
pub mod deadlines;
pub mod ledger;
pub mod notify;
pub mod roster;

#[cfg(test)]
pub(crate) mod testing;
