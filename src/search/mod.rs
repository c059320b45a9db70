//! Search layer facade.
//!
//! - **[`debounce`]**: keystroke debouncing with an explicit clock.
//! - **[`dispatch`]**: gated, sequence-numbered lookup dispatch ("skip" below the gate).
//! - **[`categorize`]**: fixed-order grouping and the flat index the cursor moves over.
//! - **[`provider`]**: the search capability trait and its error type.
//! - **[`worker`]**: background thread that runs lookups and watches for data changes.

pub mod categorize;
pub mod debounce;
pub mod dispatch;
pub mod provider;
pub mod worker;
