//! State module for tracking entries through the pipeline
//!
//! # Components
//!
//! - `Entry`: One discovered work with its identifying and resolved metadata
//! - `EntryState`: Where an entry is in the discover -> resolve -> extract -> index chain

mod entry;
mod entry_state;

// Re-export main types
pub use entry::Entry;
pub use entry_state::EntryState;
