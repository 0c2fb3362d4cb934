//! URL handling module for the collector
//!
//! This module resolves relative links against the page they were found on and
//! recognizes the archive's work-page URLs (`.../cards/<authorId>/card<titleId>.html`).

mod card;
mod resolve;

pub use card::{detail_url, match_card_url, CardId};
pub use resolve::{has_scheme, resolve};
