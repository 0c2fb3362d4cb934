//! Integration tests for the collector
//!
//! These tests use wiremock to serve listing pages, detail pages and
//! archives, and run the full pipeline end-to-end against a temporary store.

mod collect_tests;
mod support;
