//! End-to-end tests: the full pipeline against a fake site and an
//! in-memory store.

mod fake_site;
mod pipeline;
mod results;
