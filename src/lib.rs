//! Geographic view of a peer-to-peer network's nodes
//!
//! Raw node snapshots are sanitized, split into clearnet and hidden nodes,
//! aggregated into hexagonal density bins and given synthetic positions
//! where no real location exists. A [`session::Session`] owns one loaded
//! snapshot and answers hover, click and filter requests from a renderer.

pub mod classify;
pub mod colors;
pub mod config;
pub mod demo;
pub mod globe;
pub mod hexbin;
pub mod placement;
pub mod record;
pub mod report;
pub mod rollup;
pub mod sanitize;
pub mod session;
pub mod settings;
pub mod source;
pub mod terminal;
pub mod view;

pub use session::Session;
pub use settings::Settings;
