//! # tidy-lab
//!
//! Turns messy, hand-edited lab spreadsheets into one canonical tidy table
//! that plotting code can rely on.
//!
//! ```no_run
//! use tidy_lab::{clean, Config};
//! use tidy_lab::data::loader::load_file;
//!
//! # fn main() -> anyhow::Result<()> {
//! let table = load_file("plate_reader.csv".as_ref())?;
//! let config = Config::default()
//!     .with_graph("box")
//!     .with_independent("Group")
//!     .with_dependent("Conc. (mg/ml)");
//!
//! let report = clean(table, &config)?;
//! for d in report.diagnostics.entries() {
//!     println!("{d}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The cleaning core ([`clean`]) does no I/O. Loading and export live in
//! [`data`] and are only used by the binaries and callers that want them.

pub mod clean;
pub mod config;
pub mod data;
pub mod error;

pub use clean::{clean, CleanReport, Diagnostic, Diagnostics, Pipeline, Stage};
pub use config::{Config, TransformModel};
pub use data::model::{Cell, Column, Table};
pub use error::{CleanError, Result};
