//! # catalog_storage_gc - Storage maintenance for an image catalog
//!
//! Offline jobs that keep the file storage of a managed catalog backend in
//! line with the records that point into it.
//!
//! ## Architecture Layers
//!
//! - **Domain**: blob ids, referencing record kinds, the reference table and
//!   the authorization gate
//! - **Application**: ports (interfaces), the garbage collector and the image
//!   optimizer
//! - **Infrastructure**: the HTTP backend adapter, an in-memory backend, the
//!   WebP transcoder and the terminal prompt
//!
//! ## Jobs
//!
//! - Garbage collection: enumerate every stored blob, scan every record kind
//!   for references and delete the blobs nobody points at (dry run by
//!   default, confirmation required)
//! - Storage statistics: blob counts and sizes per content type
//! - Image optimization: re-encode referenced images to WebP and repoint the
//!   owning records
//!
//! ## Example Usage
//!
//! ```no_run
//! use catalog_storage_gc::{application::builder::ApplicationBuilder, Config};
//! use catalog_storage_gc::application::gc::RunMode;
//! use catalog_storage_gc::ports::FixedConfirmation;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let gc = ApplicationBuilder::new(Config::from_env())
//!     .with_http_backend()?
//!     .build_gc()?;
//! let summary = gc.run(RunMode::DryRun, None, &FixedConfirmation(false)).await?;
//! println!("{}", summary.summary());
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod logging;

pub use application::ports;
pub use config::Config;
pub use domain::errors as domain_errors;
pub use domain::{entities, value_objects};
