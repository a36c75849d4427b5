//! Elevation resolution cascade.
//!
//! The [`Resolver`] answers "what is the elevation here?" by consulting, in
//! order, the device's live altitude, the spatial cache and a network
//! elevation service. Each source is asked at most once per call and every
//! external call carries its own timeout.
//!
//! # Example
//!
//! ```ignore
//! let resolution = resolver
//!     .resolve_with_progress(|stage, message| println!("{}: {}", stage.name(), message))
//!     .await?;
//! ```

mod resolver;
mod types;

pub use resolver::{CascadeConfig, Resolver};
pub use types::{
    FailureKind, Resolution, ResolveError, ResolveStage, DEFAULT_POSITION_TIMEOUT,
};
