//! Data core of the TechFlow news portal: the content store, the reader-side
//! projections, the authoring console and persistence.

pub mod admin;
pub mod display;
pub mod error;
pub mod markdown;
pub mod persist;
pub mod portal;
pub mod projection;
pub mod settings;
pub mod source;
pub mod store;
pub mod structures;

pub use error::{ContentError, Result};
pub use store::ContentStore;
