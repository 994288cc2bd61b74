//! Domain models and types for Prvotkar.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`RegistrationId`], [`MunicipalityId`], [`RegionId`])
//! - **Domain models** ([`Subject`], [`Municipality`], [`Coordinates`])
//! - **Error types** ([`PrvotkarError`], [`HttpError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, PrvotkarError>`]:
//!
//! ```rust
//! use prvotkar::domain::{PrvotkarError, Result};
//!
//! fn example() -> Result<()> {
//!     // Errors are automatically converted using the ? operator
//!     let _config = prvotkar::config::load_config("prvotkar.toml")?;
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod ids;
pub mod region;
pub mod result;
pub mod subject;

// Re-export commonly used types for convenience
pub use errors::{HttpError, PrvotkarError};
pub use ids::{MunicipalityId, RegionId, RegistrationId};
pub use region::{Municipality, Region};
pub use result::Result;
pub use subject::{
    Coordinates, EntityType, GeocodeCandidate, GeocodeStatus, GeocodeUpdate, StoredSubject,
    Subject,
};
