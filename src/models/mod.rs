//! Data models for the admin panel API.
//!
//! Models are organized by domain:
//!
//! - [`primitives`] - Typed ids such as `AdminId`, `UserId`, `CacheObjectId`
//! - [`enums`] - HTTP methods, search filters, download types
//! - [`envelope`] - Response envelope pieces: exceptions, warnings, call metadata
//! - [`caching`] - Caching engine models
//! - [`backup`] - Database backup models
//! - [`staff`] - Staff accounts, privileges, sessions and logs
//! - [`user`] - End-user accounts, profiles, baggage, groups and logs
//! - [`public_api`] - Public API sessions and queries
//! - [`country`] - Country list

pub mod primitives;
pub mod enums;
pub mod envelope;
pub mod caching;
pub mod backup;
pub mod staff;
pub mod user;
pub mod public_api;
pub mod country;

// Re-export commonly used types
pub use primitives::*;
pub use enums::*;
pub use envelope::*;
pub use caching::*;
pub use backup::*;
pub use staff::*;
pub use user::*;
pub use public_api::*;
pub use country::*;
