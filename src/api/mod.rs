//! Endpoint services for the admin panel API.
//!
//! Each service wraps one area of the backend. Methods issue a single
//! signed call; mutations take the operator's [`TotpCode`](crate::TotpCode).

mod backups;
mod caching;
mod config;
mod countries;
mod groups;
mod public_api;
mod staff;
mod users;

pub use backups::{BackupCommand, BackupsService};
pub use caching::{CacheCommand, CachingService};
pub use config::AppConfigService;
pub use countries::{CountriesService, CountryCommand, CountrySetup, MAX_DIAL_CODE};
pub use groups::GroupsService;
pub use public_api::{PublicApiService, PublicQueryLogQuery, PublicSessionQuery};
pub use staff::{
    AdminSessionSort, CreatedAdmin, ResetAction, StaffLogQuery, StaffService, StaffSessionQuery,
};
pub use users::{
    AccountUpdate, Gender, NewUser, ProfileUpdate, UserCommand, UserCommandOutput, UserDetails,
    UserLogQuery, UserResetAction, UserSearchQuery, UsersService,
};
