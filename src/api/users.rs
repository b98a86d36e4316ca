//! End-user accounts service.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use crate::client::paginated::{PaginatedStream, PaginatedStreamBuilder, DEFAULT_PAGE_SIZE};
use crate::client::{ClientInner, SearchPage};
use crate::models::{
    ArchivedFilter, BaggageItem, GroupId, SortOrder, UserAccount, UserActivityLog, UserId,
    UserProfile, UserStatus, UserStatusFilter,
};
use crate::totp::TotpCode;
use crate::validate::{
    is_valid_phone, validate_baggage_key, validate_baggage_value, validate_country_code,
    validate_email, validate_log_filter, validate_log_flags, validate_password, validate_text,
    validate_username, USER_EMAIL_MAX_LEN,
};
use crate::{Error, Result};

const USER_ENDPOINT: &str = "/auth/users/user";
const PROFILES_ENDPOINT: &str = "/auth/users/profiles";
const BAGGAGE_ENDPOINT: &str = "/auth/users/baggage";

/// Service for searching and inspecting user accounts.
pub struct UsersService {
    inner: Arc<ClientInner>,
}

/// User account search.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSearchQuery {
    /// Username, e-mail or phone to match
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Username of the referrer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    /// Group to search in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
    /// Archived accounts handling
    pub archived: ArchivedFilter,
    /// Account status filter
    pub status: UserStatusFilter,
    /// Sort direction
    pub sort: SortOrder,
    /// Page number, from 1
    pub page: u32,
    /// Rows per page
    pub per_page: u32,
}

impl Default for UserSearchQuery {
    fn default() -> Self {
        Self {
            search: None,
            referrer: None,
            group_id: None,
            archived: ArchivedFilter::default(),
            status: UserStatusFilter::default(),
            sort: SortOrder::default(),
            page: 1,
            per_page: DEFAULT_PAGE_SIZE,
        }
    }
}

impl UserSearchQuery {
    fn validate(&self) -> Result<()> {
        if let Some(search) = &self.search {
            validate_text(search, false)?;
        }
        if let Some(referrer) = self.referrer.as_deref().filter(|r| !r.is_empty()) {
            validate_username(referrer)?;
        }
        Ok(())
    }
}

/// Activity log search for one user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLogQuery {
    /// Username whose log to search; empty searches all users
    pub username: String,
    /// Flags, separated by spaces or commas
    pub flags: String,
    /// Log message filter
    pub filter: String,
    /// Page number, from 1
    pub page: u32,
    /// Rows per page
    pub per_page: u32,
}

impl Default for UserLogQuery {
    fn default() -> Self {
        Self {
            username: String::new(),
            flags: String::new(),
            filter: String::new(),
            page: 1,
            per_page: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Fields of a new user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Group to place the account in
    pub group_id: GroupId,
    /// Username
    pub username: String,
    /// Optional e-mail address
    pub email: Option<String>,
    /// Optional phone number, `+<country>.<number>`
    pub phone: Option<String>,
}

/// Replacement account fields for [`UsersService::update_account`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountUpdate {
    /// Group membership
    pub group_id: GroupId,
    /// `Active` or `Disabled`
    pub status: UserStatus,
    /// Username
    pub username: String,
    /// E-mail address; `None` clears it
    pub email: Option<String>,
    /// Phone number; `None` clears it
    pub phone: Option<String>,
    /// ISO 3166-1 alpha-3 country; `None` clears it
    pub country: Option<String>,
}

/// Gender recorded on a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Gender {
    /// Other or undisclosed
    #[serde(rename = "o")]
    Other,
    /// Male
    #[serde(rename = "m")]
    Male,
    /// Female
    #[serde(rename = "f")]
    Female,
}

/// Replacement profile fields for [`UsersService::update_profile`].
///
/// Empty strings clear a field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Gender; `None` leaves it unset
    pub gender: Option<Gender>,
    /// Date of birth
    pub dob: Option<NaiveDate>,
    /// Address line 1
    pub address1: String,
    /// Address line 2
    pub address2: String,
    /// Postal code
    pub postal_code: String,
    /// City
    pub city: String,
    /// State or province
    pub state: String,
}

/// Maintenance actions on a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UserResetAction {
    /// Recompute the account checksum
    #[serde(rename = "checksum")]
    Checksum,
    /// Turn off two-factor authentication
    #[serde(rename = "disable2fa")]
    DisableTwoFactor,
    /// Re-encrypt stored credentials
    #[serde(rename = "re_credentials")]
    Credentials,
    /// Re-encrypt stored parameters
    #[serde(rename = "re_params")]
    Params,
}

/// A user mutation awaiting TOTP confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    /// Create an account
    Create(NewUser),
    /// Replace account fields
    UpdateAccount {
        /// Account to edit
        user: UserId,
        /// New fields
        update: AccountUpdate,
    },
    /// Set a temporary password
    ResetPassword {
        /// Account to edit
        user: UserId,
        /// Temporary password
        password: String,
        /// Flag recorded with the change
        flag: String,
    },
    /// Mark e-mail and phone verified or not
    SetVerifications {
        /// Account to edit
        user: UserId,
        /// E-mail verified
        email: bool,
        /// Phone verified
        phone: bool,
    },
    /// Run a maintenance action
    Reset {
        /// Account to edit
        user: UserId,
        /// Action to run
        action: UserResetAction,
    },
    /// Change or clear the referrer
    SetReferrer {
        /// Account to edit
        user: UserId,
        /// Referrer's username
        referrer: Option<String>,
    },
    /// Archive the account
    Delete {
        /// Account to archive
        user: UserId,
    },
    /// Bring an archived account back
    Restore {
        /// Account to restore
        user: UserId,
    },
    /// Replace profile fields
    UpdateProfile {
        /// Profile owner
        user: UserId,
        /// New fields
        update: ProfileUpdate,
    },
    /// Mark identity and address verified or not
    SetProfileVerifications {
        /// Profile owner
        user: UserId,
        /// Identity verified
        identity: bool,
        /// Address verified
        address: bool,
    },
    /// Store a baggage item
    SetBaggage {
        /// Owner
        user: UserId,
        /// Item key
        key: String,
        /// Item value
        value: String,
    },
    /// Remove a baggage item
    DeleteBaggage {
        /// Owner
        user: UserId,
        /// Item key
        key: String,
    },
}

/// What a confirmed [`UserCommand`] produced.
#[derive(Debug, Clone, PartialEq)]
pub enum UserCommandOutput {
    /// New account id
    Created(UserId),
    /// Account as saved
    Account(UserAccount),
    /// Profile as saved
    Profile(UserProfile),
    /// Server message from a maintenance action
    Message(Option<String>),
    /// Nothing to report
    Done,
}

/// A user account with the integrity errors the server found loading it.
#[derive(Debug, Clone, PartialEq)]
pub struct UserDetails {
    /// The account
    pub account: UserAccount,
    /// Problems reported while loading (e.g. checksum mismatch)
    pub errors: Vec<String>,
}

impl UsersService {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// Search user accounts, one page.
    pub async fn search(&self, query: &UserSearchQuery) -> Result<SearchPage<UserAccount>> {
        query.validate()?;
        self.inner.get_field("/auth/users", query, "users").await
    }

    /// Stream every matching user account.
    pub fn search_stream(&self, query: UserSearchQuery) -> PaginatedStream<UserAccount> {
        match query.validate() {
            Ok(()) => PaginatedStreamBuilder::new(self.inner.clone(), "/auth/users", "users")
                .per_page(query.per_page)
                .build_with_query(&query),
            Err(e) => PaginatedStream::failed(e),
        }
    }

    /// Get one account.
    pub async fn get(&self, id: UserId) -> Result<UserDetails> {
        let success = self.inner.get("/auth/users/user", &json!({"user": id})).await?;
        Ok(UserDetails {
            account: success.field("user")?,
            errors: success.optional_field("errors")?.unwrap_or_default(),
        })
    }

    /// Resolve usernames for a set of user ids. Unknown ids are left out.
    pub async fn usernames(&self, ids: &[UserId]) -> Result<BTreeMap<UserId, String>> {
        if ids.is_empty() {
            return Ok(BTreeMap::new());
        }
        let joined = ids
            .iter()
            .map(UserId::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let raw: BTreeMap<String, String> = self
            .inner
            .get_field(
                "/auth/users",
                &json!({"action": "usernames", "id": joined}),
                "usernames",
            )
            .await?;

        Ok(raw
            .into_iter()
            .filter_map(|(id, username)| match id.parse::<u64>() {
                Ok(id) if id > 0 && validate_username(&username).is_ok() => {
                    Some((UserId::new(id), username))
                }
                _ => {
                    debug!(id, "ignoring unusable username entry");
                    None
                }
            })
            .collect())
    }

    /// Create an account. Returns the id the server assigned.
    pub async fn create(&self, user: &NewUser, totp: &TotpCode) -> Result<UserId> {
        require_group(user.group_id)?;
        validate_username(&user.username)?;
        let email = optional_email(user.email.as_deref())?;
        let phone = optional_phone(user.phone.as_deref())?;

        let id: UserId = self
            .inner
            .put(
                USER_ENDPOINT,
                &json!({
                    "groupId": user.group_id,
                    "username": user.username,
                    "email": email,
                    "phone": phone,
                    "totp": totp
                }),
            )
            .await?
            .field("id")?;
        if id.get() == 0 {
            return Err(Error::MalformedResponse(
                "Expected a new user id in response".to_string(),
            ));
        }

        info!(user = %id, username = %user.username, "user account created");
        Ok(id)
    }

    /// Replace account fields. Returns the account as saved.
    pub async fn update_account(
        &self,
        id: UserId,
        update: &AccountUpdate,
        totp: &TotpCode,
    ) -> Result<UserAccount> {
        require_group(update.group_id)?;
        if !matches!(update.status, UserStatus::Active | UserStatus::Disabled) {
            return Err(Error::InvalidInput("Invalid user status".to_string()));
        }
        validate_username(&update.username)?;
        let email = optional_email(update.email.as_deref())?;
        let phone = optional_phone(update.phone.as_deref())?;
        let country = match update.country.as_deref().filter(|c| !c.is_empty()) {
            Some(country) => validate_country_code(country, 3)
                .map_err(|_| Error::InvalidInput("Invalid user country".to_string()))?,
            None => String::new(),
        };

        let account: UserAccount = self
            .inner
            .post(
                USER_ENDPOINT,
                &json!({
                    "user": id,
                    "action": "account",
                    "groupId": update.group_id,
                    "status": update.status,
                    "username": update.username,
                    "email": email,
                    "phone": phone,
                    "country": country,
                    "totp": totp
                }),
            )
            .await?
            .field("user")?;
        info!(user = %id, "user account updated");
        Ok(account)
    }

    /// Replace the password with a temporary one.
    pub async fn reset_password(
        &self,
        id: UserId,
        password: &str,
        flag: &str,
        totp: &TotpCode,
    ) -> Result<()> {
        validate_password(password, "Temporary password")?;
        self.inner
            .post(
                USER_ENDPOINT,
                &json!({
                    "user": id,
                    "action": "password",
                    "password": password,
                    "flag": flag,
                    "totp": totp
                }),
            )
            .await?;
        info!(user = %id, "user password reset");
        Ok(())
    }

    /// Mark the e-mail address and phone number verified or not.
    pub async fn set_verifications(
        &self,
        id: UserId,
        email: bool,
        phone: bool,
        totp: &TotpCode,
    ) -> Result<()> {
        self.inner
            .post(
                USER_ENDPOINT,
                &json!({
                    "user": id,
                    "action": "verifications",
                    "emailVerified": email.to_string(),
                    "phoneVerified": phone.to_string(),
                    "totp": totp
                }),
            )
            .await?;
        info!(user = %id, email, phone, "user verifications updated");
        Ok(())
    }

    /// Run a maintenance action. Returns the server's message, if any.
    pub async fn reset(
        &self,
        id: UserId,
        action: UserResetAction,
        totp: &TotpCode,
    ) -> Result<Option<String>> {
        let message = self
            .inner
            .post(
                USER_ENDPOINT,
                &json!({"user": id, "action": action, "totp": totp}),
            )
            .await?
            .optional_field::<String>("success")?
            .filter(|m| !m.is_empty());
        info!(user = %id, ?action, "user reset action executed");
        Ok(message)
    }

    /// Change the referrer; `None` or an empty name clears it.
    pub async fn set_referrer(
        &self,
        id: UserId,
        referrer: Option<&str>,
        totp: &TotpCode,
    ) -> Result<()> {
        let referrer = referrer.filter(|r| !r.is_empty()).unwrap_or("");
        if !referrer.is_empty() {
            validate_username(referrer)?;
        }
        self.inner
            .post(
                USER_ENDPOINT,
                &json!({
                    "user": id,
                    "action": "referrer",
                    "referrer": referrer,
                    "totp": totp
                }),
            )
            .await?;
        info!(user = %id, "user referrer updated");
        Ok(())
    }

    /// Archive an account.
    pub async fn delete(&self, id: UserId, totp: &TotpCode) -> Result<()> {
        self.archive_action(id, "delete", totp).await
    }

    /// Restore an archived account.
    pub async fn restore(&self, id: UserId, totp: &TotpCode) -> Result<()> {
        self.archive_action(id, "restore", totp).await
    }

    async fn archive_action(&self, id: UserId, action: &str, totp: &TotpCode) -> Result<()> {
        self.inner
            .post(
                USER_ENDPOINT,
                &json!({"user": id, "action": action, "totp": totp}),
            )
            .await?;
        info!(user = %id, action, "user archive state changed");
        Ok(())
    }

    /// Get a user's profile.
    pub async fn profile(&self, id: UserId) -> Result<UserProfile> {
        self.inner
            .get_field(PROFILES_ENDPOINT, &json!({"user": id}), "profile")
            .await
    }

    /// Replace profile fields. Returns the profile as saved.
    pub async fn update_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
        totp: &TotpCode,
    ) -> Result<UserProfile> {
        let dob = update
            .dob
            .map(|d| d.format("%a %b %d %Y").to_string())
            .unwrap_or_default();
        let profile: UserProfile = self
            .inner
            .post(
                PROFILES_ENDPOINT,
                &json!({
                    "user": id,
                    "action": "update",
                    "firstName": update.first_name,
                    "lastName": update.last_name,
                    "gender": update.gender.map_or(json!(""), |g| json!(g)),
                    "dob": dob,
                    "address1": update.address1,
                    "address2": update.address2,
                    "postalCode": update.postal_code,
                    "city": update.city,
                    "state": update.state,
                    "totp": totp
                }),
            )
            .await?
            .field("profile")?;
        info!(user = %id, "user profile updated");
        Ok(profile)
    }

    /// Mark identity and address verified or not.
    pub async fn set_profile_verifications(
        &self,
        id: UserId,
        identity: bool,
        address: bool,
        totp: &TotpCode,
    ) -> Result<()> {
        self.inner
            .post(
                PROFILES_ENDPOINT,
                &json!({
                    "user": id,
                    "action": "verifications",
                    "idVerified": identity.to_string(),
                    "addressVerified": address.to_string(),
                    "totp": totp
                }),
            )
            .await?;
        info!(user = %id, identity, address, "profile verifications updated");
        Ok(())
    }

    /// List a user's baggage items.
    pub async fn baggage(&self, id: UserId) -> Result<Vec<BaggageItem>> {
        self.inner
            .get_field(BAGGAGE_ENDPOINT, &json!({"user": id}), "items")
            .await
    }

    /// Store a baggage item, replacing any item with the same key.
    pub async fn set_baggage(
        &self,
        id: UserId,
        key: &str,
        value: &str,
        totp: &TotpCode,
    ) -> Result<()> {
        validate_baggage_key(key)?;
        validate_baggage_value(value)?;
        self.inner
            .post(
                BAGGAGE_ENDPOINT,
                &json!({"user": id, "key": key, "value": value, "totp": totp}),
            )
            .await?;
        info!(user = %id, key, "baggage item stored");
        Ok(())
    }

    /// Remove a baggage item.
    pub async fn delete_baggage(&self, id: UserId, key: &str, totp: &TotpCode) -> Result<()> {
        validate_baggage_key(key)?;
        self.inner
            .delete(
                BAGGAGE_ENDPOINT,
                &json!({"user": id, "key": key, "totp": totp}),
            )
            .await?;
        info!(user = %id, key, "baggage item deleted");
        Ok(())
    }

    /// Run a confirmed [`UserCommand`].
    pub async fn execute(&self, command: UserCommand, totp: &TotpCode) -> Result<UserCommandOutput> {
        use UserCommandOutput::{Account, Created, Done, Message, Profile};

        match command {
            UserCommand::Create(user) => self.create(&user, totp).await.map(Created),
            UserCommand::UpdateAccount { user, update } => {
                self.update_account(user, &update, totp).await.map(Account)
            }
            UserCommand::ResetPassword {
                user,
                password,
                flag,
            } => self
                .reset_password(user, &password, &flag, totp)
                .await
                .map(|()| Done),
            UserCommand::SetVerifications { user, email, phone } => self
                .set_verifications(user, email, phone, totp)
                .await
                .map(|()| Done),
            UserCommand::Reset { user, action } => {
                self.reset(user, action, totp).await.map(Message)
            }
            UserCommand::SetReferrer { user, referrer } => self
                .set_referrer(user, referrer.as_deref(), totp)
                .await
                .map(|()| Done),
            UserCommand::Delete { user } => self.delete(user, totp).await.map(|()| Done),
            UserCommand::Restore { user } => self.restore(user, totp).await.map(|()| Done),
            UserCommand::UpdateProfile { user, update } => {
                self.update_profile(user, &update, totp).await.map(Profile)
            }
            UserCommand::SetProfileVerifications {
                user,
                identity,
                address,
            } => self
                .set_profile_verifications(user, identity, address, totp)
                .await
                .map(|()| Done),
            UserCommand::SetBaggage { user, key, value } => self
                .set_baggage(user, &key, &value, totp)
                .await
                .map(|()| Done),
            UserCommand::DeleteBaggage { user, key } => {
                self.delete_baggage(user, &key, totp).await.map(|()| Done)
            }
        }
    }

    /// Search a user's activity log, one page.
    pub async fn logs(&self, query: &UserLogQuery) -> Result<SearchPage<UserActivityLog>> {
        if !query.username.is_empty() {
            validate_username(&query.username)?;
        }
        validate_log_flags(&query.flags)?;
        validate_log_filter(&query.filter)?;
        self.inner.get_field("/auth/users/logs", query, "logs").await
    }
}

fn require_group(group_id: GroupId) -> Result<()> {
    if group_id.get() == 0 {
        return Err(Error::InvalidInput("Select a users group".to_string()));
    }
    Ok(())
}

fn optional_email(email: Option<&str>) -> Result<&str> {
    match email.filter(|e| !e.is_empty()) {
        Some(email) => validate_email(email, USER_EMAIL_MAX_LEN),
        None => Ok(""),
    }
}

fn optional_phone(phone: Option<&str>) -> Result<&str> {
    match phone.filter(|p| !p.is_empty()) {
        Some(phone) if !is_valid_phone(phone) => {
            Err(Error::InvalidInput("Invalid phone number".to_string()))
        }
        Some(phone) => Ok(phone),
        None => Ok(""),
    }
}
