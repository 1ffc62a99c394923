//! View state owned by the controller
//!
//! Everything the view renders lives in [`ViewState`]. It is a plain,
//! serializable value; the only writer is [`crate::controller::Controller`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::{LinkRecord, LinkRequest, UserPayload, UserRecord, UserStatus};

/// Named operations of the controller. Notices are keyed by these.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    CreateLink,
    FetchLinks,
    FetchUsers,
    CreateUser,
    UpdateUser,
    ToggleUserStatus,
    DeleteUser,
    InitDatabase,
    SeedDemoData,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Operation::CreateLink => "create link",
            Operation::FetchLinks => "fetch links",
            Operation::FetchUsers => "fetch users",
            Operation::CreateUser => "create user",
            Operation::UpdateUser => "update user",
            Operation::ToggleUserStatus => "change user status",
            Operation::DeleteUser => "delete user",
            Operation::InitDatabase => "init database",
            Operation::SeedDemoData => "add demo data",
        };
        f.write_str(label)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Transient banner describing the last outcome of one operation
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// The shortener panel: input, validity indicator, and result
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ShortenerPanel {
    /// Pending request built from the input field
    pub request: LinkRequest,

    /// Whether `request.long_link` is an absolute http(s) URL
    pub is_url_valid: bool,

    /// Public URL of the last created short link
    pub short_url: String,

    /// Whether the result panel is visible
    pub show_result: bool,
}

/// A collection fetched from the backend, replaced wholesale on every fetch
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Collection<T> {
    /// Exactly the last successful fetch result
    pub items: Vec<T>,

    /// Section visibility; set as soon as a fetch is issued
    pub visible: bool,

    /// A fetch is in flight
    pub loading: bool,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            visible: false,
            loading: false,
        }
    }
}

/// Editable fields of a user, as held by the form buffer
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFields {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub status: UserStatus,
}

impl UserFields {
    /// Copies a record's editable fields verbatim
    pub fn from_record(record: &UserRecord) -> Self {
        Self {
            username: record.username.clone(),
            password: record.password.clone(),
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            email: record.email.clone(),
            phone: record.phone.clone(),
            status: record.status,
        }
    }

    /// Write payload: empty text fields are omitted, status is always set
    pub fn to_payload(&self, id: Option<i64>) -> UserPayload {
        UserPayload {
            id,
            username: non_empty(&self.username),
            password: non_empty(&self.password),
            first_name: non_empty(&self.first_name),
            last_name: non_empty(&self.last_name),
            email: non_empty(&self.email),
            phone: non_empty(&self.phone),
            status: self.status,
        }
    }

    /// Sets one field from text input
    pub fn set(&mut self, field: UserField, value: &str) -> Result<(), String> {
        match field {
            UserField::Username => self.username = value.to_string(),
            UserField::Password => self.password = value.to_string(),
            UserField::FirstName => self.first_name = value.to_string(),
            UserField::LastName => self.last_name = value.to_string(),
            UserField::Email => self.email = value.to_string(),
            UserField::Phone => self.phone = value.to_string(),
            UserField::Status => self.status = value.parse()?,
        }
        Ok(())
    }
}

fn non_empty(value: &str) -> Option<String> {
    Some(value.to_string()).filter(|v| !v.is_empty())
}

/// Addressable form field
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserField {
    Username,
    Password,
    FirstName,
    LastName,
    Email,
    Phone,
    Status,
}

impl std::str::FromStr for UserField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "username" => Ok(UserField::Username),
            "password" => Ok(UserField::Password),
            "first_name" | "firstname" => Ok(UserField::FirstName),
            "last_name" | "lastname" => Ok(UserField::LastName),
            "email" => Ok(UserField::Email),
            "phone" => Ok(UserField::Phone),
            "status" => Ok(UserField::Status),
            other => Err(format!("unknown field '{}'", other)),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FormMode {
    Create,
    Edit { id: i64 },
}

/// The user form. At most one is open at a time.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserForm {
    pub mode: FormMode,

    pub fields: UserFields,

    /// A save is in flight
    pub saving: bool,
}

impl UserForm {
    /// Empty form with the status defaulted to enabled
    pub fn for_create() -> Self {
        Self {
            mode: FormMode::Create,
            fields: UserFields::default(),
            saving: false,
        }
    }

    pub fn for_edit(record: &UserRecord) -> Self {
        Self {
            mode: FormMode::Edit { id: record.id },
            fields: UserFields::from_record(record),
            saving: false,
        }
    }
}

/// Everything the view renders
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub shortener: ShortenerPanel,
    pub links: Collection<LinkRecord>,
    pub users: Collection<UserRecord>,

    /// The open user form, if any
    pub form: Option<UserForm>,

    /// Last outcome per operation
    pub notices: BTreeMap<Operation, Notice>,
}

impl ViewState {
    pub fn notice(&self, operation: Operation) -> Option<&Notice> {
        self.notices.get(&operation)
    }

    pub(crate) fn dismiss(&mut self, operation: Operation) {
        self.notices.remove(&operation);
    }

    pub(crate) fn post(&mut self, operation: Operation, level: NoticeLevel, message: impl Into<String>) {
        self.notices.insert(
            operation,
            Notice {
                level,
                message: message.into(),
                at: Utc::now(),
            },
        );
    }

    pub fn user(&self, id: i64) -> Option<&UserRecord> {
        self.users.items.iter().find(|user| user.id == id)
    }
}
