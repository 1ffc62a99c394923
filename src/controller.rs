//! View-model sync controller
//!
//! Holds the editable view state, validates input, turns state into API
//! requests and merges responses back. Collections are never patched in
//! place: every successful mutation is followed by a full refetch through
//! [`Controller::refresh`], the single page-aware dispatch point.
//!
//! Operations take `&mut self`, so a controller has at most one request in
//! flight and responses are applied in the order they were issued. Failures
//! stop at the operation boundary: they are logged, recorded as a notice
//! keyed by the operation, and reported through the returned [`Outcome`].

use tracing::{error, info, warn};

use crate::api::{AdminAction, ShortlinkApi};
use crate::context::{Origin, PageContext, PageKind};
use crate::error::ApiError;
use crate::model::UserPayload;
use crate::prompt::Prompter;
use crate::state::{FormMode, NoticeLevel, Operation, UserField, UserForm, ViewState};
use crate::validate::is_valid_long_link;

/// How an operation ended
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// The user declined the confirmation; nothing was sent
    Declined,
    /// The failure is recorded as a notice in the view state
    Failed,
}

impl Outcome {
    pub fn is_completed(self) -> bool {
        matches!(self, Outcome::Completed)
    }
}

/// The two call shapes of a user update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateShape {
    /// Save the open edit form: every non-empty field plus status and id
    Form,
    /// Flip the status of a listed user after confirmation
    ToggleStatus { id: i64 },
}

pub struct Controller<A, P> {
    api: A,
    prompter: P,
    context: PageContext,
    origin: Origin,
    state: ViewState,
}

impl<A: ShortlinkApi, P: Prompter> Controller<A, P> {
    /// Creates a controller without loading anything
    pub fn new(api: A, prompter: P, context: PageContext, origin: Origin) -> Self {
        Self {
            api,
            prompter,
            context,
            origin,
            state: ViewState::default(),
        }
    }

    /// Creates a controller and performs the page's initial load
    pub async fn mount(api: A, prompter: P, context: PageContext, origin: Origin) -> Self {
        let mut controller = Self::new(api, prompter, context, origin);
        let _ = controller.refresh().await;
        controller
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn context(&self) -> &PageContext {
        &self.context
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Hides the notice of one operation
    pub fn dismiss(&mut self, operation: Operation) {
        self.state.dismiss(operation);
    }

    fn fail(&mut self, operation: Operation, err: &ApiError) {
        error!(operation = %operation, error = %err, "Operation failed");
        self.state.post(operation, NoticeLevel::Error, err.message());
    }

    fn reject(&mut self, operation: Operation, message: &str) {
        warn!(operation = %operation, reason = message, "Operation not started");
        self.state.post(operation, NoticeLevel::Error, message);
    }

    // ------------------------------------------------------------------
    // Refresh dispatch
    // ------------------------------------------------------------------

    /// Reloads whatever collection the current page shows.
    ///
    /// Dashboard reloads the user's links, Users reloads the user list, any
    /// other page does nothing.
    pub async fn refresh(&mut self) -> Outcome {
        match self.context.kind {
            PageKind::Dashboard => self.fetch_links().await,
            PageKind::Users => self.fetch_users().await,
            PageKind::Other => Outcome::Completed,
        }
    }

    // ------------------------------------------------------------------
    // Links
    // ------------------------------------------------------------------

    /// Handles an edit of the long-link input
    pub fn set_long_link(&mut self, value: impl Into<String>) {
        let panel = &mut self.state.shortener;
        panel.request.long_link = value.into();
        panel.show_result = false;
        panel.is_url_valid = is_valid_long_link(&panel.request.long_link);
    }

    /// Shortens the pending long link.
    ///
    /// The input is not required to be valid; the backend decides. The result
    /// panel is shown only on success: a failure hides it and posts a
    /// `CreateLink` error notice instead of showing a stale short URL.
    pub async fn create_link(&mut self) -> Outcome {
        let request = self.state.shortener.request.clone();

        match self.api.create_link(&request).await {
            Ok(identifier) => {
                let short_url = self.origin.short_url(&identifier);
                info!(long_link = %request.long_link, short_url = %short_url, "Short link created");

                let panel = &mut self.state.shortener;
                panel.short_url = short_url;
                panel.show_result = true;
                panel.request.long_link.clear();
                panel.is_url_valid = false;
                self.state.dismiss(Operation::CreateLink);

                let _ = self.refresh().await;
                Outcome::Completed
            }
            Err(err) => {
                self.state.shortener.show_result = false;
                self.fail(Operation::CreateLink, &err);
                Outcome::Failed
            }
        }
    }

    /// Replaces the link list with the current user's links
    pub async fn fetch_links(&mut self) -> Outcome {
        self.state.links.visible = true;

        let Some(user_id) = self.context.user_id.clone() else {
            self.reject(Operation::FetchLinks, "no signed-in user on this page");
            return Outcome::Failed;
        };

        self.state.links.loading = true;
        let result = self.api.user_links(&user_id).await;
        self.state.links.loading = false;

        match result {
            Ok(mut links) => {
                for link in &mut links {
                    link.short_link = self.origin.absolutize(&link.short_link);
                }
                info!(user_id = %user_id, count = links.len(), "Links loaded");
                self.state.links.items = links;
                self.state.dismiss(Operation::FetchLinks);
                Outcome::Completed
            }
            Err(err) => {
                self.fail(Operation::FetchLinks, &err);
                Outcome::Failed
            }
        }
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    /// Replaces the user list
    pub async fn fetch_users(&mut self) -> Outcome {
        self.state.users.visible = true;
        self.state.users.loading = true;
        let result = self.api.users().await;
        self.state.users.loading = false;

        match result {
            Ok(users) => {
                info!(count = users.len(), "Users loaded");
                self.state.users.items = users;
                self.state.dismiss(Operation::FetchUsers);
                Outcome::Completed
            }
            Err(err) => {
                self.fail(Operation::FetchUsers, &err);
                Outcome::Failed
            }
        }
    }

    /// Creates a user from the open form
    pub async fn create_user(&mut self) -> Outcome {
        let Some(payload) = self.state.form.as_ref().map(|form| form.fields.to_payload(None)) else {
            self.reject(Operation::CreateUser, "no user form is open");
            return Outcome::Failed;
        };

        self.write_user(Operation::CreateUser, payload).await
    }

    /// Updates a user, either from the edit form or as a quick status toggle
    pub async fn update_user(&mut self, shape: UpdateShape) -> Outcome {
        match shape {
            UpdateShape::Form => {
                let target = self.state.form.as_ref().map(|form| match form.mode {
                    FormMode::Edit { id } => Some(form.fields.to_payload(Some(id))),
                    FormMode::Create => None,
                });
                let payload = match target {
                    Some(Some(payload)) => payload,
                    Some(None) => {
                        self.reject(Operation::UpdateUser, "the open form is not editing a user");
                        return Outcome::Failed;
                    }
                    None => {
                        self.reject(Operation::UpdateUser, "no user form is open");
                        return Outcome::Failed;
                    }
                };
                self.write_user(Operation::UpdateUser, payload).await
            }
            UpdateShape::ToggleStatus { id } => {
                let Some((current, username)) = self
                    .state
                    .user(id)
                    .map(|user| (user.status, user.username.clone()))
                else {
                    self.reject(Operation::ToggleUserStatus, &format!("unknown user {}", id));
                    return Outcome::Failed;
                };

                let message = format!(
                    "Do you really want to {} user {}?",
                    current.toggle_verb(),
                    username
                );
                if !self.prompter.confirm(&message).await {
                    return Outcome::Declined;
                }

                let payload = UserPayload::status_change(id, current.toggled());
                self.write_user(Operation::ToggleUserStatus, payload).await
            }
        }
    }

    async fn write_user(&mut self, operation: Operation, payload: UserPayload) -> Outcome {
        let result = match operation {
            Operation::CreateUser => self.api.create_user(&payload).await,
            _ => self.api.update_user(&payload).await,
        };

        match result {
            Ok(()) => {
                let message = match operation {
                    Operation::CreateUser => "User created".to_string(),
                    Operation::ToggleUserStatus => format!("User {}", payload.status),
                    _ => "User updated".to_string(),
                };
                info!(operation = %operation, id = ?payload.id, "{}", message);
                self.state.post(operation, NoticeLevel::Success, message);

                let _ = self.refresh().await;
                Outcome::Completed
            }
            Err(err) => {
                self.fail(operation, &err);
                Outcome::Failed
            }
        }
    }

    /// Deletes a user after confirmation
    pub async fn delete_user(&mut self, id: i64) -> Outcome {
        let name = self
            .state
            .user(id)
            .map(|user| user.username.clone())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| id.to_string());

        let message = format!("Do you really want to delete user {}?", name);
        if !self.prompter.confirm(&message).await {
            return Outcome::Declined;
        }

        match self.api.delete_user(id).await {
            Ok(()) => {
                info!(id, "User deleted");
                self.state
                    .post(Operation::DeleteUser, NoticeLevel::Success, format!("User {} deleted", name));
                let _ = self.refresh().await;
                Outcome::Completed
            }
            Err(err) => {
                self.fail(Operation::DeleteUser, &err);
                Outcome::Failed
            }
        }
    }

    // ------------------------------------------------------------------
    // User form
    // ------------------------------------------------------------------

    /// Opens an empty form; replaces any open form
    pub fn open_create_form(&mut self) {
        self.state.form = Some(UserForm::for_create());
    }

    /// Opens the form on a listed user. Returns false if the id is unknown.
    pub fn open_edit_form(&mut self, id: i64) -> bool {
        let form = self.state.user(id).map(UserForm::for_edit);
        let found = form.is_some();
        if found {
            self.state.form = form;
        }
        found
    }

    pub fn set_form_field(&mut self, field: UserField, value: &str) -> Result<(), String> {
        match self.state.form.as_mut() {
            Some(form) => form.fields.set(field, value),
            None => Err("no user form is open".to_string()),
        }
    }

    pub fn close_form(&mut self) {
        self.state.form = None;
    }

    /// Saves the open form and closes it once the server accepted it.
    ///
    /// On failure the form stays open with its input intact.
    pub async fn save_form(&mut self) -> Outcome {
        let Some(mode) = self.state.form.as_ref().map(|form| form.mode) else {
            self.reject(Operation::CreateUser, "no user form is open");
            return Outcome::Failed;
        };
        if let Some(form) = self.state.form.as_mut() {
            form.saving = true;
        }

        let outcome = match mode {
            FormMode::Create => self.create_user().await,
            FormMode::Edit { .. } => self.update_user(UpdateShape::Form).await,
        };

        if outcome.is_completed() {
            self.state.form = None;
        } else if let Some(form) = self.state.form.as_mut() {
            form.saving = false;
        }
        outcome
    }

    // ------------------------------------------------------------------
    // Administrative bulk actions
    // ------------------------------------------------------------------

    /// Fires an administrative trigger after confirmation, alerts the result
    /// and refetches once the trigger has answered.
    pub async fn run_admin_action(&mut self, action: AdminAction) -> Outcome {
        if !self.prompter.confirm(action.confirmation()).await {
            return Outcome::Declined;
        }

        let operation = match action {
            AdminAction::InitDatabase => Operation::InitDatabase,
            AdminAction::SeedDemoData => Operation::SeedDemoData,
        };

        let outcome = match self.api.trigger(action).await {
            Ok(result) => {
                let message = format!("Successful {}: {}", action.label(), result);
                info!(action = action.label(), result = %result, "Admin action completed");
                self.prompter.alert(&message).await;
                self.state.post(operation, NoticeLevel::Success, message);
                Outcome::Completed
            }
            Err(err) => {
                let message = format!("Error during {}: {}", action.label(), err.message());
                error!(operation = %operation, error = %err, "Admin action failed");
                self.prompter.alert(&message).await;
                self.state.post(operation, NoticeLevel::Error, message);
                Outcome::Failed
            }
        };

        let _ = self.refresh().await;
        outcome
    }
}
