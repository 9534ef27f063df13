use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::Mutex;
use tracing::{debug, error, info, instrument, warn};

use crate::draft::{DraftField, FormDraft};
use crate::filter::{PriorityFilter, StatusFilter, TaskFilter};
use crate::repository::{ListRepository, TaskRepository};
use crate::task::{NewTask, Status, Task, TaskId, TaskList, TaskPatch};
use crate::view::{FormView, LoadState, SnapshotInput, ViewSnapshot};

pub const DELETE_PROMPT: &str = "Are you sure you want to delete this task?";

/// Blocking yes/no question asked before destructive actions.
pub trait Confirm: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
}

/// Transient user-facing message, drained by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

/// What became of a requested operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// State changed as requested.
    Applied,
    /// Guard declined the request; nothing was sent.
    Skipped,
    /// Another request for the same target is still in flight.
    Busy,
    /// The request failed; local collections are unchanged.
    Failed,
}

/// User intents forwarded by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    SearchChanged(String),
    FilterChanged(StatusFilter),
    PriorityChanged(PriorityFilter),
    ClearFilters,
    Submit,
    ToggleStatus(TaskId),
    Delete(TaskId),
    /// Open the form: `None` creates, `Some(id)` edits that task.
    Edit(Option<TaskId>),
    DraftChanged(DraftField, String),
    Close,
    Retry,
}

enum Submission {
    Update(TaskId, TaskPatch),
    Create(NewTask),
}

#[derive(Debug, Default)]
struct ViewState {
    load: LoadState,
    tasks: Vec<Task>,
    lists: Vec<TaskList>,
    filter: TaskFilter,
    form_open: bool,
    editing: Option<TaskId>,
    draft: FormDraft,
    notifications: Vec<Notification>,
    in_flight: HashSet<TaskId>,
    creating: bool,
}

impl ViewState {
    fn first_list_id(&self) -> Option<&str> {
        self.lists.first().map(|list| list.id.as_str())
    }

    fn blank_draft(&self) -> FormDraft {
        FormDraft::blank(self.first_list_id())
    }

    fn close_form(&mut self) {
        self.form_open = false;
        self.editing = None;
        self.draft = self.blank_draft();
    }

    fn notify(&mut self, level: Level, message: impl Into<String>) {
        self.notifications.push(Notification {
            level,
            message: message.into(),
        });
    }

    fn replace_task(&mut self, updated: Task) {
        if let Some(slot) = self.tasks.iter_mut().find(|task| task.id == updated.id) {
            *slot = updated;
        }
    }
}

/// Mediates between the presentation layer and the task/list stores.
///
/// Local collections change only after a store confirms a request, so a
/// failed request never needs unwinding. All methods take `&self` and the
/// internal lock is released before every `.await`; several requests can
/// therefore be in flight at once, and responses are applied in the order
/// they arrive.
pub struct ViewController {
    tasks: Arc<dyn TaskRepository>,
    lists: Arc<dyn ListRepository>,
    confirm: Arc<dyn Confirm>,
    state: Mutex<ViewState>,
}

impl ViewController {
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        lists: Arc<dyn ListRepository>,
        confirm: Arc<dyn Confirm>,
    ) -> Self {
        Self {
            tasks,
            lists,
            confirm,
            state: Mutex::new(ViewState::default()),
        }
    }

    /// Fetches tasks and lists together; either failing fails the load.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Outcome {
        {
            let mut state = self.state.lock();
            if state.load == LoadState::Loading {
                debug!("load already in progress");
                return Outcome::Busy;
            }
            state.load = LoadState::Loading;
        }

        let result = tokio::try_join!(self.tasks.get_all(), self.lists.get_all());

        let mut state = self.state.lock();
        match result {
            Ok((tasks, lists)) => {
                info!(tasks = tasks.len(), lists = lists.len(), "loaded view data");
                if !state.form_open
                    && let Some(first) = lists.first()
                {
                    state.draft.list_id = first.id.clone();
                }
                state.tasks = tasks;
                state.lists = lists;
                state.load = LoadState::Ready;
                Outcome::Applied
            }
            Err(err) => {
                error!(error = %err, "initial load failed");
                state.load = LoadState::Failed(err.to_string());
                state.notify(Level::Error, "Failed to load data");
                Outcome::Failed
            }
        }
    }

    pub async fn retry(&self) -> Outcome {
        info!("retrying load");
        self.load().await
    }

    /// Creates a task from the draft, or updates the task being edited.
    #[instrument(skip(self))]
    pub async fn submit(&self) -> Outcome {
        let submission = {
            let mut state = self.state.lock();
            if !state.form_open {
                debug!("no form open; submit ignored");
                return Outcome::Skipped;
            }
            if !state.draft.has_title() {
                debug!("blank title; submit ignored");
                return Outcome::Skipped;
            }

            match state.editing.clone() {
                Some(id) => {
                    let patch = match state.draft.to_patch() {
                        Ok(patch) => patch,
                        Err(err) => {
                            warn!(error = %err, "invalid draft");
                            state.notify(Level::Error, err.to_string());
                            return Outcome::Failed;
                        }
                    };
                    if !state.in_flight.insert(id.clone()) {
                        debug!(%id, "update already in flight");
                        return Outcome::Busy;
                    }
                    Submission::Update(id, patch)
                }
                None => {
                    let new = match state.draft.to_new_task() {
                        Ok(new) => new,
                        Err(err) => {
                            warn!(error = %err, "invalid draft");
                            state.notify(Level::Error, err.to_string());
                            return Outcome::Failed;
                        }
                    };
                    if state.creating {
                        debug!("create already in flight");
                        return Outcome::Busy;
                    }
                    state.creating = true;
                    Submission::Create(new)
                }
            }
        };

        match submission {
            Submission::Update(id, patch) => {
                let result = self.tasks.update(&id, patch).await;
                let mut state = self.state.lock();
                state.in_flight.remove(&id);
                match result {
                    Ok(updated) => {
                        info!(%id, "task updated");
                        state.replace_task(updated);
                        state.notify(Level::Success, "Task updated successfully!");
                        state.close_form();
                        Outcome::Applied
                    }
                    Err(err) => {
                        warn!(%id, error = %err, "task update failed");
                        state.notify(Level::Error, "Failed to update task");
                        Outcome::Failed
                    }
                }
            }
            Submission::Create(new) => {
                let result = self.tasks.create(new).await;
                let mut state = self.state.lock();
                state.creating = false;
                match result {
                    Ok(created) => {
                        info!(id = %created.id, "task created");
                        state.tasks.insert(0, created);
                        state.notify(Level::Success, "Task created successfully!");
                        state.close_form();
                        Outcome::Applied
                    }
                    Err(err) => {
                        warn!(error = %err, "task create failed");
                        state.notify(Level::Error, "Failed to create task");
                        Outcome::Failed
                    }
                }
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn toggle_status(&self, id: &str) -> Outcome {
        let next = {
            let mut state = self.state.lock();
            let Some(task) = state.tasks.iter().find(|task| task.id == id) else {
                debug!("toggle for unknown task ignored");
                return Outcome::Skipped;
            };
            let next = task.status.toggled();
            if !state.in_flight.insert(id.to_string()) {
                debug!("status change already in flight");
                return Outcome::Busy;
            }
            next
        };

        let result = self.tasks.update(id, TaskPatch::status(next)).await;

        let mut state = self.state.lock();
        state.in_flight.remove(id);
        match result {
            Ok(updated) => {
                info!(status = %next, "task status changed");
                state.replace_task(updated);
                let message = match next {
                    Status::Completed => "Task completed!",
                    Status::Pending => "Task reopened",
                };
                state.notify(Level::Success, message);
                Outcome::Applied
            }
            Err(err) => {
                warn!(error = %err, "status update failed");
                state.notify(Level::Error, "Failed to update task status");
                Outcome::Failed
            }
        }
    }

    /// Asks for confirmation, then deletes by id. The store decides
    /// whether the id exists.
    #[instrument(skip(self))]
    pub async fn delete_task(&self, id: &str) -> Outcome {
        if !self.confirm.confirm(DELETE_PROMPT) {
            debug!("delete declined");
            return Outcome::Skipped;
        }

        if !self.state.lock().in_flight.insert(id.to_string()) {
            debug!("delete already in flight");
            return Outcome::Busy;
        }

        let result = self.tasks.delete(id).await;

        let mut state = self.state.lock();
        state.in_flight.remove(id);
        match result {
            Ok(_) => {
                info!("task deleted");
                state.tasks.retain(|task| task.id != id);
                state.notify(Level::Success, "Task deleted successfully!");
                Outcome::Applied
            }
            Err(err) => {
                warn!(error = %err, "task delete failed");
                state.notify(Level::Error, "Failed to delete task");
                Outcome::Failed
            }
        }
    }

    /// Opens the form blank for `None`, or prefilled from `task`.
    pub fn open_form(&self, task: Option<&Task>) {
        let mut state = self.state.lock();
        match task {
            Some(task) => {
                debug!(id = %task.id, "opening edit form");
                state.editing = Some(task.id.clone());
                state.draft = FormDraft::from_task(task);
            }
            None => {
                debug!("opening create form");
                state.editing = None;
                state.draft = state.blank_draft();
            }
        }
        state.form_open = true;
    }

    /// Opens the edit form for a task in the local collection.
    pub fn edit(&self, id: &str) -> Outcome {
        let task = self
            .state
            .lock()
            .tasks
            .iter()
            .find(|task| task.id == id)
            .cloned();
        match task {
            Some(task) => {
                self.open_form(Some(&task));
                Outcome::Applied
            }
            None => {
                debug!(id, "edit for unknown task ignored");
                Outcome::Skipped
            }
        }
    }

    /// Discards the draft.
    pub fn close_form(&self) {
        debug!("closing form");
        self.state.lock().close_form();
    }

    /// Edits the open form's draft; ignored while no form is open.
    pub fn set_draft_field(&self, field: DraftField, value: &str) -> Outcome {
        let mut state = self.state.lock();
        if !state.form_open {
            debug!(?field, "no form open; draft edit ignored");
            return Outcome::Skipped;
        }
        match state.draft.set_field(field, value) {
            Ok(()) => Outcome::Applied,
            Err(err) => {
                state.notify(Level::Error, err.to_string());
                Outcome::Failed
            }
        }
    }

    pub fn set_search(&self, term: &str) {
        self.state.lock().filter.search = term.to_string();
    }

    pub fn set_status_filter(&self, status: StatusFilter) {
        self.state.lock().filter.status = status;
    }

    pub fn set_priority_filter(&self, priority: PriorityFilter) {
        self.state.lock().filter.priority = priority;
    }

    pub fn clear_filters(&self) {
        self.state.lock().filter.clear();
    }

    #[instrument(skip(self))]
    pub async fn dispatch(&self, event: ViewEvent) -> Outcome {
        match event {
            ViewEvent::SearchChanged(term) => {
                self.set_search(&term);
                Outcome::Applied
            }
            ViewEvent::FilterChanged(status) => {
                self.set_status_filter(status);
                Outcome::Applied
            }
            ViewEvent::PriorityChanged(priority) => {
                self.set_priority_filter(priority);
                Outcome::Applied
            }
            ViewEvent::ClearFilters => {
                self.clear_filters();
                Outcome::Applied
            }
            ViewEvent::Submit => self.submit().await,
            ViewEvent::ToggleStatus(id) => self.toggle_status(&id).await,
            ViewEvent::Delete(id) => self.delete_task(&id).await,
            ViewEvent::Edit(None) => {
                self.open_form(None);
                Outcome::Applied
            }
            ViewEvent::Edit(Some(id)) => self.edit(&id),
            ViewEvent::DraftChanged(field, value) => self.set_draft_field(field, &value),
            ViewEvent::Close => {
                self.close_form();
                Outcome::Applied
            }
            ViewEvent::Retry => self.retry().await,
        }
    }

    pub fn take_notifications(&self) -> Vec<Notification> {
        std::mem::take(&mut self.state.lock().notifications)
    }

    pub fn load_state(&self) -> LoadState {
        self.state.lock().load.clone()
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.state.lock().tasks.clone()
    }

    pub fn lists(&self) -> Vec<TaskList> {
        self.state.lock().lists.clone()
    }

    pub fn draft(&self) -> FormDraft {
        self.state.lock().draft.clone()
    }

    pub fn editing(&self) -> Option<TaskId> {
        self.state.lock().editing.clone()
    }

    pub fn is_form_open(&self) -> bool {
        self.state.lock().form_open
    }

    pub fn filter(&self) -> TaskFilter {
        self.state.lock().filter.clone()
    }

    pub fn is_in_flight(&self, id: &str) -> bool {
        self.state.lock().in_flight.contains(id)
    }

    pub fn snapshot(&self, today: NaiveDate) -> ViewSnapshot {
        let state = self.state.lock();
        let form = state.form_open.then(|| FormView {
            editing: state.editing.clone(),
            draft: state.draft.clone(),
        });
        ViewSnapshot::build(SnapshotInput {
            load: &state.load,
            tasks: &state.tasks,
            lists: &state.lists,
            filter: &state.filter,
            form,
            in_flight: &state.in_flight,
            today,
        })
    }
}
