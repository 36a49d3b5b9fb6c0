use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{Duration, Months, NaiveDate, Utc};

use super::domain::{
    CompletionStatus, Frequency, MaintenanceLog, MaintenanceLogId, MaintenanceTask, NewTask,
    TaskId,
};
use super::repository::MaintenanceRepository;
use crate::actor::{Actor, MemberRef};
use crate::store::RepositoryError;

#[derive(Debug, thiserror::Error)]
pub enum MaintenanceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Permission(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Outcome of an approve/reject call; decided logs stay decided.
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewOutcome {
    Applied { next_due_date: Option<NaiveDate> },
    AlreadyDecided(CompletionStatus),
}

static TASK_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static LOG_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_task_id() -> TaskId {
    let id = TASK_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    TaskId(format!("mnt-{id:06}"))
}

fn next_log_id() -> MaintenanceLogId {
    let id = LOG_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    MaintenanceLogId(format!("mlg-{id:06}"))
}

fn advance(due: NaiveDate, frequency: Frequency) -> NaiveDate {
    match frequency {
        Frequency::Daily => due + Duration::days(1),
        Frequency::Weekly => due + Duration::weeks(1),
        // Calendar-aware: Jan 31 + 1 month is Feb 28/29.
        Frequency::Monthly => due + Months::new(1),
        Frequency::OneTime => due,
    }
}

/// Recurring upkeep scheduling. Completion reports go through an admin review
/// gate; only approval advances the schedule.
pub struct MaintenanceService<R> {
    repository: Arc<R>,
}

impl<R> MaintenanceService<R>
where
    R: MaintenanceRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    fn load_task(&self, id: &TaskId) -> Result<MaintenanceTask, MaintenanceError> {
        self.repository
            .fetch_task(id)?
            .ok_or(MaintenanceError::Repository(RepositoryError::NotFound))
    }

    fn load_log(&self, id: &MaintenanceLogId) -> Result<MaintenanceLog, MaintenanceError> {
        self.repository
            .fetch_log(id)?
            .ok_or(MaintenanceError::Repository(RepositoryError::NotFound))
    }

    pub fn create_task(
        &self,
        actor: &Actor,
        input: NewTask,
        assignee: Option<MemberRef>,
    ) -> Result<MaintenanceTask, MaintenanceError> {
        if actor.as_admin().is_none() {
            return Err(MaintenanceError::Permission(
                "only admins can create maintenance tasks".to_string(),
            ));
        }
        if input.title.trim().is_empty() {
            return Err(MaintenanceError::Validation("title is required".to_string()));
        }

        let task = MaintenanceTask {
            id: next_task_id(),
            title: input.title,
            description: input.description,
            frequency: input.frequency,
            assigned_to: assignee,
            next_due_date: input.next_due_date,
            active: true,
            created_at: Utc::now(),
        };
        Ok(self.repository.insert_task(task)?)
    }

    /// Admin view: every task, soonest due first.
    pub fn all_tasks(&self, actor: &Actor) -> Result<Vec<MaintenanceTask>, MaintenanceError> {
        if actor.as_admin().is_none() {
            return Err(MaintenanceError::Permission(
                "only admins can list all tasks".to_string(),
            ));
        }
        let mut tasks = self.repository.tasks()?;
        tasks.sort_by_key(|task| task.next_due_date);
        Ok(tasks)
    }

    /// Staff worklist: active tasks assigned to the actor or unassigned,
    /// excluding tasks whose completion is already awaiting review.
    pub fn staff_tasks(&self, actor: &Actor) -> Result<Vec<MaintenanceTask>, MaintenanceError> {
        let Some(staff) = actor.as_staff() else {
            return Err(MaintenanceError::Permission(
                "only staff have a maintenance worklist".to_string(),
            ));
        };

        let pending: Vec<TaskId> = self
            .repository
            .logs()?
            .into_iter()
            .filter(|log| log.status == CompletionStatus::Pending)
            .map(|log| log.task)
            .collect();

        let mut tasks: Vec<MaintenanceTask> = self
            .repository
            .tasks()?
            .into_iter()
            .filter(|task| task.active)
            .filter(|task| {
                task.assigned_to
                    .as_ref()
                    .map_or(true, |member| member.id == staff.id)
            })
            .filter(|task| !pending.contains(&task.id))
            .collect();
        tasks.sort_by_key(|task| task.next_due_date);
        Ok(tasks)
    }

    /// File a completion report. The schedule does not move until an admin
    /// approves the report.
    pub fn complete(
        &self,
        actor: &Actor,
        id: &TaskId,
        notes: Option<String>,
        proof_key: Option<String>,
    ) -> Result<MaintenanceLog, MaintenanceError> {
        let Some(staff) = actor.as_staff() else {
            return Err(MaintenanceError::Permission(
                "only staff can complete maintenance tasks".to_string(),
            ));
        };
        let task = self.load_task(id)?;
        if !task.active {
            return Err(MaintenanceError::Validation(
                "task is no longer active".to_string(),
            ));
        }

        let log = MaintenanceLog {
            id: next_log_id(),
            task: task.id,
            completed_by: Some(staff.clone()),
            completion_date: Utc::now(),
            status: CompletionStatus::Pending,
            notes,
            proof_key,
            admin_comment: None,
        };
        Ok(self.repository.insert_log(log)?)
    }

    /// Completion history, newest first, optionally scoped to one task.
    pub fn history(
        &self,
        actor: &Actor,
        task: Option<&TaskId>,
    ) -> Result<Vec<MaintenanceLog>, MaintenanceError> {
        if actor.as_admin().is_none() && actor.as_staff().is_none() {
            return Err(MaintenanceError::Permission(
                "students cannot view maintenance history".to_string(),
            ));
        }
        let mut logs: Vec<MaintenanceLog> = self
            .repository
            .logs()?
            .into_iter()
            .filter(|log| task.map_or(true, |id| &log.task == id))
            .collect();
        logs.sort_by(|a, b| b.completion_date.cmp(&a.completion_date));
        Ok(logs)
    }

    /// Approve a pending report and reschedule the task by its frequency.
    /// Approving an already-decided log changes nothing.
    pub fn approve(
        &self,
        actor: &Actor,
        id: &MaintenanceLogId,
    ) -> Result<ReviewOutcome, MaintenanceError> {
        if actor.as_admin().is_none() {
            return Err(MaintenanceError::Permission(
                "only admins can approve completions".to_string(),
            ));
        }

        let mut log = self.load_log(id)?;
        if log.status != CompletionStatus::Pending {
            return Ok(ReviewOutcome::AlreadyDecided(log.status));
        }

        log.status = CompletionStatus::Approved;
        self.repository.update_log(log.clone())?;

        let mut task = self.load_task(&log.task)?;
        let next_due_date = if task.frequency == Frequency::OneTime {
            None
        } else {
            task.next_due_date = advance(task.next_due_date, task.frequency);
            self.repository.update_task(task.clone())?;
            Some(task.next_due_date)
        };
        Ok(ReviewOutcome::Applied { next_due_date })
    }

    /// Reject a pending report with a comment; the schedule stays put.
    pub fn reject(
        &self,
        actor: &Actor,
        id: &MaintenanceLogId,
        comment: Option<String>,
    ) -> Result<ReviewOutcome, MaintenanceError> {
        if actor.as_admin().is_none() {
            return Err(MaintenanceError::Permission(
                "only admins can reject completions".to_string(),
            ));
        }

        let mut log = self.load_log(id)?;
        if log.status != CompletionStatus::Pending {
            return Ok(ReviewOutcome::AlreadyDecided(log.status));
        }

        log.status = CompletionStatus::Rejected;
        log.admin_comment = comment;
        self.repository.update_log(log)?;
        Ok(ReviewOutcome::Applied {
            next_due_date: None,
        })
    }

    /// Retire a task; it drops out of worklists but keeps its history.
    pub fn deactivate_task(&self, actor: &Actor, id: &TaskId) -> Result<(), MaintenanceError> {
        if actor.as_admin().is_none() {
            return Err(MaintenanceError::Permission(
                "only admins can deactivate tasks".to_string(),
            ));
        }
        let mut task = self.load_task(id)?;
        task.active = false;
        self.repository.update_task(task)?;
        Ok(())
    }
}
