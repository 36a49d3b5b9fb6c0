use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;

use super::domain::{
    NewTicket, SupportMessage, SupportTicket, TicketId, TicketSender, TicketStatus, TicketThread,
};
use super::repository::SupportRepository;
use crate::actor::Actor;
use crate::store::RepositoryError;

#[derive(Debug, thiserror::Error)]
pub enum SupportError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Permission(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

static TICKET_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_ticket_id() -> TicketId {
    let id = TICKET_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    TicketId(format!("tkt-{id:06}"))
}

/// Support ticket threads. Replies do not follow the complaint state machine;
/// the only automatic move is Open -> In Progress on the first admin reply.
pub struct SupportService<R> {
    repository: Arc<R>,
}

impl<R> SupportService<R>
where
    R: SupportRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    fn load(&self, id: &TicketId) -> Result<SupportTicket, SupportError> {
        self.repository
            .fetch(id)?
            .ok_or(SupportError::Repository(RepositoryError::NotFound))
    }

    fn thread(&self, ticket: SupportTicket) -> Result<TicketThread, SupportError> {
        let mut messages = self.repository.messages_for(&ticket.id)?;
        messages.sort_by_key(|message| message.created_at);
        Ok(TicketThread { ticket, messages })
    }

    pub fn create(&self, actor: &Actor, input: NewTicket) -> Result<SupportTicket, SupportError> {
        let Some(student) = actor.as_student() else {
            return Err(SupportError::Permission(
                "only students can open support tickets".to_string(),
            ));
        };
        if input.subject.trim().is_empty() || input.description.trim().is_empty() {
            return Err(SupportError::Validation(
                "subject and description are required".to_string(),
            ));
        }

        let ticket = SupportTicket {
            id: next_ticket_id(),
            student: student.id.clone(),
            student_name: student.full_name.clone(),
            category: input.category,
            subject: input.subject,
            description: input.description,
            status: TicketStatus::Open,
            created_at: Utc::now(),
        };
        Ok(self.repository.insert(ticket)?)
    }

    /// The student's own tickets with threads, newest first.
    pub fn student_tickets(&self, actor: &Actor) -> Result<Vec<TicketThread>, SupportError> {
        let Some(student) = actor.as_student() else {
            return Err(SupportError::Permission(
                "only students can list their tickets".to_string(),
            ));
        };

        let mut own: Vec<SupportTicket> = self
            .repository
            .list()?
            .into_iter()
            .filter(|ticket| ticket.student == student.id)
            .collect();
        own.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        own.into_iter().map(|ticket| self.thread(ticket)).collect()
    }

    /// Append a student message to the student's own ticket.
    pub fn student_reply(
        &self,
        actor: &Actor,
        id: &TicketId,
        message: &str,
    ) -> Result<(), SupportError> {
        let Some(student) = actor.as_student() else {
            return Err(SupportError::Permission(
                "only students can reply to their tickets".to_string(),
            ));
        };
        let message = message.trim();
        if message.is_empty() {
            return Err(SupportError::Validation("message is required".to_string()));
        }

        let ticket = self.load(id)?;
        if ticket.student != student.id {
            return Err(SupportError::Repository(RepositoryError::NotFound));
        }

        self.repository.append_message(SupportMessage {
            ticket: id.clone(),
            sender: TicketSender::Student,
            message: message.to_string(),
            created_at: Utc::now(),
        })?;
        Ok(())
    }

    /// All tickets with threads, newest first.
    pub fn admin_tickets(&self, actor: &Actor) -> Result<Vec<TicketThread>, SupportError> {
        if actor.as_admin().is_none() {
            return Err(SupportError::Permission(
                "only admins can list all tickets".to_string(),
            ));
        }
        let mut tickets = self.repository.list()?;
        tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tickets.into_iter().map(|ticket| self.thread(ticket)).collect()
    }

    pub fn admin_detail(&self, actor: &Actor, id: &TicketId) -> Result<TicketThread, SupportError> {
        if actor.as_admin().is_none() {
            return Err(SupportError::Permission(
                "only admins can view ticket details".to_string(),
            ));
        }
        let ticket = self.load(id)?;
        self.thread(ticket)
    }

    /// Admin reply; the first reply on an Open ticket bumps it to In Progress.
    pub fn admin_reply(
        &self,
        actor: &Actor,
        id: &TicketId,
        message: &str,
    ) -> Result<SupportTicket, SupportError> {
        if actor.as_admin().is_none() {
            return Err(SupportError::Permission(
                "only admins can reply to tickets".to_string(),
            ));
        }
        let message = message.trim();
        if message.is_empty() {
            return Err(SupportError::Validation("message is required".to_string()));
        }

        let mut ticket = self.load(id)?;
        self.repository.append_message(SupportMessage {
            ticket: id.clone(),
            sender: TicketSender::Admin,
            message: message.to_string(),
            created_at: Utc::now(),
        })?;

        if ticket.status == TicketStatus::Open {
            ticket.status = TicketStatus::InProgress;
            self.repository.update(ticket.clone())?;
        }
        Ok(ticket)
    }

    /// Admin status update. Closed is terminal and not settable here.
    pub fn set_status(
        &self,
        actor: &Actor,
        id: &TicketId,
        status: TicketStatus,
    ) -> Result<SupportTicket, SupportError> {
        if actor.as_admin().is_none() {
            return Err(SupportError::Permission(
                "only admins can update ticket status".to_string(),
            ));
        }
        if status == TicketStatus::Closed {
            return Err(SupportError::Validation("Invalid status".to_string()));
        }

        let mut ticket = self.load(id)?;
        ticket.status = status;
        self.repository.update(ticket.clone())?;
        Ok(ticket)
    }
}
