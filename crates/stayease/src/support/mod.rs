//! Support tickets: free-form help requests with a student/admin message
//! thread, separate from the complaint lifecycle.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{
    NewTicket, SupportMessage, SupportTicket, TicketCategory, TicketId, TicketSender,
    TicketStatus, TicketThread,
};
pub use repository::SupportRepository;
pub use router::{support_router, SupportApi};
pub use service::{SupportError, SupportService};
