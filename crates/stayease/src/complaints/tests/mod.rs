mod common;

mod escalation;
mod lifecycle;
mod reports;
