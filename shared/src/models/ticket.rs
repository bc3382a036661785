//! Support Ticket Model

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "open" => Some(Self::Open),
            "in_progress" => Some(Self::InProgress),
            "resolved" => Some(Self::Resolved),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }

    /// Closed is final; a resolved ticket may be reopened.
    pub fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Open, Self::InProgress)
                | (Self::Open, Self::Resolved)
                | (Self::Open, Self::Closed)
                | (Self::InProgress, Self::Resolved)
                | (Self::InProgress, Self::Closed)
                | (Self::Resolved, Self::Closed)
                | (Self::Resolved, Self::Open)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    Normal,
    High,
    Urgent,
}

impl TicketPriority {
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct SupportTicket {
    pub id: i64,
    pub company_id: String,
    pub created_by: i64,
    pub subject: String,
    pub status: String,
    pub priority: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct TicketMessage {
    pub id: i64,
    pub ticket_id: i64,
    pub author_id: i64,
    /// Written by platform support rather than the tenant
    pub is_staff_reply: bool,
    pub body: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketDetail {
    #[serde(flatten)]
    pub ticket: SupportTicket,
    pub messages: Vec<TicketMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TicketCreate {
    #[validate(length(min = 1, max = 200))]
    pub subject: String,
    #[validate(length(min = 1, max = 10000))]
    pub body: String,
    pub priority: Option<TicketPriority>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TicketReply {
    #[validate(length(min = 1, max = 10000))]
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketStatusUpdate {
    pub status: TicketStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TicketFilter {
    pub status: Option<TicketStatus>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_transitions() {
        use TicketStatus::*;
        assert!(Open.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Resolved));
        assert!(Resolved.can_transition_to(Open));
        assert!(Resolved.can_transition_to(Closed));
        assert!(!Closed.can_transition_to(Open));
        assert!(!InProgress.can_transition_to(Open));
        assert!(!Open.can_transition_to(Open));
    }
}
