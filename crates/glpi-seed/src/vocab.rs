//! Closed vocabularies for the integer codes GLPI stores.
//!
//! Every generated record takes its status/priority/validation values from
//! these enums, so an out-of-range code cannot be produced.

/// Ordinal scale shared by priority, urgency and impact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl Level {
    pub const ALL: [Level; 5] = [
        Level::VeryLow,
        Level::Low,
        Level::Medium,
        Level::High,
        Level::VeryHigh,
    ];

    pub fn code(self) -> i64 {
        match self {
            Level::VeryLow => 1,
            Level::Low => 2,
            Level::Medium => 3,
            Level::High => 4,
            Level::VeryHigh => 5,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.code() == code)
    }

    /// Position in [`Level::ALL`].
    pub fn index(self) -> usize {
        (self.code() - 1) as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Level::VeryLow => "very_low",
            Level::Low => "low",
            Level::Medium => "medium",
            Level::High => "high",
            Level::VeryHigh => "very_high",
        }
    }
}

/// Ticket (incident) lifecycle codes used by the incident generator.
///
/// GLPI's `closed` (6) is intentionally absent: synthetic incidents are
/// always still open or solved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TicketStatus {
    New,
    Assigned,
    Planned,
    Waiting,
    Solved,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 5] = [
        TicketStatus::New,
        TicketStatus::Assigned,
        TicketStatus::Planned,
        TicketStatus::Waiting,
        TicketStatus::Solved,
    ];

    pub fn code(self) -> i64 {
        match self {
            TicketStatus::New => 1,
            TicketStatus::Assigned => 2,
            TicketStatus::Planned => 3,
            TicketStatus::Waiting => 4,
            TicketStatus::Solved => 5,
        }
    }
}

/// Change lifecycle.
///
/// `Closed` shares code 6 with `InProgress`, matching the GLPI instance
/// these records are seeded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeStatus {
    New,
    Planning,
    Approval,
    Approved,
    Waiting,
    InProgress,
    Applied,
    Review,
    Closed,
}

impl ChangeStatus {
    pub const ALL: [ChangeStatus; 9] = [
        ChangeStatus::New,
        ChangeStatus::Planning,
        ChangeStatus::Approval,
        ChangeStatus::Approved,
        ChangeStatus::Waiting,
        ChangeStatus::InProgress,
        ChangeStatus::Applied,
        ChangeStatus::Review,
        ChangeStatus::Closed,
    ];

    pub fn code(self) -> i64 {
        match self {
            ChangeStatus::New => 1,
            ChangeStatus::Planning => 2,
            ChangeStatus::Approval => 3,
            ChangeStatus::Approved => 4,
            ChangeStatus::Waiting => 5,
            ChangeStatus::InProgress | ChangeStatus::Closed => 6,
            ChangeStatus::Applied => 7,
            ChangeStatus::Review => 8,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ChangeStatus::New => "new",
            ChangeStatus::Planning => "planning",
            ChangeStatus::Approval => "approval",
            ChangeStatus::Approved => "approved",
            ChangeStatus::Waiting => "waiting",
            ChangeStatus::InProgress => "in_progress",
            ChangeStatus::Applied => "applied",
            ChangeStatus::Review => "review",
            ChangeStatus::Closed => "closed",
        }
    }

    /// Global validation state implied by this status.
    pub fn validation(self) -> GlobalValidation {
        match self {
            ChangeStatus::Approved
            | ChangeStatus::InProgress
            | ChangeStatus::Applied
            | ChangeStatus::Review
            | ChangeStatus::Closed => GlobalValidation::Accepted,
            ChangeStatus::Approval => GlobalValidation::Pending,
            ChangeStatus::New | ChangeStatus::Planning | ChangeStatus::Waiting => {
                GlobalValidation::None
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlobalValidation {
    None,
    Pending,
    Accepted,
    Rejected,
}

impl GlobalValidation {
    pub fn code(self) -> i64 {
        match self {
            GlobalValidation::None => 0,
            GlobalValidation::Pending => 1,
            GlobalValidation::Accepted => 2,
            GlobalValidation::Rejected => 3,
        }
    }
}
