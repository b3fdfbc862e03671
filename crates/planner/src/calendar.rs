use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use backoffice_core::{DomainError, DomainResult, Entity, EventId, Owned, UserId};

/// Input for a new calendar entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewCalendarEvent {
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// A personal calendar entry spanning `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: EventId,
    pub owner: UserId,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl CalendarEvent {
    pub fn new(owner: UserId, input: NewCalendarEvent) -> DomainResult<Self> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(DomainError::validation("event title is required"));
        }
        if input.start >= input.end {
            return Err(DomainError::validation("event must end after it starts"));
        }
        Ok(Self {
            id: EventId::new(0),
            owner,
            title: title.to_string(),
            start: input.start,
            end: input.end,
        })
    }

    pub fn overlaps(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        self.start < to && from < self.end
    }
}

impl Entity for CalendarEvent {
    type Id = EventId;

    fn id(&self) -> EventId {
        self.id
    }
}

impl Owned for CalendarEvent {
    fn owner(&self) -> UserId {
        self.owner
    }

    fn assign_id(&mut self, id: EventId) {
        self.id = id;
    }
}
