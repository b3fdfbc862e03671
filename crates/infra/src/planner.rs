//! Personal planner service: memos and calendar events.
//!
//! Records are private to their owner. Every operation resolves the owner
//! first (from the stored record, or the requested listing) and applies the
//! `ManagePlanner` policy against it, so a MASTER may look in and any other
//! caller is limited to their own records.

use chrono::{DateTime, Utc};
use tracing::info;

use backoffice_auth::{Operation, Principal, authorize};
use backoffice_core::{DomainError, DomainResult, EventId, MemoId, Owned, UserId};
use backoffice_planner::{CalendarEvent, Memo, NewCalendarEvent};

use crate::store::OwnedStore;

#[derive(Debug)]
pub struct PlannerService<M, E> {
    memos: M,
    events: E,
}

impl<M, E> PlannerService<M, E>
where
    M: OwnedStore<Memo>,
    E: OwnedStore<CalendarEvent>,
{
    pub fn new(memos: M, events: E) -> Self {
        Self { memos, events }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Memos
    // ─────────────────────────────────────────────────────────────────────────

    /// Memos of `owner` (the caller when `None`), newest first.
    pub fn list_memos(&self, principal: &Principal, owner: Option<UserId>) -> DomainResult<Vec<Memo>> {
        let owner = owner.unwrap_or(principal.id);
        authorize(principal, Operation::ManagePlanner, Some(owner))?;

        let mut memos = self.memos.list_for_owner(owner)?;
        memos.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(memos)
    }

    pub fn create_memo(&self, principal: &Principal, content: &str, now: DateTime<Utc>) -> DomainResult<Memo> {
        let memo = self.memos.insert(Memo::new(principal.id, content, now)?)?;
        info!(memo_id = %memo.id, owner = %memo.owner, "memo created");
        Ok(memo)
    }

    pub fn edit_memo(
        &self,
        principal: &Principal,
        id: MemoId,
        content: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<Memo> {
        let mut memo = owned(principal, self.memos.get(id)?)?;
        memo.edit(content, now)?;
        self.memos.update(&memo)?;
        Ok(memo)
    }

    pub fn delete_memo(&self, principal: &Principal, id: MemoId) -> DomainResult<()> {
        let memo = owned(principal, self.memos.get(id)?)?;
        self.memos.delete(memo.id)?;
        info!(memo_id = %id, caller = %principal.id, "memo deleted");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Calendar
    // ─────────────────────────────────────────────────────────────────────────

    /// Events of `owner` ordered by start, optionally limited to those
    /// overlapping `[from, to)`.
    pub fn list_events(
        &self,
        principal: &Principal,
        owner: Option<UserId>,
        window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> DomainResult<Vec<CalendarEvent>> {
        let owner = owner.unwrap_or(principal.id);
        authorize(principal, Operation::ManagePlanner, Some(owner))?;

        let mut events = self.events.list_for_owner(owner)?;
        if let Some((from, to)) = window {
            events.retain(|e| e.overlaps(from, to));
        }
        events.sort_by(|a, b| a.start.cmp(&b.start).then(a.id.cmp(&b.id)));
        Ok(events)
    }

    pub fn create_event(&self, principal: &Principal, input: NewCalendarEvent) -> DomainResult<CalendarEvent> {
        let event = self.events.insert(CalendarEvent::new(principal.id, input)?)?;
        info!(event_id = %event.id, owner = %event.owner, "calendar event created");
        Ok(event)
    }

    pub fn delete_event(&self, principal: &Principal, id: EventId) -> DomainResult<()> {
        let event = owned(principal, self.events.get(id)?)?;
        self.events.delete(event.id)?;
        Ok(())
    }
}

/// Missing records are `NotFound`; someone else's are `Forbidden`.
fn owned<T: Owned>(principal: &Principal, record: Option<T>) -> DomainResult<T> {
    let record = record.ok_or(DomainError::NotFound)?;
    authorize(principal, Operation::ManagePlanner, Some(record.owner()))?;
    Ok(record)
}
