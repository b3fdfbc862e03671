//! State-machine traits for records whose changes go through commands.

/// A record with a stable identity and a change counter.
pub trait AggregateRoot {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;

    /// Number of events applied since the record was created.
    fn version(&self) -> u64;
}

/// Command/event split for a record.
///
/// `handle` looks at current state and decides which events a command
/// produces, or refuses it. `apply` folds one event into the state. Neither
/// touches storage; the caller persists the record afterwards.
pub trait Aggregate: AggregateRoot {
    type Command: Clone + core::fmt::Debug;
    type Event: Clone + core::fmt::Debug;
    type Error: core::fmt::Debug;

    fn apply(&mut self, event: &Self::Event);

    /// Must not mutate; a refused command leaves the record as it was.
    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;

    /// `handle`, then `apply` each resulting event.
    fn execute(&mut self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        let events = self.handle(command)?;
        for event in &events {
            self.apply(event);
        }
        Ok(events)
    }
}
