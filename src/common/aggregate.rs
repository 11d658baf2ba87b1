use crate::common::{DomainEvent, DomainResult};

pub trait AggregateRoot: Send + Sync {
    type Event: DomainEvent;

    fn aggregate_id(&self) -> &str;
    fn version(&self) -> u64;

    /// Apply an event to update the aggregate state
    fn apply(&mut self, event: &Self::Event) -> DomainResult<()>;

    /// Get uncommitted events
    fn uncommitted_events(&self) -> &[Self::Event];

    /// Mark events as committed
    fn mark_events_as_committed(&mut self);

    /// Add a new event to the uncommitted events list
    fn add_event(&mut self, event: Self::Event);

    /// Hand the uncommitted events to the caller and clear them.
    fn take_uncommitted_events(&mut self) -> Vec<Self::Event>
    where
        Self::Event: Clone,
    {
        let events = self.uncommitted_events().to_vec();
        self.mark_events_as_committed();
        events
    }
}
