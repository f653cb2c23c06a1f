use std::fmt;
use std::sync::Arc;

use crate::{Record, RowKey, Value};

/// Name of a grid notification, used to register handlers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventKind {
    Ready,
    DataLoaded,
    Error,
    SelectionChanged,
    CellEditStart,
    CellEditCommit,
    CellEditCancel,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GridEvent {
    Ready,
    DataLoaded {
        data: Vec<Record>,
        total: usize,
    },
    Error {
        cause: String,
    },
    SelectionChanged {
        rows: Vec<Record>,
    },
    CellEditStart {
        key: RowKey,
        row: Record,
        field: String,
        old_value: Value,
    },
    CellEditCommit {
        key: RowKey,
        row: Record,
        field: String,
        old_value: Value,
        new_value: Value,
    },
    CellEditCancel {
        key: RowKey,
        row: Record,
        field: String,
    },
}

impl GridEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Ready => EventKind::Ready,
            Self::DataLoaded { .. } => EventKind::DataLoaded,
            Self::Error { .. } => EventKind::Error,
            Self::SelectionChanged { .. } => EventKind::SelectionChanged,
            Self::CellEditStart { .. } => EventKind::CellEditStart,
            Self::CellEditCommit { .. } => EventKind::CellEditCommit,
            Self::CellEditCancel { .. } => EventKind::CellEditCancel,
        }
    }
}

pub type EventHandler = Arc<dyn Fn(&GridEvent) + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

/// Per-event handler registry. Handlers run in registration order.
#[derive(Clone, Default)]
pub struct EventBus {
    handlers: Vec<(HandlerId, EventKind, EventHandler)>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(
        &mut self,
        kind: EventKind,
        handler: impl Fn(&GridEvent) + Send + Sync + 'static,
    ) -> HandlerId {
        self.next_id += 1;
        let id = HandlerId(self.next_id);
        self.handlers.push((id, kind, Arc::new(handler)));
        id
    }

    /// Removes a handler. Returns whether it was registered.
    pub fn off(&mut self, id: HandlerId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(h, _, _)| *h != id);
        self.handlers.len() != before
    }

    pub fn has_handlers(&self, kind: EventKind) -> bool {
        self.handlers.iter().any(|(_, k, _)| *k == kind)
    }

    pub fn emit(&self, event: &GridEvent) {
        let kind = event.kind();
        gtrace!(?kind, "emit");
        for (_, k, handler) in &self.handlers {
            if *k == kind {
                handler(event);
            }
        }
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &self.handlers.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}
