// Elements whose processing must wait for child elements that come later in the document.
//
// A pending process lives in an arena and is addressed by the index it was given when it was
// registered. It leaves the arena exactly once: when the last child it is waiting for arrives
// (and it is finalized), or when it is discarded because its element ended first or the session
// ended.

use indexmap::IndexMap;
use crate::scanner::TagEvent;
use crate::values::TypedAttributes;
use super::addressing::AddressingState;
use super::state::Level;
use super::tags::DashTag;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct PendingId(usize);

/// A child element that arrived while its parent was pending and that the parent does not wait
/// for. It is applied after the parent has been finalized.
#[derive(Debug, Clone)]
pub(crate) struct BufferedChild {
    pub tag: DashTag,
    pub attributes: TypedAttributes,
}

#[derive(Debug, Clone)]
pub(crate) struct PendingProcess {
    pub event: TagEvent,
    pub level: Level,
    pub waiting_for: IndexMap<String, Option<TagEvent>>,
    pub buffered: Vec<BufferedChild>,
    pub state: AddressingState,
}

impl PendingProcess {
    pub(crate) fn new(event: TagEvent, level: Level, waiting_for: &[&str], state: AddressingState) -> PendingProcess {
        PendingProcess {
            event,
            level,
            waiting_for: waiting_for.iter().map(|k| (k.to_string(), None)).collect(),
            buffered: Vec::new(),
            state,
        }
    }

    pub(crate) fn is_satisfied(&self) -> bool {
        self.waiting_for.values().all(Option::is_some)
    }

    pub(crate) fn missing(&self) -> Vec<&str> {
        self.waiting_for.iter()
            .filter(|(_, v)| v.is_none())
            .map(|(k, _)| k.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PendingRegistry {
    slots: Vec<Option<PendingProcess>>,
}

impl PendingRegistry {
    pub(crate) fn register(&mut self, process: PendingProcess) -> PendingId {
        self.slots.push(Some(process));
        PendingId(self.slots.len() - 1)
    }

    pub(crate) fn get_mut(&mut self, id: PendingId) -> Option<&mut PendingProcess> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    pub(crate) fn is_open(&self, id: PendingId) -> bool {
        matches!(self.slots.get(id.0), Some(Some(_)))
    }

    /// Whether the process is waiting for a child element called `key`.
    pub(crate) fn waits_for(&self, id: PendingId, key: &str) -> bool {
        matches!(self.slots.get(id.0), Some(Some(p)) if matches!(p.waiting_for.get(key), Some(None)))
    }

    /// Record the arrival of a child. Returns the process, removed from the registry, once it has
    /// everything it was waiting for.
    pub(crate) fn satisfy(&mut self, id: PendingId, child: TagEvent) -> Option<PendingProcess> {
        let process = self.get_mut(id)?;
        match process.waiting_for.get_mut(&child.key) {
            Some(slot) if slot.is_none() => *slot = Some(child),
            _ => return None,
        }
        if process.is_satisfied() {
            self.slots.get_mut(id.0).and_then(Option::take)
        } else {
            None
        }
    }

    pub(crate) fn discard(&mut self, id: PendingId) -> Option<PendingProcess> {
        self.slots.get_mut(id.0).and_then(Option::take)
    }

    /// Remove every process that is still open, in registration order.
    pub(crate) fn drain(&mut self) -> Vec<PendingProcess> {
        std::mem::take(&mut self.slots).into_iter().flatten().collect()
    }
}
