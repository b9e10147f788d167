use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HandlerId(pub u64);

/// Shape produced by a construction handler.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Polygon,
    Line,
    Point,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerKind {
    /// Turns pointer clicks into a new shape.
    Constructor(ShapeKind),
    /// Drags vertices of existing drafts.
    Modifier,
    /// Pulls the pointer onto nearby draft vertices.
    Snapper,
}

/// Pointer-interaction registration offered by the host map.
///
/// Ids returned by `attach` are never reused, so an event tagged with a
/// detached id can always be told apart from a live one.
pub trait InteractionSurface {
    fn attach(&mut self, kind: HandlerKind) -> HandlerId;

    fn detach(&mut self, id: HandlerId);
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    Attached(HandlerId, HandlerKind),
    Detached(HandlerId),
}

/// Surface without a renderer; keeps the attached set and an event log.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    next_id: u64,
    attached: BTreeMap<HandlerId, HandlerKind>,
    log: Vec<SurfaceEvent>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attached(&self) -> impl Iterator<Item = (HandlerId, HandlerKind)> + '_ {
        self.attached.iter().map(|(id, kind)| (*id, *kind))
    }

    pub fn attached_count(&self) -> usize {
        self.attached.len()
    }

    pub fn is_attached(&self, id: HandlerId) -> bool {
        self.attached.contains_key(&id)
    }

    pub fn log(&self) -> &[SurfaceEvent] {
        &self.log
    }
}

impl InteractionSurface for HeadlessSurface {
    fn attach(&mut self, kind: HandlerKind) -> HandlerId {
        self.next_id += 1;
        let id = HandlerId(self.next_id);
        self.attached.insert(id, kind);
        self.log.push(SurfaceEvent::Attached(id, kind));
        id
    }

    fn detach(&mut self, id: HandlerId) {
        if self.attached.remove(&id).is_some() {
            self.log.push(SurfaceEvent::Detached(id));
        }
    }
}
