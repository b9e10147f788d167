use foundation::Coord;
use formats::wkt::{self, WktError};
use scene::{Feature, Geometry, GeometryType};
use serde::{Deserialize, Serialize};

use crate::surface::{HandlerId, HandlerKind, InteractionSurface, ShapeKind};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawMode {
    #[default]
    None,
    Polygon,
    Line,
    Point,
}

impl DrawMode {
    pub fn shape(self) -> Option<ShapeKind> {
        match self {
            DrawMode::None => None,
            DrawMode::Polygon => Some(ShapeKind::Polygon),
            DrawMode::Line => Some(ShapeKind::Line),
            DrawMode::Point => Some(ShapeKind::Point),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum DrawingState {
    #[default]
    Idle,
    Drawing(ShapeKind),
}

/// The three handlers attached for one drawing mode.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct HandlerSet {
    pub constructor: HandlerId,
    pub modifier: HandlerId,
    pub snapper: HandlerId,
}

impl HandlerSet {
    fn attach<S: InteractionSurface + ?Sized>(surface: &mut S, shape: ShapeKind) -> Self {
        Self {
            constructor: surface.attach(HandlerKind::Constructor(shape)),
            modifier: surface.attach(HandlerKind::Modifier),
            snapper: surface.attach(HandlerKind::Snapper),
        }
    }

    fn detach<S: InteractionSurface + ?Sized>(self, surface: &mut S) {
        surface.detach(self.constructor);
        surface.detach(self.modifier);
        surface.detach(self.snapper);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawError {
    /// The event came from a handler that is no longer attached.
    StaleHandler(HandlerId),
    /// The handler is live but does not produce this kind of event.
    WrongHandler(HandlerId),
    UnknownDraft(usize),
    /// A point is built from exactly one click.
    PointVertices(usize),
    Wkt(WktError),
}

impl std::fmt::Display for DrawError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DrawError::StaleHandler(id) => write!(f, "handler {} is detached", id.0),
            DrawError::WrongHandler(id) => {
                write!(f, "handler {} cannot emit this event", id.0)
            }
            DrawError::UnknownDraft(i) => write!(f, "no draft at index {i}"),
            DrawError::PointVertices(n) => write!(f, "a point needs one vertex, got {n}"),
            DrawError::Wkt(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for DrawError {}

impl From<WktError> for DrawError {
    fn from(e: WktError) -> Self {
        DrawError::Wkt(e)
    }
}

/// Receives the WKT of each committed or edited shape, and `None` on clear.
pub type WktSubscriber = Box<dyn FnMut(Option<&str>)>;

/// Drawing lifecycle over a host interaction surface.
///
/// At most one handler set is attached at any time. `start` detaches the old
/// set before attaching the new one, so no event reaches a handler from a
/// previous mode once `start` returns. Drafts survive `stop` and mode changes
/// and are only emptied by `clear`.
#[derive(Default)]
pub struct DrawingStateMachine {
    state: DrawingState,
    handlers: Option<HandlerSet>,
    drafts: Vec<Feature>,
    subscriber: Option<WktSubscriber>,
}

impl std::fmt::Debug for DrawingStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawingStateMachine")
            .field("state", &self.state)
            .field("handlers", &self.handlers)
            .field("drafts", &self.drafts.len())
            .finish()
    }
}

impl DrawingStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(Option<&str>) + 'static) {
        self.subscriber = Some(Box::new(subscriber));
    }

    pub fn state(&self) -> DrawingState {
        self.state
    }

    pub fn active_handlers(&self) -> Option<HandlerSet> {
        self.handlers
    }

    pub fn drafts(&self) -> &[Feature] {
        &self.drafts
    }

    /// Switches to `mode`; `DrawMode::None` is the same as [`Self::stop`].
    pub fn start<S: InteractionSurface + ?Sized>(&mut self, surface: &mut S, mode: DrawMode) {
        let Some(shape) = mode.shape() else {
            self.stop(surface);
            return;
        };
        self.detach_all(surface);
        self.handlers = Some(HandlerSet::attach(surface, shape));
        self.state = DrawingState::Drawing(shape);
        tracing::debug!(?shape, "drawing started");
    }

    pub fn stop<S: InteractionSurface + ?Sized>(&mut self, surface: &mut S) {
        if self.handlers.is_some() {
            tracing::debug!("drawing stopped");
        }
        self.detach_all(surface);
        self.state = DrawingState::Idle;
    }

    /// A shape finished by the construction handler.
    ///
    /// Returns the draft's index and its WKT. Events from detached handlers
    /// are rejected without touching the drafts.
    pub fn commit(
        &mut self,
        handler: HandlerId,
        coords: &[Coord],
    ) -> Result<(usize, String), DrawError> {
        let handlers = self.live_handlers(handler)?;
        let DrawingState::Drawing(shape) = self.state else {
            return Err(DrawError::StaleHandler(handler));
        };
        if handler != handlers.constructor {
            return Err(DrawError::WrongHandler(handler));
        }
        let (geometry, text) = build(shape, coords)?;
        self.drafts.push(Feature::new(geometry));
        self.notify(Some(&text));
        Ok((self.drafts.len() - 1, text))
    }

    /// Vertex edit of an existing draft by the modifier handler.
    pub fn modify(
        &mut self,
        handler: HandlerId,
        draft: usize,
        coords: &[Coord],
    ) -> Result<String, DrawError> {
        let handlers = self.live_handlers(handler)?;
        if handler != handlers.modifier {
            return Err(DrawError::WrongHandler(handler));
        }
        let shape = match self.drafts.get(draft).map(Feature::geometry_type) {
            Some(GeometryType::Polygon) => ShapeKind::Polygon,
            Some(GeometryType::LineString) => ShapeKind::Line,
            Some(GeometryType::Point) => ShapeKind::Point,
            Some(_) | None => return Err(DrawError::UnknownDraft(draft)),
        };
        let (geometry, text) = build(shape, coords)?;
        self.drafts[draft].geometry = geometry;
        self.notify(Some(&text));
        Ok(text)
    }

    /// Nearest draft vertex within `tolerance` of `at`, for the snapping handler.
    pub fn snap(
        &self,
        handler: HandlerId,
        at: Coord,
        tolerance: f64,
    ) -> Result<Option<Coord>, DrawError> {
        let handlers = self.live_handlers(handler)?;
        if handler != handlers.snapper {
            return Err(DrawError::WrongHandler(handler));
        }
        let mut best: Option<(f64, Coord)> = None;
        for draft in &self.drafts {
            draft.geometry.for_each_coord(|c| {
                let d = (c[0] - at[0]).hypot(c[1] - at[1]);
                if d <= tolerance && best.is_none_or(|(bd, _)| d < bd) {
                    best = Some((d, c));
                }
            });
        }
        Ok(best.map(|(_, c)| c))
    }

    /// Drops every draft and tells the subscriber there is nothing to export.
    pub fn clear(&mut self) {
        self.drafts.clear();
        self.notify(None);
    }

    fn live_handlers(&self, handler: HandlerId) -> Result<HandlerSet, DrawError> {
        match self.handlers {
            Some(set) if [set.constructor, set.modifier, set.snapper].contains(&handler) => Ok(set),
            _ => {
                tracing::debug!(handler = handler.0, "ignoring event from detached handler");
                Err(DrawError::StaleHandler(handler))
            }
        }
    }

    fn detach_all<S: InteractionSurface + ?Sized>(&mut self, surface: &mut S) {
        if let Some(set) = self.handlers.take() {
            set.detach(surface);
        }
    }

    fn notify(&mut self, wkt: Option<&str>) {
        if let Some(subscriber) = self.subscriber.as_mut() {
            subscriber(wkt);
        }
    }
}

fn build(shape: ShapeKind, coords: &[Coord]) -> Result<(Geometry, String), DrawError> {
    match shape {
        ShapeKind::Polygon => {
            let text = wkt::encode_polygon(coords)?;
            Ok((Geometry::Polygon(vec![wkt::close_ring(coords)?]), text))
        }
        ShapeKind::Line => {
            let text = wkt::encode_line(coords)?;
            Ok((Geometry::LineString(coords.to_vec()), text))
        }
        ShapeKind::Point => match coords {
            [c] => Ok((Geometry::Point(*c), wkt::encode_point(*c)?)),
            _ => Err(DrawError::PointVertices(coords.len())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{HeadlessSurface, SurfaceEvent};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    const SQUARE: [Coord; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

    fn recording() -> (DrawingStateMachine, Rc<RefCell<Vec<Option<String>>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut machine = DrawingStateMachine::new();
        machine.subscribe(move |wkt| sink.borrow_mut().push(wkt.map(str::to_string)));
        (machine, seen)
    }

    #[test]
    fn switching_modes_leaves_one_handler_set() {
        let mut surface = HeadlessSurface::new();
        let mut m = DrawingStateMachine::new();
        m.start(&mut surface, DrawMode::Polygon);
        let first = m.active_handlers().expect("attached");
        m.start(&mut surface, DrawMode::Line);

        assert_eq!(surface.attached_count(), 3);
        assert_eq!(m.state(), DrawingState::Drawing(ShapeKind::Line));
        assert!(!surface.is_attached(first.constructor));
        assert!(
            surface
                .attached()
                .any(|(_, k)| k == HandlerKind::Constructor(ShapeKind::Line))
        );
        // Old handlers go away before the new ones arrive.
        let log = surface.log();
        assert_eq!(log[3], SurfaceEvent::Detached(first.constructor));
        assert!(matches!(
            log[6],
            SurfaceEvent::Attached(_, HandlerKind::Constructor(ShapeKind::Line))
        ));
    }

    #[test]
    fn stop_twice_is_a_no_op() {
        let mut surface = HeadlessSurface::new();
        let mut m = DrawingStateMachine::new();
        m.start(&mut surface, DrawMode::Point);
        m.stop(&mut surface);
        let events = surface.log().len();
        m.stop(&mut surface);
        assert_eq!(surface.log().len(), events);
        assert_eq!(surface.attached_count(), 0);
        assert_eq!(m.state(), DrawingState::Idle);
        assert_eq!(m.active_handlers(), None);
    }

    #[test]
    fn start_none_stops() {
        let mut surface = HeadlessSurface::new();
        let mut m = DrawingStateMachine::new();
        m.start(&mut surface, DrawMode::Polygon);
        m.start(&mut surface, DrawMode::None);
        assert_eq!(m.state(), DrawingState::Idle);
        assert_eq!(surface.attached_count(), 0);
    }

    #[test]
    fn commit_reports_wkt_and_keeps_drawing() {
        let mut surface = HeadlessSurface::new();
        let (mut m, seen) = recording();
        m.start(&mut surface, DrawMode::Polygon);
        let h = m.active_handlers().expect("attached");

        let (index, text) = m.commit(h.constructor, &SQUARE).expect("commit");
        assert_eq!(index, 0);
        assert_eq!(text, "POLYGON ((0 0, 1 0, 1 1, 0 1, 0 0))");
        assert_eq!(m.state(), DrawingState::Drawing(ShapeKind::Polygon));
        assert_eq!(*seen.borrow(), vec![Some(text)]);
        assert_eq!(m.drafts().len(), 1);
    }

    #[test]
    fn events_from_detached_handlers_are_ignored() {
        let mut surface = HeadlessSurface::new();
        let (mut m, seen) = recording();
        m.start(&mut surface, DrawMode::Polygon);
        let old = m.active_handlers().expect("attached");
        m.start(&mut surface, DrawMode::Line);

        assert_eq!(
            m.commit(old.constructor, &SQUARE),
            Err(DrawError::StaleHandler(old.constructor))
        );
        m.stop(&mut surface);
        let line = [[0.0, 0.0], [2.0, 2.0]];
        assert!(m.commit(old.constructor, &line).is_err());
        assert!(m.drafts().is_empty());
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn drafts_survive_stop_and_clear_notifies_none() {
        let mut surface = HeadlessSurface::new();
        let (mut m, seen) = recording();
        m.start(&mut surface, DrawMode::Line);
        let h = m.active_handlers().expect("attached");
        m.commit(h.constructor, &[[0.0, 0.0], [2.5, -1.0]]).expect("commit");
        m.stop(&mut surface);
        assert_eq!(m.drafts().len(), 1);

        m.start(&mut surface, DrawMode::Point);
        m.clear();
        assert!(m.drafts().is_empty());
        assert_eq!(m.state(), DrawingState::Drawing(ShapeKind::Point));
        assert_eq!(
            *seen.borrow(),
            vec![Some("LINESTRING (0 0, 2.5 -1)".to_string()), None]
        );
    }

    #[test]
    fn modifier_edits_replace_the_draft() {
        let mut surface = HeadlessSurface::new();
        let (mut m, seen) = recording();
        m.start(&mut surface, DrawMode::Polygon);
        let h = m.active_handlers().expect("attached");
        m.commit(h.constructor, &SQUARE).expect("commit");

        let moved = [[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0]];
        assert_eq!(
            m.modify(h.constructor, 0, &moved),
            Err(DrawError::WrongHandler(h.constructor))
        );
        let text = m.modify(h.modifier, 0, &moved).expect("modify");
        assert_eq!(text, "POLYGON ((0 0, 2 0, 2 2, 0 2, 0 0))");
        assert_eq!(m.drafts()[0].extent().to_array(), [0.0, 0.0, 2.0, 2.0]);
        assert_eq!(seen.borrow().len(), 2);
        assert_eq!(m.modify(h.modifier, 3, &moved), Err(DrawError::UnknownDraft(3)));
    }

    #[test]
    fn invalid_shapes_are_rejected() {
        let mut surface = HeadlessSurface::new();
        let mut m = DrawingStateMachine::new();
        m.start(&mut surface, DrawMode::Polygon);
        let h = m.active_handlers().expect("attached");
        assert!(matches!(
            m.commit(h.constructor, &[[0.0, 0.0], [1.0, 1.0]]),
            Err(DrawError::Wkt(WktError::TooFewVertices { .. }))
        ));

        m.start(&mut surface, DrawMode::Point);
        let h = m.active_handlers().expect("attached");
        assert_eq!(
            m.commit(h.constructor, &[[0.0, 0.0], [1.0, 1.0]]),
            Err(DrawError::PointVertices(2))
        );
        assert!(m.drafts().is_empty());
    }

    #[test]
    fn snapper_finds_nearest_vertex() {
        let mut surface = HeadlessSurface::new();
        let mut m = DrawingStateMachine::new();
        m.start(&mut surface, DrawMode::Polygon);
        let h = m.active_handlers().expect("attached");
        m.commit(h.constructor, &SQUARE).expect("commit");

        assert_eq!(m.snap(h.snapper, [0.9, 1.05], 0.2), Ok(Some([1.0, 1.0])));
        assert_eq!(m.snap(h.snapper, [0.5, 0.5], 0.2), Ok(None));
        assert_eq!(
            m.snap(h.modifier, [0.5, 0.5], 0.2),
            Err(DrawError::WrongHandler(h.modifier))
        );
    }
}
