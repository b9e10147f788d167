#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub u64);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LayerKind {
    /// Tiled raster base map.
    Base,
    /// Caller-supplied feature collection.
    Vector,
}

pub trait Layer {
    fn id(&self) -> LayerId;

    fn kind(&self) -> LayerKind;
}
