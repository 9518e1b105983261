pub mod composer;
mod geometry;
mod projection;
mod renderer;
mod spatial;

pub use composer::{
    build_base_layers, build_legend, build_overlay, compose_map, BaseLayer, BaseStyle, LayerControl,
    LegendControl, MapHandle, Marker, OverlayLayer, Position, TileLayer,
};
pub use projection::{Viewport, PIXELS_PER_DOT};
pub use renderer::{marker_dots, Lod, MapLayers, MapRenderer, MarkerLayer};
pub use spatial::PointGrid;
