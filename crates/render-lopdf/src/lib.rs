//! Tagged PDF output device built on lopdf.
//!
//! Content streams are assembled per page and streamed to the output as soon
//! as the page closes; shared resources, the structure tree and the catalog
//! follow when the device is finished.

mod device;
mod fonts;
mod graphics;
mod image;
mod links;
mod outline;
mod page;
mod path;
mod sink;
mod structure;
mod tagger;
mod text;
mod transform;
mod writer;

pub use device::{DEFAULT_DOTS_PER_POINT, DeviceSettings, DocumentInfo, LopdfOutputDevice};
pub use graphics::GraphicsStateTracker;
pub use links::{LinkAction, LinkArea, LinkAnnotator, resolve_uri, xyz_destination};
pub use outline::OutlineEntry;
pub use path::{PaintIntent, PathRenderer};
pub use sink::ContentSink;
pub use structure::{NodeId, StructKid, StructNode, StructureTree};
pub use tagger::{RunPosition, StructureContext, block_role};
pub use transform::CoordinateTransformer;
pub use writer::StreamingPdfWriter;
