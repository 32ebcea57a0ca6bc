pub mod discovery;
pub mod document;

pub use discovery::{InventoryDiscoverer, StaticDiscoverer};
pub use document::JsonDocumentCodec;
