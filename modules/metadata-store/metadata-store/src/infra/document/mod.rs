pub mod codec;
pub mod dto;

pub use codec::JsonDocumentCodec;
pub use dto::MetadataDocument;
