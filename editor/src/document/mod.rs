//! The narrow document model the tools and commands operate on
//!
//! A document is a set of textured faces with a selection and a
//! modification count. Changes are made through commands so they can be
//! undone.

mod face;
mod map_document;

pub use face::{AttributeChange, ChangeFaceAttributesRequest, Face, FaceAttributes, FaceId};
pub use map_document::{DocumentCommandFacade, DocumentState, MapDocument};
