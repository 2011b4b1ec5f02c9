//! The codec subsystem.
//!
//! Descriptor blobs sent by the server are parsed into a tree of codecs
//! ([`descriptor`]), kept per connection in a [`CodecRegistry`] keyed by
//! descriptor ID. Each [`Codec`] encodes query arguments and decodes result
//! rows between the wire and [`EdbValue`](crate::EdbValue).

mod base_types;
mod codec;
mod descriptor;
mod registry;

pub(crate) use codec::{Codec, CodecKind, NamedField, ScalarKind, ShapeField};
pub(crate) use descriptor::register_descriptors;
pub(crate) use registry::CodecRegistry;
