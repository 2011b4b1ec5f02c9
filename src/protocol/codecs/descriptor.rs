//! Parsing of type-descriptor blobs.
//!
//! A blob is a sequence of self-describing entries, each carrying a kind
//! byte, the 16-byte descriptor ID, and a kind-specific body. Bodies refer
//! to other descriptors by ID; the blob is ordered so that every referenced
//! descriptor is already registered (there are no forward references). The
//! last entry is the root that `CommandDataDescription` echoes.

use crate::protocol::buffer::Reader;
use crate::protocol::codecs::{Codec, CodecKind, CodecRegistry, NamedField, ShapeField};
use crate::{EdbError, EdbResult};
use std::sync::Arc;
use uuid::Uuid;

const KIND_SET: u8 = 0;
const KIND_SHAPE: u8 = 1;
const KIND_BASE_SCALAR: u8 = 2;
const KIND_SCALAR: u8 = 3;
const KIND_TUPLE: u8 = 4;
const KIND_NAMED_TUPLE: u8 = 5;
const KIND_ARRAY: u8 = 6;
const KIND_ENUM: u8 = 7;
const KIND_INPUT_SHAPE: u8 = 8;
const KIND_RANGE: u8 = 9;

const SHAPE_FLAG_OPTIONAL: u8 = 0x01;

/// Parses a descriptor blob and registers a codec for every entry.
pub(crate) fn register_descriptors(registry: &mut CodecRegistry, blob: &[u8]) -> EdbResult<()> {
    let mut rdr = Reader::new(blob);
    while !rdr.is_empty() {
        let kind = rdr.pop_u8()?;
        let id = rdr.pop_uuid()?;
        let codec = match kind {
            KIND_SET => CodecKind::Set {
                element: reference(registry, &mut rdr)?,
            },
            KIND_SHAPE | KIND_INPUT_SHAPE => CodecKind::Object {
                fields: parse_shape_fields(registry, &mut rdr)?,
            },
            KIND_BASE_SCALAR => {
                // no body; the ID must be one of the built-in scalars
                if !registry.contains(&id) {
                    return Err(EdbError::Protocol(format!(
                        "base scalar descriptor with unknown ID {id}"
                    )));
                }
                continue;
            }
            KIND_SCALAR => CodecKind::ScalarAlias {
                base: reference(registry, &mut rdr)?,
            },
            KIND_TUPLE => {
                let count = rdr.pop_u16()?;
                let mut elements = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    elements.push(reference(registry, &mut rdr)?);
                }
                CodecKind::Tuple { elements }
            }
            KIND_NAMED_TUPLE => {
                let count = rdr.pop_u16()?;
                let mut fields = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    let name = rdr.pop_str()?.to_string();
                    fields.push(NamedField {
                        name,
                        codec: reference(registry, &mut rdr)?,
                    });
                }
                CodecKind::NamedTuple { fields }
            }
            KIND_ARRAY => {
                let element = reference(registry, &mut rdr)?;
                let ndims = rdr.pop_u16()?;
                for _ in 0..ndims {
                    rdr.pop_i32()?; // declared dimension length, unused
                }
                if ndims > 1 {
                    return Err(EdbError::Protocol(format!(
                        "{ndims}-dimensional array descriptors are not supported"
                    )));
                }
                CodecKind::Array { element }
            }
            KIND_ENUM => {
                let count = rdr.pop_u16()?;
                let mut members = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    members.push(rdr.pop_str()?.to_string());
                }
                CodecKind::Enum { members }
            }
            KIND_RANGE => CodecKind::Range {
                element: reference(registry, &mut rdr)?,
            },
            kind => {
                return Err(EdbError::Protocol(format!(
                    "unknown type descriptor kind {kind}"
                )))
            }
        };
        registry.register(Arc::new(Codec::new(id, codec)));
    }
    Ok(())
}

// A reference to an inner descriptor; it must have been registered by an
// earlier entry of this or a previous blob.
fn reference(registry: &CodecRegistry, rdr: &mut Reader) -> EdbResult<Arc<Codec>> {
    let id = rdr.pop_uuid()?;
    registry.get(&id).map_err(|_| {
        EdbError::Protocol(format!(
            "descriptor blob references {id} before it was declared"
        ))
    })
}

fn parse_shape_fields(
    registry: &CodecRegistry,
    rdr: &mut Reader,
) -> EdbResult<Vec<ShapeField>> {
    let count = rdr.pop_u16()?;
    let mut fields = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let flags = rdr.pop_u8()?;
        let name = rdr.pop_str()?.to_string();
        fields.push(ShapeField {
            name,
            optional: flags & SHAPE_FLAG_OPTIONAL != 0,
            codec: reference(registry, rdr)?,
        });
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::register_descriptors;
    use super::{KIND_BASE_SCALAR, KIND_INPUT_SHAPE, KIND_SET};
    use crate::protocol::buffer::{Reader, Writer};
    use crate::protocol::codecs::{base_types, CodecRegistry};
    use crate::protocol::value::EdbValue;
    use uuid::Uuid;

    fn str_id() -> Uuid {
        base_types::base_scalar_codec(&Uuid::from_u128(0x101))
            .unwrap()
            .id()
    }

    #[test]
    fn set_of_str_blob() {
        let set_id = Uuid::from_u128(0xabc1);
        let mut w = Writer::new();
        w.push_u8(KIND_BASE_SCALAR);
        w.push_uuid(str_id());
        w.push_u8(KIND_SET);
        w.push_uuid(set_id);
        w.push_uuid(str_id());
        let blob = w.into_bytes();

        let mut registry = CodecRegistry::default();
        register_descriptors(&mut registry, &blob).unwrap();
        let codec = registry.get(&set_id).unwrap();

        let mut w = Writer::new();
        codec
            .encode(&EdbValue::Set(vec!["x".into()]), &mut w)
            .unwrap();
        let bytes = w.into_bytes();
        let mut rdr = Reader::new(&bytes);
        assert_eq!(
            codec.decode(&mut rdr).unwrap(),
            EdbValue::Set(vec!["x".into()])
        );
    }

    #[test]
    fn shape_blob_with_flags() {
        let shape_id = Uuid::from_u128(0xabc2);
        let mut w = Writer::new();
        w.push_u8(KIND_INPUT_SHAPE);
        w.push_uuid(shape_id);
        w.push_u16(2);
        w.push_u8(0); // required
        w.push_str("0");
        w.push_uuid(str_id());
        w.push_u8(1); // optional
        w.push_str("1");
        w.push_uuid(str_id());
        let blob = w.into_bytes();

        let mut registry = CodecRegistry::default();
        register_descriptors(&mut registry, &blob).unwrap();
        assert!(registry.contains(&shape_id));
    }

    #[test]
    fn forward_reference_is_rejected() {
        let set_id = Uuid::from_u128(0xabc3);
        let inner_id = Uuid::from_u128(0xabc4);
        let mut w = Writer::new();
        w.push_u8(KIND_SET);
        w.push_uuid(set_id);
        w.push_uuid(inner_id); // never declared
        let blob = w.into_bytes();

        let mut registry = CodecRegistry::default();
        let err = register_descriptors(&mut registry, &blob).unwrap_err();
        assert!(err.to_string().contains("before it was declared"));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let mut w = Writer::new();
        w.push_u8(77);
        w.push_uuid(Uuid::from_u128(0xabc5));
        let blob = w.into_bytes();
        let mut registry = CodecRegistry::default();
        assert!(register_descriptors(&mut registry, &blob).is_err());
    }
}
