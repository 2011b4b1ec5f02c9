//! The fixed descriptor IDs of the built-in scalar types.
//!
//! The server references these without ever describing them; the byte
//! sequences are part of the protocol and must match exactly.

use crate::protocol::codecs::{Codec, CodecKind, ScalarKind};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

pub(crate) const UUID_ID: Uuid = Uuid::from_u128(0x100);
pub(crate) const STR_ID: Uuid = Uuid::from_u128(0x101);
pub(crate) const BYTES_ID: Uuid = Uuid::from_u128(0x102);
pub(crate) const INT16_ID: Uuid = Uuid::from_u128(0x103);
pub(crate) const INT32_ID: Uuid = Uuid::from_u128(0x104);
pub(crate) const INT64_ID: Uuid = Uuid::from_u128(0x105);
pub(crate) const FLOAT32_ID: Uuid = Uuid::from_u128(0x106);
pub(crate) const FLOAT64_ID: Uuid = Uuid::from_u128(0x107);
pub(crate) const DECIMAL_ID: Uuid = Uuid::from_u128(0x108);
pub(crate) const BOOL_ID: Uuid = Uuid::from_u128(0x109);
pub(crate) const DATETIME_ID: Uuid = Uuid::from_u128(0x10a);
pub(crate) const LOCAL_DATETIME_ID: Uuid = Uuid::from_u128(0x10b);
pub(crate) const LOCAL_DATE_ID: Uuid = Uuid::from_u128(0x10c);
pub(crate) const LOCAL_TIME_ID: Uuid = Uuid::from_u128(0x10d);
pub(crate) const DURATION_ID: Uuid = Uuid::from_u128(0x10e);
pub(crate) const JSON_ID: Uuid = Uuid::from_u128(0x10f);
pub(crate) const BIGINT_ID: Uuid = Uuid::from_u128(0x110);
pub(crate) const RELATIVE_DURATION_ID: Uuid = Uuid::from_u128(0x111);
pub(crate) const MEMORY_ID: Uuid = Uuid::from_u128(0x130);

// The argument root the server sends for queries without parameters.
pub(crate) const EMPTY_TUPLE_ID: Uuid = Uuid::from_u128(0xff);

lazy_static! {
    static ref BASE_SCALARS: HashMap<Uuid, Arc<Codec>> = {
        let mut m = HashMap::new();
        let mut insert = |id: Uuid, kind: ScalarKind| {
            m.insert(id, Arc::new(Codec::new(id, CodecKind::Scalar(kind))));
        };
        insert(UUID_ID, ScalarKind::Uuid);
        insert(STR_ID, ScalarKind::Str);
        insert(BYTES_ID, ScalarKind::Bytes);
        insert(INT16_ID, ScalarKind::Int16);
        insert(INT32_ID, ScalarKind::Int32);
        insert(INT64_ID, ScalarKind::Int64);
        insert(FLOAT32_ID, ScalarKind::Float32);
        insert(FLOAT64_ID, ScalarKind::Float64);
        insert(DECIMAL_ID, ScalarKind::Decimal);
        insert(BOOL_ID, ScalarKind::Bool);
        insert(DATETIME_ID, ScalarKind::Datetime);
        insert(LOCAL_DATETIME_ID, ScalarKind::LocalDatetime);
        insert(LOCAL_DATE_ID, ScalarKind::LocalDate);
        insert(LOCAL_TIME_ID, ScalarKind::LocalTime);
        insert(DURATION_ID, ScalarKind::Duration);
        insert(JSON_ID, ScalarKind::Json);
        insert(BIGINT_ID, ScalarKind::BigInt);
        insert(RELATIVE_DURATION_ID, ScalarKind::RelativeDuration);
        insert(MEMORY_ID, ScalarKind::Memory);
        m.insert(
            EMPTY_TUPLE_ID,
            Arc::new(Codec::new(EMPTY_TUPLE_ID, CodecKind::Tuple { elements: vec![] })),
        );
        m
    };
}

/// Looks up the codec of a built-in scalar (or the empty tuple) by its
/// well-known descriptor ID.
pub(crate) fn base_scalar_codec(id: &Uuid) -> Option<Arc<Codec>> {
    BASE_SCALARS.get(id).cloned()
}

#[cfg(test)]
mod tests {
    use super::{base_scalar_codec, MEMORY_ID, STR_ID};

    #[test]
    fn well_known_ids_have_the_documented_bytes() {
        assert_eq!(
            STR_ID.as_bytes(),
            &[0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0x01]
        );
        assert_eq!(
            MEMORY_ID.as_bytes(),
            &[0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0x30]
        );
    }

    #[test]
    fn base_scalars_resolve() {
        assert!(base_scalar_codec(&STR_ID).is_some());
        assert!(base_scalar_codec(&uuid::Uuid::from_u128(0xdead)).is_none());
    }
}
