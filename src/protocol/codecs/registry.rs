use crate::protocol::codecs::{base_types, Codec};
use crate::{EdbError, EdbResult};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// The per-connection mapping from descriptor ID to codec.
///
/// Populated lazily while `CommandDataDescription` blobs are parsed; the
/// built-in scalar codecs resolve without ever being registered.
#[derive(Debug, Default)]
pub(crate) struct CodecRegistry {
    codecs: HashMap<Uuid, Arc<Codec>>,
}

impl CodecRegistry {
    pub fn contains(&self, id: &Uuid) -> bool {
        self.codecs.contains_key(id) || base_types::base_scalar_codec(id).is_some()
    }

    pub fn get(&self, id: &Uuid) -> EdbResult<Arc<Codec>> {
        self.codecs
            .get(id)
            .cloned()
            .or_else(|| base_types::base_scalar_codec(id))
            .ok_or_else(|| EdbError::Protocol(format!("unknown type descriptor {id}")))
    }

    pub fn register(&mut self, codec: Arc<Codec>) {
        self.codecs.insert(codec.id(), codec);
    }
}
