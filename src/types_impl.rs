pub(crate) mod memory;
pub(crate) mod range;
pub(crate) mod relative_duration;
pub(crate) mod wire_decimal;
