use crate::types_impl::{memory::Memory, range::Range, relative_duration::RelativeDuration};
use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Enum for all supported database value types.
///
/// The wire codecs operate only through this abstraction; projecting values
/// onto concrete user types is layered above the protocol core.
#[derive(Clone, Debug, PartialEq)]
pub enum EdbValue {
    /// An absent optional value.
    ///
    /// Encoding it for a required position is an error; for an optional
    /// position it serializes as the 4-byte sentinel length.
    Nothing,
    /// A boolean.
    Bool(bool),
    /// A 16-bit signed integer.
    Int16(i16),
    /// A 32-bit signed integer.
    Int32(i32),
    /// A 64-bit signed integer.
    Int64(i64),
    /// An IEEE-754 single-precision float.
    Float32(f32),
    /// An IEEE-754 double-precision float.
    Float64(f64),
    /// An arbitrary-precision fixed-point number.
    Decimal(BigDecimal),
    /// An arbitrary-precision integer.
    BigInt(BigInt),
    /// A UTF-8 string.
    Str(String),
    /// A byte string.
    Bytes(Vec<u8>),
    /// A UUID.
    Uuid(Uuid),
    /// A JSON document.
    Json(serde_json::Value),
    /// A point in time with time zone (UTC on the wire).
    Datetime(OffsetDateTime),
    /// A calendar date and wall-clock time without time zone.
    LocalDatetime(PrimitiveDateTime),
    /// A calendar date.
    LocalDate(Date),
    /// A wall-clock time.
    LocalTime(Time),
    /// A duration with microsecond precision.
    Duration(time::Duration),
    /// A calendar-aware duration of months, days and microseconds.
    RelativeDuration(RelativeDuration),
    /// An amount of memory, as an unsigned 64-bit byte count.
    Memory(Memory),
    /// A member of an enumeration type.
    Enum(String),
    /// An ordered collection.
    Array(Vec<EdbValue>),
    /// An unordered collection (ordered as received).
    Set(Vec<EdbValue>),
    /// An unnamed tuple.
    Tuple(Vec<EdbValue>),
    /// A named tuple, fields in declaration order.
    NamedTuple(Vec<(String, EdbValue)>),
    /// An object shape, fields in declaration order; absent optional fields
    /// hold [`EdbValue::Nothing`].
    Object(Vec<(String, EdbValue)>),
    /// A range over an orderable scalar type.
    Range(Range),
}

impl EdbValue {
    /// A short name of the value's kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Nothing => "nothing",
            Self::Bool(_) => "bool",
            Self::Int16(_) => "int16",
            Self::Int32(_) => "int32",
            Self::Int64(_) => "int64",
            Self::Float32(_) => "float32",
            Self::Float64(_) => "float64",
            Self::Decimal(_) => "decimal",
            Self::BigInt(_) => "bigint",
            Self::Str(_) => "str",
            Self::Bytes(_) => "bytes",
            Self::Uuid(_) => "uuid",
            Self::Json(_) => "json",
            Self::Datetime(_) => "datetime",
            Self::LocalDatetime(_) => "local_datetime",
            Self::LocalDate(_) => "local_date",
            Self::LocalTime(_) => "local_time",
            Self::Duration(_) => "duration",
            Self::RelativeDuration(_) => "relative_duration",
            Self::Memory(_) => "memory",
            Self::Enum(_) => "enum",
            Self::Array(_) => "array",
            Self::Set(_) => "set",
            Self::Tuple(_) => "tuple",
            Self::NamedTuple(_) => "named tuple",
            Self::Object(_) => "object",
            Self::Range(_) => "range",
        }
    }
}

impl From<&str> for EdbValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}
impl From<String> for EdbValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}
impl From<i64> for EdbValue {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}
impl From<bool> for EdbValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

/// The named arguments of a query.
///
/// Positional arguments use their position as name, matching the `$0`,
/// `$1`, ... parameters of the query source.
#[derive(Clone, Debug, Default)]
pub struct QueryArgs {
    fields: Vec<(String, EdbValue)>,
}

impl QueryArgs {
    /// No arguments.
    pub fn none() -> QueryArgs {
        QueryArgs::default()
    }

    /// Positional arguments `$0 .. $n`.
    pub fn positional<I>(values: I) -> QueryArgs
    where
        I: IntoIterator<Item = EdbValue>,
    {
        QueryArgs {
            fields: values
                .into_iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v))
                .collect(),
        }
    }

    /// Named arguments.
    pub fn named<I, S>(values: I) -> QueryArgs
    where
        I: IntoIterator<Item = (S, EdbValue)>,
        S: Into<String>,
    {
        QueryArgs {
            fields: values
                .into_iter()
                .map(|(name, v)| (name.into(), v))
                .collect(),
        }
    }

    /// Adds one named argument.
    pub fn push<S: Into<String>>(&mut self, name: S, value: EdbValue) {
        self.fields.push((name.into(), value));
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub(crate) fn get(&self, name: &str) -> Option<&EdbValue> {
        self.fields
            .iter()
            .find_map(|(n, v)| (n == name).then_some(v))
    }

    pub(crate) fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }
}
