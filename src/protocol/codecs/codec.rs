use crate::protocol::buffer::{Reader, Writer};
use crate::protocol::value::{EdbValue, QueryArgs};
use crate::types_impl::{
    memory::Memory, range::Range, relative_duration::RelativeDuration, wire_decimal,
};
use crate::{EdbError, EdbResult};
use std::sync::Arc;
use time::macros::{date, datetime};
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

// All date/time scalars are relative to 2000-01-01.
const EPOCH_UTC: OffsetDateTime = datetime!(2000-01-01 0:00 UTC);
const EPOCH_NAIVE: PrimitiveDateTime = datetime!(2000-01-01 0:00);
const EPOCH_DATE: Date = date!(2000 - 01 - 01);

const MICROS_PER_DAY: i64 = 86_400_000_000;

const RANGE_EMPTY: u8 = 0x01;
const RANGE_LB_INC: u8 = 0x02;
const RANGE_UB_INC: u8 = 0x04;
const RANGE_LB_INF: u8 = 0x08;
const RANGE_UB_INF: u8 = 0x10;

/// One node of the codec tree.
///
/// A codec knows its descriptor ID, the native value kind it corresponds
/// to, and how to encode/decode a single length-prefixed value block.
#[derive(Debug)]
pub(crate) struct Codec {
    id: Uuid,
    kind: CodecKind,
}

#[derive(Debug)]
pub(crate) enum CodecKind {
    Scalar(ScalarKind),
    /// A user-declared scalar delegating to its fundamental type.
    ScalarAlias {
        base: Arc<Codec>,
    },
    Tuple {
        elements: Vec<Arc<Codec>>,
    },
    NamedTuple {
        fields: Vec<NamedField>,
    },
    /// An object shape; also used for input shapes that encode arguments.
    Object {
        fields: Vec<ShapeField>,
    },
    /// Like an object, but only present fields travel, keyed by index.
    SparseObject {
        fields: Vec<NamedField>,
    },
    Array {
        element: Arc<Codec>,
    },
    Set {
        element: Arc<Codec>,
    },
    Enum {
        members: Vec<String>,
    },
    Range {
        element: Arc<Codec>,
    },
}

#[derive(Debug)]
pub(crate) struct NamedField {
    pub name: String,
    pub codec: Arc<Codec>,
}

#[derive(Debug)]
pub(crate) struct ShapeField {
    pub name: String,
    pub optional: bool,
    pub codec: Arc<Codec>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum ScalarKind {
    Bool,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Decimal,
    BigInt,
    Str,
    Bytes,
    Uuid,
    Json,
    Datetime,
    LocalDatetime,
    LocalDate,
    LocalTime,
    Duration,
    RelativeDuration,
    Memory,
}

impl ScalarKind {
    fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Decimal => "decimal",
            Self::BigInt => "bigint",
            Self::Str => "str",
            Self::Bytes => "bytes",
            Self::Uuid => "uuid",
            Self::Json => "json",
            Self::Datetime => "datetime",
            Self::LocalDatetime => "local_datetime",
            Self::LocalDate => "local_date",
            Self::LocalTime => "local_time",
            Self::Duration => "duration",
            Self::RelativeDuration => "relative_duration",
            Self::Memory => "memory",
        }
    }
}

impl Codec {
    pub fn new(id: Uuid, kind: CodecKind) -> Codec {
        Codec { id, kind }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The native type this codec corresponds to, for error messages.
    pub fn native_type(&self) -> String {
        match &self.kind {
            CodecKind::Scalar(kind) => kind.name().to_string(),
            CodecKind::ScalarAlias { base } => base.native_type(),
            CodecKind::Tuple { .. } => "tuple".to_string(),
            CodecKind::NamedTuple { .. } => "named tuple".to_string(),
            CodecKind::Object { .. } => "object".to_string(),
            CodecKind::SparseObject { .. } => "sparse object".to_string(),
            CodecKind::Array { element } => format!("array<{}>", element.native_type()),
            CodecKind::Set { element } => format!("set<{}>", element.native_type()),
            CodecKind::Enum { .. } => "enum".to_string(),
            CodecKind::Range { element } => format!("range<{}>", element.native_type()),
        }
    }

    fn mismatch(&self, value: &EdbValue) -> EdbError {
        EdbError::TypeMismatch(format!(
            "expected a value of type {}, got {}",
            self.native_type(),
            value.kind_name()
        ))
    }

    /// Encodes `value` as one length-prefixed block.
    pub fn encode(&self, value: &EdbValue, w: &mut Writer) -> EdbResult<()> {
        w.begin_block();
        self.encode_payload(value, w)?;
        w.end_block();
        Ok(())
    }

    /// Decodes one length-prefixed block into a value.
    pub fn decode(&self, rdr: &mut Reader) -> EdbResult<EdbValue> {
        match rdr.pop_value_block()? {
            None => Err(EdbError::Protocol(
                "absent value in a non-optional position".to_string(),
            )),
            Some(mut body) => {
                let value = self.decode_payload(&mut body)?;
                body.expect_end()?;
                Ok(value)
            }
        }
    }

    /// Encodes the argument set of a query.
    ///
    /// The argument root is always a (possibly empty) shape; servers
    /// announce parameterless statements with the empty-tuple descriptor,
    /// whose wire form is identical to an empty shape.
    #[allow(clippy::cast_possible_truncation)]
    pub fn encode_arguments(&self, args: &QueryArgs, w: &mut Writer) -> EdbResult<()> {
        match &self.kind {
            CodecKind::Object { fields } => {
                for name in args.names() {
                    if !fields.iter().any(|f| f.name == name) {
                        return Err(EdbError::TypeMismatch(format!(
                            "query does not take an argument named ${name}"
                        )));
                    }
                }
                w.begin_block();
                w.push_u32(fields.len() as u32);
                for field in fields {
                    w.push_i32(0); // reserved
                    match args.get(&field.name) {
                        Some(value) if !matches!(value, EdbValue::Nothing) => {
                            field.codec.encode(value, w)?;
                        }
                        _ if field.optional => w.push_sentinel_absent(),
                        _ => {
                            return Err(EdbError::TypeMismatch(format!(
                                "missing required argument ${}",
                                field.name
                            )))
                        }
                    }
                }
                w.end_block();
                Ok(())
            }
            CodecKind::Tuple { elements } => {
                if args.len() != elements.len() {
                    return Err(EdbError::TypeMismatch(format!(
                        "query takes {} positional arguments, {} given",
                        elements.len(),
                        args.len()
                    )));
                }
                w.begin_block();
                w.push_u32(elements.len() as u32);
                for (i, element) in elements.iter().enumerate() {
                    let value = args.get(&i.to_string()).ok_or_else(|| {
                        EdbError::TypeMismatch(format!("missing positional argument ${i}"))
                    })?;
                    w.push_i32(0); // reserved
                    element.encode(value, w)?;
                }
                w.end_block();
                Ok(())
            }
            _ => Err(EdbError::ImplDetailed(format!(
                "argument descriptor is a {}, not a shape",
                self.native_type()
            ))),
        }
    }

    #[allow(clippy::too_many_lines)]
    #[allow(clippy::cast_possible_truncation)]
    fn encode_payload(&self, value: &EdbValue, w: &mut Writer) -> EdbResult<()> {
        match &self.kind {
            CodecKind::Scalar(kind) => self.encode_scalar(*kind, value, w),
            CodecKind::ScalarAlias { base } => base.encode_payload(value, w),
            CodecKind::Tuple { elements } => {
                let EdbValue::Tuple(items) = value else {
                    return Err(self.mismatch(value));
                };
                if items.len() != elements.len() {
                    return Err(EdbError::TypeMismatch(format!(
                        "tuple with {} elements does not fit a tuple type with {}",
                        items.len(),
                        elements.len()
                    )));
                }
                w.push_u32(elements.len() as u32);
                for (element, item) in elements.iter().zip(items) {
                    w.push_i32(0); // reserved
                    element.encode(item, w)?;
                }
                Ok(())
            }
            CodecKind::NamedTuple { fields } => {
                let EdbValue::NamedTuple(items) = value else {
                    return Err(self.mismatch(value));
                };
                self.check_field_names(
                    fields.iter().map(|f| f.name.as_str()),
                    items.iter().map(|(n, _)| n.as_str()),
                )?;
                w.push_u32(fields.len() as u32);
                for (field, (_, item)) in fields.iter().zip(items) {
                    w.push_i32(0); // reserved
                    field.codec.encode(item, w)?;
                }
                Ok(())
            }
            CodecKind::Object { fields } => {
                let EdbValue::Object(items) = value else {
                    return Err(self.mismatch(value));
                };
                self.check_field_names(
                    fields.iter().map(|f| f.name.as_str()),
                    items.iter().map(|(n, _)| n.as_str()),
                )?;
                w.push_u32(fields.len() as u32);
                for (field, (_, item)) in fields.iter().zip(items) {
                    w.push_i32(0); // reserved
                    if matches!(item, EdbValue::Nothing) {
                        if !field.optional {
                            return Err(EdbError::TypeMismatch(format!(
                                "field {} is required but absent",
                                field.name
                            )));
                        }
                        w.push_sentinel_absent();
                    } else {
                        field.codec.encode(item, w)?;
                    }
                }
                Ok(())
            }
            CodecKind::SparseObject { fields } => {
                let EdbValue::Object(items) = value else {
                    return Err(self.mismatch(value));
                };
                let present: Vec<(usize, &EdbValue)> = items
                    .iter()
                    .filter(|(_, v)| !matches!(v, EdbValue::Nothing))
                    .map(|(name, v)| {
                        fields
                            .iter()
                            .position(|f| &f.name == name)
                            .map(|i| (i, v))
                            .ok_or_else(|| {
                                EdbError::TypeMismatch(format!("unknown sparse field {name}"))
                            })
                    })
                    .collect::<EdbResult<_>>()?;
                w.push_u32(present.len() as u32);
                for (index, item) in present {
                    w.push_i32(index as i32);
                    fields[index].codec.encode(item, w)?;
                }
                Ok(())
            }
            CodecKind::Array { element } | CodecKind::Set { element } => {
                let items = match (&self.kind, value) {
                    (CodecKind::Array { .. }, EdbValue::Array(items))
                    | (CodecKind::Set { .. }, EdbValue::Set(items)) => items,
                    _ => return Err(self.mismatch(value)),
                };
                if items.is_empty() {
                    w.push_i32(0); // ndims
                    w.push_i32(0);
                    w.push_i32(0);
                } else {
                    w.push_i32(1); // ndims
                    w.push_i32(0);
                    w.push_i32(0);
                    w.push_i32(items.len() as i32); // upper
                    w.push_i32(1); // lower
                    for item in items {
                        element.encode(item, w)?;
                    }
                }
                Ok(())
            }
            CodecKind::Enum { members } => {
                let name = match value {
                    EdbValue::Enum(name) | EdbValue::Str(name) => name,
                    _ => return Err(self.mismatch(value)),
                };
                if !members.iter().any(|m| m == name) {
                    return Err(EdbError::TypeMismatch(format!(
                        "{name:?} is not a member of the enumeration"
                    )));
                }
                w.push_raw(name.as_bytes());
                Ok(())
            }
            CodecKind::Range { element } => {
                let EdbValue::Range(range) = value else {
                    return Err(self.mismatch(value));
                };
                if range.is_empty() {
                    w.push_u8(RANGE_EMPTY);
                    return Ok(());
                }
                let mut flags = 0;
                if range.inc_lower() {
                    flags |= RANGE_LB_INC;
                }
                if range.inc_upper() {
                    flags |= RANGE_UB_INC;
                }
                if range.lower().is_none() {
                    flags |= RANGE_LB_INF;
                }
                if range.upper().is_none() {
                    flags |= RANGE_UB_INF;
                }
                w.push_u8(flags);
                if let Some(lower) = range.lower() {
                    element.encode(lower, w)?;
                }
                if let Some(upper) = range.upper() {
                    element.encode(upper, w)?;
                }
                Ok(())
            }
        }
    }

    fn check_field_names<'n>(
        &self,
        expected: impl Iterator<Item = &'n str> + ExactSizeIterator,
        got: impl Iterator<Item = &'n str> + ExactSizeIterator,
    ) -> EdbResult<()> {
        if expected.len() != got.len() {
            return Err(EdbError::TypeMismatch(format!(
                "{} fields do not fit a type with {} fields",
                got.len(),
                expected.len(),
            )));
        }
        for (expected, got) in expected.zip(got) {
            if expected != got {
                return Err(EdbError::TypeMismatch(format!(
                    "field {got:?} does not match the declared field {expected:?}"
                )));
            }
        }
        Ok(())
    }

    fn encode_scalar(&self, kind: ScalarKind, value: &EdbValue, w: &mut Writer) -> EdbResult<()> {
        match (kind, value) {
            (ScalarKind::Bool, EdbValue::Bool(v)) => w.push_u8(u8::from(*v)),
            (ScalarKind::Int16, EdbValue::Int16(v)) => w.push_i16(*v),
            (ScalarKind::Int32, EdbValue::Int32(v)) => w.push_i32(*v),
            (ScalarKind::Int64, EdbValue::Int64(v)) => w.push_i64(*v),
            (ScalarKind::Float32, EdbValue::Float32(v)) => w.push_f32(*v),
            (ScalarKind::Float64, EdbValue::Float64(v)) => w.push_f64(*v),
            (ScalarKind::Decimal, EdbValue::Decimal(v)) => wire_decimal::emit_decimal(v, w)?,
            (ScalarKind::BigInt, EdbValue::BigInt(v)) => wire_decimal::emit_bigint(v, w)?,
            (ScalarKind::Str, EdbValue::Str(v)) => w.push_raw(v.as_bytes()),
            (ScalarKind::Bytes, EdbValue::Bytes(v)) => w.push_raw(v),
            (ScalarKind::Uuid, EdbValue::Uuid(v)) => w.push_uuid(*v),
            (ScalarKind::Json, EdbValue::Json(v)) => {
                let text = serde_json::to_string(v)
                    .map_err(|e| EdbError::TypeMismatch(format!("unserializable json: {e}")))?;
                w.push_u8(1); // json format version
                w.push_raw(text.as_bytes());
            }
            (ScalarKind::Datetime, EdbValue::Datetime(v)) => {
                w.push_i64(micros_since(*v - EPOCH_UTC)?);
            }
            (ScalarKind::LocalDatetime, EdbValue::LocalDatetime(v)) => {
                w.push_i64(micros_since(*v - EPOCH_NAIVE)?);
            }
            (ScalarKind::LocalDate, EdbValue::LocalDate(v)) => {
                let days = (*v - EPOCH_DATE).whole_days();
                w.push_i32(i32::try_from(days).map_err(|_| {
                    EdbError::TypeMismatch("date out of the encodable range".to_string())
                })?);
            }
            (ScalarKind::LocalTime, EdbValue::LocalTime(v)) => {
                w.push_i64(micros_since(*v - Time::MIDNIGHT)?);
            }
            (ScalarKind::Duration, EdbValue::Duration(v)) => {
                w.push_i64(micros_since(*v)?);
                w.push_i32(0); // days
                w.push_i32(0); // months
            }
            (ScalarKind::RelativeDuration, EdbValue::RelativeDuration(v)) => {
                w.push_i64(v.micros());
                w.push_i32(v.days());
                w.push_i32(v.months());
            }
            (ScalarKind::Memory, EdbValue::Memory(v)) => w.push_u64(v.bytes()),
            _ => return Err(self.mismatch(value)),
        }
        Ok(())
    }

    fn decode_payload(&self, rdr: &mut Reader) -> EdbResult<EdbValue> {
        match &self.kind {
            CodecKind::Scalar(kind) => decode_scalar(*kind, rdr),
            CodecKind::ScalarAlias { base } => base.decode_payload(rdr),
            CodecKind::Tuple { elements } => {
                let count = rdr.pop_u32()? as usize;
                if count != elements.len() {
                    return Err(EdbError::Protocol(format!(
                        "tuple with {count} elements, descriptor has {}",
                        elements.len()
                    )));
                }
                let mut items = Vec::with_capacity(count);
                for element in elements {
                    rdr.pop_i32()?; // reserved
                    items.push(element.decode(rdr)?);
                }
                Ok(EdbValue::Tuple(items))
            }
            CodecKind::NamedTuple { fields } => {
                let count = rdr.pop_u32()? as usize;
                if count != fields.len() {
                    return Err(EdbError::Protocol(format!(
                        "named tuple with {count} elements, descriptor has {}",
                        fields.len()
                    )));
                }
                let mut items = Vec::with_capacity(count);
                for field in fields {
                    rdr.pop_i32()?; // reserved
                    items.push((field.name.clone(), field.codec.decode(rdr)?));
                }
                Ok(EdbValue::NamedTuple(items))
            }
            CodecKind::Object { fields } => {
                let count = rdr.pop_u32()? as usize;
                if count != fields.len() {
                    return Err(EdbError::Protocol(format!(
                        "object with {count} fields, descriptor has {}",
                        fields.len()
                    )));
                }
                let mut items = Vec::with_capacity(count);
                for field in fields {
                    rdr.pop_i32()?; // reserved
                    let value = match rdr.pop_value_block()? {
                        None => EdbValue::Nothing,
                        Some(mut body) => {
                            let value = field.codec.decode_payload(&mut body)?;
                            body.expect_end()?;
                            value
                        }
                    };
                    items.push((field.name.clone(), value));
                }
                Ok(EdbValue::Object(items))
            }
            CodecKind::SparseObject { fields } => {
                let count = rdr.pop_u32()? as usize;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    let index = rdr.pop_i32()?;
                    let field = usize::try_from(index)
                        .ok()
                        .and_then(|i| fields.get(i))
                        .ok_or_else(|| {
                            EdbError::Protocol(format!("sparse field index {index} out of range"))
                        })?;
                    items.push((field.name.clone(), field.codec.decode(rdr)?));
                }
                Ok(EdbValue::Object(items))
            }
            CodecKind::Array { element } => Ok(EdbValue::Array(decode_elements(element, rdr)?)),
            CodecKind::Set { element } => Ok(EdbValue::Set(decode_elements(element, rdr)?)),
            CodecKind::Enum { members } => {
                let name = std::str::from_utf8(rdr.pop_rest())
                    .map_err(|e| EdbError::Protocol(format!("invalid enum value: {e}")))?;
                if !members.iter().any(|m| m == name) {
                    return Err(EdbError::Protocol(format!(
                        "{name:?} is not a member of the enumeration"
                    )));
                }
                Ok(EdbValue::Enum(name.to_string()))
            }
            CodecKind::Range { element } => {
                let flags = rdr.pop_u8()?;
                if flags & RANGE_EMPTY != 0 {
                    return Ok(EdbValue::Range(Range::empty()));
                }
                let lower = if flags & RANGE_LB_INF == 0 {
                    Some(element.decode(rdr)?)
                } else {
                    None
                };
                let upper = if flags & RANGE_UB_INF == 0 {
                    Some(element.decode(rdr)?)
                } else {
                    None
                };
                Ok(EdbValue::Range(Range::new(
                    lower,
                    upper,
                    flags & RANGE_LB_INC != 0,
                    flags & RANGE_UB_INC != 0,
                )))
            }
        }
    }
}

// dimension header: ndims, two reserved words, then (upper, lower) per dim
fn decode_elements(element: &Arc<Codec>, rdr: &mut Reader) -> EdbResult<Vec<EdbValue>> {
    let ndims = rdr.pop_i32()?;
    rdr.pop_i32()?; // reserved
    rdr.pop_i32()?; // reserved
    match ndims {
        0 => Ok(vec![]),
        1 => {
            let upper = rdr.pop_i32()?;
            let lower = rdr.pop_i32()?;
            let count = usize::try_from(upper - lower + 1).map_err(|_| {
                EdbError::Protocol(format!("invalid dimension bounds {lower}..{upper}"))
            })?;
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                items.push(element.decode(rdr)?);
            }
            Ok(items)
        }
        ndims => Err(EdbError::Protocol(format!(
            "{ndims}-dimensional collections are not supported"
        ))),
    }
}

fn micros_since(duration: time::Duration) -> EdbResult<i64> {
    if duration.subsec_nanoseconds() % 1000 != 0 {
        return Err(EdbError::TypeMismatch(
            "sub-microsecond precision cannot be represented on the wire".to_string(),
        ));
    }
    i64::try_from(duration.whole_microseconds())
        .map_err(|_| EdbError::TypeMismatch("duration out of the encodable range".to_string()))
}

fn decode_scalar(kind: ScalarKind, rdr: &mut Reader) -> EdbResult<EdbValue> {
    Ok(match kind {
        ScalarKind::Bool => match rdr.pop_u8()? {
            0 => EdbValue::Bool(false),
            1 => EdbValue::Bool(true),
            v => return Err(EdbError::Protocol(format!("invalid bool byte 0x{v:x}"))),
        },
        ScalarKind::Int16 => EdbValue::Int16(rdr.pop_i16()?),
        ScalarKind::Int32 => EdbValue::Int32(rdr.pop_i32()?),
        ScalarKind::Int64 => EdbValue::Int64(rdr.pop_i64()?),
        ScalarKind::Float32 => EdbValue::Float32(rdr.pop_f32()?),
        ScalarKind::Float64 => EdbValue::Float64(rdr.pop_f64()?),
        ScalarKind::Decimal => EdbValue::Decimal(wire_decimal::parse_decimal(rdr)?),
        ScalarKind::BigInt => EdbValue::BigInt(wire_decimal::parse_bigint(rdr)?),
        ScalarKind::Str => EdbValue::Str(
            std::str::from_utf8(rdr.pop_rest())
                .map_err(|e| EdbError::Protocol(format!("invalid UTF-8 string: {e}")))?
                .to_string(),
        ),
        ScalarKind::Bytes => EdbValue::Bytes(rdr.pop_rest().to_vec()),
        ScalarKind::Uuid => EdbValue::Uuid(rdr.pop_uuid()?),
        ScalarKind::Json => {
            let version = rdr.pop_u8()?;
            if version != 1 {
                return Err(EdbError::Protocol(format!(
                    "unsupported json format version {version}"
                )));
            }
            EdbValue::Json(
                serde_json::from_slice(rdr.pop_rest())
                    .map_err(|e| EdbError::Protocol(format!("invalid json payload: {e}")))?,
            )
        }
        ScalarKind::Datetime => {
            let micros = rdr.pop_i64()?;
            EdbValue::Datetime(
                EPOCH_UTC
                    .checked_add(time::Duration::microseconds(micros))
                    .ok_or_else(|| EdbError::Protocol("datetime out of range".to_string()))?,
            )
        }
        ScalarKind::LocalDatetime => {
            let micros = rdr.pop_i64()?;
            EdbValue::LocalDatetime(
                EPOCH_NAIVE
                    .checked_add(time::Duration::microseconds(micros))
                    .ok_or_else(|| EdbError::Protocol("local datetime out of range".to_string()))?,
            )
        }
        ScalarKind::LocalDate => {
            let days = rdr.pop_i32()?;
            EdbValue::LocalDate(
                EPOCH_DATE
                    .checked_add(time::Duration::days(i64::from(days)))
                    .ok_or_else(|| EdbError::Protocol("local date out of range".to_string()))?,
            )
        }
        ScalarKind::LocalTime => {
            let micros = rdr.pop_i64()?;
            if !(0..MICROS_PER_DAY).contains(&micros) {
                return Err(EdbError::Protocol(format!(
                    "local time {micros}µs is outside the day"
                )));
            }
            EdbValue::LocalTime(Time::MIDNIGHT + time::Duration::microseconds(micros))
        }
        ScalarKind::Duration => {
            let micros = rdr.pop_i64()?;
            let days = rdr.pop_i32()?;
            let months = rdr.pop_i32()?;
            if days != 0 || months != 0 {
                return Err(EdbError::Protocol(
                    "duration with calendar components".to_string(),
                ));
            }
            EdbValue::Duration(time::Duration::microseconds(micros))
        }
        ScalarKind::RelativeDuration => {
            let micros = rdr.pop_i64()?;
            let days = rdr.pop_i32()?;
            let months = rdr.pop_i32()?;
            EdbValue::RelativeDuration(RelativeDuration::new(months, days, micros))
        }
        ScalarKind::Memory => EdbValue::Memory(Memory::new(rdr.pop_u64()?)),
    })
}
