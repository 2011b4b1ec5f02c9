//! Conversion between the wire representation of arbitrary-precision
//! numbers and `BigDecimal`/`BigInt`.
//!
//! The wire form is `ndigits (u16), weight (i16), sign (u16), dscale (u16)`
//! followed by `ndigits` base-10000 digits (u16 each). `weight` is the
//! base-10000 exponent of the first digit; `dscale` the count of decimal
//! fraction digits. `bigint` uses the same layout with `dscale == 0`.

use crate::protocol::buffer::{Reader, Writer};
use crate::{EdbError, EdbResult};
use bigdecimal::BigDecimal;
use num_bigint::{BigInt, Sign};

const SIGN_POS: u16 = 0x0000;
const SIGN_NEG: u16 = 0x4000;

pub(crate) fn emit_decimal(value: &BigDecimal, w: &mut Writer) -> EdbResult<()> {
    let (unscaled, scale) = value.as_bigint_and_exponent();
    emit_parts(&unscaled, scale, w)
}

pub(crate) fn emit_bigint(value: &BigInt, w: &mut Writer) -> EdbResult<()> {
    emit_parts(value, 0, w)
}

pub(crate) fn parse_decimal(rdr: &mut Reader) -> EdbResult<BigDecimal> {
    let (unscaled, exp10, dscale) = parse_parts(rdr)?;
    Ok(BigDecimal::new(unscaled, -exp10).with_scale(i64::from(dscale)))
}

pub(crate) fn parse_bigint(rdr: &mut Reader) -> EdbResult<BigInt> {
    let (unscaled, exp10, dscale) = parse_parts(rdr)?;
    if dscale != 0 {
        return Err(EdbError::Protocol(
            "bigint with a nonzero decimal scale".to_string(),
        ));
    }
    if exp10 < 0 {
        return Err(EdbError::Protocol(
            "bigint with fractional digits".to_string(),
        ));
    }
    let mut value = unscaled;
    for _ in 0..exp10 {
        value *= 10;
    }
    Ok(value)
}

// value = unscaled * 10^-scale
#[allow(clippy::cast_possible_truncation)]
fn emit_parts(unscaled: &BigInt, scale: i64, w: &mut Writer) -> EdbResult<()> {
    let sign = match unscaled.sign() {
        Sign::Minus => SIGN_NEG,
        Sign::NoSign | Sign::Plus => SIGN_POS,
    };

    let mut digits_str = unscaled.magnitude().to_str_radix(10);
    let mut scale = scale;
    if scale < 0 {
        // fold a negative scale into the digit string
        let shift =
            usize::try_from(-scale).map_err(|_| EdbError::TypeMismatch("number too large".to_string()))?;
        digits_str.push_str(&"0".repeat(shift));
        scale = 0;
    }
    let dscale = u16::try_from(scale)
        .map_err(|_| EdbError::TypeMismatch("decimal scale out of range".to_string()))?;
    let frac_len = scale as usize;
    if digits_str.len() <= frac_len {
        // ensure at least one integer digit
        digits_str = format!("{}{}", "0".repeat(frac_len - digits_str.len() + 1), digits_str);
    }
    let int_len = digits_str.len() - frac_len;

    // align both parts to whole base-10000 groups
    let int_groups = (int_len + 3) / 4;
    let frac_groups = (frac_len + 3) / 4;
    let padded = format!(
        "{}{}{}",
        "0".repeat(int_groups * 4 - int_len),
        digits_str,
        "0".repeat(frac_groups * 4 - frac_len)
    );

    let mut digits: Vec<u16> = padded
        .as_bytes()
        .chunks(4)
        .map(|chunk| {
            chunk
                .iter()
                .fold(0u16, |acc, b| acc * 10 + u16::from(b - b'0'))
        })
        .collect();

    let mut weight = i64::try_from(int_groups)
        .map_err(|_| EdbError::TypeMismatch("number too large".to_string()))?
        - 1;
    while digits.first() == Some(&0) {
        digits.remove(0);
        weight -= 1;
    }
    while digits.last() == Some(&0) {
        digits.pop();
    }
    if digits.is_empty() {
        weight = 0;
    }

    let weight = i16::try_from(weight)
        .map_err(|_| EdbError::TypeMismatch("decimal weight out of range".to_string()))?;
    w.push_u16(digits.len() as u16);
    w.push_i16(weight);
    w.push_u16(sign);
    w.push_u16(dscale);
    for digit in digits {
        w.push_u16(digit);
    }
    Ok(())
}

// Returns (unscaled, exp10, dscale) with value = unscaled * 10^exp10.
fn parse_parts(rdr: &mut Reader) -> EdbResult<(BigInt, i64, u16)> {
    let ndigits = rdr.pop_u16()?;
    let weight = rdr.pop_i16()?;
    let sign = rdr.pop_u16()?;
    let dscale = rdr.pop_u16()?;

    let mut unscaled = BigInt::from(0);
    for _ in 0..ndigits {
        let digit = rdr.pop_u16()?;
        if digit > 9999 {
            return Err(EdbError::Protocol(format!(
                "base-10000 digit out of range: {digit}"
            )));
        }
        unscaled = unscaled * 10_000 + digit;
    }
    match sign {
        SIGN_POS => {}
        SIGN_NEG => unscaled = -unscaled,
        sign => {
            return Err(EdbError::Protocol(format!(
                "invalid numeric sign 0x{sign:04x}"
            )))
        }
    }
    let exp10 = 4 * (i64::from(weight) + 1 - i64::from(ndigits));
    Ok((unscaled, exp10, dscale))
}

#[cfg(test)]
mod tests {
    use super::{emit_bigint, emit_decimal, parse_bigint, parse_decimal};
    use crate::protocol::buffer::{Reader, Writer};
    use bigdecimal::BigDecimal;
    use num_bigint::BigInt;
    use std::str::FromStr;

    fn decimal_round_trip(repr: &str) {
        let value = BigDecimal::from_str(repr).unwrap();
        let mut w = Writer::new();
        emit_decimal(&value, &mut w).unwrap();
        let bytes = w.into_bytes();
        let mut rdr = Reader::new(&bytes);
        let back = parse_decimal(&mut rdr).unwrap();
        assert!(rdr.is_empty());
        assert_eq!(back, value, "{repr}");
    }

    #[test]
    fn decimal_round_trips() {
        for repr in [
            "0",
            "1",
            "-1",
            "123.45",
            "-123.45",
            "0.0001",
            "10000",
            "9999.9999",
            "123456789012345678901234567890.000042",
            "-0.5",
            "1e10",
        ] {
            decimal_round_trip(repr);
        }
    }

    #[test]
    fn decimal_wire_layout() {
        // 123.45 -> digits [123, 4500], weight 0, dscale 2
        let value = BigDecimal::from_str("123.45").unwrap();
        let mut w = Writer::new();
        emit_decimal(&value, &mut w).unwrap();
        let bytes = w.into_bytes();
        assert_eq!(
            bytes,
            [0, 2, 0, 0, 0, 0, 0, 2, 0x00, 0x7b, 0x11, 0x94]
        );
    }

    #[test]
    fn bigint_round_trips() {
        for repr in ["0", "1", "-1", "10000", "-99999999", "123456789012345678901234567890"] {
            let value = BigInt::from_str(repr).unwrap();
            let mut w = Writer::new();
            emit_bigint(&value, &mut w).unwrap();
            let bytes = w.into_bytes();
            let mut rdr = Reader::new(&bytes);
            assert_eq!(parse_bigint(&mut rdr).unwrap(), value, "{repr}");
        }
    }

    #[test]
    fn bigint_rejects_fractions() {
        let value = BigDecimal::from_str("1.5").unwrap();
        let mut w = Writer::new();
        emit_decimal(&value, &mut w).unwrap();
        let bytes = w.into_bytes();
        let mut rdr = Reader::new(&bytes);
        assert!(parse_bigint(&mut rdr).is_err());
    }
}
