/// A calendar-aware duration of months, days, and microseconds.
///
/// Unlike a plain duration, the three components do not convert into each
/// other (a month is not a fixed number of days), so they are carried
/// separately, exactly as on the wire.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct RelativeDuration {
    micros: i64,
    days: i32,
    months: i32,
}

impl RelativeDuration {
    pub fn new(months: i32, days: i32, micros: i64) -> RelativeDuration {
        RelativeDuration {
            micros,
            days,
            months,
        }
    }

    pub fn months(self) -> i32 {
        self.months
    }

    pub fn days(self) -> i32 {
        self.days
    }

    pub fn micros(self) -> i64 {
        self.micros
    }
}

impl std::fmt::Display for RelativeDuration {
    // ISO-8601-like rendering, e.g. "P1Y2M3DT4H5M6.5S".
    #[allow(clippy::cast_precision_loss)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.months == 0 && self.days == 0 && self.micros == 0 {
            return write!(f, "PT0S");
        }
        write!(f, "P")?;
        let (years, months) = (self.months / 12, self.months % 12);
        if years != 0 {
            write!(f, "{years}Y")?;
        }
        if months != 0 {
            write!(f, "{months}M")?;
        }
        if self.days != 0 {
            write!(f, "{}D", self.days)?;
        }
        if self.micros != 0 {
            write!(f, "T")?;
            let hours = self.micros / 3_600_000_000;
            let minutes = (self.micros % 3_600_000_000) / 60_000_000;
            let micros = self.micros % 60_000_000;
            if hours != 0 {
                write!(f, "{hours}H")?;
            }
            if minutes != 0 {
                write!(f, "{minutes}M")?;
            }
            if micros != 0 {
                let seconds = micros as f64 / 1_000_000.0;
                write!(f, "{seconds}S")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::RelativeDuration;

    #[test]
    fn display() {
        assert_eq!(RelativeDuration::default().to_string(), "PT0S");
        assert_eq!(RelativeDuration::new(14, 3, 0).to_string(), "P1Y2M3D");
        assert_eq!(
            RelativeDuration::new(0, 0, 4 * 3_600_000_000 + 30 * 60_000_000).to_string(),
            "PT4H30M"
        );
        assert_eq!(RelativeDuration::new(0, 0, 6_500_000).to_string(), "PT6.5S");
    }
}
