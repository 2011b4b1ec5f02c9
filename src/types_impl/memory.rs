/// An amount of memory, as reported by the server, in bytes.
///
/// The `Display` implementation renders whole binary units
/// (`1024` bytes print as `1KiB`) and falls back to a byte count.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Memory(u64);

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;
const GIB: u64 = 1024 * MIB;
const TIB: u64 = 1024 * GIB;
const PIB: u64 = 1024 * TIB;

impl Memory {
    pub fn new(bytes: u64) -> Memory {
        Memory(bytes)
    }

    /// The raw byte count.
    pub fn bytes(self) -> u64 {
        self.0
    }
}

impl From<u64> for Memory {
    fn from(bytes: u64) -> Memory {
        Memory(bytes)
    }
}

impl std::fmt::Display for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let v = self.0;
        for (unit, name) in [
            (PIB, "PiB"),
            (TIB, "TiB"),
            (GIB, "GiB"),
            (MIB, "MiB"),
            (KIB, "KiB"),
        ] {
            if v >= unit && v % unit == 0 {
                return write!(f, "{}{name}", v / unit);
            }
        }
        write!(f, "{v}B")
    }
}

#[cfg(test)]
mod tests {
    use super::Memory;

    #[test]
    fn display_uses_whole_units() {
        assert_eq!(Memory::new(0).to_string(), "0B");
        assert_eq!(Memory::new(1023).to_string(), "1023B");
        assert_eq!(Memory::new(1024).to_string(), "1KiB");
        assert_eq!(Memory::new(3 * 1024 * 1024).to_string(), "3MiB");
        assert_eq!(Memory::new(1024 * 1024 + 1).to_string(), "1048577B");
    }
}
