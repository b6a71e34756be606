//! Scan command variants and where each one carries its cursor.

use std::fmt;

/// The closed set of scan shapes. Each variant knows the argument index of
/// its cursor, so re-issuing a command never re-parses the command name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanVariant {
    /// Whole keyspace: `scan <cursor> [MATCH ..] [COUNT ..]`.
    Keys,
    /// Scoped by a leading qualifier: `<cmd> <qualifier> <cursor> ...`.
    Qualified,
    /// Like `Qualified`, but the page interleaves keys and values.
    Values,
}

impl ScanVariant {
    /// Index of the cursor in the argument vector.
    pub fn cursor_offset(self) -> usize {
        match self {
            ScanVariant::Keys => 1,
            ScanVariant::Qualified | ScanVariant::Values => 2,
        }
    }

    /// Whether pages are `[k0, v0, k1, v1, ...]`.
    pub fn returns_pairs(self) -> bool {
        matches!(self, ScanVariant::Values)
    }

    pub fn name(self) -> &'static str {
        match self {
            ScanVariant::Keys => "keys",
            ScanVariant::Qualified => "qualified",
            ScanVariant::Values => "values",
        }
    }

    /// Classify a command by its name.
    ///
    /// `scan` and `qscan` put their cursor right after the name; every other
    /// scan command takes a qualifier first. Value-returning commands are not
    /// distinguishable by name and must be built with [`ScanVariant::Values`].
    pub fn from_command_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("scan") || name.eq_ignore_ascii_case("qscan") {
            ScanVariant::Keys
        } else {
            ScanVariant::Qualified
        }
    }
}

impl fmt::Display for ScanVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_offsets() {
        assert_eq!(ScanVariant::Keys.cursor_offset(), 1);
        assert_eq!(ScanVariant::Qualified.cursor_offset(), 2);
        assert_eq!(ScanVariant::Values.cursor_offset(), 2);
    }

    #[test]
    fn test_returns_pairs() {
        assert!(ScanVariant::Values.returns_pairs());
        assert!(!ScanVariant::Keys.returns_pairs());
        assert!(!ScanVariant::Qualified.returns_pairs());
    }

    #[test]
    fn test_from_command_name() {
        assert_eq!(ScanVariant::from_command_name("scan"), ScanVariant::Keys);
        assert_eq!(ScanVariant::from_command_name("QSCAN"), ScanVariant::Keys);
        assert_eq!(ScanVariant::from_command_name("hscan"), ScanVariant::Qualified);
        assert_eq!(ScanVariant::from_command_name("zscan"), ScanVariant::Qualified);
    }

    #[test]
    fn test_display() {
        assert_eq!(ScanVariant::Values.to_string(), "values");
    }
}
