use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::device::ControlTable;

/// The built-in CC assignment used when no map file is supplied.
const DEFAULT_MAP: &[(u8, &str)] = &[
    (7, "Volume"),
    (22, "Volume"),
    (23, "Bass"),
    (24, "Middle"),
    (25, "Treble"),
    (26, "Mod_Switch"),
    (27, "Delay_Switch"),
    (28, "Reverb_Switch"),
    (14, "Voice"),
    (15, "Gain"),
    (16, "ISF"),
];

/// Assignment of MIDI CC numbers to amplifier control names.
///
/// Several CC numbers may address the same control; a CC number addresses at
/// most one control (on load, the last row naming a CC wins). Every name must
/// exist in the device's control table; a load that violates this fails as a
/// whole and the caller keeps whatever map was active before.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlMap {
    entries: BTreeMap<u8, String>,
}

impl ControlMap {
    /// The built-in default mapping.
    pub fn builtin() -> Self {
        let entries = DEFAULT_MAP
            .iter()
            .map(|&(cc, name)| (cc, name.to_string()))
            .collect();
        Self { entries }
    }

    /// Load a map from a file of `ccNumber,controlName` lines (no header).
    ///
    /// Blank lines are skipped and fields are trimmed. The first row with a
    /// non-integer or out-of-range CC number, or a name missing from
    /// `controls`, fails the load; nothing of the candidate map survives a
    /// failure.
    pub fn from_path(path: &Path, controls: &ControlTable) -> Result<Self, MapError> {
        let content =
            fs::read_to_string(path).map_err(|e| MapError::ReadError(e.to_string()))?;
        Self::from_rows(content.lines(), controls)
    }

    /// Build a validated map from `cc,name` rows. Used by `from_path` and
    /// directly by tests.
    pub fn from_rows<'a, I>(rows: I, controls: &ControlTable) -> Result<Self, MapError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut entries = BTreeMap::new();
        for row in rows {
            let row = row.trim();
            if row.is_empty() {
                continue;
            }
            let (cc_field, name_field) = row
                .split_once(',')
                .ok_or_else(|| MapError::ParseError(row.to_string()))?;

            let cc: i32 = cc_field
                .trim()
                .parse()
                .map_err(|_| MapError::InvalidCcNumber(cc_field.trim().to_string()))?;
            if !(0..=127).contains(&cc) {
                return Err(MapError::InvalidCcNumber(cc.to_string()));
            }

            let name = name_field.trim();
            if !controls.contains(name) {
                return Err(MapError::UnknownControl(name.to_string()));
            }

            entries.insert(cc as u8, name.to_string());
        }
        Ok(Self { entries })
    }

    /// The control name assigned to a CC number, in its display casing.
    pub fn control_for(&self, cc: u8) -> Option<&str> {
        self.entries.get(&cc).map(String::as_str)
    }

    /// Entries in CC-number order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &str)> {
        self.entries.iter().map(|(cc, name)| (*cc, name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ControlMap {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Why a map failed to load. Any of these rejects the whole file.
#[derive(Debug)]
pub enum MapError {
    ReadError(String),
    ParseError(String),
    InvalidCcNumber(String),
    UnknownControl(String),
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::ReadError(msg) => write!(f, "failed to read map file: {}", msg),
            MapError::ParseError(row) => write!(f, "malformed map row \"{}\"", row),
            MapError::InvalidCcNumber(cc) => write!(f, "invalid MIDI CC number {}", cc),
            MapError::UnknownControl(name) => write!(f, "invalid control name \"{}\"", name),
        }
    }
}

impl std::error::Error for MapError {}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn controls() -> ControlTable {
        let mut t = ControlTable::new();
        for name in ["volume", "bass", "middle", "treble", "voice", "gain", "isf"] {
            t.insert(name, 0, 127);
        }
        t
    }

    #[test]
    fn builtin_map_routes_volume() {
        let map = ControlMap::builtin();
        assert_eq!(map.control_for(7), Some("Volume"));
        assert_eq!(map.control_for(22), Some("Volume"));
        assert_eq!(map.control_for(23), Some("Bass"));
        assert_eq!(map.control_for(99), None);
    }

    #[test]
    fn loads_valid_rows() {
        let map =
            ControlMap::from_rows(["1,Volume", "2,Bass", "", "  3 , Treble "], &controls())
                .unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map.control_for(1), Some("Volume"));
        assert_eq!(map.control_for(3), Some("Treble"));
    }

    #[test]
    fn last_row_wins_for_duplicate_cc() {
        let map = ControlMap::from_rows(["5,Volume", "5,Bass"], &controls()).unwrap();
        assert_eq!(map.control_for(5), Some("Bass"));
    }

    #[test]
    fn out_of_range_cc_rejects_the_file() {
        let err = ControlMap::from_rows(["200,Volume"], &controls()).unwrap_err();
        assert!(matches!(err, MapError::InvalidCcNumber(_)));

        let err = ControlMap::from_rows(["-1,Volume"], &controls()).unwrap_err();
        assert!(matches!(err, MapError::InvalidCcNumber(_)));
    }

    #[test]
    fn non_integer_cc_rejects_the_file() {
        let err = ControlMap::from_rows(["seven,Volume"], &controls()).unwrap_err();
        assert!(matches!(err, MapError::InvalidCcNumber(_)));
    }

    #[test]
    fn unknown_control_rejects_the_file() {
        let err = ControlMap::from_rows(["1,Volume", "2,Flanger"], &controls()).unwrap_err();
        assert!(matches!(err, MapError::UnknownControl(_)));
    }

    #[test]
    fn control_names_validate_case_insensitively() {
        let map = ControlMap::from_rows(["1,VOLUME", "2,bass"], &controls()).unwrap();
        assert_eq!(map.control_for(1), Some("VOLUME"));
        assert_eq!(map.control_for(2), Some("bass"));
    }

    #[test]
    fn reload_of_the_same_source_is_identical() {
        let rows = ["7,Volume", "23,Bass"];
        let first = ControlMap::from_rows(rows, &controls()).unwrap();
        let second = ControlMap::from_rows(rows, &controls()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = ControlMap::from_path(Path::new("/nonexistent/map.csv"), &controls())
            .unwrap_err();
        assert!(matches!(err, MapError::ReadError(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "7,Volume").unwrap();
        writeln!(file, "23,Bass").unwrap();
        let map = ControlMap::from_path(file.path(), &controls()).unwrap();
        assert_eq!(map.control_for(7), Some("Volume"));
        assert_eq!(map.control_for(23), Some("Bass"));
    }
}
