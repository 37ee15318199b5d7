use ampctl_core::ControlTable;

/// Wire identifier of the delay time control, the one control that carries a
/// two-byte value.
pub(crate) const DELAY_TIME_ID: u8 = 0x1B;

/// ID-series controls: name, wire identifier, inclusive value range.
const CONTROLS: &[(&str, u8, i32, i32)] = &[
    ("voice", 0x01, 0, 5),
    ("gain", 0x02, 0, 127),
    ("volume", 0x03, 0, 127),
    ("bass", 0x04, 0, 127),
    ("middle", 0x05, 0, 127),
    ("treble", 0x06, 0, 127),
    ("isf", 0x07, 0, 127),
    ("tvp_valve", 0x08, 0, 5),
    ("resonance", 0x0B, 0, 127),
    ("presence", 0x0C, 0, 127),
    ("master_volume", 0x0D, 0, 127),
    ("tvp_switch", 0x0E, 0, 1),
    ("mod_switch", 0x0F, 0, 1),
    ("delay_switch", 0x10, 0, 1),
    ("reverb_switch", 0x11, 0, 1),
    ("mod_type", 0x12, 0, 3),
    ("mod_segval", 0x13, 0, 31),
    ("mod_level", 0x15, 0, 127),
    ("mod_speed", 0x16, 0, 127),
    ("delay_type", 0x17, 0, 1),
    ("delay_feedback", 0x18, 0, 31),
    ("delay_level", 0x1A, 0, 127),
    ("delay_time", DELAY_TIME_ID, 100, 2000),
    ("reverb_type", 0x1C, 0, 3),
    ("reverb_size", 0x1D, 0, 31),
    ("reverb_level", 0x1F, 0, 127),
    ("fx_focus", 0x24, 1, 3),
];

/// The control table for ID-series amplifiers.
pub fn control_table() -> ControlTable {
    let mut table = ControlTable::new();
    for &(name, _, low, high) in CONTROLS {
        table.insert(name, low, high);
    }
    table
}

/// Wire identifier for a control name (case-insensitive).
pub(crate) fn control_id(name: &str) -> Option<u8> {
    let name = name.to_ascii_lowercase();
    CONTROLS
        .iter()
        .find(|(candidate, _, _, _)| *candidate == name)
        .map(|&(_, id, _, _)| id)
}
