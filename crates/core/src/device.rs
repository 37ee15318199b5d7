use std::collections::BTreeMap;

use anyhow::Result;

/// Control metadata for an amplifier: the set of known control names and the
/// integer value range each control accepts.
///
/// Names are stored lowercase; lookups are case-insensitive. The table is
/// built once by the device layer and stays immutable for the process
/// lifetime.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlTable {
    limits: BTreeMap<String, (i32, i32)>,
}

impl ControlTable {
    pub fn new() -> Self {
        Self {
            limits: BTreeMap::new(),
        }
    }

    /// Register a control with its inclusive `[low, high]` value range.
    pub fn insert(&mut self, name: &str, low: i32, high: i32) {
        debug_assert!(low <= high, "control range must be ordered");
        self.limits.insert(name.to_ascii_lowercase(), (low, high));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.limits.contains_key(&name.to_ascii_lowercase())
    }

    pub fn limits(&self, name: &str) -> Option<(i32, i32)> {
        self.limits.get(&name.to_ascii_lowercase()).copied()
    }

    /// Control names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.limits.keys().map(String::as_str)
    }

    /// Controls with their limits, in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, (i32, i32))> {
        self.limits.iter().map(|(name, range)| (name.as_str(), *range))
    }

    pub fn len(&self) -> usize {
        self.limits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.limits.is_empty()
    }

    /// Rescale a 7-bit MIDI value (0-127) into the named control's range:
    /// `round(value / 127 * (high - low) + low)`.
    ///
    /// Rounding is half away from zero (`f64::round`), so a CC value of 64 on
    /// a 0-127 control yields 64. The endpoints map exactly: 0 gives `low`,
    /// 127 gives `high`. Returns `None` only for an unknown control name.
    pub fn scale(&self, name: &str, cc_value: u8) -> Option<i32> {
        let (low, high) = self.limits(name)?;
        let fraction = f64::from(cc_value) / 127.0;
        let scaled = fraction * f64::from(high - low) + f64::from(low);
        Some(scaled.round() as i32)
    }
}

/// An amplifier as seen by the engine: a connection lifecycle, two command
/// entry points and static control metadata. The transport behind it (USB,
/// mock, anything else) is the implementor's concern.
pub trait AmpDevice {
    /// Human-readable model name, e.g. for the connection banner.
    fn model(&self) -> &str;

    /// The amplifier's control table. Stable across the whole process.
    fn controls(&self) -> &ControlTable;

    fn connect(&mut self) -> Result<()>;

    fn disconnect(&mut self) -> Result<()>;

    /// Recall a stored preset. Presets are numbered 1-128.
    fn select_preset(&mut self, preset: u8) -> Result<()>;

    /// Set a control to a value within its limits. `name` is lowercase.
    fn set_control(&mut self, name: &str, value: i32) -> Result<()>;
}
