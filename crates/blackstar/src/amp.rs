use std::time::Duration;

use ampctl_core::{AmpDevice, ControlTable};
use rusb::{Context, DeviceHandle, UsbContext};
use thiserror::Error;

use crate::controls;
use crate::protocol::{self, PACKET_SIZE};

/// Blackstar USB vendor ID.
const BLACKSTAR_VENDOR_ID: u16 = 0x27D4;

/// Product IDs we recognize. Anything else under the vendor ID is accepted
/// with a generic model name.
const KNOWN_MODELS: &[(u16, &str)] = &[
    (0x0001, "ID:TVP"),
    (0x0010, "ID:Core"),
    (0x0013, "ID:Core BEAM"),
];

const FALLBACK_MODEL: &str = "Blackstar ID";

/// Interrupt endpoint for commands to the amp.
const ENDPOINT_OUT: u8 = 0x01;

/// USB transfer timeout in milliseconds.
const USB_TIMEOUT_MS: u64 = 1000;

/// Errors from the Blackstar transport.
#[derive(Debug, Error)]
pub enum BlackstarError {
    #[error("no Blackstar ID amplifier found")]
    DeviceNotFound,

    #[error("USB error: {0}")]
    Usb(#[from] rusb::Error),

    #[error("amplifier is not connected")]
    NotConnected,

    #[error("unknown control \"{0}\"")]
    UnknownControl(String),

    #[error("value {value} out of range {low}-{high} for {name}")]
    ValueOutOfRange {
        name: String,
        value: i32,
        low: i32,
        high: i32,
    },
}

/// A Blackstar ID-series amplifier on the USB bus.
///
/// Commands are written as 64-byte interrupt transfers; the claimed interface
/// is released again on `disconnect` (or drop). The kernel driver the OS may
/// have bound to the interface is detached for the duration of the claim and
/// reattached afterwards.
pub struct BlackstarAmp {
    handle: Option<DeviceHandle<Context>>,
    model: String,
    controls: ControlTable,
}

impl BlackstarAmp {
    pub fn new() -> Self {
        Self {
            handle: None,
            model: FALLBACK_MODEL.to_string(),
            controls: controls::control_table(),
        }
    }

    fn write_packet(&mut self, packet: &[u8; PACKET_SIZE]) -> Result<(), BlackstarError> {
        let handle = self.handle.as_mut().ok_or(BlackstarError::NotConnected)?;
        let timeout = Duration::from_millis(USB_TIMEOUT_MS);
        handle.write_interrupt(ENDPOINT_OUT, packet, timeout)?;
        Ok(())
    }

    fn checked_limits(&self, name: &str, value: i32) -> Result<(), BlackstarError> {
        let (low, high) = self
            .controls
            .limits(name)
            .ok_or_else(|| BlackstarError::UnknownControl(name.to_string()))?;
        if value < low || value > high {
            return Err(BlackstarError::ValueOutOfRange {
                name: name.to_string(),
                value,
                low,
                high,
            });
        }
        Ok(())
    }
}

impl Default for BlackstarAmp {
    fn default() -> Self {
        Self::new()
    }
}

impl AmpDevice for BlackstarAmp {
    fn model(&self) -> &str {
        &self.model
    }

    fn controls(&self) -> &ControlTable {
        &self.controls
    }

    fn connect(&mut self) -> anyhow::Result<()> {
        let context = Context::new().map_err(BlackstarError::from)?;

        // Find the first device under the Blackstar vendor ID.
        let (device, product_id) = context
            .devices()
            .map_err(BlackstarError::from)?
            .iter()
            .find_map(|d| {
                let desc = d.device_descriptor().ok()?;
                (desc.vendor_id() == BLACKSTAR_VENDOR_ID).then(|| (d, desc.product_id()))
            })
            .ok_or(BlackstarError::DeviceNotFound)?;

        let mut handle = device.open().map_err(BlackstarError::from)?;

        // Let libusb move any bound kernel driver out of the way while the
        // interface is claimed; not every platform supports this.
        if let Err(e) = handle.set_auto_detach_kernel_driver(true) {
            log::debug!("kernel driver auto-detach unavailable: {}", e);
        }
        handle
            .claim_interface(0)
            .map_err(BlackstarError::from)?;

        self.model = KNOWN_MODELS
            .iter()
            .find(|(pid, _)| *pid == product_id)
            .map(|&(_, model)| model.to_string())
            .unwrap_or_else(|| FALLBACK_MODEL.to_string());
        self.handle = Some(handle);

        log::info!("claimed {} (product id {:#06x})", self.model, product_id);
        Ok(())
    }

    fn disconnect(&mut self) -> anyhow::Result<()> {
        if let Some(handle) = self.handle.take() {
            handle
                .release_interface(0)
                .map_err(BlackstarError::from)?;
            log::info!("released {}", self.model);
        }
        Ok(())
    }

    fn select_preset(&mut self, preset: u8) -> anyhow::Result<()> {
        self.write_packet(&protocol::preset_packet(preset))?;
        Ok(())
    }

    fn set_control(&mut self, name: &str, value: i32) -> anyhow::Result<()> {
        let id = controls::control_id(name)
            .ok_or_else(|| BlackstarError::UnknownControl(name.to_string()))?;
        self.checked_limits(name, value)?;
        self.write_packet(&protocol::control_packet(id, value))?;
        Ok(())
    }
}

impl Drop for BlackstarAmp {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.release_interface(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_require_a_connection() {
        let mut amp = BlackstarAmp::new();
        let err = amp.set_control("volume", 64).unwrap_err();
        assert!(err.downcast_ref::<BlackstarError>().is_some());
    }

    #[test]
    fn unknown_control_is_rejected_before_any_transfer() {
        let mut amp = BlackstarAmp::new();
        let err = amp.set_control("flanger", 1).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BlackstarError>(),
            Some(BlackstarError::UnknownControl(_))
        ));
    }

    #[test]
    fn disconnect_without_connect_is_a_no_op() {
        let mut amp = BlackstarAmp::new();
        assert!(amp.disconnect().is_ok());
    }

    #[test]
    fn model_defaults_until_connected() {
        assert_eq!(BlackstarAmp::new().model(), FALLBACK_MODEL);
    }
}
