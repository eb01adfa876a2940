//! Detect controllers that XInput already serves.
//!
//! XInput-capable controllers also expose a HID "compatibility" endpoint whose
//! device path carries an `IG_` interface-group marker. DirectInput happily
//! enumerates the same physical pad through that endpoint, so its product is
//! collected here and DirectInput skips any instance whose product GUID
//! carries the same `MAKELONG(vid, pid)`.

use std::collections::HashSet;

use hidapi::{DeviceInfo, HidApi};

fn is_xinput_endpoint(info: &DeviceInfo) -> bool {
    info.path().to_string_lossy().contains("IG_")
}

#[inline]
fn product_key(vid: u16, pid: u16) -> u32 {
    u32::from(pid) << 16 | u32::from(vid)
}

/// `MAKELONG(vid, pid)` of every HID endpoint that belongs to an XInput pad.
///
/// An enumeration failure yields an empty set: nothing gets filtered, which
/// at worst reports a controller twice.
pub fn xinput_products() -> HashSet<u32> {
    let api = match HidApi::new() {
        Ok(api) => api,
        Err(e) => {
            log::debug!("[dinput8] hidapi unavailable, skipping XInput filter: {e}");
            return HashSet::new();
        }
    };
    api.device_list()
        .filter(|info| is_xinput_endpoint(info))
        .map(|info| product_key(info.vendor_id(), info.product_id()))
        .collect()
}
