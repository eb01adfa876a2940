//! Poll every device at ~25 Hz and print changes.
//!
//! A virtual pad is attached alongside the native backends so there is always
//! something to watch; it slowly sweeps axis 0 and toggles button 0.

use std::collections::HashMap;
use std::thread;
use std::time::{Duration, Instant};

use nativepad::backends::VirtualBackend;
use nativepad::{DeviceId, GamepadState, HatState, Hotplug, NativeGamepads};

fn describe(state: &GamepadState) -> String {
    let axes: Vec<String> = state.axes().iter().map(|v| format!("{v:+.3}")).collect();
    let buttons: Vec<usize> = state
        .buttons()
        .iter()
        .enumerate()
        .filter_map(|(i, &p)| p.then_some(i))
        .collect();
    let hats: Vec<u8> = state.hats().iter().map(|h| h.bits()).collect();
    format!(
        "axes=[{}] pressed={buttons:?} hats={hats:?}",
        axes.join(" ")
    )
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut pads = NativeGamepads::new();
    if let Err(e) = pads.init() {
        eprintln!("init: {e}");
    }

    let virt = VirtualBackend::new();
    let script = virt.handle();
    script.plug(0, "Virtual Sweep", 2, 4, 1);
    pads.attach_backend(Box::new(virt));

    let start = Instant::now();
    let mut last_rescan = Instant::now();
    let mut last: HashMap<DeviceId, GamepadState> = HashMap::new();

    loop {
        let t = start.elapsed().as_secs_f64();
        script.set_axis(0, 0, (t * 0.5).sin());
        script.press(0, 0, (t as u64) % 2 == 0);
        let hat = if (t as u64) % 4 == 0 {
            HatState::Up
        } else {
            HatState::Centered
        };
        script.set_hat(0, 0, hat);

        // No window message loop here, so rescan on a timer instead of WM_DEVICECHANGE.
        if last_rescan.elapsed() >= Duration::from_secs(2) {
            pads.handle_hotplug(Hotplug::Arrived);
            pads.handle_hotplug(Hotplug::Removed);
            last_rescan = Instant::now();
        }

        pads.update_all();
        for id in pads.ids() {
            let pad = pads.gamepad(id);
            if last.get(&id) != Some(pad.state()) {
                let label = pads
                    .meta(id)
                    .map(|m| m.label().to_string())
                    .unwrap_or_default();
                println!("{id} {label}: {}", describe(pad.state()));
                last.insert(id, pad.state().clone());
            }
        }
        last.retain(|id, _| pads.gamepad(*id).present());

        thread::sleep(Duration::from_millis(40));
    }
}
