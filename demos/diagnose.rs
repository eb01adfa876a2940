//! Print which native backends came up and every device they report.
//!
//! ```text
//! cargo run --example diagnose [config.toml]
//! ```

use nativepad::{BackendConfig, NativeGamepads, SystemPlatform};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => BackendConfig::load(&path).expect("load config"),
        None => BackendConfig::default(),
    };

    let mut pads = NativeGamepads::with_config(SystemPlatform::default(), config);
    if let Err(e) = pads.init() {
        eprintln!("init: {e}");
    }
    pads.update_all();

    let snap = pads.snapshot();
    for b in &snap.backends {
        println!(
            "{:<8} available={} library={}",
            b.kind.as_str(),
            b.available,
            b.library.as_deref().unwrap_or("-")
        );
    }
    for d in &snap.devices {
        println!(
            "{} [{}] {} vid={:04x?} pid={:04x?} axes={} buttons={} hats={} present={}",
            d.id,
            d.meta.backend,
            d.meta.label(),
            d.meta.vid,
            d.meta.pid,
            d.state.axes().len(),
            d.state.buttons().len(),
            d.state.hats().len(),
            d.present
        );
    }
    println!("{}", snap.to_json().expect("serialize snapshot"));
}
