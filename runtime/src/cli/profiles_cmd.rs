//! `scout profiles`: print the device emulation table.

use crate::session::profile::DeviceKind;
use anyhow::Result;

pub fn run(json: bool) -> Result<()> {
    let profiles: Vec<_> = DeviceKind::ALL.iter().map(|k| k.profile()).collect();
    if json {
        println!("{}", serde_json::to_string_pretty(&profiles)?);
        return Ok(());
    }

    println!("{:<8} {:>10} {:>6} {:>6}  USER AGENT", "DEVICE", "VIEWPORT", "SCALE", "TOUCH");
    for p in &profiles {
        println!(
            "{:<8} {:>10} {:>6} {:>6}  {}",
            p.kind.as_str(),
            format!("{}x{}", p.width, p.height),
            p.device_scale_factor,
            if p.has_touch { "yes" } else { "no" },
            p.user_agent
        );
    }
    Ok(())
}
