use colored::*;

use fleetr_core::Selection;

use crate::commands::Output;
use crate::mprint;
use crate::terminal::{format, print};

pub fn inventory(subset: &Selection<'_>, out: Output) -> anyhow::Result<()> {
    if out.json {
        let devices: Vec<_> = subset.devices().collect();
        println!("{}", serde_json::to_string_pretty(&devices)?);
        return Ok(());
    }

    print::header(&format!("{} devices", subset.len()), out.quiet);
    for (idx, device) in subset.devices().enumerate() {
        let platform = device.platform.as_deref().unwrap_or("default platform");
        print::tree_head(idx, &device.name, format!("({platform})").dimmed());
        if out.quiet == 0 {
            print::as_tree_one_level(&format::device_details(device));
            if idx + 1 != subset.len() {
                mprint!();
            }
        }
    }
    Ok(())
}
