use std::time::Duration;

use colored::*;

use fleetr_core::{DeviceResult, ResultSet};

use crate::mprint;
use crate::terminal::{colors, format, print};

/// Tree per device, then a summary line.
pub fn present(results: &ResultSet, total_time: Duration, q_level: u8) {
    print::header(&format!("{} results", results.name()), q_level);

    for (idx, device) in results.iter().enumerate() {
        if q_level < 2 {
            print_device(idx, device, q_level);
        }
        if idx + 1 != results.len() && q_level == 0 {
            mprint!();
        }
    }

    print_summary(results, total_time, q_level);
}

fn device_status(device: &DeviceResult) -> ColoredString {
    if device.failed() {
        "FAILED".color(colors::FAILURE).bold()
    } else if device.changed() {
        "CHANGED".color(colors::CHANGED).bold()
    } else if device.is_empty() {
        "NOTHING TO DO".dimmed()
    } else {
        "OK".color(colors::SUCCESS).bold()
    }
}

fn print_device(idx: usize, device: &DeviceResult, q_level: u8) {
    print::tree_head(idx, &device.device, device_status(device));

    for (i, step) in device.results.iter().enumerate() {
        let last = i + 1 == device.results.len();
        let elapsed = format!("{}ms", step.elapsed.as_millis()).dimmed();
        let status = format!("{} {}", format::outcome_status(&step.outcome), elapsed).normal();
        print::branch(&step.name, status, last);

        if q_level == 0 {
            if let Some(output) = step.outcome.output() {
                print::as_tree_block(&format::payload_lines(&output.payload), last);
            }
        }
    }
}

fn print_summary(results: &ResultSet, total_time: Duration, q_level: u8) {
    let failed = results.failed_devices().len();
    let changed = results.changed_devices().len();

    let devices: ColoredString = format!("{} devices", results.len()).bold().green();
    let failed: ColoredString = match failed {
        0 => "0 failed".normal(),
        n => format!("{n} failed").bold().red(),
    };
    let changed: ColoredString = format!("{changed} changed").bold().yellow();
    let total_time: ColoredString = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();
    let output: String = format!("{devices}, {failed}, {changed} in {total_time}");

    match q_level {
        0 => {
            print::fat_separator();
            print::centerln(&output);
        }
        _ => {
            mprint!();
            fleetr_common::success!("{}", output)
        }
    }
}
