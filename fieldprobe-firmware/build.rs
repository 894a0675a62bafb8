//! Build script for fieldprobe-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates probe.toml at compile time

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::PathBuf;

const CONFIG_FILE: &str = "probe.toml";

fn main() {
    setup_linker();
    validate_config();
}

/// Put memory.x where the linker looks
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR not set by cargo"));
    fs::write(out_dir.join("memory.x"), include_bytes!("memory.x"))
        .expect("cannot write memory.x");

    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate probe.toml at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed={}", CONFIG_FILE);

    let source = fs::read_to_string(CONFIG_FILE).unwrap_or_else(|e| {
        fail(
            "probe.toml is missing or unreadable",
            &[e.to_string(), "The firmware embeds it; keep it next to Cargo.toml".into()],
        )
    });

    let config: toml::Value = toml::from_str(&source).unwrap_or_else(|e| {
        let lines: Vec<String> = e.to_string().lines().map(str::to_string).collect();
        fail("Invalid TOML syntax in probe.toml", &lines)
    });

    validate_required_sections(&config);
    validate_bus(&config);
    validate_scan(&config);
    validate_board(&config);

    println!("cargo:warning=probe.toml validated successfully");
}

/// Abort the build with a boxed list of problems
fn fail(title: &str, lines: &[String]) -> ! {
    let body: Vec<String> = lines.iter().map(|l| format!("║  • {:<62} ║", l)).collect();
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        body.join("\n")
    );
}

/// Fail if any validator collected errors
fn report(title: &str, errors: &[String]) {
    if !errors.is_empty() {
        fail(title, errors);
    }
}

fn validate_required_sections(config: &toml::Value) {
    let errors: Vec<String> = ["bus", "scan", "board"]
        .iter()
        .filter(|name| !matches!(config.get(**name), Some(toml::Value::Table(_))))
        .map(|name| format!("Missing [{}] section", name))
        .collect();

    report("Missing required sections in probe.toml", &errors);
}

/// Logical pin like "PC1": port A, C or D, index 0-15
fn is_logical_pin(s: &str) -> bool {
    let mut chars = s.chars();
    if chars.next() != Some('P') {
        return false;
    }
    if !matches!(chars.next(), Some('A' | 'C' | 'D')) {
        return false;
    }
    matches!(chars.as_str().parse::<u8>(), Ok(n) if n <= 15)
}

/// Board pin like "^!gpio14"
fn board_gpio(s: &str) -> Option<u8> {
    let s = s.trim_start_matches(|c| c == '!' || c == '^');
    let n: u8 = s.strip_prefix("gpio")?.parse().ok()?;
    (n < 30).then_some(n)
}

fn int(table: &toml::value::Table, key: &str) -> Option<i64> {
    table.get(key).and_then(|v| v.as_integer())
}

fn validate_bus(config: &toml::Value) {
    let Some(bus) = config.get("bus").and_then(|b| b.as_table()) else {
        return;
    };
    let mut errors = Vec::new();

    let mut lines = Vec::new();
    for key in ["sda", "scl"] {
        match bus.get(key).and_then(|v| v.as_str()) {
            Some(pin) if is_logical_pin(pin) => lines.push(pin),
            Some(pin) => errors.push(format!("[bus] {} '{}' is not PA/PC/PD 0-15", key, pin)),
            None => errors.push(format!("[bus] missing '{}'", key)),
        }
    }
    if lines.len() == 2 && lines[0] == lines[1] {
        errors.push("[bus] sda and scl must differ".to_string());
    }

    for key in ["scan_speed_hz", "sensor_speed_hz"] {
        match int(bus, key) {
            Some(hz) if hz > 0 && hz <= 1_000_000 => {}
            Some(_) => errors.push(format!("[bus] {} must be 1-1000000", key)),
            None => {}
        }
    }

    report("Invalid [bus] configuration", &errors);
}

fn validate_scan(config: &toml::Value) {
    let Some(scan) = config.get("scan").and_then(|s| s.as_table()) else {
        return;
    };
    let mut errors = Vec::new();

    for key in ["first_address", "last_address", "min_valid_address"] {
        if let Some(addr) = int(scan, key) {
            if !(0..=0x7F).contains(&addr) {
                errors.push(format!("[scan] {} must be 0x00-0x7F", key));
            }
        }
    }

    let first = int(scan, "first_address").unwrap_or(0x04);
    let last = int(scan, "last_address").unwrap_or(0x7F);
    if first > last {
        errors.push("[scan] first_address must not exceed last_address".to_string());
    }

    if let Some(threshold) = int(scan, "bus_fault_threshold") {
        if !(1..=255).contains(&threshold) {
            errors.push("[scan] bus_fault_threshold must be 1-255".to_string());
        }
    }

    report("Invalid [scan] configuration", &errors);
}

fn validate_board(config: &toml::Value) {
    let Some(board) = config.get("board").and_then(|b| b.as_table()) else {
        return;
    };
    let mut errors = Vec::new();
    let mut used = HashSet::new();

    for key in ["sda", "scl", "led", "button_a", "button_b"] {
        match board.get(key).and_then(|v| v.as_str()) {
            Some(pin) => match board_gpio(pin) {
                Some(n) => {
                    if !used.insert(n) {
                        errors.push(format!("[board] {} reuses gpio{}", key, n));
                    }
                }
                None => errors.push(format!("[board] {} '{}' is not gpio0-29", key, pin)),
            },
            None => errors.push(format!("[board] missing '{}'", key)),
        }
    }

    report("Invalid [board] configuration", &errors);
}
