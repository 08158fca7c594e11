//! Build script for fieldbase-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates station.toml at compile time
//! - Records the build time, used to set a clock that lost power

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

fn main() {
    setup_linker();
    validate_config();
    emit_build_time();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
}

/// Seconds since the Unix epoch, exported as `FIELDBASE_BUILD_EPOCH`
fn emit_build_time() {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    println!("cargo:rustc-env=FIELDBASE_BUILD_EPOCH={}", secs);
}

/// Validate station.toml configuration at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=station.toml");

    let config_path = Path::new("station.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: station.toml not found!                                  ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds station.toml as its configuration.          ║\n\
            ║  Please create one in the fieldbase-firmware directory.          ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read station.toml                              ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in station.toml                      ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                {}\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();
    validate_station(&config, &mut errors);
    validate_radio(&config, &mut errors);
    validate_clock(&config, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid values in station.toml                           ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=station.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Look up `section.key`, recording an error if the section is not a table
fn field<'a>(
    config: &'a toml::Value,
    section: &str,
    key: &str,
    errors: &mut Vec<String>,
) -> Option<&'a toml::Value> {
    match config.get(section) {
        None => None,
        Some(toml::Value::Table(t)) => t.get(key),
        Some(_) => {
            errors.push(format!("[{}] must be a table", section));
            None
        }
    }
}

/// Check an optional integer against an inclusive range
fn check_int(
    config: &toml::Value,
    section: &str,
    key: &str,
    min: i64,
    max: i64,
    errors: &mut Vec<String>,
) {
    match field(config, section, key, errors) {
        None => {}
        Some(toml::Value::Integer(v)) if (min..=max).contains(v) => {}
        Some(toml::Value::Integer(v)) => {
            errors.push(format!("[{}] {} = {} outside {}..={}", section, key, v, min, max));
        }
        Some(_) => errors.push(format!("[{}] {} must be an integer", section, key)),
    }
}

fn check_bool(config: &toml::Value, section: &str, key: &str, errors: &mut Vec<String>) {
    if let Some(v) = field(config, section, key, errors) {
        if !v.is_bool() {
            errors.push(format!("[{}] {} must be true or false", section, key));
        }
    }
}

fn check_keys(config: &toml::Value, section: &str, known: &[&str], errors: &mut Vec<String>) {
    if let Some(toml::Value::Table(t)) = config.get(section) {
        for key in t.keys() {
            if !known.contains(&key.as_str()) {
                errors.push(format!("[{}] unknown key '{}'", section, key));
            }
        }
    }
}

fn validate_station(config: &toml::Value, errors: &mut Vec<String>) {
    check_keys(config, "station", &["address", "log_file", "reply_to_data"], errors);
    check_int(config, "station", "address", 0, 254, errors);
    check_bool(config, "station", "reply_to_data", errors);

    match field(config, "station", "log_file", errors) {
        None => {}
        Some(toml::Value::String(name)) => {
            let valid = match name.split_once('.') {
                Some((base, ext)) => {
                    (1..=8).contains(&base.len()) && ext.len() <= 3 && !ext.contains('.')
                }
                None => (1..=8).contains(&name.len()),
            };
            if !valid {
                errors.push(format!("[station] log_file '{}' is not an 8.3 name", name));
            }
        }
        Some(_) => errors.push("[station] log_file must be a string".to_string()),
    }
}

fn validate_radio(config: &toml::Value, errors: &mut Vec<String>) {
    check_keys(
        config,
        "radio",
        &[
            "frequency_khz",
            "tx_power_dbm",
            "bandwidth_hz",
            "spreading_factor",
            "coding_rate",
            "ack_timeout_ms",
            "retries",
        ],
        errors,
    );
    check_int(config, "radio", "frequency_khz", 137_000, 1_020_000, errors);
    check_int(config, "radio", "tx_power_dbm", 2, 20, errors);
    check_int(config, "radio", "spreading_factor", 6, 12, errors);
    check_int(config, "radio", "coding_rate", 5, 8, errors);
    check_int(config, "radio", "ack_timeout_ms", 1, 10_000, errors);
    check_int(config, "radio", "retries", 0, 255, errors);

    const BANDWIDTHS: [i64; 10] = [
        7_800, 10_400, 15_600, 20_800, 31_250, 41_700, 62_500, 125_000, 250_000, 500_000,
    ];
    if let Some(toml::Value::Integer(bw)) = field(config, "radio", "bandwidth_hz", errors) {
        if !BANDWIDTHS.contains(bw) {
            errors.push(format!("[radio] bandwidth_hz = {} is not a LoRa bandwidth", bw));
        }
    }
}

fn validate_clock(config: &toml::Value, errors: &mut Vec<String>) {
    check_keys(config, "clock", &["adjust_on_boot"], errors);
    check_bool(config, "clock", "adjust_on_boot", errors);
}
