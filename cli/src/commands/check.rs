use std::path::Path;

use anyhow::Context;
use colored::*;
use hostsync_common::config::Config;

use crate::terminal::{colors, print};

pub fn check(path: &Path) -> anyhow::Result<()> {
    let config: Config = Config::load(path)
        .with_context(|| format!("configuration {} is not usable", path.display()))?;

    summary(&config);
    Ok(())
}

fn summary(config: &Config) {
    let processing = &config.processing;
    let lines: Vec<(&str, ColoredString)> = vec![
        ("Controller", config.unifi.host.as_str().color(colors::TEXT_DEFAULT)),
        ("User", print::or_none(&config.unifi.user)),
        ("Password", secret(&config.unifi.password)),
        ("Verify TLS", config.unifi.verify_tls.to_string().normal()),
        ("Hosts file", print::or_none(&config.hostsfile.filename)),
        ("Database", database(config)),
        ("Domains", print::or_none(&processing.domains.join(", "))),
        ("Static hosts", processing.additional.len().to_string().normal()),
        ("Exclusive", exclusive(config)),
        ("Block rules", processing.blocked.len().to_string().normal()),
        ("Aliases", processing.cnames.len().to_string().normal()),
        ("Keep MACs", processing.keep_macs.to_string().normal()),
        ("Daemonize", config.daemonize.to_string().normal()),
        ("Sleep", format!("{}s", config.sleep_duration().as_secs()).normal()),
        ("Max age", max_age(config)),
    ];

    print::set_key_width(lines.iter().map(|(key, _)| *key));
    print::header("configuration");
    for (key, value) in lines {
        print::aligned_line(key, value);
    }
    print::fat_separator();
    print::print_status(format!("{}", "Configuration is valid".green().bold()));
}

fn secret(value: &str) -> ColoredString {
    if value.is_empty() {
        return print::or_none(value);
    }
    "********".color(colors::TEXT_DEFAULT)
}

fn database(config: &Config) -> ColoredString {
    if !config.database.is_configured() {
        return print::or_none("");
    }
    format!("{} ({})", config.database.dsn, config.database.driver).normal()
}

fn exclusive(config: &Config) -> ColoredString {
    let names: Vec<String> = config
        .processing
        .additional
        .iter()
        .filter(|host| host.exclusive)
        .flat_map(|host| host.names())
        .collect();
    print::or_none(&names.join(", "))
}

fn max_age(config: &Config) -> ColoredString {
    match config.max_age() {
        Some(age) => format!("{}s", age.as_secs()).normal(),
        None => "disabled".color(colors::MUTED).italic(),
    }
}
