//! Config validation CLI tool
//!
//! Validates a speakqd configuration file and reports any errors.

use speakq_util::default_config_path;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a speakqd configuration file.");
            eprintln!();
            eprintln!("Example:");
            eprintln!("  validate-config {}", default_path.display());
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match speakq_config::load_config(&config_path) {
        Ok(config) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", speakq_config::CURRENT_CONFIG_VERSION);
            println!("  Format: {}", config.meeting.format);
            if config.meeting.time_limit_seconds > 0 {
                println!("  Time limit: {}s", config.meeting.time_limit_seconds);
            }
            println!(
                "  Auto-advance: {} (delay {}s)",
                if config.meeting.auto_advance { "on" } else { "off" },
                config.meeting.auto_advance_delay_seconds
            );
            println!("  Participants: {}", config.participants.len());

            if !config.participants.is_empty() {
                println!();
                println!("Roster:");
                for (position, participant) in config.participants.iter().enumerate() {
                    println!("  {}. {} [{}]", position + 1, participant.name, participant.id);
                }
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                speakq_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                speakq_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                speakq_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                speakq_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        speakq_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
