//! `parley doctor`: diagnose configuration and environment.

use parley_channels::VoiceCapabilities;
use parley_config::{AppConfig, ConfigError};

pub async fn run(config: Result<AppConfig, ConfigError>) -> Result<(), Box<dyn std::error::Error>> {
    println!("Parley Doctor: System Diagnostics");
    println!("=================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  ✅ Config file found: {}", config_path.display());
    } else {
        println!("  ⚠️  No config file (defaults in use). Run `parley onboard` to create one");
    }

    let config = match config {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ Configuration invalid: {e}");
            println!("\n  ⚠️  Fix the configuration and re-run doctor.");
            return Ok(());
        }
    };

    match config.require_api_key() {
        Ok(()) => println!("  ✅ Completion credential configured ({})", config.default_provider),
        Err(e) => {
            println!("  ❌ {e}");
            issues += 1;
        }
    }

    if config.weather.api_key.is_some() {
        println!("  ✅ Weather credential configured");
    } else {
        println!("  ⚠️  No WEATHER_API_KEY: weather requests will report it is not configured");
    }

    let voice = VoiceCapabilities::detect(&config.voice);
    if voice.voice_mode_available() {
        println!("  ✅ Speech recognition available");
    } else {
        println!("  ⚠️  Speech recognition not available: voice mode disabled");
    }
    if voice.speech_output_available() {
        println!("  ✅ Speech synthesis available");
    } else {
        println!("  ⚠️  Speech synthesis not available: spoken replies will be printed");
    }

    if config.has_api_key() {
        let router = parley_providers::router::build_from_config(&config);
        match router.default() {
            Some(provider) => match provider.health_check().await {
                Ok(true) => println!("  ✅ Provider '{}' reachable", provider.name()),
                Ok(false) => {
                    println!("  ❌ Provider '{}' did not answer", provider.name());
                    issues += 1;
                }
                Err(e) => {
                    println!("  ❌ Provider '{}' unreachable: {e}", provider.name());
                    issues += 1;
                }
            },
            None => {
                println!("  ❌ No default provider configured");
                issues += 1;
            }
        }
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
