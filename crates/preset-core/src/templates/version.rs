//! Version comparison for CLI and preset compatibility

use semver::Version;

fn parse(version: &str) -> Option<Version> {
    Version::parse(version.trim().trim_start_matches('v')).ok()
}

/// Compare the CLI version against the version a preset was written for.
/// Returns a warning message if the CLI is older than the preset expects.
pub fn check_compatibility(
    cli_version: &str,
    preset_name: &str,
    preset_version: &str,
    upgrade_command: &str,
) -> Option<String> {
    // Unparseable versions can't be compared, skip the warning
    let cli_ver = parse(cli_version)?;
    let preset_ver = parse(preset_version)?;

    if cli_ver < preset_ver {
        Some(format!(
            "Preset '{}' was written for CLI version {} or newer.\n\
             You are running version {}.\n\
             Consider updating: {}",
            preset_name, preset_ver, cli_ver, upgrade_command
        ))
    } else {
        None
    }
}
