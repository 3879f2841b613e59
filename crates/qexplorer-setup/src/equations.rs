//! Lookup of the pre-rendered model equation images.
//!
//! The images live in `latex/` under an assets directory: `eqn.png` shows
//! the full model, and `eqn_<symbol>.png` the same equation with one symbol
//! highlighted.

use std::path::{Path, PathBuf};

/// Every symbol that has a highlighted image.
pub const HIGHLIGHTS: [&str; 11] = [
    "freq",
    "kerr",
    "drive_amp",
    "drive_phase",
    "decay",
    "dephasing",
    "leg_count",
    "init_state",
    "leg_phase",
    "displacement",
    "pulse",
];

/// Highlight suffix for a field key, if the equation shows that parameter.
pub fn highlight_for(key: &str) -> Option<&'static str> {
    Some(match key {
        "frequency" => "freq",
        "anharmonicity" | "strength" => "kerr",
        "amplitude" => "drive_amp",
        "phase_degrees" => "drive_phase",
        "decay" => "decay",
        "dephasing" => "dephasing",
        "initial_leg_count" => "leg_count",
        "initial_leg_phases" => "leg_phase",
        "dimension" => "init_state",
        "initial_displacement" => "displacement",
        "duration" => "pulse",
        _ => return None,
    })
}

/// Path of the equation image, optionally highlighting `suffix`.
pub fn equation_image(assets: &Path, suffix: Option<&str>) -> PathBuf {
    let file = match suffix {
        Some(s) => format!("eqn_{s}.png"),
        None => "eqn.png".to_string(),
    };
    assets.join("latex").join(file)
}

/// Image to show while `key` is being edited: its highlighted variant when
/// that file exists, the plain equation otherwise.
pub fn image_for_field(assets: &Path, key: &str) -> PathBuf {
    highlight_for(key)
        .map(|s| equation_image(assets, Some(s)))
        .filter(|p| p.is_file())
        .unwrap_or_else(|| equation_image(assets, None))
}
