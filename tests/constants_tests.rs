// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use camera_mirror::constants::SessionPreset;

#[test]
fn test_session_preset_values() {
    assert_eq!(SessionPreset::ALL.len(), 4);
    assert_eq!(SessionPreset::default(), SessionPreset::High);
}

#[test]
fn test_session_preset_ordering() {
    // Bounded presets grow from lowest to highest resolution
    let mut prev_pixels = 0u32;
    for preset in SessionPreset::ALL {
        let Some((w, h)) = preset.max_resolution() else {
            assert_eq!(preset, SessionPreset::Max);
            continue;
        };
        assert!(
            w * h > prev_pixels,
            "Presets should be ordered from lowest to highest"
        );
        prev_pixels = w * h;
    }
}

#[test]
fn test_session_preset_display_names() {
    for preset in SessionPreset::ALL {
        let name = preset.display_name();
        assert!(!name.is_empty());
        assert_eq!(name.parse::<SessionPreset>(), Ok(preset));
    }
}
