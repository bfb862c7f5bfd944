#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleKind {
    Filter,
    Adjustment,
}

/// Named instruction sent through the shared style operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StylePreset {
    pub kind: StyleKind,
    pub name: &'static str,
    pub instruction: &'static str,
}

const fn preset(kind: StyleKind, name: &'static str, instruction: &'static str) -> StylePreset {
    StylePreset {
        kind,
        name,
        instruction,
    }
}

pub const FILTER_PRESETS: &[StylePreset] = &[
    preset(
        StyleKind::Filter,
        "Synthwave",
        "Apply a vibrant 80s synthwave aesthetic with neon magenta and cyan glows and subtle scan lines.",
    ),
    preset(
        StyleKind::Filter,
        "Anime",
        "Give the image a vibrant Japanese anime style with bold outlines, cel-shading and saturated colors.",
    ),
    preset(
        StyleKind::Filter,
        "Lomo",
        "Apply a Lomography-style cross-processing effect with high contrast, oversaturated colors and dark vignetting.",
    ),
    preset(
        StyleKind::Filter,
        "Glitch",
        "Transform the image into a futuristic holographic projection with digital glitch effects and chromatic aberration.",
    ),
];

pub const ADJUSTMENT_PRESETS: &[StylePreset] = &[
    preset(
        StyleKind::Adjustment,
        "Blur Background",
        "Apply a realistic depth-of-field effect, making the background blurry while keeping the main subject in sharp focus.",
    ),
    preset(
        StyleKind::Adjustment,
        "Enhance Details",
        "Slightly enhance the sharpness and details of the image without making it look unnatural.",
    ),
    preset(
        StyleKind::Adjustment,
        "Warmer Lighting",
        "Adjust the color temperature to give the image warmer, golden-hour style lighting.",
    ),
    preset(
        StyleKind::Adjustment,
        "Studio Light",
        "Add dramatic, professional studio lighting to the main subject.",
    ),
];

pub fn presets(kind: StyleKind) -> &'static [StylePreset] {
    match kind {
        StyleKind::Filter => FILTER_PRESETS,
        StyleKind::Adjustment => ADJUSTMENT_PRESETS,
    }
}

pub fn find_preset(kind: StyleKind, name: &str) -> Option<&'static StylePreset> {
    presets(kind)
        .iter()
        .find(|preset| preset.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_grouped_by_kind() {
        assert!(FILTER_PRESETS.iter().all(|p| p.kind == StyleKind::Filter));
        assert!(ADJUSTMENT_PRESETS
            .iter()
            .all(|p| p.kind == StyleKind::Adjustment));
        assert!(presets(StyleKind::Filter)
            .iter()
            .chain(presets(StyleKind::Adjustment))
            .all(|p| !p.instruction.trim().is_empty()));
    }

    #[test]
    fn find_preset_ignores_case() {
        let preset = find_preset(StyleKind::Adjustment, "studio light").unwrap();
        assert_eq!(preset.name, "Studio Light");
        assert!(find_preset(StyleKind::Filter, "Studio Light").is_none());
    }
}
