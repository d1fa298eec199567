use serde::{Deserialize, Serialize};

/// Shared across every theme: failure is always rendered the same way.
const FAILED_COLOR: &str = "#E5484D";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeKind {
    #[default]
    Mountain,
    Ocean,
    Forest,
    Space,
    Desert,
    Castle,
}

impl ThemeKind {
    pub const ALL: [ThemeKind; 6] = [
        ThemeKind::Mountain,
        ThemeKind::Ocean,
        ThemeKind::Forest,
        ThemeKind::Space,
        ThemeKind::Desert,
        ThemeKind::Castle,
    ];

    /// Resolves an external theme key. Unknown, empty or missing keys fall
    /// back to [`ThemeKind::Mountain`].
    pub fn from_key(key: Option<&str>) -> Self {
        let Some(key) = key else {
            return Self::default();
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "ocean" => Self::Ocean,
            "forest" => Self::Forest,
            "space" => Self::Space,
            "desert" => Self::Desert,
            "castle" => Self::Castle,
            _ => Self::Mountain,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Mountain => "mountain",
            Self::Ocean => "ocean",
            Self::Forest => "forest",
            Self::Space => "space",
            Self::Desert => "desert",
            Self::Castle => "castle",
        }
    }

    pub fn theme(self) -> Theme {
        match self {
            Self::Mountain => Theme::mountain(),
            Self::Ocean => Theme::ocean(),
            Self::Forest => Theme::forest(),
            Self::Space => Theme::space(),
            Self::Desert => Theme::desert(),
            Self::Castle => Theme::castle(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusPalette {
    pub active: String,
    pub completed: String,
    pub locked: String,
    pub failed: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub kind: ThemeKind,
    pub name: String,
    pub icon: String,
    pub particles: Vec<String>,
    pub palette: StatusPalette,
    pub background_top: String,
    pub background_bottom: String,
    pub card_background: String,
    pub text_color: String,
    pub muted_text_color: String,
    pub font_family: String,
    pub font_size: f32,
}

impl Theme {
    #[allow(clippy::too_many_arguments)]
    fn build(
        kind: ThemeKind,
        name: &str,
        icon: &str,
        particles: &[&str],
        (active, completed, locked): (&str, &str, &str),
        (background_top, background_bottom): (&str, &str),
        card_background: &str,
        (text_color, muted_text_color): (&str, &str),
    ) -> Self {
        Self {
            kind,
            name: name.to_string(),
            icon: icon.to_string(),
            particles: particles.iter().map(|glyph| glyph.to_string()).collect(),
            palette: StatusPalette {
                active: active.to_string(),
                completed: completed.to_string(),
                locked: locked.to_string(),
                failed: FAILED_COLOR.to_string(),
            },
            background_top: background_top.to_string(),
            background_bottom: background_bottom.to_string(),
            card_background: card_background.to_string(),
            text_color: text_color.to_string(),
            muted_text_color: muted_text_color.to_string(),
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 14.0,
        }
    }

    pub fn mountain() -> Self {
        Self::build(
            ThemeKind::Mountain,
            "Mountain Summit",
            "\u{26F0}\u{FE0F}",
            &["\u{2744}", "\u{2601}", "\u{1F985}"],
            ("#3B82F6", "#10B981", "#94A3B8"),
            ("#E0F2FE", "#F8FAFC"),
            "#FFFFFF",
            ("#0F172A", "#64748B"),
        )
    }

    pub fn ocean() -> Self {
        Self::build(
            ThemeKind::Ocean,
            "Ocean Voyage",
            "\u{1F30A}",
            &["\u{1FAE7}", "\u{1F41A}", "\u{1F420}"],
            ("#0EA5E9", "#14B8A6", "#7DD3FC"),
            ("#CFFAFE", "#ECFEFF"),
            "#F0FDFF",
            ("#083344", "#477A8A"),
        )
    }

    pub fn forest() -> Self {
        Self::build(
            ThemeKind::Forest,
            "Enchanted Forest",
            "\u{1F332}",
            &["\u{1F343}", "\u{1F33F}", "\u{1F98B}"],
            ("#65A30D", "#15803D", "#A8A29E"),
            ("#DCFCE7", "#F7FEE7"),
            "#FEFFFA",
            ("#14532D", "#57734F"),
        )
    }

    pub fn space() -> Self {
        Self::build(
            ThemeKind::Space,
            "Space Odyssey",
            "\u{1F680}",
            &["\u{2726}", "\u{2B50}", "\u{1FA90}"],
            ("#8B5CF6", "#22D3EE", "#475569"),
            ("#0B1026", "#1E1B4B"),
            "#1E293B",
            ("#F1F5F9", "#A5B4FC"),
        )
    }

    pub fn desert() -> Self {
        Self::build(
            ThemeKind::Desert,
            "Desert Caravan",
            "\u{1F3DC}\u{FE0F}",
            &["\u{2600}", "\u{1F335}", "\u{1F4A8}"],
            ("#F59E0B", "#D97706", "#D6C6A8"),
            ("#FEF3C7", "#FFFBEB"),
            "#FFFDF7",
            ("#451A03", "#92704A"),
        )
    }

    pub fn castle() -> Self {
        Self::build(
            ThemeKind::Castle,
            "Castle Siege",
            "\u{1F3F0}",
            &["\u{2694}", "\u{1F6E1}", "\u{2728}"],
            ("#DC2626", "#CA8A04", "#A1A1AA"),
            ("#F4F4F5", "#FAFAF9"),
            "#FFFFFF",
            ("#27272A", "#71717A"),
        )
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::mountain()
    }
}
