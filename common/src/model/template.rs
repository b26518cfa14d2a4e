use serde::{Deserialize, Serialize};

/// A named visual theme applied to a certificate.
///
/// Templates are immutable catalog entries selected by `id`. Swapping the
/// template of a certificate only changes how it is rendered; the record's
/// semantic fields are never touched.
///
/// Colors are `#rrggbb` strings, exactly as they appear in CSS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    pub background_color: String,
    pub border_color: String,
    pub title_color: String,
    pub text_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent_color: Option<String>,
    /// Logo used when the record does not carry its own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    /// Any non-empty tag enables the tiled dot pattern.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_pattern: Option<String>,
    pub layout: LayoutKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    Classic,
    Modern,
    Elegant,
    Professional,
}

fn entry(
    id: &str,
    name: &str,
    colors: [&str; 5],
    background_pattern: &str,
    layout: LayoutKind,
) -> Template {
    let [background, border, title, text, accent] = colors;
    Template {
        id: id.to_string(),
        name: name.to_string(),
        background_color: background.to_string(),
        border_color: border.to_string(),
        title_color: title.to_string(),
        text_color: text.to_string(),
        accent_color: Some(accent.to_string()),
        logo_url: None,
        background_pattern: Some(background_pattern.to_string()),
        layout,
    }
}

/// The built-in template catalog. The first entry is the default.
pub fn catalog() -> Vec<Template> {
    vec![
        entry(
            "classic",
            "Classic Blue",
            ["#f8fafc", "#2563eb", "#1e40af", "#374151", "#3b82f6"],
            "geometric",
            LayoutKind::Classic,
        ),
        entry(
            "elegant",
            "Elegant Gold",
            ["#fefbf7", "#d97706", "#92400e", "#374151", "#f59e0b"],
            "ornate",
            LayoutKind::Elegant,
        ),
        entry(
            "modern",
            "Modern Green",
            ["#f0fdf4", "#16a34a", "#15803d", "#374151", "#22c55e"],
            "minimal",
            LayoutKind::Modern,
        ),
        entry(
            "professional",
            "Professional Purple",
            ["#faf7ff", "#7c3aed", "#6d28d9", "#374151", "#8b5cf6"],
            "corporate",
            LayoutKind::Professional,
        ),
    ]
}

/// Looks up a catalog template by id.
pub fn find(id: &str) -> Option<Template> {
    catalog().into_iter().find(|t| t.id == id)
}
