//! The declarative certificate layout.
//!
//! [`compose`] turns a record and a template into a flat list of positioned
//! elements on a fixed 1024×768 logical canvas. Both renderers (the drawing
//! surface in `render::surface` and the HTML tree in `render::html`) walk this
//! list; neither carries coordinates of its own.
//!
//! Text positions are the top edge of the text box. `Anchor::Center` means
//! the x coordinate is the horizontal center.

mod compose;
pub mod logo;

pub use compose::compose;
pub use logo::LoadedLogo;

pub const CANVAS_WIDTH: f32 = 1024.0;
pub const CANVAS_HEIGHT: f32 = 768.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rrggbb` or `#rgb`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().strip_prefix('#')?;
        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            _ => return None,
        };
        let channel = |i: usize| u8::from_str_radix(expanded.get(i..i + 2)?, 16).ok();
        Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFamily {
    Serif,
    Sans,
    Mono,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub family: FontFamily,
    pub bold: bool,
    pub italic: bool,
    pub color: Color,
    pub opacity: f32,
    pub anchor: Anchor,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: f32,
    /// Dash and gap length; solid when `None`.
    pub dash: Option<f32>,
}

#[derive(Debug, Clone)]
pub enum ElementKind {
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        radius: f32,
        fill: Option<Color>,
        stroke: Option<Stroke>,
        opacity: f32,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        stroke: Stroke,
    },
    Dot {
        cx: f32,
        cy: f32,
        radius: f32,
        color: Color,
        opacity: f32,
    },
    Text {
        x: f32,
        y: f32,
        text: String,
        style: TextStyle,
    },
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        opacity: f32,
        logo: LoadedLogo,
    },
    /// Square placeholder standing in for a QR code.
    QrPlaceholder {
        x: f32,
        y: f32,
        size: f32,
        color: Color,
        opacity: f32,
        payload: String,
    },
}

/// What a layout element shows; also used as the HTML `data-field` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Border,
    InnerBorder,
    Pattern,
    Grid,
    Logo,
    Title,
    TitleRule,
    Preamble,
    RecipientName,
    NameRule,
    CompletionText,
    CourseTitle,
    Instructors,
    CourseDetails,
    IssuedByLabel,
    InstitutionName,
    DateLabel,
    DateValue,
    DateRule,
    SignatureLabel,
    SignatureName,
    SignatureTitle,
    SignatureDate,
    SignatureRule,
    VerificationCode,
    CertificateId,
    CredentialId,
    QrCode,
    QrLabel,
    Footer,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Border => "border",
            Field::InnerBorder => "inner-border",
            Field::Pattern => "pattern",
            Field::Grid => "grid",
            Field::Logo => "logo",
            Field::Title => "title",
            Field::TitleRule => "title-rule",
            Field::Preamble => "preamble",
            Field::RecipientName => "recipient-name",
            Field::NameRule => "name-rule",
            Field::CompletionText => "completion-text",
            Field::CourseTitle => "course-title",
            Field::Instructors => "instructors",
            Field::CourseDetails => "course-details",
            Field::IssuedByLabel => "issued-by-label",
            Field::InstitutionName => "institution-name",
            Field::DateLabel => "date-label",
            Field::DateValue => "date-value",
            Field::DateRule => "date-rule",
            Field::SignatureLabel => "signature-label",
            Field::SignatureName => "signature-name",
            Field::SignatureTitle => "signature-title",
            Field::SignatureDate => "signature-date",
            Field::SignatureRule => "signature-rule",
            Field::VerificationCode => "verification-code",
            Field::CertificateId => "certificate-id",
            Field::CredentialId => "credential-id",
            Field::QrCode => "qr-code",
            Field::QrLabel => "qr-label",
            Field::Footer => "footer",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Element {
    pub field: Field,
    pub kind: ElementKind,
}

/// Interactivity of a rendered certificate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderMode {
    /// Text may be selected and edited in place.
    pub editable: bool,
    /// Draw the 20px alignment grid; only honored when `editable` is set.
    pub show_grid: bool,
}

impl RenderMode {
    pub fn display() -> Self {
        Self::default()
    }

    pub fn editor(show_grid: bool) -> Self {
        Self {
            editable: true,
            show_grid,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Layout {
    pub width: f32,
    pub height: f32,
    pub background: Color,
    pub mode: RenderMode,
    pub elements: Vec<Element>,
}

impl Layout {
    /// Every text element as `(field, text, x, y)`, in paint order.
    pub fn texts(&self) -> impl Iterator<Item = (Field, &str, f32, f32)> + '_ {
        self.elements.iter().filter_map(|e| match &e.kind {
            ElementKind::Text { x, y, text, .. } => Some((e.field, text.as_str(), *x, *y)),
            _ => None,
        })
    }

    pub fn find(&self, field: Field) -> Option<&Element> {
        self.elements.iter().find(|e| e.field == field)
    }

    pub fn text_of(&self, field: Field) -> Option<&str> {
        self.texts()
            .find(|(f, ..)| *f == field)
            .map(|(_, text, ..)| text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors() {
        assert_eq!(Color::from_hex("#2563eb"), Some(Color::rgb(0x25, 0x63, 0xeb)));
        assert_eq!(Color::from_hex("#ddd"), Some(Color::rgb(0xdd, 0xdd, 0xdd)));
        assert_eq!(Color::from_hex("2563eb"), None);
        assert_eq!(Color::from_hex("#zzzzzz"), None);
        assert_eq!(Color::rgb(0x1e, 0x40, 0xaf).to_hex(), "#1e40af");
    }
}
