use super::{
    Anchor, Color, Element, ElementKind, Field, FontFamily, Layout, LoadedLogo, RenderMode,
    Stroke, TextStyle, CANVAS_HEIGHT, CANVAS_WIDTH,
};
use crate::dates::display_date;
use crate::security::{qr_payload, verification_code};
use common::model::certificate::CertificateRecord;
use common::model::template::Template;

const CENTER_X: f32 = CANVAS_WIDTH / 2.0;
const DATE_X: f32 = 150.0;
const SIGNATURE_X: f32 = CANVAS_WIDTH - 300.0;
const SECURITY_X: f32 = 60.0;
const QR_SIZE: f32 = 60.0;
const QR_X: f32 = CANVAS_WIDTH - 120.0;
const PATTERN_STEP: usize = 50;
const GRID_STEP: usize = 20;
const DEFAULT_TITLE: &str = "CERTIFICATE OF COMPLETION";

struct Palette {
    background: Color,
    border: Color,
    title: Color,
    text: Color,
}

impl Palette {
    fn of(template: &Template) -> Self {
        let pick = |hex: &str, fallback: Color| Color::from_hex(hex).unwrap_or(fallback);
        Self {
            background: pick(&template.background_color, Color::WHITE),
            border: pick(&template.border_color, Color::BLACK),
            title: pick(&template.title_color, Color::BLACK),
            text: pick(&template.text_color, Color::BLACK),
        }
    }
}

fn style(size: f32, family: FontFamily, color: Color) -> TextStyle {
    TextStyle {
        size,
        family,
        bold: false,
        italic: false,
        color,
        opacity: 1.0,
        anchor: Anchor::Start,
    }
}

impl TextStyle {
    fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    fn centered(mut self) -> Self {
        self.anchor = Anchor::Center;
        self
    }

    fn faded(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }
}

struct Builder {
    elements: Vec<Element>,
}

impl Builder {
    fn push(&mut self, field: Field, kind: ElementKind) {
        self.elements.push(Element { field, kind });
    }

    /// Blank strings produce no element.
    fn text(&mut self, field: Field, x: f32, y: f32, text: impl Into<String>, style: TextStyle) {
        let text = text.into();
        if text.trim().is_empty() {
            return;
        }
        self.push(field, ElementKind::Text { x, y, text, style });
    }

    fn rule(&mut self, field: Field, x1: f32, x2: f32, y: f32, color: Color, width: f32) {
        self.push(
            field,
            ElementKind::Line {
                x1,
                y1: y,
                x2,
                y2: y,
                stroke: Stroke {
                    color,
                    width,
                    dash: None,
                },
            },
        );
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// `Duration: d | Level: l | Grade: g`, leaving out blank duration and grade.
fn details_line(record: &CertificateRecord) -> String {
    let course = &record.course;
    let mut parts = Vec::new();
    if let Some(duration) = non_blank(&course.duration) {
        parts.push(format!("Duration: {duration}"));
    }
    parts.push(format!("Level: {}", course.level.as_str()));
    if let Some(grade) = course.grade.as_deref().and_then(non_blank) {
        parts.push(format!("Grade: {grade}"));
    }
    parts.join(" | ")
}

/// Builds the positioned elements of one certificate.
///
/// `logo` is the already loaded institution logo; `None` draws the "LOGO"
/// placeholder. Loading is left to the caller so composing stays pure.
pub fn compose(
    record: &CertificateRecord,
    template: &Template,
    mode: RenderMode,
    logo: Option<&LoadedLogo>,
) -> Layout {
    let palette = Palette::of(template);
    let mut b = Builder {
        elements: Vec::new(),
    };

    b.push(
        Field::Border,
        ElementKind::Rect {
            x: 20.0,
            y: 20.0,
            width: CANVAS_WIDTH - 40.0,
            height: CANVAS_HEIGHT - 40.0,
            radius: 10.0,
            fill: None,
            stroke: Some(Stroke {
                color: palette.border,
                width: 4.0,
                dash: None,
            }),
            opacity: 1.0,
        },
    );
    b.push(
        Field::InnerBorder,
        ElementKind::Rect {
            x: 40.0,
            y: 40.0,
            width: CANVAS_WIDTH - 80.0,
            height: CANVAS_HEIGHT - 80.0,
            radius: 5.0,
            fill: None,
            stroke: Some(Stroke {
                color: palette.border,
                width: 1.0,
                dash: Some(5.0),
            }),
            opacity: 1.0,
        },
    );

    if mode.editable && mode.show_grid {
        let grid = Stroke {
            color: Color::rgb(0xdd, 0xdd, 0xdd),
            width: 0.5,
            dash: None,
        };
        for x in (0..=CANVAS_WIDTH as usize).step_by(GRID_STEP) {
            let x = x as f32;
            b.push(
                Field::Grid,
                ElementKind::Line {
                    x1: x,
                    y1: 0.0,
                    x2: x,
                    y2: CANVAS_HEIGHT,
                    stroke: grid,
                },
            );
        }
        for y in (0..=CANVAS_HEIGHT as usize).step_by(GRID_STEP) {
            let y = y as f32;
            b.push(
                Field::Grid,
                ElementKind::Line {
                    x1: 0.0,
                    y1: y,
                    x2: CANVAS_WIDTH,
                    y2: y,
                    stroke: grid,
                },
            );
        }
    }

    match logo {
        Some(logo) => {
            let (width, height) = logo.fitted_size();
            b.push(
                Field::Logo,
                ElementKind::Image {
                    x: CENTER_X - width / 2.0,
                    y: 50.0,
                    width,
                    height,
                    opacity: 0.9,
                    logo: logo.clone(),
                },
            );
        }
        None => b.text(
            Field::Logo,
            CENTER_X,
            70.0,
            "LOGO",
            style(16.0, FontFamily::Sans, palette.text).centered().faded(0.5),
        ),
    }

    if template
        .background_pattern
        .as_deref()
        .is_some_and(|p| !p.trim().is_empty())
    {
        for x in (0..CANVAS_WIDTH as usize).step_by(PATTERN_STEP) {
            for y in (0..CANVAS_HEIGHT as usize).step_by(PATTERN_STEP) {
                b.push(
                    Field::Pattern,
                    ElementKind::Dot {
                        cx: x as f32 + 2.0,
                        cy: y as f32 + 2.0,
                        radius: 2.0,
                        color: palette.border,
                        opacity: 0.1,
                    },
                );
            }
        }
    }

    let title = non_blank(&record.certificate_title)
        .map(str::to_uppercase)
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());
    b.text(
        Field::Title,
        CENTER_X,
        140.0,
        title,
        style(42.0, FontFamily::Serif, palette.title).bold().centered(),
    );
    b.push(
        Field::TitleRule,
        ElementKind::Rect {
            x: CENTER_X - 150.0,
            y: 195.0,
            width: 300.0,
            height: 3.0,
            radius: 0.0,
            fill: Some(palette.title),
            stroke: None,
            opacity: 1.0,
        },
    );

    b.text(
        Field::Preamble,
        CENTER_X,
        220.0,
        "This is to certify that",
        style(20.0, FontFamily::Sans, palette.text).centered(),
    );
    b.text(
        Field::RecipientName,
        CENTER_X,
        270.0,
        record.student.name.to_uppercase(),
        style(36.0, FontFamily::Serif, palette.title).bold().centered(),
    );
    b.rule(Field::NameRule, CENTER_X - 200.0, CENTER_X + 200.0, 320.0, palette.text, 1.0);

    b.text(
        Field::CompletionText,
        CENTER_X,
        350.0,
        "has successfully completed the course",
        style(18.0, FontFamily::Sans, palette.text).centered(),
    );
    b.text(
        Field::CourseTitle,
        CENTER_X,
        385.0,
        record.course.title.clone(),
        style(24.0, FontFamily::Serif, palette.title).bold().centered(),
    );

    let instructors: Vec<&str> = record
        .course
        .instructors
        .iter()
        .filter_map(|i| non_blank(&i.name))
        .collect();
    if !instructors.is_empty() {
        b.text(
            Field::Instructors,
            CENTER_X,
            425.0,
            format!("Instructed by: {}", instructors.join(", ")),
            style(16.0, FontFamily::Sans, palette.text).centered(),
        );
    }
    b.text(
        Field::CourseDetails,
        CENTER_X,
        450.0,
        details_line(record),
        style(14.0, FontFamily::Sans, palette.text).centered(),
    );

    if let Some(institution) = non_blank(&record.institution.name) {
        b.text(
            Field::IssuedByLabel,
            CENTER_X,
            500.0,
            "Issued by:",
            style(14.0, FontFamily::Sans, palette.text).centered(),
        );
        b.text(
            Field::InstitutionName,
            CENTER_X,
            520.0,
            institution,
            style(18.0, FontFamily::Serif, palette.title).bold().centered(),
        );
    }

    let language = record.language;
    let completion = non_blank(&record.course.completion_date).unwrap_or(&record.issue_date);
    b.text(
        Field::DateLabel,
        DATE_X,
        550.0,
        "Date of Completion:",
        style(14.0, FontFamily::Sans, palette.text),
    );
    b.text(
        Field::DateValue,
        DATE_X,
        575.0,
        display_date(completion, language),
        style(16.0, FontFamily::Sans, palette.title).bold(),
    );
    b.rule(Field::DateRule, DATE_X, DATE_X + 150.0, 595.0, palette.text, 1.0);

    if let Some(signer) = non_blank(&record.signature.name) {
        b.text(
            Field::SignatureLabel,
            SIGNATURE_X,
            550.0,
            "Authorized Signature:",
            style(14.0, FontFamily::Sans, palette.text),
        );
        b.text(
            Field::SignatureName,
            SIGNATURE_X,
            575.0,
            signer,
            style(16.0, FontFamily::Sans, palette.title).bold(),
        );
        b.text(
            Field::SignatureTitle,
            SIGNATURE_X,
            600.0,
            record.signature.title.clone(),
            style(12.0, FontFamily::Sans, palette.text),
        );
        if let Some(date) = record.signature.date.as_deref().and_then(non_blank) {
            b.text(
                Field::SignatureDate,
                SIGNATURE_X,
                618.0,
                display_date(date, language),
                style(10.0, FontFamily::Sans, palette.text),
            );
        }
        b.rule(
            Field::SignatureRule,
            SIGNATURE_X,
            SIGNATURE_X + 150.0,
            595.0,
            palette.text,
            1.0,
        );
    }

    let security = style(10.0, FontFamily::Mono, palette.text).faded(0.7);
    b.text(
        Field::VerificationCode,
        SECURITY_X,
        650.0,
        format!("Verification: {}", verification_code(record)),
        security,
    );
    b.text(
        Field::CertificateId,
        SECURITY_X,
        670.0,
        format!("Certificate ID: {}", record.id),
        security,
    );
    b.text(
        Field::CredentialId,
        SECURITY_X,
        690.0,
        format!("Credential ID: {}", record.credential_id),
        security,
    );

    b.push(
        Field::QrCode,
        ElementKind::QrPlaceholder {
            x: QR_X,
            y: 650.0,
            size: QR_SIZE,
            color: palette.text,
            opacity: 0.1,
            payload: qr_payload(record),
        },
    );
    b.text(
        Field::QrLabel,
        QR_X + QR_SIZE / 2.0,
        675.0,
        "QR Code",
        style(8.0, FontFamily::Sans, palette.text).centered(),
    );

    b.text(
        Field::Footer,
        CENTER_X,
        CANVAS_HEIGHT - 40.0,
        format!(
            "Issued on {} | Verify at: {}",
            display_date(&record.issue_date, language),
            record.verification_url
        ),
        style(10.0, FontFamily::Sans, palette.text).centered().faded(0.8),
    );

    Layout {
        width: CANVAS_WIDTH,
        height: CANVAS_HEIGHT,
        background: palette.background,
        mode,
        elements: b.elements,
    }
}
