//! Plain HTML rendering of a layout: one absolutely positioned element per
//! layout element, styled inline, inside a fixed-size container.

use crate::layout::{Anchor, Color, ElementKind, FontFamily, Layout, LoadedLogo};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::ImageFormat;
use log::warn;
use std::fmt::Write;
use std::io::Cursor;

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn font_stack(family: FontFamily) -> &'static str {
    match family {
        FontFamily::Serif => "Georgia, serif",
        FontFamily::Sans => "Arial, sans-serif",
        FontFamily::Mono => "'Courier New', monospace",
    }
}

fn rgba(color: Color, opacity: f32) -> String {
    if opacity >= 1.0 {
        color.to_hex()
    } else {
        format!("rgba({}, {}, {}, {})", color.r, color.g, color.b, opacity)
    }
}

fn logo_src(logo: &LoadedLogo) -> Option<String> {
    let mut bytes = Vec::new();
    match logo
        .pixels
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
    {
        Ok(()) => Some(format!("data:image/png;base64,{}", BASE64.encode(bytes))),
        Err(e) => {
            warn!("Could not encode logo {} for HTML: {}", logo.source, e);
            None
        }
    }
}

/// Renders the layout as a self-contained HTML fragment.
pub fn render_html(layout: &Layout) -> String {
    let editable = layout.mode.editable;
    let interaction = if editable {
        "user-select:text;"
    } else {
        "pointer-events:none;user-select:none;"
    };

    let mut html = String::new();
    let _ = write!(
        html,
        "<div class=\"certificate\" style=\"position:relative;width:{}px;height:{}px;background:{};overflow:hidden;\">",
        layout.width,
        layout.height,
        layout.background.to_hex()
    );

    for element in &layout.elements {
        let field = element.field.as_str();
        match &element.kind {
            ElementKind::Rect {
                x,
                y,
                width,
                height,
                radius,
                fill,
                stroke,
                opacity,
            } => {
                let mut style = format!(
                    "position:absolute;left:{x}px;top:{y}px;width:{width}px;height:{height}px;box-sizing:border-box;border-radius:{radius}px;opacity:{opacity};"
                );
                if let Some(fill) = fill {
                    let _ = write!(style, "background:{};", fill.to_hex());
                }
                if let Some(stroke) = stroke {
                    let kind = if stroke.dash.is_some() { "dashed" } else { "solid" };
                    let _ = write!(
                        style,
                        "border:{}px {} {};",
                        stroke.width,
                        kind,
                        stroke.color.to_hex()
                    );
                }
                let _ = write!(html, "<div data-field=\"{field}\" style=\"{style}\"></div>");
            }
            ElementKind::Line {
                x1,
                y1,
                x2,
                y2,
                stroke,
            } => {
                let (left, top) = (x1.min(*x2), y1.min(*y2));
                let (w, h) = if (y1 - y2).abs() < f32::EPSILON {
                    ((x2 - x1).abs(), stroke.width)
                } else {
                    (stroke.width, (y2 - y1).abs())
                };
                let _ = write!(
                    html,
                    "<div data-field=\"{field}\" style=\"position:absolute;left:{left}px;top:{top}px;width:{w}px;height:{h}px;background:{};\"></div>",
                    stroke.color.to_hex()
                );
            }
            ElementKind::Dot {
                cx,
                cy,
                radius,
                color,
                opacity,
            } => {
                let _ = write!(
                    html,
                    "<div data-field=\"{field}\" style=\"position:absolute;left:{}px;top:{}px;width:{d}px;height:{d}px;border-radius:50%;background:{};\"></div>",
                    cx - radius,
                    cy - radius,
                    rgba(*color, *opacity),
                    d = radius * 2.0
                );
            }
            ElementKind::Text { x, y, text, style } => {
                let transform = match style.anchor {
                    Anchor::Center => "transform:translateX(-50%);text-align:center;",
                    Anchor::Start => "",
                };
                let _ = write!(
                    html,
                    "<div data-field=\"{field}\"{} style=\"position:absolute;left:{x}px;top:{y}px;white-space:nowrap;font-family:{};font-size:{}px;font-weight:{};font-style:{};color:{};opacity:{};{transform}{interaction}\">{}</div>",
                    if editable { " contenteditable=\"true\"" } else { "" },
                    font_stack(style.family),
                    style.size,
                    if style.bold { "bold" } else { "normal" },
                    if style.italic { "italic" } else { "normal" },
                    style.color.to_hex(),
                    style.opacity,
                    escape(text)
                );
            }
            ElementKind::Image {
                x,
                y,
                width,
                height,
                opacity,
                logo,
            } => {
                let Some(src) = logo_src(logo) else {
                    continue;
                };
                let _ = write!(
                    html,
                    "<img data-field=\"{field}\" alt=\"Institution logo\" src=\"{src}\" style=\"position:absolute;left:{x}px;top:{y}px;width:{width}px;height:{height}px;opacity:{opacity};pointer-events:none;\">"
                );
            }
            ElementKind::QrPlaceholder {
                x,
                y,
                size,
                color,
                opacity,
                payload,
            } => {
                let _ = write!(
                    html,
                    "<div data-field=\"{field}\" data-qr-payload=\"{}\" style=\"position:absolute;left:{x}px;top:{y}px;width:{size}px;height:{size}px;background:{};\"></div>",
                    escape(payload),
                    rgba(*color, *opacity)
                );
            }
        }
    }

    html.push_str("</div>");
    html
}
