//! Drawing-surface object model.
//!
//! A `Surface` is the retained scene the rasterizer paints: the layout's
//! elements plus per-object interactivity flags. In display mode nothing is
//! selectable or evented.

use crate::layout::{Color, ElementKind, Field, Layout};

#[derive(Debug, Clone)]
pub struct SurfaceObject {
    pub field: Field,
    pub kind: ElementKind,
    pub selectable: bool,
    pub evented: bool,
}

#[derive(Debug, Clone)]
pub struct Surface {
    pub width: f32,
    pub height: f32,
    pub background: Color,
    /// Rubber-band selection across objects.
    pub selection: bool,
    pub objects: Vec<SurfaceObject>,
}

impl Surface {
    pub fn texts(&self) -> impl Iterator<Item = (Field, &str, f32, f32)> + '_ {
        self.objects.iter().filter_map(|o| match &o.kind {
            ElementKind::Text { x, y, text, .. } => Some((o.field, text.as_str(), *x, *y)),
            _ => None,
        })
    }
}

pub fn draw(layout: &Layout) -> Surface {
    let editable = layout.mode.editable;
    let objects = layout
        .elements
        .iter()
        .map(|element| {
            let interactive = editable && matches!(element.kind, ElementKind::Text { .. });
            SurfaceObject {
                field: element.field,
                kind: element.kind.clone(),
                selectable: interactive,
                evented: interactive,
            }
        })
        .collect();

    Surface {
        width: layout.width,
        height: layout.height,
        background: layout.background,
        selection: editable,
        objects,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{compose, RenderMode};
    use crate::record::tests::sample_record;
    use common::model::template;

    #[test]
    fn display_mode_is_inert() {
        let layout = compose(
            &sample_record(),
            &template::find("modern").unwrap(),
            RenderMode::display(),
            None,
        );
        let surface = draw(&layout);
        assert!(!surface.selection);
        assert!(surface.objects.iter().all(|o| !o.selectable && !o.evented));
        assert_eq!(surface.objects.len(), layout.elements.len());
    }

    #[test]
    fn editor_mode_enables_text_only() {
        let layout = compose(
            &sample_record(),
            &template::find("modern").unwrap(),
            RenderMode::editor(true),
            None,
        );
        let surface = draw(&layout);
        assert!(surface.selection);
        for object in &surface.objects {
            let is_text = matches!(object.kind, ElementKind::Text { .. });
            assert_eq!(object.selectable, is_text, "{:?}", object.field);
        }
    }
}
