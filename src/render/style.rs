use eframe::egui::Color32;

use crate::model::{EdgeKind, NodeKind};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeStyle {
    pub fill: Color32,
    pub outline: Color32,
    pub glyph: &'static str,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dash {
    pub length: f32,
    pub gap: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkStyle {
    pub color: Color32,
    pub dash: Option<Dash>,
    pub arrow: bool,
}

pub const BACKGROUND: Color32 = Color32::from_rgb(19, 23, 29);
pub const GRID_LINE: Color32 = Color32::from_rgba_premultiplied(60, 70, 80, 70);
pub const LABEL: Color32 = Color32::from_rgb(220, 226, 232);
pub const SELECTION: Color32 = Color32::from_rgb(255, 214, 102);
pub const GROUP_FILL: Color32 = Color32::from_rgba_premultiplied(40, 52, 66, 90);
pub const GROUP_STROKE: Color32 = Color32::from_rgb(86, 104, 124);
pub const GROUP_HEADER: Color32 = Color32::from_rgba_premultiplied(58, 74, 94, 160);

pub fn node_style(kind: NodeKind) -> NodeStyle {
    match kind {
        NodeKind::Component => NodeStyle {
            fill: Color32::from_rgb(97, 175, 239),
            outline: Color32::from_rgb(160, 210, 250),
            glyph: "C",
        },
        NodeKind::Class => NodeStyle {
            fill: Color32::from_rgb(198, 120, 221),
            outline: Color32::from_rgb(228, 180, 240),
            glyph: "K",
        },
        NodeKind::Function => NodeStyle {
            fill: Color32::from_rgb(152, 195, 121),
            outline: Color32::from_rgb(200, 228, 180),
            glyph: "F",
        },
        NodeKind::Method => NodeStyle {
            fill: Color32::from_rgb(229, 192, 123),
            outline: Color32::from_rgb(244, 222, 180),
            glyph: "M",
        },
        NodeKind::Unknown => NodeStyle {
            fill: Color32::from_rgb(130, 137, 151),
            outline: Color32::from_rgb(180, 186, 196),
            glyph: "?",
        },
    }
}

pub fn link_style(kind: EdgeKind) -> LinkStyle {
    let dashed = |length, gap| Some(Dash { length, gap });
    match kind {
        EdgeKind::Uses => LinkStyle {
            color: Color32::from_rgb(120, 140, 160),
            dash: None,
            arrow: true,
        },
        EdgeKind::Calls => LinkStyle {
            color: Color32::from_rgb(152, 195, 121),
            dash: None,
            arrow: true,
        },
        EdgeKind::Instantiates => LinkStyle {
            color: Color32::from_rgb(97, 175, 239),
            dash: dashed(6.0, 4.0),
            arrow: true,
        },
        EdgeKind::Contains => LinkStyle {
            color: Color32::from_rgb(92, 99, 112),
            dash: None,
            arrow: false,
        },
        EdgeKind::Imports => LinkStyle {
            color: Color32::from_rgb(86, 182, 194),
            dash: dashed(3.0, 3.0),
            arrow: true,
        },
        EdgeKind::Exports => LinkStyle {
            color: Color32::from_rgb(229, 192, 123),
            dash: dashed(3.0, 3.0),
            arrow: true,
        },
        EdgeKind::Inherits => LinkStyle {
            color: Color32::from_rgb(198, 120, 221),
            dash: dashed(8.0, 3.0),
            arrow: true,
        },
        EdgeKind::Unknown => LinkStyle {
            color: Color32::from_rgb(110, 116, 128),
            dash: dashed(2.0, 4.0),
            arrow: false,
        },
    }
}

pub fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}
