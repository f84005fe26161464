//! Fixed A4 work-order template.
//!
//! Coordinates are PDF points measured from the top-left corner, `y` being the
//! text baseline. The PDF writer flips them.

use super::metrics::{text_width, wrap};
use crate::config::BusinessProfile;
use crate::models::OrderDraft;

pub const PAGE_WIDTH: f32 = 595.0;
pub const PAGE_HEIGHT: f32 = 842.0;
pub const MARGIN: f32 = 40.0;
pub const USABLE_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

/// Printed instead of an empty value.
pub const PLACEHOLDER: &str = "—";

const TITLE_SIZE: f32 = 14.0;
const BODY_SIZE: f32 = 11.0;
const FOOTER_SIZE: f32 = 9.0;
const LINE_HEIGHT: f32 = BODY_SIZE * 1.15;
const ROW_HEIGHT: f32 = 16.0;
const VALUE_COLUMN: f32 = 120.0;
const BUDGET_COLUMN: f32 = 160.0;
const SECTION_GAP: f32 = 14.0;

const FOOTER_RULE_Y: f32 = 780.0;
const FOOTER_TEXT_Y: f32 = 795.0;
/// Lowest baseline (or image bottom) allowed above the footer.
const CONTENT_BOTTOM: f32 = 770.0;
/// First baseline on continuation pages.
const CONTINUATION_TOP: f32 = MARGIN + 20.0;

const LOGO_BOX: (f32, f32) = (160.0, 56.0);
const PHOTO_BOX: (f32, f32) = (200.0, 150.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Text {
        x: f32,
        y: f32,
        font: Font,
        size: f32,
        text: String,
    },
    Rule {
        x1: f32,
        x2: f32,
        y: f32,
    },
    /// `index` points into the image list handed to the PDF writer.
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        index: usize,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub pages: Vec<Page>,
}

impl Layout {
    /// Every text run, page by page, in placement order.
    #[cfg(test)]
    pub fn texts(&self) -> Vec<&str> {
        self.pages
            .iter()
            .flat_map(|page| page.items.iter())
            .filter_map(|item| match item {
                Item::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn image_count(&self) -> usize {
        self.pages
            .iter()
            .flat_map(|page| page.items.iter())
            .filter(|item| matches!(item, Item::Image { .. }))
            .count()
    }
}

pub fn or_placeholder(value: &str) -> &str {
    if value.trim().is_empty() {
        PLACEHOLDER
    } else {
        value
    }
}

/// Vertical cursor over a growing list of pages.
struct Cursor {
    pages: Vec<Page>,
    y: f32,
}

impl Cursor {
    fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            y: MARGIN,
        }
    }

    fn page(&mut self) -> &mut Page {
        if self.pages.is_empty() {
            self.pages.push(Page::default());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// Open a new page unless `height` more points fit below the cursor.
    fn ensure(&mut self, height: f32) {
        if self.y + height > CONTENT_BOTTOM {
            self.pages.push(Page::default());
            self.y = CONTINUATION_TOP;
        }
    }

    fn put(&mut self, x: f32, y: f32, font: Font, size: f32, text: impl Into<String>) {
        self.page().items.push(Item::Text {
            x,
            y,
            font,
            size,
            text: text.into(),
        });
    }

    fn image(&mut self, x: f32, y: f32, (width, height): (f32, f32), index: usize) {
        self.page().items.push(Item::Image {
            x,
            y,
            width,
            height,
            index,
        });
    }

    /// Bold label with its value in the value column; long values wrap.
    fn row(&mut self, label: &str, value: &str) {
        let lines = wrap(
            or_placeholder(value),
            Font::Regular,
            BODY_SIZE,
            USABLE_WIDTH - VALUE_COLUMN,
        );
        self.ensure(0.0);
        self.put(MARGIN, self.y, Font::Bold, BODY_SIZE, label);
        for (i, line) in lines.into_iter().enumerate() {
            if i > 0 {
                self.ensure(0.0);
            }
            self.put(MARGIN + VALUE_COLUMN, self.y, Font::Regular, BODY_SIZE, line);
            self.y += ROW_HEIGHT;
        }
    }

    /// Bold heading followed by a paragraph wrapped to the usable width.
    fn section(&mut self, title: &str, body: &str) {
        self.ensure(SECTION_GAP);
        self.put(MARGIN, self.y, Font::Bold, BODY_SIZE, title);
        self.y += SECTION_GAP;

        for line in wrap(or_placeholder(body), Font::Regular, BODY_SIZE, USABLE_WIDTH) {
            self.ensure(0.0);
            self.put(MARGIN, self.y, Font::Regular, BODY_SIZE, line);
            self.y += LINE_HEIGHT;
        }
        self.y += SECTION_GAP;
    }

    fn finish(mut self, footer: &str) -> Layout {
        let footer_width = text_width(footer, Font::Regular, FOOTER_SIZE);
        let footer_x = ((PAGE_WIDTH - footer_width) / 2.0).max(MARGIN);
        for page in &mut self.pages {
            page.items.push(Item::Rule {
                x1: MARGIN,
                x2: MARGIN + USABLE_WIDTH,
                y: FOOTER_RULE_Y,
            });
            page.items.push(Item::Text {
                x: footer_x,
                y: FOOTER_TEXT_Y,
                font: Font::Regular,
                size: FOOTER_SIZE,
                text: footer.to_string(),
            });
        }
        Layout { pages: self.pages }
    }
}

/// Lay out one work order. `logo` and `photo` are image-list indices of images
/// that decoded successfully.
pub fn build(
    draft: &OrderDraft,
    business: &BusinessProfile,
    logo: Option<usize>,
    photo: Option<usize>,
) -> Layout {
    let fields = &draft.fields;
    let mut cursor = Cursor::new();

    cursor.put(
        MARGIN,
        MARGIN + 20.0,
        Font::Bold,
        TITLE_SIZE,
        format!("ORDEN DE TRABAJO – N° {}", draft.order_number),
    );
    cursor.put(
        MARGIN,
        MARGIN + 40.0,
        Font::Regular,
        BODY_SIZE,
        format!("Fecha: {}   |   Hora: {}", draft.date, draft.time),
    );
    if let Some(index) = logo {
        cursor.image(MARGIN + USABLE_WIDTH - 200.0, MARGIN, LOGO_BOX, index);
    }

    cursor.y = MARGIN + 90.0;
    cursor.row("Cliente:", &fields.client.name);
    cursor.row("DNI:", &fields.client.national_id);
    cursor.row("Teléfono:", &fields.client.phone);
    cursor.row("Email:", &fields.client.email);
    cursor.row("Sucursal:", &fields.branch);
    cursor.row("Tipo de equipo:", fields.device.device_type.as_str());
    cursor.row("Marca:", &fields.device.brand);
    cursor.row("Modelo:", &fields.device.model);
    cursor.row("N° Serie / IMEI:", &fields.device.serial);
    cursor.row("Clave / PIN:", &fields.device.passcode);

    cursor.y += 10.0;
    cursor.section("Descripción de la falla:", &fields.failure_description);
    cursor.section("Estado del equipo al ingresar:", &fields.intake_condition);

    let budget = if fields.estimated_budget.trim().is_empty() {
        PLACEHOLDER.to_string()
    } else {
        format!("$ {}", fields.estimated_budget.trim())
    };
    cursor.ensure(0.0);
    cursor.put(MARGIN, cursor.y, Font::Bold, BODY_SIZE, "Presupuesto estimado:");
    cursor.put(MARGIN + BUDGET_COLUMN, cursor.y, Font::Regular, BODY_SIZE, budget);
    cursor.y += ROW_HEIGHT;

    cursor.row("Técnico que recibe:", &fields.technician);
    cursor.y += SECTION_GAP;

    if let Some(index) = photo {
        cursor.ensure(PHOTO_BOX.1);
        cursor.image(MARGIN, cursor.y, PHOTO_BOX, index);
        cursor.y += PHOTO_BOX.1 + 20.0;
    }

    let footer = format!(
        "{} | Tel: {} | {} | {}",
        business.name, business.phone, business.website, business.email
    );
    cursor.finish(&footer)
}
