//! Serializes a [`Layout`] into PDF bytes with lopdf.
//!
//! Text uses the standard Helvetica fonts with WinAnsi encoding, so no font
//! files are embedded. Images become DeviceRGB XObjects.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};

use super::images::DecodedImage;
use super::layout::{Font, Item, Layout, PAGE_HEIGHT, PAGE_WIDTH};
use crate::errors::AppError;

fn font_resource(font: Font) -> &'static str {
    match font {
        Font::Regular => "F1",
        Font::Bold => "F2",
    }
}

/// Write `layout` as a complete PDF document.
pub fn write(layout: &Layout, images: &[DecodedImage]) -> Result<Vec<u8>, AppError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut xobjects = lopdf::Dictionary::new();
    for (index, image) in images.iter().enumerate() {
        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => image.width as i64,
                "Height" => image.height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8i64,
            },
            image.rgb.clone(),
        ));
        xobjects.set(image_name(index), image_id);
    }

    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular_id,
            "F2" => bold_id,
        },
        "XObject" => xobjects,
    });

    let mut kids: Vec<Object> = Vec::with_capacity(layout.pages.len());
    for page in &layout.pages {
        let content = Content {
            operations: page_operations(&page.items),
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id: ObjectId = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![0i64.into(), 0i64.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| AppError::Render(format!("Failed to write PDF: {}", e)))?;
    Ok(bytes)
}

fn image_name(index: usize) -> String {
    format!("Im{}", index)
}

fn page_operations(items: &[Item]) -> Vec<Operation> {
    let mut ops = Vec::new();
    for item in items {
        match item {
            Item::Text {
                x,
                y,
                font,
                size,
                text,
            } => {
                ops.push(Operation::new("BT", vec![]));
                ops.push(Operation::new(
                    "Tf",
                    vec![font_resource(*font).into(), (*size).into()],
                ));
                ops.push(Operation::new("Td", vec![(*x).into(), (PAGE_HEIGHT - y).into()]));
                ops.push(Operation::new(
                    "Tj",
                    vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
                ));
                ops.push(Operation::new("ET", vec![]));
            }
            Item::Rule { x1, x2, y } => {
                ops.push(Operation::new("w", vec![0.5f32.into()]));
                ops.push(Operation::new("m", vec![(*x1).into(), (PAGE_HEIGHT - y).into()]));
                ops.push(Operation::new("l", vec![(*x2).into(), (PAGE_HEIGHT - y).into()]));
                ops.push(Operation::new("S", vec![]));
            }
            Item::Image {
                x,
                y,
                width,
                height,
                index,
            } => {
                ops.push(Operation::new("q", vec![]));
                ops.push(Operation::new(
                    "cm",
                    vec![
                        (*width).into(),
                        0i64.into(),
                        0i64.into(),
                        (*height).into(),
                        (*x).into(),
                        (PAGE_HEIGHT - y - height).into(),
                    ],
                ));
                ops.push(Operation::new(
                    "Do",
                    vec![Object::Name(image_name(*index).into_bytes())],
                ));
                ops.push(Operation::new("Q", vec![]));
            }
        }
    }
    ops
}

/// Map text to the WinAnsi (cp1252) bytes the standard fonts expect.
/// Characters outside the code page print as `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7e}' => c as u8,
            '\u{a0}'..='\u{ff}' => c as u32 as u8,
            '€' => 0x80,
            '‚' => 0x82,
            'ƒ' => 0x83,
            '„' => 0x84,
            '…' => 0x85,
            '†' => 0x86,
            '‡' => 0x87,
            'ˆ' => 0x88,
            '‰' => 0x89,
            'Š' => 0x8a,
            '‹' => 0x8b,
            'Œ' => 0x8c,
            'Ž' => 0x8e,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '˜' => 0x98,
            '™' => 0x99,
            'š' => 0x9a,
            '›' => 0x9b,
            'œ' => 0x9c,
            'ž' => 0x9e,
            'Ÿ' => 0x9f,
            c if c.is_whitespace() => b' ',
            _ => b'?',
        })
        .collect()
}
