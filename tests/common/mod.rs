#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, StringFormat, dictionary};
use picklist_merge::{AccountUpload, UploadedFile};

/// Builds a text PDF with one Courier line per entry, one page per slice.
pub fn create_test_pdf(pages: &[Vec<&str>]) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let font = dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    };
    build_pdf(font, pages, |line| Object::string_literal(line))
}

/// Same layout, but the font is a Type0 `Identity-H` font with no
/// `DescendantFonts` and every line is a UTF-16BE string with a BOM.
pub fn create_type0_pdf(pages: &[Vec<&str>]) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let font = dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => "Courier",
        "Encoding" => "Identity-H",
    };
    build_pdf(font, pages, |line| {
        let mut bytes = vec![0xFE, 0xFF];
        bytes.extend(line.encode_utf16().flat_map(u16::to_be_bytes));
        Object::String(bytes, StringFormat::Hexadecimal)
    })
}

fn build_pdf(
    font: Dictionary,
    pages: &[Vec<&str>],
    encode_line: impl Fn(&str) -> Object,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut doc = Document::with_version("1.5");

    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(font);
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut page_ids = Vec::new();
    for lines in pages {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("TL", vec![16.into()]),
            Operation::new("Td", vec![50.into(), 780.into()]),
        ];
        for (index, line) in lines.iter().enumerate() {
            operations.push(Operation::new("Tj", vec![encode_line(line)]));
            if index + 1 < lines.len() {
                operations.push(Operation::new("T*", vec![]));
            }
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        page_ids.push(doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        }));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.iter().map(|id| (*id).into()).collect::<Vec<_>>(),
            "Count" => i64::try_from(page_ids.len())?,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

pub fn csv_upload(account: &str, contents: &str) -> AccountUpload {
    AccountUpload::new(
        account,
        UploadedFile::new(format!("{account}.csv"), contents.as_bytes().to_vec()),
    )
}

pub fn pdf_upload(account: &str, pages: &[Vec<&str>]) -> AccountUpload {
    let bytes = create_test_pdf(pages).expect("PDF fixture should be created");
    AccountUpload::new(account, UploadedFile::new(format!("{account}.pdf"), bytes))
}
