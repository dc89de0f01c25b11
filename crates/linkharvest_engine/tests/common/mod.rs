#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use linkharvest_engine::{EngineEvent, ProgressSink};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

pub fn init_logging() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

/// A link annotation to place on a generated page. An empty label draws no text.
pub struct TestLink<'a> {
    pub label: &'a str,
    pub uri: &'a str,
    pub rect: [i64; 4],
}

/// Builds a small PDF with one Helvetica label drawn inside each link rectangle.
pub fn build_pdf(pages: &[Vec<TestLink<'_>>]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for links in pages {
        let mut operations = Vec::new();
        let mut annots = Vec::new();
        for link in links {
            if !link.label.is_empty() {
                operations.extend([
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), Object::Integer(12)]),
                    Operation::new(
                        "Td",
                        vec![(link.rect[0] + 2).into(), (link.rect[1] + 4).into()],
                    ),
                    Operation::new("Tj", vec![Object::string_literal(link.label)]),
                    Operation::new("ET", vec![]),
                ]);
            }
            annots.push(link_annotation(&mut doc, link.uri, link.rect));
        }
        kids.push(add_page(&mut doc, pages_id, resources_id, operations, annots));
    }
    finish(doc, pages_id, kids)
}

/// A line of text drawn at `at` (baseline start) in 12pt Courier.
pub struct TestLine<'a> {
    pub text: &'a str,
    pub at: [i64; 2],
}

/// Builds a one-page PDF whose text and links are placed independently, so
/// a link can cover part of a line. The font carries a `/Widths` table with
/// every printable glyph 600 units wide, 7.2pt at 12pt.
pub fn build_text_pdf(lines: &[TestLine<'_>], links: &[(&str, [i64; 4])]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let widths: Vec<Object> = (32..=126).map(|_| Object::Integer(600)).collect();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "FirstChar" => Object::Integer(32),
        "LastChar" => Object::Integer(126),
        "Widths" => widths,
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut operations = Vec::new();
    for line in lines {
        operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), Object::Integer(12)]),
            Operation::new("Td", vec![line.at[0].into(), line.at[1].into()]),
            Operation::new("Tj", vec![Object::string_literal(line.text)]),
            Operation::new("ET", vec![]),
        ]);
    }
    let annots = links
        .iter()
        .map(|(uri, rect)| link_annotation(&mut doc, uri, *rect))
        .collect();
    let page = add_page(&mut doc, pages_id, resources_id, operations, annots);
    finish(doc, pages_id, vec![page])
}

fn link_annotation(doc: &mut Document, uri: &str, rect: [i64; 4]) -> Object {
    let rect: Vec<Object> = rect.iter().map(|v| Object::Integer(*v)).collect();
    let annot_id = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Link",
        "Rect" => rect,
        "A" => dictionary! {
            "S" => "URI",
            "URI" => Object::string_literal(uri),
        },
    });
    Object::Reference(annot_id)
}

fn add_page(
    doc: &mut Document,
    pages_id: lopdf::ObjectId,
    resources_id: lopdf::ObjectId,
    operations: Vec<Operation>,
    annots: Vec<Object>,
) -> Object {
    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Annots" => annots,
    });
    Object::Reference(page_id)
}

fn finish(mut doc: Document, pages_id: lopdf::ObjectId, kids: Vec<Object>) -> Vec<u8> {
    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

#[derive(Default, Clone)]
pub struct TestSink {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl TestSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}
