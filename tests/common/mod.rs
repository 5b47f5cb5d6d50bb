#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use docquality::{
    extraction::{DocumentStats, ExtractionResult},
    metadata::{Metadata, MetadataExtractor},
    quality::{TopicCandidate, TopicReport},
    topics::{TopicMatch, TopicMatcher},
};
use lopdf::{Document, Object, Stream, dictionary};
use serde_json::Value;

/// Metadata collaborator returning a fixed mapping and counting calls.
pub struct StubMetadata {
    response: Metadata,
    calls: AtomicUsize,
}

impl StubMetadata {
    pub fn new(response: Value) -> Self {
        let response = match response {
            Value::Object(fields) => fields,
            _ => Metadata::new(),
        };
        Self {
            response,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataExtractor for StubMetadata {
    async fn extract(&self, _bytes: &[u8], _file_name: &str) -> Metadata {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone()
    }
}

/// Topic matcher assigning one fixed topic and counting calls.
#[derive(Default)]
pub struct StubTopics {
    calls: AtomicUsize,
}

impl StubTopics {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TopicMatcher for StubTopics {
    async fn match_text(&self, _text: &str, _top_k: usize) -> TopicMatch {
        self.calls.fetch_add(1, Ordering::SeqCst);
        TopicMatch {
            is_valid: true,
            report: TopicReport {
                topics: vec![TopicCandidate {
                    topic_id: 7,
                    topic_name: "Soil carbon".into(),
                    probability: Some(0.82),
                }],
                diagnose: None,
            },
        }
    }
}

/// Long scientific paper: section headings up front, references at the end.
pub fn scientific_paper() -> ExtractionResult {
    let mut text = String::from(
        "Soil carbon dynamics under cover crops\n\
         A three-year field study in Mediterranean vineyards\n\
         Abstract\n\
         We measured soil organic carbon in vineyards managed with and without cover crops.\n\
         Methodology\n",
    );
    let body = "Samples were taken at three depths from every plot in spring and autumn.\n";
    while text.chars().count() < 15_000 {
        text.push_str(body);
    }
    text.push_str("References\nSmith, J. (2020). Carbon in vineyard soils. Soil Journal 12.\n");

    ExtractionResult {
        text,
        stats: DocumentStats {
            num_pages: 60,
            bytes: 2_000_000,
            ..DocumentStats::default()
        },
    }
}

/// Minimal PDF with one text line per page.
pub fn make_pdf(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        });
        kids.push(page_id.into());
    }

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

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("serialize pdf");
    buf
}
