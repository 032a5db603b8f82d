//! End-to-end tests over small hand-assembled PDF files.

use pdftree::{
    convert_file, extract_bytes, ContentExtractor, Error, JsonFormat, Node, Options, PageSelection,
    PdfParser, Pipeline,
};
use serde_json::{json, Value};

/// One line of text: font resource, size, x, y (PDF coordinates), text.
type Line = (&'static str, f32, f32, f32, &'static str);

/// Page description: text lines plus an optional image placement
/// (x, y, width, height).
struct TestPage {
    lines: Vec<Line>,
    image: Option<(f32, f32, f32, f32)>,
}

/// Assemble a PDF with Helvetica (`F1`) and Helvetica-Bold (`F2`) and a
/// correct cross-reference table.
fn build_pdf(pages: &[TestPage]) -> Vec<u8> {
    let mut objects: Vec<Vec<u8>> = Vec::new();
    let font_id = 3;
    let bold_id = 4;
    let image_id = 5;
    let first_page_id = 6;

    let kids: Vec<String> = (0..pages.len())
        .map(|i| format!("{} 0 R", first_page_id + 2 * i))
        .collect();

    objects.push(b"<< /Type /Catalog /Pages 2 0 R >>".to_vec());
    objects.push(
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            pages.len()
        )
        .into_bytes(),
    );
    objects.push(
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_vec(),
    );
    objects.push(
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>"
            .to_vec(),
    );
    objects.push(
        b"<< /Type /XObject /Subtype /Image /Width 1 /Height 1 /ColorSpace /DeviceGray /BitsPerComponent 8 /Length 1 >>\nstream\n\x80\nendstream"
            .to_vec(),
    );

    for (i, page) in pages.iter().enumerate() {
        let content_id = first_page_id + 2 * i + 1;
        objects.push(
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
                 /Resources << /Font << /F1 {font_id} 0 R /F2 {bold_id} 0 R >> \
                 /XObject << /Im1 {image_id} 0 R >> >> /Contents {content_id} 0 R >>"
            )
            .into_bytes(),
        );

        let mut stream = String::new();
        for (font, size, x, y, text) in &page.lines {
            stream.push_str(&format!("BT /{font} {size} Tf {x} {y} Td ({text}) Tj ET\n"));
        }
        if let Some((x, y, w, h)) = page.image {
            stream.push_str(&format!("q {w} 0 0 {h} {x} {y} cm /Im1 Do Q\n"));
        }
        objects.push(
            format!(
                "<< /Length {} >>\nstream\n{}\nendstream",
                stream.len(),
                stream
            )
            .into_bytes(),
        );
    }

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n", i + 1).as_bytes());
        pdf.extend_from_slice(body);
        pdf.extend_from_slice(b"\nendobj\n");
    }

    let xref_offset = pdf.len();
    pdf.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    pdf.extend_from_slice(b"0000000000 65535 f \n");
    for offset in offsets {
        pdf.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    pdf.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_offset
        )
        .as_bytes(),
    );
    pdf
}

fn report() -> Vec<u8> {
    build_pdf(&[
        TestPage {
            lines: vec![
                ("F2", 24.0, 72.0, 720.0, "Annual Report"),
                ("F2", 18.0, 72.0, 680.0, "Introduction"),
                ("F1", 11.0, 72.0, 650.0, "This report describes the"),
                ("F1", 11.0, 72.0, 636.0, "results of the year and"),
                ("F1", 11.0, 72.0, 622.0, "the outlook for the next."),
                ("F2", 18.0, 72.0, 580.0, "Financials"),
                ("F1", 11.0, 72.0, 550.0, "Revenue grew every quarter."),
                ("F1", 11.0, 72.0, 500.0, "Quarter"),
                ("F1", 11.0, 250.0, 500.0, "Revenue"),
                ("F1", 11.0, 72.0, 485.0, "Q1"),
                ("F1", 11.0, 250.0, 485.0, "100"),
                ("F1", 11.0, 72.0, 470.0, "Q2"),
                ("F1", 11.0, 250.0, 470.0, "120"),
                ("F1", 9.0, 300.0, 40.0, "1"),
            ],
            image: None,
        },
        TestPage {
            lines: vec![
                ("F1", 11.0, 72.0, 720.0, "The outlook remains positive."),
                ("F2", 18.0, 72.0, 680.0, "Appendix"),
                ("F1", 11.0, 72.0, 650.0, "Additional notes follow."),
                ("F1", 9.0, 300.0, 40.0, "2"),
            ],
            image: Some((72.0, 400.0, 200.0, 100.0)),
        },
    ])
}

#[test]
fn test_report_tree() {
    let extraction = extract_bytes(&report()).unwrap();
    let value = serde_json::to_value(&extraction.tree).unwrap();

    let expected = json!({
        "source": null,
        "total_pages": 2,
        "pages": [
            {"page": 1, "content": [
                {"type": "section", "title": "Annual Report", "level": 1, "children": [
                    {"type": "section", "title": "Introduction", "level": 2, "children": [
                        {"type": "paragraph", "text": "This report describes the results of the year and the outlook for the next."}
                    ]},
                    {"type": "section", "title": "Financials", "level": 2, "children": [
                        {"type": "paragraph", "text": "Revenue grew every quarter."},
                        {"type": "table", "rows": [["Quarter", "Revenue"], ["Q1", "100"], ["Q2", "120"]]}
                    ]}
                ]}
            ]},
            {"page": 2, "content": [
                {"type": "section", "title": "Annual Report", "level": 1, "continued": true, "children": [
                    {"type": "section", "title": "Financials", "level": 2, "continued": true, "children": [
                        {"type": "paragraph", "text": "The outlook remains positive."}
                    ]},
                    {"type": "section", "title": "Appendix", "level": 2, "children": [
                        {"type": "paragraph", "text": "Additional notes follow."},
                        {"type": "chart"}
                    ]}
                ]}
            ]}
        ]
    });
    assert_eq!(value, expected);

    assert!(extraction.warnings.is_empty());
    assert_eq!(extraction.stats.dropped_span_count, 2);
    assert_eq!(extraction.stats.table_count, 1);
    assert_eq!(extraction.stats.chart_count, 1);
}

#[test]
fn test_parser_reports_fonts_and_positions() {
    let parser = PdfParser::from_bytes(&report()).unwrap();
    assert_eq!(parser.page_count(), 2);
    assert_eq!(parser.version(), "1.4");

    let pages = parser.extract().unwrap();
    let title = &pages[0].spans[0];
    assert_eq!(title.text, "Annual Report");
    assert_eq!(title.font_name, "Helvetica-Bold");
    assert!(title.bold);
    assert_eq!(title.font_size, 24.0);
    assert_eq!(title.y_position, 72.0);

    assert_eq!(pages[0].tables.len(), 1);
    assert!(pages[0].spans.iter().all(|s| s.text != "Q1"));

    let image = pages[1].images[0].bounding_box;
    assert_eq!((image.x0, image.top, image.x1, image.bottom), (72.0, 292.0, 272.0, 392.0));
}

#[test]
fn test_page_selection_starts_fresh() {
    let options = Options::new().with_pages(PageSelection::Pages(vec![2]));
    let extraction = Pipeline::new(options).process_bytes(&report()).unwrap();
    let tree = extraction.tree;

    assert_eq!(tree.total_pages, 2);
    assert_eq!(tree.pages.len(), 1);
    let content = &tree.pages[0].content;
    assert_eq!(
        content[0],
        Node::Paragraph {
            text: "The outlook remains positive.".into()
        }
    );
    assert_eq!(content[1].as_section().map(|s| s.title.as_str()), Some("Appendix"));
}

#[test]
fn test_page_out_of_range() {
    let options = Options::new().with_pages(PageSelection::Pages(vec![1, 9]));
    let err = Pipeline::new(options).process_bytes(&report()).unwrap_err();
    assert!(matches!(err, Error::PageOutOfRange(9, 2)));
}

#[test]
fn test_document_without_pages() {
    let err = extract_bytes(&build_pdf(&[])).unwrap_err();
    assert!(err.is_extraction_error());
}

#[test]
fn test_non_pdf_input() {
    let err = extract_bytes(b"Hello, this is plain text").unwrap_err();
    assert!(matches!(err, Error::UnknownFormat));
}

#[test]
fn test_convert_file_writes_json() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("report.pdf");
    let output = dir.path().join("report.json");
    std::fs::write(&input, report()).unwrap();

    let options = Options::new().with_format(JsonFormat::Compact);
    let extraction = convert_file(&input, &output, &options).unwrap();
    assert_eq!(extraction.stats.page_count, 2);

    let written = std::fs::read_to_string(&output).unwrap();
    assert!(!written.contains('\n'));
    let value: Value = serde_json::from_str(&written).unwrap();
    assert_eq!(value["source"], json!(input.display().to_string()));
    assert_eq!(value["pages"][0]["content"][0]["title"], json!("Annual Report"));
}

#[test]
fn test_batch_processing_keeps_input_order() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.pdf");
    let bad = dir.path().join("bad.pdf");
    std::fs::write(&good, report()).unwrap();
    std::fs::write(&bad, b"%PDF-1.4\ngarbage").unwrap();

    let results = pdftree::process_files(&[good, bad], &Options::default());
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(results[1].as_ref().is_err_and(|e| e.is_extraction_error()));
}

#[test]
fn test_batch_stats_add_up() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.pdf");
    let second = dir.path().join("second.pdf");
    std::fs::write(&first, report()).unwrap();
    std::fs::write(&second, report()).unwrap();

    let mut totals = pdftree::ExtractionStats::default();
    for result in pdftree::process_files(&[first, second], &Options::default()) {
        totals.merge(&result.unwrap().stats);
    }
    assert_eq!(totals.page_count, 4);
    assert_eq!(totals.table_count, 2);
    assert_eq!(totals.chart_count, 2);
    assert_eq!(totals.dropped_span_count, 4);
}
