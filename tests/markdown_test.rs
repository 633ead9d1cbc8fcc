//! Markdown reader and writer tests.

use std::fs;
use std::path::Path;

use mu::{
    AttrValue, Choice, Error, MarkdownReader, MarkdownWriter, OverwritePolicy, Payload, Reader,
    Registry, Selection, UnitKind, WarningKind, Writer,
};

const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

fn parse(src: &str) -> Result<mu::Course, Error> {
    MarkdownReader::new().parse_str(src, &Registry::standard())
}

fn round_trip(src: &str) -> String {
    let registry = Registry::standard();
    let course = MarkdownReader::new().parse_str(src, &registry).unwrap();
    MarkdownWriter::new().render(&course, &registry).unwrap().output
}

#[test]
fn test_single_unit_course() {
    let src = "# Course\n## Unit 1\nSome text {#u1}";
    let course = parse(src).unwrap();
    assert_eq!(course.title(), "Course");
    assert_eq!(course.children().len(), 1);

    let unit = &course.children()[0];
    assert_eq!(unit.kind(), UnitKind::Collection);
    assert_eq!(unit.title(), "Unit 1");
    assert_eq!(unit.children().len(), 1);

    let text = &unit.children()[0];
    assert_eq!(text.id(), "u1");
    assert_eq!(text.payload(), &Payload::raw_html("Some text"));

    assert_eq!(round_trip(src), src);
}

#[test]
fn test_heading_gap_synthesizes_collection() {
    let course = parse("# C\n### Deep\ntext").unwrap();
    let filler = &course.children()[0];
    assert_eq!(filler.kind(), UnitKind::Collection);
    assert_eq!(filler.title(), "");
    assert_eq!(filler.children()[0].title(), "Deep");
    assert_eq!(filler.warnings()[0].kind, WarningKind::HeadingDepthGap);
}

#[test]
fn test_read_fixture() {
    let registry = Registry::standard();
    let course = MarkdownReader::new()
        .read(&Path::new(FIXTURES_DIR).join("course.md"), &registry)
        .expect("Failed to read Markdown fixture");

    assert_eq!(course.id(), "rust101");
    assert_eq!(course.attributes().get("org"), Some(&AttrValue::from("acme")));
    assert_eq!(course.unit_count(), 10);
    assert!(course.warnings().is_empty());

    let welcome = course.find("welcome").unwrap();
    assert_eq!(welcome.title(), "Welcome");
    assert_eq!(
        welcome.payload(),
        &Payload::Video {
            sources: vec!["https://www.youtube.com/watch?v=dQw4w9WgXcQ".into()],
            transcript: Some("https://example.com/welcome.vtt".into()),
        }
    );
    assert_eq!(
        course.find("q1").unwrap().payload(),
        &Payload::MultipleChoice {
            question: "Which keyword declares a variable?".into(),
            choices: vec![Choice::new("let", true), Choice::new("var", false)],
            selection: Selection::Single,
        }
    );
    let playground = course.find("playground").unwrap();
    assert_eq!(playground.attributes().get("width").and_then(|v| v.as_integer()), Some(640));
    assert_eq!(course.find("feedback").unwrap().kind(), UnitKind::Survey);
}

#[test]
fn test_duplicate_identifier() {
    let err = parse("# C\n## A {#x}\n## B {#x}").unwrap_err();
    assert!(matches!(err, Error::Schema(_)));
}

#[test]
fn test_duplicate_attribute_warns() {
    let course = parse("# C\ntext {#t level=\"1\" level=\"2\"}").unwrap();
    let unit = &course.children()[0];
    assert_eq!(unit.attributes().get_text("level").as_deref(), Some("2"));
    assert_eq!(unit.warnings()[0].kind, WarningKind::DuplicateAttribute);
}

#[test]
fn test_typed_attribute_coercion_error() {
    let err = parse("# C\n<iframe src=\"https://example.com\"></iframe> {width=\"wide\"}")
        .unwrap_err();
    assert!(matches!(err, Error::Coercion { .. } | Error::Format { .. }));
}

#[test]
fn test_malformed_documents() {
    assert!(matches!(parse(""), Err(Error::Format { .. })));
    assert!(matches!(parse("intro\n# C"), Err(Error::Format { .. })));
    assert!(matches!(parse("## C"), Err(Error::Format { .. })));
}

#[test]
fn test_write_file() {
    let registry = Registry::standard();
    let course = parse("# Course\n## Unit 1\nSome text {#u1}").unwrap();
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("out.md");

    let warnings = MarkdownWriter::new().write(&course, &dest, &registry).unwrap();
    assert!(warnings.is_empty());
    assert_eq!(
        fs::read_to_string(&dest).unwrap(),
        "# Course\n## Unit 1\nSome text {#u1}\n"
    );

    assert!(MarkdownWriter::new().write(&course, &dest, &registry).is_err());
    MarkdownWriter::new()
        .overwrite(OverwritePolicy::Replace)
        .write(&course, &dest, &registry)
        .unwrap();
}
