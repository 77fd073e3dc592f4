//! End-to-end split runs over files on disk

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use xmlsplit_core::*;

/// `<w>` element whose serialization is exactly `len` bytes
fn element_of_len(len: usize) -> String {
    assert!(len >= 7);
    format!("<w>{}</w>", "x".repeat(len - 7))
}

fn write_input(dir: &Path, xml: &str) -> PathBuf {
    let path = dir.join("source.xml");
    fs::write(&path, xml).unwrap();
    path
}

fn fragment_config(dir: &TempDir, xml: &str, max_bytes: u64) -> SplitConfig {
    let input = write_input(dir.path(), xml);
    SplitConfig::builder()
        .element("w")
        .max_chunk_bytes(max_bytes)
        .input_file(input)
        .output_dir(dir.path().join("out"))
        .layout(ChunkLayout::Fragment)
        .build()
        .unwrap()
}

fn read_all(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| fs::read_to_string(p).unwrap())
        .collect()
}

#[test]
fn test_five_equal_elements_make_three_chunks() {
    let dir = TempDir::new().unwrap();
    let elements: Vec<String> = (0..5).map(|_| element_of_len(40)).collect();
    let xml = format!("<root>{}</root>", elements.concat());

    let paths = Splitter::new(fragment_config(&dir, &xml, 100))
        .split()
        .unwrap();

    assert_eq!(
        paths,
        vec![
            dir.path().join("out/chunk_1.xml"),
            dir.path().join("out/chunk_2.xml"),
            dir.path().join("out/chunk_3.xml"),
        ]
    );
    let sizes: Vec<u64> = paths
        .iter()
        .map(|p| fs::metadata(p).unwrap().len())
        .collect();
    assert_eq!(sizes, vec![80, 80, 40]);
}

#[test]
fn test_oversized_element_is_written_whole() {
    let dir = TempDir::new().unwrap();
    let big = element_of_len(150);
    let xml = format!("<root>{big}</root>");

    let paths = Splitter::new(fragment_config(&dir, &xml, 100))
        .split()
        .unwrap();

    assert_eq!(paths.len(), 1);
    assert_eq!(fs::read_to_string(&paths[0]).unwrap(), big);
}

#[test]
fn test_no_match_produces_no_chunk_files() {
    let dir = TempDir::new().unwrap();
    let xml = "<root><other>1</other><other>2</other></root>";

    let paths = Splitter::new(fragment_config(&dir, xml, 100))
        .split()
        .unwrap();

    assert!(paths.is_empty());
    assert_eq!(fs::read_dir(dir.path().join("out")).unwrap().count(), 0);
}

#[test]
fn test_partition_preserves_order_and_content() {
    let dir = TempDir::new().unwrap();
    let elements: Vec<String> = (0..40)
        .map(|i| format!("<w id=\"{i}\">{}</w>", "v".repeat(i % 7)))
        .collect();
    let xml = format!(
        "<?xml version=\"1.0\"?>\n<root>\n  <header/>\n  {}\n</root>\n",
        elements.join("\n  ")
    );

    let paths = Splitter::new(fragment_config(&dir, &xml, 64))
        .split()
        .unwrap();

    assert!(paths.len() > 1);
    assert_eq!(read_all(&paths).concat(), elements.concat());
}

#[test]
fn test_chunks_respect_budget() {
    let dir = TempDir::new().unwrap();
    let lens = [10, 30, 55, 12, 70, 20, 20, 20, 9, 64];
    let elements: Vec<String> = lens.iter().map(|&n| element_of_len(n)).collect();
    let xml = format!("<root>{}</root>", elements.concat());

    let paths = Splitter::new(fragment_config(&dir, &xml, 64))
        .split()
        .unwrap();

    for content in read_all(&paths) {
        let single = content.matches("<w>").count() == 1;
        assert!(content.len() <= 64 || single, "chunk too large: {content}");
    }
}

#[test]
fn test_repeated_runs_are_identical() {
    let dir = TempDir::new().unwrap();
    let elements: Vec<String> = (0..25).map(|i| element_of_len(20 + i)).collect();
    let xml = format!("<root>{}</root>", elements.concat());
    let config = fragment_config(&dir, &xml, 90);

    let first = Splitter::new(config.clone()).split().unwrap();
    let first_contents = read_all(&first);

    let second = Splitter::new(config).split().unwrap();
    assert_eq!(first, second);
    assert_eq!(first_contents, read_all(&second));
}

#[test]
fn test_document_chunks_are_well_formed() {
    let dir = TempDir::new().unwrap();
    let input_dir = dir.path().join("input");
    fs::create_dir_all(&input_dir).unwrap();
    fs::write(
        input_dir.join("workers.xml"),
        r#"<?xml version="1.0" encoding="UTF-8"?>
<wd:Report xmlns:wd="urn:com.workday/bsvc">
  <wd:Worker><wd:Name>Ada</wd:Name></wd:Worker>
  <wd:Worker><wd:Name>Grace</wd:Name></wd:Worker>
  <wd:Worker><wd:Name>Edsger</wd:Name></wd:Worker>
</wd:Report>
"#,
    )
    .unwrap();

    let config = SplitConfig::builder()
        .element("Worker")
        .max_chunk_bytes(60)
        .input_dir(&input_dir, "*.xml")
        .output_dir(dir.path().join("out"))
        .build()
        .unwrap();
    let paths = Splitter::new(config).split().unwrap();
    assert_eq!(paths.len(), 3);

    for path in &paths {
        let content = fs::read_to_string(path).unwrap();
        assert!(content.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"));
        assert!(content.contains(r#"<wd:Report xmlns:wd="urn:com.workday/bsvc">"#));

        // Every chunk parses on its own
        let mut reader = quick_xml::Reader::from_str(&content);
        let mut depth = 0i32;
        loop {
            match reader.read_event().unwrap() {
                quick_xml::events::Event::Start(_) => depth += 1,
                quick_xml::events::Event::End(_) => depth -= 1,
                quick_xml::events::Event::Eof => break,
                _ => {}
            }
        }
        assert_eq!(depth, 0);
    }
}

#[test]
fn test_inherited_namespace_is_declared_on_fragment() {
    let dir = TempDir::new().unwrap();
    let xml = r#"<r xmlns:p="urn:p"><p:w>1</p:w></r>"#;
    let input = write_input(dir.path(), xml);

    let config = SplitConfig::builder()
        .element("p:w")
        .input_file(input)
        .output_dir(dir.path().join("out"))
        .layout(ChunkLayout::Fragment)
        .build()
        .unwrap();
    let paths = Splitter::new(config).split().unwrap();

    assert_eq!(
        fs::read_to_string(&paths[0]).unwrap(),
        r#"<p:w xmlns:p="urn:p">1</p:w>"#
    );
}

#[test]
fn test_fragment_keeps_prefixes_used_in_values() {
    let dir = TempDir::new().unwrap();
    let xml = r#"<r xmlns:wd="urn:wd" xmlns:xsi="urn:xsi"><w xsi:type="wd:Employee">1</w></r>"#;
    let input = write_input(dir.path(), xml);

    let config = SplitConfig::builder()
        .element("w")
        .input_file(input)
        .output_dir(dir.path().join("out"))
        .layout(ChunkLayout::Fragment)
        .build()
        .unwrap();
    let paths = Splitter::new(config).split().unwrap();

    assert_eq!(
        fs::read_to_string(&paths[0]).unwrap(),
        r#"<w xsi:type="wd:Employee" xmlns:wd="urn:wd" xmlns:xsi="urn:xsi">1</w>"#
    );
}

#[test]
fn test_malformed_document_fails_without_chunks() {
    let dir = TempDir::new().unwrap();
    let mut xml = String::from("<root>");
    for _ in 0..10 {
        xml.push_str(&element_of_len(30));
    }
    xml.push_str("<w>unterminated");

    let err = Splitter::new(fragment_config(&dir, &xml, 50))
        .split()
        .unwrap_err();

    assert!(matches!(err, SplitError::MalformedSource { .. }));
    assert_eq!(fs::read_dir(dir.path().join("out")).unwrap().count(), 0);
}

#[test]
fn test_missing_input_directory_is_reported() {
    let dir = TempDir::new().unwrap();
    let err = SplitConfig::builder()
        .element("w")
        .input_dir(dir.path().join("nowhere"), "*.xml")
        .output_dir(dir.path().join("out"))
        .build()
        .unwrap_err();

    assert!(matches!(err, SplitError::MissingInput { .. }));
}

#[test]
fn test_first_of_several_candidates_is_split() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("b.xml"), "<r><w>b</w></r>").unwrap();
    fs::write(dir.path().join("a.xml"), "<r><w>a</w></r>").unwrap();

    let config = SplitConfig::builder()
        .element("w")
        .input_dir(dir.path(), "*.xml")
        .output_dir(dir.path().join("out"))
        .layout(ChunkLayout::Fragment)
        .build()
        .unwrap();
    assert!(config.input_selection().is_ambiguous());
    assert_eq!(config.input_file(), dir.path().join("a.xml"));

    let paths = Splitter::new(config).split().unwrap();
    assert_eq!(fs::read_to_string(&paths[0]).unwrap(), "<w>a</w>");
}
