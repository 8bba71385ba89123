use reqwest::Url;

use super::*;
use crate::error::ParseError;

fn base() -> Url {
    Url::parse("https://www.exist.ru/").unwrap()
}

fn catalogue_entry(manufacturer: &str, name: &str, href: &str) -> String {
    format!(
        "<li class=\"catalogs__item\">\n\t<a href=\"{href}\">\n\t\t<dl>\n\t\t\t<dt><span class=\"catalogs__brand\">\n\t{manufacturer}\r\n</span></dt>\n\t\t\t<dd>{name}</dd>\n\t\t</dl>\n\t</a>\n</li>"
    )
}

fn selection_page(entries: &[String]) -> String {
    format!(
        "<html><head><title>exist.ru</title></head><body>\
         <h1>Выберите каталог</h1>\
         <ul class=\"catalogs\">\n{}\n</ul>\
         </body></html>",
        entries.join("\n")
    )
}

fn part_page(data: &str) -> String {
    format!(
        "<html><head>\
         <script src=\"/static/app.js\"></script>\
         <script>window.dataLayer = [];</script>\
         </head><body>\
         <script type=\"text/javascript\">\n    var _data = {data};\n    var _favs = [];\n</script>\
         </body></html>"
    )
}

// -----------------------------------------------------------------------
// is_selection_page
// -----------------------------------------------------------------------

#[test]
fn selection_marker_is_detected() {
    assert!(is_selection_page(&selection_page(&[])));
}

#[test]
fn part_page_is_not_a_selection_page() {
    assert!(!is_selection_page(&part_page("[]")));
}

// -----------------------------------------------------------------------
// parse_selection_page
// -----------------------------------------------------------------------

#[test]
fn selection_page_yields_options_in_document_order() {
    let html = selection_page(&[
        catalogue_entry("MANN-FILTER", "Фильтр масляный", "/Price/?pid=1"),
        catalogue_entry("BOSCH", "Фильтр воздушный", "/Price/?pid=2"),
        catalogue_entry("Nissan", "Filter, oil", "/Price/?pid=3"),
    ]);

    let options = parse_selection_page(&html, &base());

    assert_eq!(options.len(), 3);
    assert_eq!(options[0].manufacturer, "MANN FILTER");
    assert_eq!(options[0].name, "Фильтр масляный");
    assert_eq!(options[0].url, "https://www.exist.ru/Price/?pid=1");
    assert_eq!(options[1].manufacturer, "BOSCH");
    assert_eq!(options[1].url, "https://www.exist.ru/Price/?pid=2");
    assert_eq!(options[2].name, "Filter oil");
    assert_eq!(options[2].url, "https://www.exist.ru/Price/?pid=3");
}

#[test]
fn selection_page_skips_malformed_entries_and_keeps_the_rest() {
    let no_span = "<li><a href=\"/Price/?pid=9\"><dl><dd>Без бренда</dd></dl></a></li>".to_string();
    let no_dd = "<li><a href=\"/Price/?pid=8\"><span>ACME</span></a></li>".to_string();
    let no_link = "<li><span>ACME</span><dl><dd>Без ссылки</dd></dl></li>".to_string();

    let html = selection_page(&[
        no_span,
        catalogue_entry("A", "first", "/Price/?pid=1"),
        no_dd,
        catalogue_entry("B", "second", "/Price/?pid=2"),
        no_link,
        catalogue_entry("C", "third", "/Price/?pid=3"),
    ]);

    let options = parse_selection_page(&html, &base());

    let names: Vec<&str> = options.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["first", "second", "third"]);
}

#[test]
fn selection_page_ignores_text_nodes_between_entries() {
    let html = selection_page(&[
        "stray text".to_string(),
        catalogue_entry("A", "only", "/Price/?pid=1"),
        "more stray text".to_string(),
    ]);

    let options = parse_selection_page(&html, &base());
    assert_eq!(options.len(), 1);
    assert_eq!(options[0].manufacturer, "A");
}

#[test]
fn selection_page_keeps_absolute_links() {
    let html = selection_page(&[catalogue_entry(
        "A",
        "abs",
        "https://other.example.com/Price/?pid=7",
    )]);

    let options = parse_selection_page(&html, &base());
    assert_eq!(options[0].url, "https://other.example.com/Price/?pid=7");
}

#[test]
fn selection_page_without_catalogue_list_is_empty() {
    let html = "<html><body><h1>Выберите каталог</h1><ul class=\"other\"><li>x</li></ul></body></html>";
    assert!(parse_selection_page(html, &base()).is_empty());
}

#[test]
fn selection_page_uses_only_first_catalogue_list() {
    let first = selection_page(&[catalogue_entry("A", "one", "/Price/?pid=1")]);
    let html = first.replace(
        "</body>",
        "<ul class=\"catalogs\"><li><a href=\"/x\"><span>Z</span><dd>two</dd></a></li></ul></body>",
    );

    let options = parse_selection_page(&html, &base());
    assert_eq!(options.len(), 1);
    assert_eq!(options[0].name, "one");
}

// -----------------------------------------------------------------------
// parse_part_page
// -----------------------------------------------------------------------

#[test]
fn part_page_yields_first_data_element() {
    let html = part_page(
        r#"[{"PartNumber":"OC90","CatalogName":"MAHLE","Description":"Фильтр масляный","Price":512},
            {"PartNumber":"OC90OF","CatalogName":"KNECHT","Description":"other"}]"#,
    );

    let candidate = parse_part_page(&html).unwrap();
    assert_eq!(candidate.part_number, "OC90");
    assert_eq!(candidate.catalogue_name, "MAHLE");
    assert_eq!(candidate.description, "Фильтр масляный");
}

#[test]
fn null_description_becomes_literal_none() {
    let html = part_page(r#"[{"PartNumber":"ABC123","CatalogName":"Widget","Description":null}]"#);
    let candidate = parse_part_page(&html).unwrap();
    assert_eq!(candidate.part_number, "ABC123");
    assert_eq!(candidate.catalogue_name, "Widget");
    assert_eq!(candidate.description, "None");
}

#[test]
fn absent_description_becomes_literal_none() {
    let html = part_page(r#"[{"PartNumber":"ABC123","CatalogName":"Widget"}]"#);
    assert_eq!(parse_part_page(&html).unwrap().description, "None");
}

#[test]
fn page_without_data_script_is_not_found() {
    let html = "<html><body><script>var _favs = [];</script><p>Ничего не найдено</p></body></html>";
    let err = parse_part_page(html).unwrap_err();
    assert!(
        matches!(err, ParseError::DataScriptNotFound),
        "expected DataScriptNotFound, got: {err:?}"
    );
}

#[test]
fn data_in_external_script_tag_is_ignored() {
    let html = r#"<html><head><script src="/data.js">var _data = [{"PartNumber":"X","CatalogName":"Y"}]; var _favs = [];</script></head></html>"#;
    let err = parse_part_page(html).unwrap_err();
    assert!(matches!(err, ParseError::DataScriptNotFound), "got: {err:?}");
}

#[test]
fn malformed_json_is_a_parse_error() {
    let html = part_page(r#"[{"PartNumber":"X","CatalogName":}]"#);
    let err = parse_part_page(&html).unwrap_err();
    assert!(matches!(err, ParseError::Json { .. }), "got: {err:?}");
}

#[test]
fn missing_part_number_is_a_parse_error() {
    let html = part_page(r#"[{"CatalogName":"Widget","Description":"x"}]"#);
    let err = parse_part_page(&html).unwrap_err();
    assert!(matches!(err, ParseError::Json { .. }), "got: {err:?}");
}

#[test]
fn empty_data_array_is_a_parse_error() {
    let html = part_page("[]");
    let err = parse_part_page(&html).unwrap_err();
    assert!(matches!(err, ParseError::EmptyData), "got: {err:?}");
}
