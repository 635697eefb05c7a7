use devlog_backend::draft::{parse_draft, Draft};

#[test]
fn well_formed_payload_parses() {
    let draft = parse_draft(r#"{"excerpt": "Short and catchy.", "content": "Two paragraphs."}"#)
        .expect("valid payload");
    assert_eq!(
        draft,
        Draft {
            excerpt: "Short and catchy.".to_string(),
            content: "Two paragraphs.".to_string(),
        }
    );
}

#[test]
fn missing_field_is_rejected() {
    assert!(parse_draft(r#"{"excerpt": "only one field"}"#).is_err());
    assert!(parse_draft(r#"{"content": "only one field"}"#).is_err());
}

#[test]
fn extra_field_is_rejected() {
    let err = parse_draft(
        r#"{"excerpt": "ok", "content": "ok", "title": "models love to add fields"}"#,
    );
    assert!(err.is_err());
}

#[test]
fn mistyped_field_is_rejected() {
    assert!(parse_draft(r#"{"excerpt": 42, "content": "ok"}"#).is_err());
    assert!(parse_draft(r#"{"excerpt": "ok", "content": null}"#).is_err());
    assert!(parse_draft(r#"{"excerpt": "ok", "content": ["a", "b"]}"#).is_err());
}

#[test]
fn non_json_text_is_rejected() {
    assert!(parse_draft("Sure! Here is your draft:").is_err());
    assert!(parse_draft("").is_err());
    assert!(parse_draft("[]").is_err());
}
