//! Answer envelope decoding.
//!
//! An assignment's answer arrives as `QuestionFormAnswers` XML. The task
//! writes its result as JSON into a single `FreeText` element; this module
//! pulls that text out and parses it.

use crate::error::DecodeError;
use crate::models::AnswerPayload;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::Value;

const FREE_TEXT: &[u8] = b"FreeText";

/// Decode the JSON object carried by the envelope's only `FreeText` field.
///
/// Fails with [`DecodeError::MultipleFreeText`] as soon as the whole
/// envelope has been scanned and more than one field was seen; no payload
/// is ever picked from such an envelope.
pub fn decode_answer(envelope: &str) -> Result<AnswerPayload, DecodeError> {
    let texts = free_text_contents(envelope)?;

    let text = match texts.len() {
        0 => return Err(DecodeError::NoFreeText),
        1 => &texts[0],
        n => return Err(DecodeError::MultipleFreeText(n)),
    };

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(AnswerPayload(map)),
        Ok(other) => Err(DecodeError::Payload(format!(
            "expected an object, found {}",
            json_kind(&other)
        ))),
        Err(e) => Err(DecodeError::Payload(e.to_string())),
    }
}

/// Text content of every `FreeText` element, in document order.
///
/// Text and CDATA segments inside one element are joined with a space.
fn free_text_contents(envelope: &str) -> Result<Vec<String>, DecodeError> {
    let mut reader = Reader::from_str(envelope);
    let mut fields = Vec::new();
    // Segments of the FreeText element currently open, if any.
    let mut current: Option<Vec<String>> = None;
    let mut depth = 0usize;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| DecodeError::Envelope(e.to_string()))?;

        match event {
            Event::Start(ref e) => {
                depth += 1;
                if e.local_name().as_ref() == FREE_TEXT {
                    current = Some(Vec::new());
                }
            }
            Event::Empty(ref e) if e.local_name().as_ref() == FREE_TEXT => {
                fields.push(String::new());
            }
            Event::End(ref e) => {
                depth = depth.saturating_sub(1);
                if e.local_name().as_ref() == FREE_TEXT {
                    if let Some(segments) = current.take() {
                        fields.push(segments.join(" "));
                    }
                }
            }
            Event::Text(ref t) => {
                if let Some(ref mut segments) = current {
                    let text = t
                        .unescape()
                        .map_err(|e| DecodeError::Envelope(e.to_string()))?;
                    segments.push(text.into_owned());
                }
            }
            Event::CData(c) => {
                if let Some(ref mut segments) = current {
                    let raw = c.into_inner();
                    let text = std::str::from_utf8(&raw)
                        .map_err(|e| DecodeError::Envelope(e.to_string()))?;
                    segments.push(text.to_string());
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if current.is_some() {
        return Err(DecodeError::Envelope("unclosed FreeText element".to_string()));
    }
    if depth != 0 {
        return Err(DecodeError::Envelope(format!("{} unclosed element(s)", depth)));
    }

    Ok(fields)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str =
        "http://mechanicalturk.amazonaws.com/AWSMechanicalTurkDataSchemas/2005-10-01/QuestionFormAnswers.xsd";

    fn envelope(answers: &[&str]) -> String {
        let body: String = answers
            .iter()
            .enumerate()
            .map(|(i, free_text)| {
                format!(
                    "<Answer><QuestionIdentifier>q{}</QuestionIdentifier><FreeText>{}</FreeText></Answer>",
                    i, free_text
                )
            })
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?><QuestionFormAnswers xmlns="{}">{}</QuestionFormAnswers>"#,
            NS, body
        )
    }

    #[test]
    fn test_decodes_single_free_text() {
        let xml = envelope(&[r#"{"label": "cat", "confidence": 3}"#]);
        let payload = decode_answer(&xml).unwrap();

        assert_eq!(payload.0.len(), 2);
        assert_eq!(payload.0.get("label").and_then(|v| v.as_str()), Some("cat"));
        assert_eq!(payload.0.get("confidence").and_then(|v| v.as_i64()), Some(3));
    }

    #[test]
    fn test_unescapes_entities() {
        let xml = envelope(&["{&quot;note&quot;: &quot;a &amp; b &lt; c&quot;}"]);
        let payload = decode_answer(&xml).unwrap();
        assert_eq!(
            payload.0.get("note").and_then(|v| v.as_str()),
            Some("a & b < c")
        );
    }

    #[test]
    fn test_reads_cdata() {
        let xml = envelope(&[r#"<![CDATA[{"tags": ["x", "y"]}]]>"#]);
        let payload = decode_answer(&xml).unwrap();
        assert_eq!(payload.0.get("tags").and_then(|v| v.as_array()).map(|a| a.len()), Some(2));
    }

    #[test]
    fn test_two_free_text_fields_fail_fast() {
        let xml = envelope(&[r#"{"a": 1}"#, r#"{"b": 2}"#]);
        assert_eq!(decode_answer(&xml), Err(DecodeError::MultipleFreeText(2)));
    }

    #[test]
    fn test_multiplicity_wins_over_bad_json() {
        let xml = envelope(&["not json", r#"{"b": 2}"#, "also not json"]);
        assert_eq!(decode_answer(&xml), Err(DecodeError::MultipleFreeText(3)));
    }

    #[test]
    fn test_no_free_text() {
        let xml = format!(
            r#"<QuestionFormAnswers xmlns="{}"><Answer><QuestionIdentifier>q</QuestionIdentifier><SelectionIdentifier>yes</SelectionIdentifier></Answer></QuestionFormAnswers>"#,
            NS
        );
        assert_eq!(decode_answer(&xml), Err(DecodeError::NoFreeText));
    }

    #[test]
    fn test_empty_free_text_is_bad_payload() {
        let xml = format!(
            r#"<QuestionFormAnswers xmlns="{}"><Answer><FreeText/></Answer></QuestionFormAnswers>"#,
            NS
        );
        assert!(matches!(decode_answer(&xml), Err(DecodeError::Payload(_))));
    }

    #[test]
    fn test_invalid_json() {
        let xml = envelope(&["{label: cat"]);
        assert!(matches!(decode_answer(&xml), Err(DecodeError::Payload(_))));
    }

    #[test]
    fn test_non_object_json() {
        let xml = envelope(&["[1, 2, 3]"]);
        assert_eq!(
            decode_answer(&xml),
            Err(DecodeError::Payload("expected an object, found an array".to_string()))
        );
    }

    #[test]
    fn test_malformed_xml() {
        let result = decode_answer("<QuestionFormAnswers><Answer><FreeText>{}</Answer>");
        assert!(matches!(result, Err(DecodeError::Envelope(_))));
    }

    #[test]
    fn test_unclosed_outer_element() {
        let result =
            decode_answer(r#"<QuestionFormAnswers><Answer><FreeText>{"a":1}</FreeText></Answer>"#);
        assert!(matches!(result, Err(DecodeError::Envelope(_))));
    }
}
