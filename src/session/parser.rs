//! Best-effort parser for the simulator's session text blob.
//!
//! The blob looks like YAML but is not: indentation widths vary between
//! simulator builds, list items sometimes carry inline keys, and values are
//! unescaped. A conforming YAML grammar rejects real captures, so this parser
//! is a stack-based reducer instead. Every structural ambiguity (empty-valued
//! key, bare dash) is resolved by peeking at the next meaningful line: a
//! leading `-` there means the nested container is an array, anything else
//! means an object.
//!
//! The parser never fails. Lines that make no sense in their context (a dash
//! outside an array, a mapping line inside an array, a line without a colon)
//! are dropped and parsing continues. That leniency is deliberate: the
//! upstream format carries no stability contract, and a snapshot with a few
//! dropped lines is far more useful than no snapshot at all.

use tracing::trace;

use super::{SessionValue, scalar};

/// One non-blank line of the blob: leading-whitespace width plus trimmed text.
struct RawLine {
    indent: i32,
    text: String,
}

/// Container under construction.
enum Container {
    Object(Vec<(String, SessionValue)>),
    Array(Vec<SessionValue>),
}

impl Container {
    fn into_value(self) -> SessionValue {
        match self {
            Container::Object(entries) => SessionValue::Object(entries),
            Container::Array(items) => SessionValue::Array(items),
        }
    }
}

/// How a finished container joins its parent when its frame closes.
enum Attach {
    Root,
    Key(String),
    Element,
}

/// An entry on the active nesting stack.
///
/// A frame is closed once a later line's indent is less than or equal to the
/// frame's own indent. The root frame sits at indent -1 and never closes.
struct Frame {
    indent: i32,
    container: Container,
    attach: Attach,
}

/// Parse a session text blob into a [`SessionValue`] tree.
///
/// The result is always an object at the root. This function does not fail:
/// arbitrarily malformed input yields a (possibly empty) object, and parsing
/// the same text twice yields structurally equal trees.
pub fn parse_session(text: &str) -> SessionValue {
    let lines = split_lines(text);
    let mut stack = vec![Frame {
        indent: -1,
        container: Container::Object(Vec::new()),
        attach: Attach::Root,
    }];

    for (i, line) in lines.iter().enumerate() {
        // Close every scope this line's indent has stepped out of.
        while stack.len() > 1
            && line.indent <= stack.last().map_or(i32::MIN, |frame| frame.indent)
        {
            close_frame(&mut stack);
        }

        // Blank lines were dropped at split time, so the lookahead target is
        // simply the next element.
        let next = lines.get(i + 1);

        if let Some(rest) = line.text.strip_prefix('-') {
            handle_list_line(&mut stack, line, rest.trim(), next);
        } else {
            handle_mapping_line(&mut stack, line, next);
        }
    }

    while stack.len() > 1 {
        close_frame(&mut stack);
    }

    match stack.pop() {
        Some(root) => root.container.into_value(),
        None => SessionValue::Object(Vec::new()),
    }
}

/// Split the blob into non-blank lines, stripping carriage returns and
/// recording the leading-whitespace width (spaces and tabs each count one).
fn split_lines(text: &str) -> Vec<RawLine> {
    let mut lines = Vec::new();
    for raw in text.split('\n') {
        let raw = raw.replace('\r', "");
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        let indent = raw.chars().take_while(|&c| c == ' ' || c == '\t').count() as i32;
        lines.push(RawLine { indent, text: trimmed.to_string() });
    }
    lines
}

/// Pop the top frame and attach its finished container to the new top.
fn close_frame(stack: &mut Vec<Frame>) {
    let Some(frame) = stack.pop() else { return };
    let value = frame.container.into_value();
    let Some(parent) = stack.last_mut() else { return };
    match (frame.attach, &mut parent.container) {
        (Attach::Key(key), Container::Object(entries)) => entries.push((key, value)),
        (Attach::Element, Container::Array(items)) => items.push(value),
        // Root never closes; a kind mismatch cannot be built by the handlers
        // below, but dropping the value beats corrupting the parent.
        _ => {}
    }
}

/// Handle a line whose trimmed text starts with the `-` list marker.
fn handle_list_line(
    stack: &mut Vec<Frame>,
    line: &RawLine,
    item_text: &str,
    next: Option<&RawLine>,
) {
    let Some(top) = stack.last_mut() else { return };
    if !matches!(top.container, Container::Array(_)) {
        // A dash outside an active array context is malformed; drop it
        // rather than promoting the container.
        trace!(indent = line.indent, "dropping list item outside array context");
        return;
    }

    if item_text.is_empty() {
        // Bare dash: the element is itself a container; its kind comes from
        // the next meaningful line.
        let (next_is_array, child_indent) = lookahead(next, line.indent);
        stack.push(Frame {
            indent: child_indent,
            container: new_container(next_is_array),
            attach: Attach::Element,
        });
        return;
    }

    let Some(colon) = item_text.find(':') else {
        // No colon: a bare scalar element.
        if let Container::Array(items) = &mut top.container {
            items.push(scalar::classify(item_text));
        }
        return;
    };

    let key = item_text[..colon].trim().to_string();
    let raw_value = item_text[colon + 1..].trim();

    if raw_value.is_empty() {
        // `- Key:` opens a single-key wrapper object whose value is a nested
        // container. Two frames: the wrapper at the dash line's indent, the
        // child at the continuation indent.
        let (next_is_array, child_indent) = lookahead(next, line.indent);
        stack.push(Frame {
            indent: line.indent,
            container: Container::Object(Vec::new()),
            attach: Attach::Element,
        });
        stack.push(Frame {
            indent: child_indent,
            container: new_container(next_is_array),
            attach: Attach::Key(key),
        });
        return;
    }

    let value = scalar::classify(raw_value);
    if next.is_some_and(|peek| peek.indent > line.indent) {
        // Deeper-indented continuation lines fold into this element, so the
        // wrapper object stays open on the stack.
        stack.push(Frame {
            indent: line.indent,
            container: Container::Object(vec![(key, value)]),
            attach: Attach::Element,
        });
    } else if let Container::Array(items) = &mut top.container {
        items.push(SessionValue::Object(vec![(key, value)]));
    }
}

/// Handle a plain `Key: value` mapping line.
fn handle_mapping_line(stack: &mut Vec<Frame>, line: &RawLine, next: Option<&RawLine>) {
    let Some(top) = stack.last_mut() else { return };
    if matches!(top.container, Container::Array(_)) {
        // A mapping line where an array element was expected is malformed.
        trace!(indent = line.indent, "dropping mapping line inside array context");
        return;
    }

    let Some(colon) = line.text.find(':') else {
        trace!(indent = line.indent, "dropping line without key separator");
        return;
    };

    let key = line.text[..colon].trim().to_string();
    let raw_value = line.text[colon + 1..].trim();

    if raw_value.is_empty() {
        // The child container scope is anchored at the key line's indent so
        // that children indented past the key nest under it and the next
        // sibling key at the same indent closes it.
        let (next_is_array, _) = lookahead(next, line.indent);
        stack.push(Frame {
            indent: line.indent,
            container: new_container(next_is_array),
            attach: Attach::Key(key),
        });
    } else if let Container::Object(entries) = &mut top.container {
        entries.push((key, scalar::classify(raw_value)));
    }
}

fn new_container(is_array: bool) -> Container {
    if is_array { Container::Array(Vec::new()) } else { Container::Object(Vec::new()) }
}

/// Peek at the next meaningful line: does it open an array, and at what
/// indent does the nested scope sit? With no further content the scope is
/// anchored one column past the current line.
fn lookahead(next: Option<&RawLine>, current_indent: i32) -> (bool, i32) {
    match next {
        Some(peek) => (peek.text.starts_with('-'), peek.indent),
        None => (false, current_indent + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn obj(entries: Vec<(&str, SessionValue)>) -> SessionValue {
        SessionValue::Object(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    #[test]
    fn two_level_round_trip() {
        let text = "WeekendInfo:\n\
                    \x20TrackName: \"Summit Point\"\n\
                    \x20TrackLength: 3.23\n\
                    Drivers:\n\
                    \x20- CarNumber: 07\n\
                    \x20  UserName: Alice\n";

        let parsed = parse_session(text);

        let expected = obj(vec![
            (
                "WeekendInfo",
                obj(vec![
                    ("TrackName", SessionValue::String("Summit Point".to_string())),
                    ("TrackLength", SessionValue::Float(3.23)),
                ]),
            ),
            (
                "Drivers",
                SessionValue::Array(vec![obj(vec![
                    // Unquoted in source, so the scalar codec sees a number
                    // and the padding is lost.
                    ("CarNumber", SessionValue::Int(7)),
                    ("UserName", SessionValue::String("Alice".to_string())),
                ])]),
            ),
        ]);

        assert_eq!(parsed, expected);
    }

    #[test]
    fn root_is_always_an_object() {
        assert_eq!(parse_session(""), SessionValue::Object(Vec::new()));
        assert_eq!(parse_session("\n\n   \n"), SessionValue::Object(Vec::new()));
        assert!(matches!(parse_session("- orphan item"), SessionValue::Object(_)));
    }

    #[test]
    fn top_level_scalars() {
        let parsed = parse_session("BuildVersion: 2025.09.09.01\nSessionLaps: unlimited\nSkies: 1\n");
        assert_eq!(
            parsed,
            obj(vec![
                ("BuildVersion", SessionValue::String("2025.09.09.01".to_string())),
                ("SessionLaps", SessionValue::String("unlimited".to_string())),
                ("Skies", SessionValue::Int(1)),
            ])
        );
    }

    #[test]
    fn carriage_returns_are_stripped() {
        let parsed = parse_session("A: 1\r\nB: 2\r\n");
        assert_eq!(parsed, obj(vec![("A", SessionValue::Int(1)), ("B", SessionValue::Int(2))]));
    }

    #[test]
    fn blank_lines_do_not_affect_nesting() {
        let text = "Weekend:\n\n \n TrackName: bathurst\n\n Turns: 23\n";
        let parsed = parse_session(text);
        assert_eq!(
            parsed,
            obj(vec![(
                "Weekend",
                obj(vec![
                    ("TrackName", SessionValue::String("bathurst".to_string())),
                    ("Turns", SessionValue::Int(23)),
                ])
            )])
        );
    }

    #[test]
    fn sibling_keys_close_nested_scopes() {
        let text = "A:\n B:\n  C: 1\n D: 2\nE: 3\n";
        let parsed = parse_session(text);
        assert_eq!(
            parsed,
            obj(vec![
                (
                    "A",
                    obj(vec![
                        ("B", obj(vec![("C", SessionValue::Int(1))])),
                        ("D", SessionValue::Int(2)),
                    ])
                ),
                ("E", SessionValue::Int(3)),
            ])
        );
    }

    #[test]
    fn dash_outside_array_is_dropped() {
        // The root is an object, so a dash at the top level is malformed and
        // must not promote the root to an array.
        let parsed = parse_session("- CarNumber: 7\nTrackName: lime rock\n");
        assert_eq!(
            parsed,
            obj(vec![("TrackName", SessionValue::String("lime rock".to_string()))])
        );
    }

    #[test]
    fn mapping_line_inside_array_is_dropped() {
        let text = "Results:\n - Position: 1\n - Position: 2\n";
        let with_noise = "Results:\n - Position: 1\n Stray: oops\n - Position: 2\n";

        // The stray mapping line closes nothing and adds nothing; the second
        // dash still lands in the array.
        let parsed = parse_session(with_noise);
        assert_eq!(parsed, parse_session(text));
        let results = parsed.get("Results").expect("array should exist");
        assert_eq!(
            results,
            &SessionValue::Array(vec![
                obj(vec![("Position", SessionValue::Int(1))]),
                obj(vec![("Position", SessionValue::Int(2))]),
            ])
        );
    }

    #[test]
    fn bare_scalar_list_items() {
        let parsed = parse_session("Flags:\n - checkered\n - white\n - 3\n");
        assert_eq!(
            parsed.get("Flags"),
            Some(&SessionValue::Array(vec![
                SessionValue::String("checkered".to_string()),
                SessionValue::String("white".to_string()),
                SessionValue::Int(3),
            ]))
        );
    }

    #[test]
    fn multi_line_list_elements_fold_into_one_object() {
        let text = "Sessions:\n\
                    \x20- SessionNum: 0\n\
                    \x20  SessionType: Practice\n\
                    \x20- SessionNum: 1\n\
                    \x20  SessionType: Race\n";
        let parsed = parse_session(text);
        assert_eq!(
            parsed.get("Sessions"),
            Some(&SessionValue::Array(vec![
                obj(vec![
                    ("SessionNum", SessionValue::Int(0)),
                    ("SessionType", SessionValue::String("Practice".to_string())),
                ]),
                obj(vec![
                    ("SessionNum", SessionValue::Int(1)),
                    ("SessionType", SessionValue::String("Race".to_string())),
                ]),
            ]))
        );
    }

    #[test]
    fn empty_valued_key_followed_by_dash_opens_array() {
        let parsed = parse_session("Drivers:\n - 7\n");
        assert_eq!(parsed.get("Drivers"), Some(&SessionValue::Array(vec![SessionValue::Int(7)])));
    }

    #[test]
    fn empty_valued_key_at_end_of_input_yields_empty_object() {
        let parsed = parse_session("CarSetup:\n");
        assert_eq!(parsed.get("CarSetup"), Some(&SessionValue::Object(Vec::new())));
    }

    #[test]
    fn line_without_colon_is_dropped() {
        let parsed = parse_session("just some words\nTrackName: okayama\n");
        assert_eq!(
            parsed,
            obj(vec![("TrackName", SessionValue::String("okayama".to_string()))])
        );
    }

    #[test]
    fn value_with_colon_splits_on_first_colon() {
        let parsed = parse_session("SessionTime: 120.00 sec: extra\n");
        assert_eq!(
            parsed,
            obj(vec![("SessionTime", SessionValue::String("120.00 sec: extra".to_string()))])
        );
    }

    #[test]
    fn parse_is_idempotent() {
        let text = "WeekendInfo:\n TrackName: spa\nDrivers:\n - CarNumber: 07\n   UserName: Alice\n";
        assert_eq!(parse_session(text), parse_session(text));
    }

    proptest! {
        #[test]
        fn prop_parser_never_panics(text in ".*") {
            let _ = parse_session(&text);
        }

        #[test]
        fn prop_parser_never_panics_on_structured_noise(
            text in r"(\s*-?\s*[A-Za-z0-9]{0,8}:?\s*[A-Za-z0-9\.\x22]{0,8}\n){0,20}"
        ) {
            let first = parse_session(&text);
            let second = parse_session(&text);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_root_is_object(text in ".*") {
            prop_assert!(matches!(parse_session(&text), SessionValue::Object(_)));
        }
    }
}
