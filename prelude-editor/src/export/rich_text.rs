//! Rich text (editor HTML) to plain text
//!
//! Unordered list items become `• ` lines, ordered list items `N. ` lines,
//! `p`/`div`/`li`/`br` end a line, `style` and `script` are dropped, and runs
//! of three or more newlines collapse to a single blank line.

use scraper::{ElementRef, Html, Node};

#[derive(Clone, Copy)]
enum ListKind {
    None,
    Unordered,
    Ordered,
}

pub fn html_to_plain_text(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }

    let fragment = Html::parse_fragment(html);
    let mut out = String::new();
    walk(fragment.root_element(), ListKind::None, &mut out);

    collapse_blank_lines(&out).trim().to_string()
}

fn walk(element: ElementRef<'_>, list: ListKind, out: &mut String) {
    let mut ordinal = 0usize;

    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                match el.name() {
                    "style" | "script" => {}
                    "br" => out.push('\n'),
                    "p" | "div" => {
                        walk(child_el, list, out);
                        out.push('\n');
                    }
                    "ul" => walk(child_el, ListKind::Unordered, out),
                    "ol" => walk(child_el, ListKind::Ordered, out),
                    "li" => {
                        match list {
                            ListKind::Unordered => out.push_str("• "),
                            ListKind::Ordered => {
                                ordinal += 1;
                                out.push_str(&format!("{}. ", ordinal));
                            }
                            ListKind::None => {}
                        }
                        // List items are flattened to their text
                        text_content(child_el, out);
                        out.push('\n');
                    }
                    _ => walk(child_el, list, out),
                }
            }
            _ => {}
        }
    }
}

fn text_content(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if matches!(el.name(), "style" | "script") => {}
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    text_content(child_el, out);
                }
            }
            _ => {}
        }
    }
}

fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newlines = 0;
    for c in text.chars() {
        if c == '\n' {
            newlines += 1;
            if newlines <= 2 {
                out.push(c);
            }
        } else {
            newlines = 0;
            out.push(c);
        }
    }
    out
}
