use crate::importer::{ListItem, NoteBody};
use crate::markup::Markup;

/// Render a note body as the inner markup of `<en-note>`.
pub fn render_body(body: NoteBody<'_>) -> Markup {
    match body {
        NoteBody::Text(text) => render_text(text),
        NoteBody::Checklist(items) => render_checklist(items),
        NoteBody::Empty => Markup::new(),
    }
}

pub fn render_text(text: &str) -> Markup {
    let mut m = Markup::new();
    m.push_paragraphs(text);
    m
}

/// One `<div>` per item: an `<en-todo>` box followed by the item text.
pub fn render_checklist(items: &[ListItem]) -> Markup {
    let mut m = Markup::new();
    for item in items {
        let mut row = Markup::new();
        row.push_empty_element(
            "en-todo",
            &[("checked", if item.is_checked { "true" } else { "false" })],
        );
        row.push_linkified(&item.text);
        m.push_element("div", &row);
    }
    m
}
