// Selector matching over an html5ever DOM, trimmed down from crabquery.
//
// Supports a single compound selector built from tag, `.class`, `#id`,
// `[attr]` and `[attr=value]` parts. Combinators are not supported.

use std::{cell::Ref, collections::HashMap, sync::Arc};

use html5ever::{
    driver::ParseOpts, parse_document, tendril::TendrilSink, tree_builder::TreeBuilderOpts,
};
use markup5ever::{Attribute, QualName};
use markup5ever_arcdom::{ArcDom, Handle, NodeData};

use crate::ParseError;

pub struct Document {
    doc: ArcDom,
}

fn default_parse_opts() -> ParseOpts {
    ParseOpts {
        tree_builder: TreeBuilderOpts {
            drop_doctype: true,
            ..Default::default()
        },
        ..Default::default()
    }
}

impl TryFrom<&str> for Document {
    type Error = ParseError;

    fn try_from(input: &str) -> Result<Self, Self::Error> {
        let doc = parse_document(ArcDom::default(), default_parse_opts())
            .from_utf8()
            .read_from(&mut input.as_bytes())?;

        if !doc.errors.is_empty() {
            tracing::debug!(errors = doc.errors.len(), "recovered from markup errors");
        }

        let has_root = doc
            .document
            .children
            .borrow()
            .iter()
            .any(|node| matches!(node.data, NodeData::Element { .. }));

        if !has_root {
            return Err(ParseError::NoRoot);
        }

        Ok(Self { doc })
    }
}

impl Document {
    pub fn select(&self, selector: impl Into<Selector>) -> Vec<Element> {
        let sel: Selector = selector.into();
        sel.find(self.doc.document.children.borrow())
    }
}

#[derive(Debug, PartialEq, Clone)]
enum AttributeSpec {
    Present,
    Exact(String),
}

impl AttributeSpec {
    fn parse(spec: &str) -> (String, Self) {
        match spec.split_once('=') {
            Some((key, value)) => (
                key.to_string(),
                AttributeSpec::Exact(value.trim_matches('"').to_string()),
            ),
            None => (spec.to_string(), AttributeSpec::Present),
        }
    }

    fn matches(&self, other: &str) -> bool {
        match self {
            AttributeSpec::Present => true,
            AttributeSpec::Exact(v) => other == v,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Default)]
struct Matcher {
    tag: Option<String>,
    class: Vec<String>,
    id: Vec<String>,
    attribute: HashMap<String, AttributeSpec>,
}

impl From<&str> for Matcher {
    fn from(input: &str) -> Self {
        let mut segments = vec![];
        let mut buf = String::new();

        for c in input.chars() {
            match c {
                '#' | '.' | '[' => {
                    segments.push(std::mem::take(&mut buf));
                }
                ']' => {
                    segments.push(std::mem::take(&mut buf));
                    continue;
                }
                _ => {}
            };

            buf.push(c);
        }
        segments.push(buf);

        let mut res = Self::default();

        for segment in segments {
            match segment.chars().next() {
                Some('#') => res.id.push(segment[1..].to_string()),
                Some('.') => res.class.push(segment[1..].to_string()),
                Some('[') => {
                    let (key, spec) = AttributeSpec::parse(&segment[1..]);
                    res.attribute.insert(key, spec);
                }
                None => {}
                _ => res.tag = Some(segment),
            }
        }

        res
    }
}

impl Matcher {
    fn matches(&self, name: &QualName, attrs: Ref<'_, Vec<Attribute>>) -> bool {
        if let Some(tag) = &self.tag {
            if &*name.local != tag.as_str() {
                return false;
            }
        }

        let listed = |attr: &str, wanted: &[String]| {
            if wanted.is_empty() {
                return true;
            }

            match get_attr(&attrs, attr) {
                Some(value) => {
                    let values = value.split_whitespace().collect::<Vec<_>>();
                    wanted.iter().all(|w| values.contains(&w.as_str()))
                }
                None => false,
            }
        };

        if !listed("id", &self.id) || !listed("class", &self.class) {
            return false;
        }

        self.attribute
            .iter()
            .all(|(key, spec)| match get_attr(&attrs, key) {
                Some(value) => spec.matches(&value),
                None => false,
            })
    }
}

#[derive(Debug, PartialEq)]
pub struct Selector {
    matcher: Matcher,
}

impl From<&str> for Selector {
    fn from(input: &str) -> Self {
        Selector {
            matcher: Matcher::from(input.trim()),
        }
    }
}

fn get_attr(attrs: &Ref<'_, Vec<Attribute>>, name: &str) -> Option<String> {
    attrs
        .iter()
        .find(|attr| &*attr.name.local == name)
        .map(|attr| attr.value.to_string())
}

impl Selector {
    /// Collects matching nodes of `elements` and their descendants in
    /// document order.
    fn find_nodes(&self, elements: &[Handle], acc: &mut Vec<Handle>) {
        for el in elements {
            if let NodeData::Element {
                ref name,
                ref attrs,
                ..
            } = el.data
            {
                if self.matcher.matches(name, attrs.borrow()) {
                    acc.push(Arc::clone(el));
                }
            }

            let children: Vec<_> = el.children.borrow().iter().map(Arc::clone).collect();
            self.find_nodes(&children, acc);
        }
    }

    fn find(&self, elements: Ref<'_, Vec<Handle>>) -> Vec<Element> {
        let elements: Vec<_> = elements.iter().map(Arc::clone).collect();

        let mut acc = vec![];
        self.find_nodes(&elements, &mut acc);

        acc.iter().map(Element::from).collect()
    }
}

#[derive(Debug)]
pub struct Element {
    handle: Handle,
}

impl From<&Handle> for Element {
    fn from(e: &Handle) -> Self {
        Element {
            handle: Arc::clone(e),
        }
    }
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<String> {
        match self.handle.data {
            NodeData::Element { ref attrs, .. } => get_attr(&attrs.borrow(), name),
            _ => None,
        }
    }

    /// Concatenated text of every descendant text node.
    pub fn text(&self) -> String {
        fn collect(handle: &Handle, out: &mut String) {
            for child in handle.children.borrow().iter() {
                match child.data {
                    NodeData::Text { ref contents } => out.push_str(&contents.borrow()),
                    _ => collect(child, out),
                }
            }
        }

        let mut res = String::new();
        collect(&self.handle, &mut res);
        res
    }

    pub fn select(&self, selector: impl Into<Selector>) -> Vec<Element> {
        let sel: Selector = selector.into();
        sel.find(self.handle.children.borrow())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static PAGE: &str = r#"
        <html><body>
          <ul id="guide" class="list main">
            <li class="item" data-testid="rating-item"><span class="label">First</span></li>
            <li class="item other" data-testid="rating-item-extra"><span class="label">Second</span></li>
            <li class="item"><span class="label">Third <b>bold</b></span></li>
          </ul>
        </body></html>
    "#;

    fn texts(elements: &[Element]) -> Vec<String> {
        elements.iter().map(|e| e.text().trim().to_string()).collect()
    }

    #[test]
    fn selects_by_class_in_document_order() {
        let doc = Document::try_from(PAGE).unwrap();

        assert_eq!(texts(&doc.select("li.item")), vec!["First", "Second", "Third bold"]);
    }

    #[test]
    fn exact_attribute_requires_the_attribute() {
        let doc = Document::try_from(PAGE).unwrap();

        assert_eq!(texts(&doc.select("[data-testid=rating-item]")), vec!["First"]);
        assert_eq!(texts(&doc.select("li[data-testid]")), vec!["First", "Second"]);
        assert!(doc.select("li[data-testid=rating]").is_empty());
    }

    #[test]
    fn compound_selector_needs_every_part() {
        let doc = Document::try_from(PAGE).unwrap();

        assert_eq!(doc.select("ul#guide.main").len(), 1);
        assert!(doc.select("ul#guide.missing").is_empty());
        assert!(doc.select("ol#guide").is_empty());
    }

    #[test]
    fn nested_matches_are_returned_once_in_document_order() {
        let doc = Document::try_from(
            r#"<div class="x" id="outer"><div class="x" id="inner"><p>one</p></div></div>
               <div class="x" id="last"></div>"#,
        )
        .unwrap();

        let ids: Vec<_> = doc
            .select("div.x")
            .iter()
            .filter_map(|e| e.attr("id"))
            .collect();

        assert_eq!(ids, vec!["outer", "inner", "last"]);
    }

    #[test]
    fn element_select_searches_descendants_only() {
        let doc = Document::try_from(PAGE).unwrap();
        let items = doc.select("li.other");

        assert_eq!(items.len(), 1);
        assert_eq!(texts(&items[0].select(".label")), vec!["Second"]);
        assert!(items[0].select("li").is_empty());
        assert_eq!(items[0].attr("data-testid").as_deref(), Some("rating-item-extra"));
    }

    #[test]
    fn text_decodes_entities() {
        let doc = Document::try_from("<p class=\"x\">Violence &amp; Gore</p>").unwrap();

        assert_eq!(texts(&doc.select("p.x")), vec!["Violence & Gore"]);
    }
}
