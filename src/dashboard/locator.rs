//! Structural locator resolution.
//!
//! The widgets carry no stable identifiers, so each session snapshots the
//! rendered markup once and computes a root-relative structural path for
//! every configured widget: a chain of tag names, each annotated with a
//! 1-based sibling index whenever the parent holds more than one child of
//! that tag. The path stays valid for the session's lifetime as long as the
//! view's widget ordering is stable across reloads, a precondition the
//! callers rely on rather than verify here.
//!
//! Resolution is a pure function over the snapshot; nothing here touches
//! the live session.

use std::collections::HashMap;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::automation::{AutomationError, AutomationResult, Locator};

use super::view::ViewConfig;

/// Root-relative structural path of one widget, usable as an XPath.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetAddress(String);

impl WidgetAddress {
    pub fn as_xpath(&self) -> &str {
        &self.0
    }

    pub fn locator(&self) -> Locator {
        Locator::xpath(self.0.clone())
    }

    /// Locator for descendants of this widget matching an XPath suffix.
    pub fn descendants(&self, suffix: &str) -> Locator {
        Locator::xpath(format!("{}{suffix}", self.0))
    }
}

/// Logical widget name to resolved address, owned by one session.
pub type WidgetMap = HashMap<&'static str, WidgetAddress>;

fn parse_selector(css: &str) -> AutomationResult<Selector> {
    Selector::parse(css)
        .map_err(|e| AutomationError::Driver(format!("invalid selector '{css}': {e}")))
}

/// Computes the structural path from an element up to the document root.
fn structural_path(element: ElementRef<'_>) -> String {
    let mut components = Vec::new();
    let mut node = *element;

    loop {
        let Some(tag) = node.value().as_element().map(|e| e.name().to_string()) else {
            break;
        };
        match node.parent() {
            Some(parent) => {
                let same_tag: Vec<_> = parent
                    .children()
                    .filter(|child| {
                        child
                            .value()
                            .as_element()
                            .map_or(false, |e| e.name() == tag)
                    })
                    .map(|child| child.id())
                    .collect();
                if same_tag.len() > 1 {
                    let position = same_tag
                        .iter()
                        .position(|id| *id == node.id())
                        .map_or(1, |i| i + 1);
                    components.push(format!("{tag}[{position}]"));
                } else {
                    components.push(tag);
                }
                node = parent;
            }
            None => {
                components.push(tag);
                break;
            }
        }
    }

    components.reverse();
    format!("/{}", components.join("/"))
}

/// Address of the Nth element matching `css` in the snapshot, or `None`
/// when fewer than N+1 elements match.
pub fn nth_match_path(
    markup: &str,
    css: &str,
    ordinal: usize,
) -> AutomationResult<Option<WidgetAddress>> {
    let selector = parse_selector(css)?;
    let document = Html::parse_document(markup);
    Ok(document
        .select(&selector)
        .nth(ordinal)
        .map(|el| WidgetAddress(structural_path(el))))
}

/// Resolves every widget in the view's configuration table against one
/// markup snapshot. Fails when a configured widget is absent, since every
/// later interaction would dereference a dangling address.
pub fn resolve_widgets(markup: &str, view: &ViewConfig) -> AutomationResult<WidgetMap> {
    let selector = parse_selector(view.widget_matcher.selector())?;
    let document = Html::parse_document(markup);
    let matches: Vec<ElementRef<'_>> = document.select(&selector).collect();

    let mut map = WidgetMap::new();
    for slot in &view.widgets {
        let element = matches.get(slot.ordinal).ok_or_else(|| {
            AutomationError::NotFound(format!(
                "widget {} expected at ordinal {} but only {} matched {}",
                slot.logical,
                slot.ordinal,
                matches.len(),
                view.widget_matcher.selector()
            ))
        })?;
        let address = WidgetAddress(structural_path(*element));
        debug!("resolved {} -> {}", slot.logical, address.as_xpath());
        map.insert(slot.logical, address);
    }
    Ok(map)
}
