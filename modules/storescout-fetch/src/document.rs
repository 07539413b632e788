use scraper::{ElementRef, Html, Selector};
use tracing::warn;

/// Query-by-selector access to a fetched page. Stages depend on this
/// capability, never on a particular query engine or page structure.
pub trait Document {
    /// Text content of the first node matching `selector`.
    fn query(&self, selector: &str) -> Option<String>;
    /// Text content of every node matching `selector`.
    fn query_all(&self, selector: &str) -> Vec<String>;
    /// `attr` value of the first node matching `selector`.
    fn query_attr(&self, selector: &str, attr: &str) -> Option<String>;
    /// `attr` value of every node matching `selector`.
    fn query_attr_all(&self, selector: &str, attr: &str) -> Vec<String>;
    /// Sub-documents scoped to each node matching `selector`, so callers
    /// can run relative queries per row.
    fn fragments<'a>(&'a self, selector: &str) -> Vec<Box<dyn Document + 'a>>;
}

/// CSS-selector document backed by `scraper`.
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    pub fn parse(body: &str) -> Self {
        Self {
            html: Html::parse_document(body),
        }
    }
}

/// An invalid selector matches nothing; selectors are operator-supplied
/// configuration, so this is a logged condition rather than a panic.
fn compile(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(sel) => Some(sel),
        Err(e) => {
            warn!(selector, error = ?e, "invalid selector");
            None
        }
    }
}

fn text_of(el: &ElementRef) -> String {
    el.text().collect::<Vec<_>>().join(" ").trim().to_string()
}

fn first_text(scope: ElementRef<'_>, selector: &str) -> Option<String> {
    let sel = compile(selector)?;
    scope.select(&sel).next().map(|el| text_of(&el))
}

fn all_text(scope: ElementRef<'_>, selector: &str) -> Vec<String> {
    let Some(sel) = compile(selector) else {
        return Vec::new();
    };
    scope.select(&sel).map(|el| text_of(&el)).collect()
}

fn first_attr(scope: ElementRef<'_>, selector: &str, attr: &str) -> Option<String> {
    let sel = compile(selector)?;
    scope
        .select(&sel)
        .find_map(|el| el.value().attr(attr).map(str::to_string))
}

fn all_attr(scope: ElementRef<'_>, selector: &str, attr: &str) -> Vec<String> {
    let Some(sel) = compile(selector) else {
        return Vec::new();
    };
    scope
        .select(&sel)
        .filter_map(|el| el.value().attr(attr).map(str::to_string))
        .collect()
}

fn sub_fragments<'a>(scope: ElementRef<'a>, selector: &str) -> Vec<Box<dyn Document + 'a>> {
    let Some(sel) = compile(selector) else {
        return Vec::new();
    };
    scope
        .select(&sel)
        .map(|el| Box::new(Fragment { el }) as Box<dyn Document + 'a>)
        .collect()
}

impl Document for HtmlDocument {
    fn query(&self, selector: &str) -> Option<String> {
        first_text(self.html.root_element(), selector)
    }

    fn query_all(&self, selector: &str) -> Vec<String> {
        all_text(self.html.root_element(), selector)
    }

    fn query_attr(&self, selector: &str, attr: &str) -> Option<String> {
        first_attr(self.html.root_element(), selector, attr)
    }

    fn query_attr_all(&self, selector: &str, attr: &str) -> Vec<String> {
        all_attr(self.html.root_element(), selector, attr)
    }

    fn fragments<'a>(&'a self, selector: &str) -> Vec<Box<dyn Document + 'a>> {
        sub_fragments(self.html.root_element(), selector)
    }
}

/// A sub-tree of a parsed page, scoping queries to one element.
struct Fragment<'a> {
    el: ElementRef<'a>,
}

impl Document for Fragment<'_> {
    fn query(&self, selector: &str) -> Option<String> {
        first_text(self.el, selector)
    }

    fn query_all(&self, selector: &str) -> Vec<String> {
        all_text(self.el, selector)
    }

    fn query_attr(&self, selector: &str, attr: &str) -> Option<String> {
        first_attr(self.el, selector, attr)
    }

    fn query_attr_all(&self, selector: &str, attr: &str) -> Vec<String> {
        all_attr(self.el, selector, attr)
    }

    fn fragments<'a>(&'a self, selector: &str) -> Vec<Box<dyn Document + 'a>> {
        sub_fragments(self.el, selector)
    }
}
