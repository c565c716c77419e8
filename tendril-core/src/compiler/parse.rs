//! Template parser.

use serde::Serialize;

use super::CompileError;

/// One node of a parsed template.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TemplateNode {
    Element {
        tag: String,
        attrs: Vec<Attribute>,
        children: Vec<TemplateNode>,
    },
    Text {
        content: String,
    },
    Interpolation {
        path: String,
    },
}

/// One attribute of a template element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Attribute {
    /// `name="value"`, or a bare `name` with an empty value.
    Static { name: String, value: String },
    /// `:name="path"`
    Bind { name: String, path: String },
    /// `@event="path"`
    On { event: String, path: String },
}

/// Parse template source into its root nodes. Whitespace-only text is
/// dropped.
pub(crate) fn parse(source: &str) -> Result<Vec<TemplateNode>, CompileError> {
    let mut parser = Parser { source, pos: 0 };
    let roots = parser.parse_children(None)?;
    if roots.is_empty() {
        return Err(CompileError::EmptyTemplate);
    }
    Ok(roots)
}

struct Parser<'a> {
    source: &'a str,
    pos: usize,
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | ':' | '@' | '.')
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn starts_with(&self, pattern: &str) -> bool {
        self.rest().starts_with(pattern)
    }

    fn advance(&mut self, bytes: usize) {
        self.pos = (self.pos + bytes).min(self.source.len());
    }

    fn skip_whitespace(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.source.len() - trimmed.len();
    }

    fn read_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let end = rest.find(|ch: char| !pred(ch)).unwrap_or(rest.len());
        self.advance(end);
        &rest[..end]
    }

    /// Whether a `<` at the cursor opens a tag rather than being text.
    fn at_tag_open(&self) -> bool {
        let mut chars = self.rest().chars();
        chars.next() == Some('<') && chars.next().is_some_and(|ch| ch.is_ascii_alphabetic())
    }

    /// Parse nodes until the closing tag of `parent`, or the end of input
    /// at the top level.
    fn parse_children(&mut self, parent: Option<(&str, usize)>) -> Result<Vec<TemplateNode>, CompileError> {
        let mut nodes = Vec::new();

        loop {
            if self.rest().is_empty() {
                return match parent {
                    Some((tag, offset)) => Err(CompileError::UnclosedTag {
                        tag: tag.to_owned(),
                        offset,
                    }),
                    None => Ok(nodes),
                };
            }

            if self.starts_with("</") {
                let offset = self.pos;
                self.advance(2);
                let found = self.read_while(is_name_char);
                self.skip_whitespace();
                if self.peek() != Some('>') {
                    return Err(CompileError::UnexpectedEof { offset: self.pos });
                }
                self.advance(1);

                return match parent {
                    Some((expected, _)) if expected == found => Ok(nodes),
                    Some((expected, _)) => Err(CompileError::MismatchedClosingTag {
                        expected: expected.to_owned(),
                        found: found.to_owned(),
                        offset,
                    }),
                    None => Err(CompileError::MismatchedClosingTag {
                        expected: String::new(),
                        found: found.to_owned(),
                        offset,
                    }),
                };
            }

            if self.starts_with("{{") {
                nodes.push(self.parse_interpolation()?);
            } else if self.at_tag_open() {
                nodes.push(self.parse_element()?);
            } else {
                let content = self.parse_text();
                if !content.trim().is_empty() {
                    nodes.push(TemplateNode::Text { content });
                }
            }
        }
    }

    fn parse_interpolation(&mut self) -> Result<TemplateNode, CompileError> {
        let offset = self.pos;
        self.advance(2);
        let Some(end) = self.rest().find("}}") else {
            return Err(CompileError::UnterminatedInterpolation { offset });
        };
        let path = self.rest()[..end].trim().to_owned();
        self.advance(end + 2);
        Ok(TemplateNode::Interpolation { path })
    }

    fn parse_text(&mut self) -> String {
        // A lone `<` that does not open a tag is ordinary text.
        let start = self.pos;
        if self.starts_with("<") {
            self.advance(1);
        }
        while !self.rest().is_empty() && !self.starts_with("{{") && !self.starts_with("</") && !self.at_tag_open() {
            let width = self.peek().map_or(1, char::len_utf8);
            self.advance(width);
        }
        self.source[start..self.pos].to_owned()
    }

    fn parse_element(&mut self) -> Result<TemplateNode, CompileError> {
        let offset = self.pos;
        self.advance(1);
        let tag = self.read_while(is_name_char);
        let mut attrs = Vec::new();

        loop {
            self.skip_whitespace();
            if self.rest().is_empty() {
                return Err(CompileError::UnexpectedEof { offset: self.pos });
            }
            if self.starts_with("/>") {
                self.advance(2);
                return Ok(TemplateNode::Element {
                    tag: tag.to_owned(),
                    attrs,
                    children: Vec::new(),
                });
            }
            if self.starts_with(">") {
                self.advance(1);
                break;
            }
            attrs.push(self.parse_attribute()?);
        }

        let children = self.parse_children(Some((tag, offset)))?;
        Ok(TemplateNode::Element {
            tag: tag.to_owned(),
            attrs,
            children,
        })
    }

    fn parse_attribute(&mut self) -> Result<Attribute, CompileError> {
        let offset = self.pos;
        let name = self.read_while(is_name_char);
        if name.is_empty() {
            return Err(CompileError::InvalidAttribute { offset });
        }

        self.skip_whitespace();
        let value = if self.starts_with("=") {
            self.advance(1);
            self.skip_whitespace();
            let quote = match self.peek() {
                Some(quote @ ('"' | '\'')) => quote,
                Some(_) => return Err(CompileError::InvalidAttribute { offset }),
                None => return Err(CompileError::UnexpectedEof { offset: self.pos }),
            };
            self.advance(1);
            let Some(end) = self.rest().find(quote) else {
                return Err(CompileError::UnexpectedEof { offset: self.source.len() });
            };
            let value = self.rest()[..end].to_owned();
            self.advance(end + 1);
            value
        } else {
            String::new()
        };

        let attribute = if let Some(name) = name.strip_prefix(':') {
            Attribute::Bind {
                name: name.to_owned(),
                path: value.trim().to_owned(),
            }
        } else if let Some(event) = name.strip_prefix('@') {
            Attribute::On {
                event: event.to_owned(),
                path: value.trim().to_owned(),
            }
        } else {
            Attribute::Static {
                name: name.to_owned(),
                value,
            }
        };

        match &attribute {
            Attribute::Bind { name, path } | Attribute::On { event: name, path } if name.is_empty() || path.is_empty() => {
                Err(CompileError::InvalidAttribute { offset })
            }
            _ => Ok(attribute),
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn element(tag: &str, attrs: Vec<Attribute>, children: Vec<TemplateNode>) -> TemplateNode {
        TemplateNode::Element {
            tag: tag.into(),
            attrs,
            children,
        }
    }

    fn text(content: &str) -> TemplateNode {
        TemplateNode::Text { content: content.into() }
    }

    #[test]
    fn parses_nested_elements_and_text() {
        let roots = parse("<div><p>Hello</p> <span>x</span></div>").expect("parse");
        assert_eq!(
            roots,
            vec![element(
                "div",
                vec![],
                vec![
                    element("p", vec![], vec![text("Hello")]),
                    element("span", vec![], vec![text("x")]),
                ]
            )]
        );
    }

    #[test]
    fn parses_interpolation_inside_text() {
        let roots = parse("<p>Hi {{ user.name }}!</p>").expect("parse");
        assert_eq!(
            roots,
            vec![element(
                "p",
                vec![],
                vec![
                    text("Hi "),
                    TemplateNode::Interpolation { path: "user.name".into() },
                    text("!"),
                ]
            )]
        );
    }

    #[test]
    fn parses_attribute_kinds() {
        let roots = parse(r#"<button class="primary" :title="label" @click="onTap" disabled/>"#).expect("parse");
        let TemplateNode::Element { attrs, children, .. } = &roots[0] else {
            panic!("expected element");
        };
        assert!(children.is_empty());
        assert_eq!(
            attrs,
            &vec![
                Attribute::Static { name: "class".into(), value: "primary".into() },
                Attribute::Bind { name: "title".into(), path: "label".into() },
                Attribute::On { event: "click".into(), path: "onTap".into() },
                Attribute::Static { name: "disabled".into(), value: String::new() },
            ]
        );
    }

    #[test]
    fn lone_angle_bracket_is_text() {
        let roots = parse("<p>1 < 2</p>").expect("parse");
        assert_eq!(roots, vec![element("p", vec![], vec![text("1 < 2")])]);
    }

    #[test]
    fn reports_unclosed_tag() {
        assert_eq!(
            parse("<div><p></p>"),
            Err(CompileError::UnclosedTag { tag: "div".into(), offset: 0 })
        );
    }

    #[test]
    fn reports_mismatched_closing_tag() {
        assert_eq!(
            parse("<div></span>"),
            Err(CompileError::MismatchedClosingTag {
                expected: "div".into(),
                found: "span".into(),
                offset: 5,
            })
        );
    }

    #[test]
    fn reports_unterminated_interpolation() {
        assert_eq!(
            parse("<p>{{ name </p>"),
            Err(CompileError::UnterminatedInterpolation { offset: 3 })
        );
    }

    #[test]
    fn reports_unquoted_attribute() {
        assert_eq!(parse("<p class=x></p>"), Err(CompileError::InvalidAttribute { offset: 3 }));
        assert_eq!(parse("<p :=\"x\"></p>"), Err(CompileError::InvalidAttribute { offset: 3 }));
    }

    #[test]
    fn whitespace_only_template_is_empty() {
        assert_eq!(parse(" \n "), Err(CompileError::EmptyTemplate));
    }

    #[test]
    fn ast_serializes_with_type_tags() {
        let roots = parse("<b :id=\"key\">{{ x }}</b>").expect("parse");
        let json = serde_json::to_value(&roots).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!([{
                "type": "element",
                "tag": "b",
                "attrs": [{ "kind": "bind", "name": "id", "path": "key" }],
                "children": [{ "type": "interpolation", "path": "x" }]
            }])
        );
    }
}
