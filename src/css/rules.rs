//! Minimal stylesheet object model
//!
//! A [`RuleList`] is the ordered, mutable sequence of rules of one
//! stylesheet. Parsing only goes as deep as inlining needs: style rules and
//! `@font-face` rules expose their declarations, `@import` rules their target,
//! `@media` rules their nested list, and every other construct is carried as
//! opaque text.
//!
//! Every parsed rule remembers its source text. A rule that is never
//! rewritten serializes back to exactly that text.

use std::borrow::Cow;

use super::scanner::{
    find_block_end, find_top_level, skip_whitespace_and_comments, split_top_level,
};
use super::value_parser::{extract_css_url, serialize_url};

/// One `property: value [!important]` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

impl Declaration {
    fn to_css(&self) -> String {
        if self.important {
            format!("{}:{} !important", self.property, self.value)
        } else {
            format!("{}:{}", self.property, self.value)
        }
    }
}

/// Ordered declaration block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Declarations(Vec<Declaration>);

impl Declarations {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last declaration of `property` (later declarations win)
    #[must_use]
    pub fn get_declaration(&self, property: &str) -> Option<&Declaration> {
        self.0
            .iter()
            .rev()
            .find(|decl| decl.property.eq_ignore_ascii_case(property))
    }

    #[must_use]
    pub fn get(&self, property: &str) -> Option<&str> {
        self.get_declaration(property).map(|decl| decl.value.as_str())
    }

    /// Set `property`, keeping its position and `!important` flag if present
    pub fn set(&mut self, property: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .0
            .iter_mut()
            .rev()
            .find(|decl| decl.property.eq_ignore_ascii_case(property))
        {
            Some(decl) => decl.value = value,
            None => self.0.push(Declaration {
                property: property.to_ascii_lowercase(),
                value,
                important: false,
            }),
        }
    }

    pub fn push(&mut self, declaration: Declaration) {
        self.0.push(declaration);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Declaration> {
        self.0.iter()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn to_css_text(&self) -> String {
        self.0
            .iter()
            .map(Declaration::to_css)
            .collect::<Vec<_>>()
            .join(";")
    }
}

fn strip_important(value: &str) -> (&str, bool) {
    let trimmed = value.trim_end();
    let lower = trimmed.to_ascii_lowercase();
    if let Some(before) = lower.strip_suffix("important") {
        let before = before.trim_end();
        if let Some(rest) = before.strip_suffix('!') {
            return (trimmed[..rest.len()].trim_end(), true);
        }
    }
    (trimmed, false)
}

/// Parse the inside of a `{ ... }` declaration block
#[must_use]
pub fn parse_declarations(block: &str) -> Declarations {
    let mut declarations = Declarations::new();

    for part in split_top_level(block, b';') {
        let start = skip_whitespace_and_comments(part, 0);
        let part = &part[start..];
        let Some(colon) = find_top_level(part, 0, b":") else {
            continue;
        };

        let property = part[..colon].trim();
        if property.is_empty() {
            continue;
        }

        let (value, important) = strip_important(part[colon + 1..].trim());
        declarations.push(Declaration {
            property: property.to_ascii_lowercase(),
            value: value.to_string(),
            important,
        });
    }

    declarations
}

/// `selector { declarations }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRule {
    selector: String,
    declarations: Declarations,
    source: Option<String>,
}

impl StyleRule {
    #[must_use]
    pub fn new(selector: impl Into<String>, declarations: Declarations) -> Self {
        Self {
            selector: selector.into(),
            declarations,
            source: None,
        }
    }

    #[must_use]
    pub fn selector(&self) -> &str {
        &self.selector
    }

    #[must_use]
    pub fn declarations(&self) -> &Declarations {
        &self.declarations
    }

    /// Property write-back; `!important` survives.
    pub fn set_property(&mut self, property: &str, value: impl Into<String>) {
        self.declarations.set(property, value);
        self.source = None;
    }

    #[must_use]
    pub fn css_text(&self) -> Cow<'_, str> {
        match &self.source {
            Some(source) => Cow::Borrowed(source),
            None => Cow::Owned(format!(
                "{}{{{}}}",
                self.selector,
                self.declarations.to_css_text()
            )),
        }
    }
}

/// `@import <url> [media];`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRule {
    href: String,
    media: String,
    source: Option<String>,
}

impl ImportRule {
    #[must_use]
    pub fn new(href: impl Into<String>, media: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            media: media.into(),
            source: None,
        }
    }

    #[must_use]
    pub fn href(&self) -> &str {
        &self.href
    }

    #[must_use]
    pub fn media(&self) -> &str {
        &self.media
    }

    /// True when the imported rules apply unconditionally
    #[must_use]
    pub fn applies_to_all_media(&self) -> bool {
        self.media.is_empty() || self.media.eq_ignore_ascii_case("all")
    }

    pub fn set_href(&mut self, href: impl Into<String>) {
        self.href = href.into();
        self.source = None;
    }

    #[must_use]
    pub fn css_text(&self) -> Cow<'_, str> {
        match &self.source {
            Some(source) => Cow::Borrowed(source),
            None if self.media.is_empty() => {
                Cow::Owned(format!("@import {};", serialize_url(&self.href)))
            }
            None => Cow::Owned(format!(
                "@import {} {};",
                serialize_url(&self.href),
                self.media
            )),
        }
    }
}

/// `@font-face { descriptors }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontFaceRule {
    declarations: Declarations,
    source: Option<String>,
}

impl FontFaceRule {
    #[must_use]
    pub fn new(declarations: Declarations) -> Self {
        Self {
            declarations,
            source: None,
        }
    }

    #[must_use]
    pub fn family(&self) -> Option<&str> {
        self.declarations.get("font-family")
    }

    #[must_use]
    pub fn descriptor(&self, name: &str) -> Option<&str> {
        self.declarations.get(name)
    }

    #[must_use]
    pub fn declarations(&self) -> &Declarations {
        &self.declarations
    }

    /// A fresh rule carrying this rule's family, style and weight and a new `src`
    ///
    /// Engines may ignore in-place `src` edits on `@font-face`, so rewrites
    /// build a whole new rule and exchange it into the list.
    #[must_use]
    pub fn rebuilt_with_src(&self, src: impl Into<String>) -> FontFaceRule {
        let mut declarations = Declarations::new();
        for name in ["font-family", "font-style", "font-weight"] {
            if let Some(decl) = self.declarations.get_declaration(name) {
                declarations.push(decl.clone());
            }
        }
        declarations.push(Declaration {
            property: "src".to_string(),
            value: src.into(),
            important: false,
        });
        FontFaceRule::new(declarations)
    }

    #[must_use]
    pub fn css_text(&self) -> Cow<'_, str> {
        match &self.source {
            Some(source) => Cow::Borrowed(source),
            None => Cow::Owned(format!(
                "@font-face{{{}}}",
                self.declarations.to_css_text()
            )),
        }
    }
}

/// `@media <condition> { rules }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRule {
    condition: String,
    rules: RuleList,
    source: Option<String>,
}

impl MediaRule {
    #[must_use]
    pub fn new(condition: impl Into<String>, rules: RuleList) -> Self {
        Self {
            condition: condition.into(),
            rules,
            source: None,
        }
    }

    #[must_use]
    pub fn condition(&self) -> &str {
        &self.condition
    }

    #[must_use]
    pub fn rules(&self) -> &RuleList {
        &self.rules
    }

    pub fn rules_mut(&mut self) -> &mut RuleList {
        &mut self.rules
    }

    #[must_use]
    pub fn css_text(&self) -> Cow<'_, str> {
        match &self.source {
            Some(source) if !self.rules.is_dirty() => Cow::Borrowed(source),
            _ => Cow::Owned(format!(
                "@media {}{{\n{}\n}}",
                self.condition,
                self.rules.to_css_text()
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleType {
    Style,
    Import,
    FontFace,
    Media,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CssRule {
    Style(StyleRule),
    Import(ImportRule),
    FontFace(FontFaceRule),
    Media(MediaRule),
    /// Any other construct, kept as its exact source text
    Other(String),
}

impl CssRule {
    #[must_use]
    pub fn rule_type(&self) -> RuleType {
        match self {
            CssRule::Style(_) => RuleType::Style,
            CssRule::Import(_) => RuleType::Import,
            CssRule::FontFace(_) => RuleType::FontFace,
            CssRule::Media(_) => RuleType::Media,
            CssRule::Other(_) => RuleType::Other,
        }
    }

    #[must_use]
    pub fn css_text(&self) -> Cow<'_, str> {
        match self {
            CssRule::Style(rule) => rule.css_text(),
            CssRule::Import(rule) => rule.css_text(),
            CssRule::FontFace(rule) => rule.css_text(),
            CssRule::Media(rule) => rule.css_text(),
            CssRule::Other(text) => Cow::Borrowed(text),
        }
    }
}

/// Ordered, mutable sequence of the rules of one stylesheet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleList {
    rules: Vec<CssRule>,
    dirty: bool,
}

impl RuleList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// True once any rule was handed out mutably or the list was edited
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CssRule> {
        self.rules.iter()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&CssRule> {
        self.rules.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut CssRule> {
        self.dirty = true;
        self.rules.get_mut(index)
    }

    /// Rule addressed by a path of indices through nested `@media` lists
    pub fn rule_at_path_mut(&mut self, path: &[usize]) -> Option<&mut CssRule> {
        let (&first, rest) = path.split_first()?;
        let rule = self.get_mut(first)?;
        if rest.is_empty() {
            return Some(rule);
        }
        match rule {
            CssRule::Media(media) => media.rules_mut().rule_at_path_mut(rest),
            _ => None,
        }
    }

    /// Nested list reached by following `path` through `@media` rules
    ///
    /// An empty path is this list.
    pub fn list_at_path_mut(&mut self, path: &[usize]) -> Option<&mut RuleList> {
        let Some((&first, rest)) = path.split_first() else {
            return Some(self);
        };
        match self.get_mut(first)? {
            CssRule::Media(media) => media.rules_mut().list_at_path_mut(rest),
            _ => None,
        }
    }

    pub fn push(&mut self, rule: CssRule) {
        self.dirty = true;
        self.rules.push(rule);
    }

    /// Replace the rule at `index`, returning the previous one
    pub fn exchange(&mut self, index: usize, rule: CssRule) -> Option<CssRule> {
        let slot = self.rules.get_mut(index)?;
        self.dirty = true;
        Some(std::mem::replace(slot, rule))
    }

    /// Replace the rule at `index` with `replacement`, in order, at the same position
    pub fn splice(&mut self, index: usize, replacement: Vec<CssRule>) {
        if index >= self.rules.len() {
            return;
        }
        self.dirty = true;
        self.rules.splice(index..=index, replacement);
    }

    pub fn remove(&mut self, index: usize) -> Option<CssRule> {
        if index >= self.rules.len() {
            return None;
        }
        self.dirty = true;
        Some(self.rules.remove(index))
    }

    #[must_use]
    pub fn into_rules(self) -> Vec<CssRule> {
        self.rules
    }

    #[must_use]
    pub fn to_css_text(&self) -> String {
        self.rules
            .iter()
            .map(CssRule::css_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<Vec<CssRule>> for RuleList {
    fn from(rules: Vec<CssRule>) -> Self {
        Self {
            rules,
            dirty: false,
        }
    }
}

impl FromIterator<CssRule> for RuleList {
    fn from_iter<I: IntoIterator<Item = CssRule>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl<'a> IntoIterator for &'a RuleList {
    type Item = &'a CssRule;
    type IntoIter = std::slice::Iter<'a, CssRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

fn at_keyword(prelude: &str) -> Option<String> {
    let name: String = prelude
        .strip_prefix('@')?
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    Some(name.to_ascii_lowercase())
}

/// Target and media list of an `@import` prelude (`@import` keyword included)
fn parse_import_target(rule: &str) -> Option<(String, String)> {
    let after_at = rule.get(..7).filter(|p| p.eq_ignore_ascii_case("@import"))?;
    let rest = rule[after_at.len()..].trim_start();

    let (target, media) = if rest
        .get(..4)
        .is_some_and(|p| p.eq_ignore_ascii_case("url("))
    {
        let close = find_top_level(rest, 0, b")")?;
        let token = format!("url({}", &rest[4..=close]);
        (extract_css_url(&token).ok()?, &rest[close + 1..])
    } else {
        let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
        let inner = &rest[1..];
        let close = inner.find(quote)?;
        (inner[..close].to_string(), &inner[close + 1..])
    };

    let media = media.trim().trim_end_matches(';').trim().to_string();
    Some((target, media))
}

fn parse_statement(source: &str) -> CssRule {
    match at_keyword(source).as_deref() {
        Some("import") => match parse_import_target(source) {
            Some((href, media)) => CssRule::Import(ImportRule {
                href,
                media,
                source: Some(source.to_string()),
            }),
            None => CssRule::Other(source.to_string()),
        },
        _ => CssRule::Other(source.to_string()),
    }
}

fn parse_block_rule(prelude: &str, body: &str, source: &str) -> CssRule {
    match at_keyword(prelude).as_deref() {
        None => CssRule::Style(StyleRule {
            selector: prelude.to_string(),
            declarations: parse_declarations(body),
            source: Some(source.to_string()),
        }),
        Some("font-face") => CssRule::FontFace(FontFaceRule {
            declarations: parse_declarations(body),
            source: Some(source.to_string()),
        }),
        Some("media") => CssRule::Media(MediaRule {
            condition: prelude["@media".len()..].trim().to_string(),
            rules: parse_css_text(body),
            source: Some(source.to_string()),
        }),
        Some(_) => CssRule::Other(source.to_string()),
    }
}

/// Parse stylesheet text into a rule list
///
/// Comments between rules are dropped; an unterminated trailing rule is
/// dropped the way a browser would.
#[must_use]
pub fn parse_css_text(text: &str) -> RuleList {
    let mut rules = Vec::new();
    let mut pos = 0;

    while pos < text.len() {
        pos = skip_whitespace_and_comments(text, pos);
        let rest = &text[pos..];
        if rest.is_empty() {
            break;
        }
        if rest.starts_with(';') || rest.starts_with('}') {
            pos += 1;
            continue;
        }
        if rest.starts_with("<!--") {
            pos += 4;
            continue;
        }
        if rest.starts_with("-->") {
            pos += 3;
            continue;
        }

        let Some(stop) = find_top_level(text, pos, b";{") else {
            log::debug!("Dropping unterminated CSS at offset {pos}");
            break;
        };

        if text.as_bytes()[stop] == b';' {
            rules.push(parse_statement(&text[pos..=stop]));
            pos = stop + 1;
            continue;
        }

        let Some(end) = find_block_end(text, stop) else {
            log::debug!("Dropping unclosed CSS block at offset {pos}");
            break;
        };

        let prelude = text[pos..stop].trim();
        rules.push(parse_block_rule(prelude, &text[stop + 1..end], &text[pos..=end]));
        pos = end + 1;
    }

    RuleList::from(rules)
}

/// Serialize a rule list back to stylesheet text
#[must_use]
pub fn rule_list_to_text(rules: &RuleList) -> String {
    rules.to_css_text()
}
