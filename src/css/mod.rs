//! Stylesheet parsing and rewriting
//!
//! - `rules`: the rule-list object model and its parser/serializer
//! - `value_parser`: `url()`, `background` and `@font-face` `src` grammars
//! - `paths`: rebasing relative references of a fetched sheet

pub mod paths;
pub mod rules;
pub(crate) mod scanner;
pub mod value_parser;

pub use paths::adjust_paths_of_css_resources;
pub use rules::{
    parse_css_text, parse_declarations, rule_list_to_text, CssRule, Declaration, Declarations,
    FontFaceRule, ImportRule, MediaRule, RuleList, RuleType, StyleRule,
};
pub use value_parser::{
    extract_css_url, font_mime_type, parse_background_declaration, parse_font_face_src,
    serialize_background_declaration, serialize_font_face_src, serialize_url, BackgroundLayer,
    CssUrlError, FontSource,
};
