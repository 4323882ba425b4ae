//! PPTX template engine: clones a template slide per team and
//! substitutes `{{KEY}}` placeholders with team data.
//!
//! A .pptx file is a ZIP package of XML parts wired together by
//! relationship files. Cloning a slide means copying its XML part and
//! relationships, then registering the copy in the content types, the
//! presentation relationships, and the slide id list.

pub mod package;
pub mod slides;
pub mod substitute;
pub mod writer;

#[cfg(test)]
mod test_fixtures;

pub use package::TemplatePackage;
pub use substitute::substitute_slide;
pub use writer::{generate_deck, DeckSummary};
