//! Prompt templates with a single `{text}` slot.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Error, Result};

lazy_static! {
    static ref TEXT_SLOT: Regex = Regex::new(r"\{\s*text\s*\}").expect("valid slot pattern");
}

/// Instruction used for every map call of `map_reduce`.
const MAP_TEMPLATE_HEAD: &str = "Summarize:\n\n";

/// A validated prompt: everything before and after the `{text}` slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    head: String,
    tail: String,
}

impl PromptTemplate {
    /// Parse a template that must contain exactly one `{text}` slot.
    pub fn parse(template: &str) -> Result<Self> {
        let mut slots = TEXT_SLOT.find_iter(template);
        let Some(slot) = slots.next() else {
            return Err(Error::config(
                "prompt template must contain a {text} placeholder where the document text goes",
            ));
        };
        if slots.next().is_some() {
            return Err(Error::config(
                "prompt template must contain exactly one {text} placeholder",
            ));
        }

        Ok(Self {
            head: template[..slot.start()].to_string(),
            tail: template[slot.end()..].to_string(),
        })
    }

    /// Build a template from a user instruction.
    ///
    /// An instruction without a slot becomes `"<instruction>:\n\n {text}"`; one
    /// that already has a slot is parsed strictly.
    pub fn from_instruction(instruction: &str) -> Result<Self> {
        if instruction.trim().is_empty() {
            return Err(Error::config("the summary prompt must not be empty"));
        }
        if TEXT_SLOT.is_match(instruction) {
            return Self::parse(instruction);
        }
        Ok(Self {
            head: format!("{instruction}:\n\n "),
            tail: String::new(),
        })
    }

    /// The fixed, generic per-chunk template of `map_reduce`.
    pub fn map() -> Self {
        Self {
            head: MAP_TEMPLATE_HEAD.to_string(),
            tail: String::new(),
        }
    }

    /// Template for one refine step: the user's instruction, the running
    /// summary and a slot for the next chunk.
    ///
    /// Built directly rather than parsed, so a summary that happens to contain
    /// `{text}` is never mistaken for the slot.
    pub fn refine(instruction: &PromptTemplate, existing_summary: &str) -> Self {
        Self {
            head: format!(
                "{}\n\n\
                 We have provided an existing summary up to a certain point:\n\
                 {existing_summary}\n\n\
                 We have the opportunity to refine the existing summary (only if needed) \
                 with some more context below.\n\
                 ------------\n",
                instruction.instruction()
            ),
            tail: "\n------------\n\
                   Given the new context, refine the original summary. \
                   If the context isn't useful, return the original summary."
                .to_string(),
        }
    }

    /// The template with its slot and trailing punctuation removed.
    ///
    /// Text on both sides of a mid-template slot is joined with one space.
    pub fn instruction(&self) -> String {
        let head = self.head.trim();
        let tail = self.tail.trim();
        let joined = match (head.is_empty(), tail.is_empty()) {
            (false, false) => format!("{head} {tail}"),
            (false, true) => head.to_string(),
            _ => tail.to_string(),
        };
        joined.trim_end_matches(':').trim_end().to_string()
    }

    /// Substitute `text` into the slot.
    pub fn render(&self, text: &str) -> String {
        let mut out = String::with_capacity(self.head.len() + text.len() + self.tail.len());
        out.push_str(&self.head);
        out.push_str(text);
        out.push_str(&self.tail);
        out
    }
}

impl fmt::Display for PromptTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{text}}{}", self.head, self.tail)
    }
}
