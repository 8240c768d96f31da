use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;

/// What to do with Markdown image references (`![alt](target)`) in OCR output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageHandling {
    Keep,
    Strip,
    Placeholder(String),
}

impl ImageHandling {
    pub const DEFAULT_PLACEHOLDER: &'static str = "[image]";
}

impl Default for ImageHandling {
    fn default() -> Self {
        Self::Placeholder(Self::DEFAULT_PLACEHOLDER.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostProcessingOptions {
    pub image_handling: ImageHandling,
    pub remove_empty_lines: bool,
    pub trim_whitespace: bool,
}

impl Default for PostProcessingOptions {
    fn default() -> Self {
        Self {
            image_handling: ImageHandling::default(),
            remove_empty_lines: true,
            trim_whitespace: true,
        }
    }
}

fn image_link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"!\[.*?\]\(.*?\)").unwrap())
}

/// Two or more newline-only lines. Lines holding spaces or tabs are content.
fn blank_run_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\r?\n(?:\r?\n){2,}").unwrap())
}

/// Cleans raw OCR Markdown before it is handed back to callers.
pub struct PostProcessor;

impl PostProcessor {
    /// Image handling, then blank-line collapsing, then trimming.
    pub fn process(text: &str, options: &PostProcessingOptions) -> String {
        if text.is_empty() {
            return String::new();
        }

        let text: Cow<'_, str> = match &options.image_handling {
            ImageHandling::Keep => Cow::Borrowed(text),
            ImageHandling::Strip => image_link_regex().replace_all(text, ""),
            ImageHandling::Placeholder(placeholder) => {
                image_link_regex().replace_all(text, regex::NoExpand(placeholder.as_str()))
            }
        };

        let text = if options.remove_empty_lines {
            Cow::Owned(blank_run_regex().replace_all(&text, "\n\n").into_owned())
        } else {
            text
        };

        if options.trim_whitespace {
            text.trim().to_string()
        } else {
            text.into_owned()
        }
    }
}
