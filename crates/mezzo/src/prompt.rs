//! System message composition.
//!
//! [`compose_system_message`] lays the persona, the knowledge base, and the
//! session directive out with a fixed template. [`SystemPromptBuilder`] is
//! the small section builder underneath it.

/// Heading of the knowledge-base section.
pub const REFERENCE_HEADING: &str = "REFERENCE MATERIAL (KNOWLEDGE BASE)";

/// Heading of the operating-mode section.
pub const DIRECTIVE_HEADING: &str = "INSTRUCTIONS FOR THIS SESSION";

/// Fixed operating-mode directive appended to every system message.
pub const SESSION_DIRECTIVE: &str =
    "You are running in 'local_tester' mode.\nAct exactly as Mezzo.";

/// Builder for multi-section system prompts.
///
/// Sections are joined with blank lines. A section's heading sits directly
/// above its body. Empty sections are silently skipped.
///
/// # Example
///
/// ```
/// use mezzo::prompt::SystemPromptBuilder;
///
/// let prompt = SystemPromptBuilder::new("You are a receptionist.")
///     .section("Hours", "Open 9-5.")
///     .section("Missing", "")
///     .build();
///
/// assert_eq!(prompt, "You are a receptionist.\n\n# Hours\nOpen 9-5.");
/// ```
pub struct SystemPromptBuilder {
    sections: Vec<String>,
}

impl SystemPromptBuilder {
    /// Create a new builder with an initial preamble section.
    ///
    /// The preamble is included as-is. Sections added via `section()` get
    /// `# ` headings.
    pub fn new(preamble: impl Into<String>) -> Self {
        Self {
            sections: vec![preamble.into()],
        }
    }

    /// Append a named section with a markdown heading.
    ///
    /// Skipped if `content` is empty.
    pub fn section(mut self, heading: &str, content: impl Into<String>) -> Self {
        let content = content.into();
        if !content.is_empty() {
            self.sections.push(format!("# {heading}\n{content}"));
        }
        self
    }

    /// Build the final system prompt by joining all sections with blank lines.
    pub fn build(self) -> String {
        self.sections.join("\n\n")
    }
}

/// Compose the session's system message.
///
/// Layout: persona text, then the knowledge base under a reference-material
/// heading, then the fixed session directive. Both inputs are inserted
/// verbatim. Callers reject empty inputs before getting here.
pub fn compose_system_message(persona: &str, knowledge_base: &str) -> String {
    SystemPromptBuilder::new(persona)
        .section(REFERENCE_HEADING, knowledge_base)
        .section(DIRECTIVE_HEADING, SESSION_DIRECTIVE)
        .build()
}
