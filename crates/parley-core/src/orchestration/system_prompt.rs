//! System prompt management
//!
//! The tool-use instruction is submitted as an ephemeral System message on
//! every tool-enabled call. It is never stored in the conversation.

/// System prompt configuration and generation
#[derive(Debug, Clone)]
pub struct SystemPrompt {
    /// Base system prompt
    base: String,
    /// Additional context (e.g., memory notes about the project)
    context: Option<String>,
}

impl Default for SystemPrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemPrompt {
    /// Create a new system prompt with the default content
    pub fn new() -> Self {
        Self::with_base(DEFAULT_SYSTEM_PROMPT)
    }

    /// Create with custom base prompt (e.g. an agent's own instructions)
    pub fn with_base(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            context: None,
        }
    }

    /// Add context submitted as a separate System message after the base prompt
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        let context = context.into();
        self.context = (!context.trim().is_empty()).then_some(context);
        self
    }

    /// Get the base prompt without context
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }
}

/// Default instruction sent whenever tools are available
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are an AI assistant for infrastructure management. You have access to tools that allow you to perform actions.

IMPORTANT: When you need to perform an action (read files, edit files, search, execute commands, etc.), you MUST use the available tools. Do NOT just describe what you would do - actually use the tools to do it.

For example:
- If you need to read a file, use the read_file tool immediately
- If you need to edit a file, use the edit_file tool immediately
- If you need to search for files, use the search_files tool immediately
- If you need to run a command, use the execute_command tool immediately

Always take action using tools rather than describing what action you would take."#;

/// Corrective message sent once when the model announced an action but made no tool call
pub const CORRECTIVE_NUDGE: &str =
    "Please use the available tools to perform that action now, rather than just describing what you would do.";
