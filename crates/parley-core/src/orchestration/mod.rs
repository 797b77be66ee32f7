//! Orchestration of a single conversational turn
//!
//! This module contains:
//! - The turn orchestrator and its bounded tool loop
//! - Action-intent detection used for the corrective nudge
//! - System prompt handling
//! - Tool result formatting for the user and the model

pub mod formatting;
pub mod intent;
mod system_prompt;
mod turn;

pub use formatting::{
    detect_output_format, format_tool_block, format_tool_parameters, format_tool_result_for_llm,
    result_display_output, tool_results_message, OutputFormat,
};
pub use intent::{detect_action_intent, IntentDetector, ACTION_VERBS, INTENT_PHRASES};
pub use system_prompt::{SystemPrompt, CORRECTIVE_NUDGE, DEFAULT_SYSTEM_PROMPT};
pub use turn::{
    TurnOptions, TurnOrchestrator, TurnOutcome, DEFAULT_MAX_TOOL_ITERATIONS, RESULT_SEPARATOR,
};
