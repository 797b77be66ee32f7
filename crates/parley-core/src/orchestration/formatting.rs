//! Tool result formatting
//!
//! Every tool result is rendered twice: a markdown block for the user
//! (tool name, a parameter summary, fenced output with a sniffed language
//! tag) and a compact `Tool:/Result:` block for the next model turn.

use crate::provider::ToolCall;
use crate::tools::ToolResult;

const MAX_COMMAND_DISPLAY: usize = 80;
const MAX_PARAM_DISPLAY: usize = 50;
const FORMAT_SNIFF_LINES: usize = 10;

/// Sniffed format of a tool's output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
    Hcl,
    /// Pipe-separated table; fenced as text, which renders it more faithfully
    Table,
    Text,
}

impl OutputFormat {
    /// Markdown code fence language tag
    pub fn fence_tag(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
            OutputFormat::Hcl => "hcl",
            OutputFormat::Table | OutputFormat::Text => "text",
        }
    }
}

/// Guess the format of command output
pub fn detect_output_format(output: &str) -> OutputFormat {
    let trimmed = output.trim();

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return OutputFormat::Json;
    }

    let lines: Vec<&str> = trimmed.lines().collect();

    let yaml_patterns = lines
        .iter()
        .take(FORMAT_SNIFF_LINES + 1)
        .map(|l| l.trim())
        .filter(|l| l.contains(": ") || l.starts_with("- "))
        .count();
    if yaml_patterns >= 3 {
        return OutputFormat::Yaml;
    }

    if ["resource \"", "data \"", "module \"", "variable \""]
        .iter()
        .any(|kw| trimmed.contains(kw))
    {
        return OutputFormat::Hcl;
    }

    if lines.len() > 2 {
        let pipes = lines[0].matches('|').count();
        let rows = &lines[1..lines.len().min(5)];
        if pipes > 1 && rows.iter().all(|l| l.matches('|').count() == pipes) {
            return OutputFormat::Table;
        }
    }

    OutputFormat::Text
}

/// Truncate to `max` characters, replacing the tail with `...`
fn truncate_display(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max - 3).collect();
        format!("{}...", head)
    }
}

/// One-line summary of a tool call's parameters for display
///
/// Well-known tools get a specialised label; everything else lists its
/// parameters as ``key=`value` `` in key order.
pub fn format_tool_parameters(call: &ToolCall) -> String {
    if call.input.is_empty() {
        return String::new();
    }

    match call.name.as_str() {
        "execute_command" | "run_command" | "execute_bash" | "bash" | "shell" => {
            if let Some(cmd) = call.input_str("command") {
                return format!("**Command:** `{}`", truncate_display(cmd, MAX_COMMAND_DISPLAY));
            }
        }
        "read_file" | "edit_file" | "write_file" | "read_component_file" | "read_stack_file"
        | "write_component_file" | "write_stack_file" => {
            if let Some(path) = call.input_str("path") {
                return format!("**Path:** `{}`", path);
            }
            if let Some(component) = call.input_str("component") {
                return format!("**Component:** `{}`", component);
            }
        }
        "search_files" | "grep" | "glob" => {
            if let Some(pattern) = call.input_str("pattern") {
                return format!("**Pattern:** `{}`", pattern);
            }
        }
        "describe_component" => {
            let mut parts = Vec::new();
            if let Some(component) = call.input_str("component") {
                parts.push(component.to_string());
            }
            if let Some(stack) = call.input_str("stack") {
                parts.push(format!("-s {}", stack));
            }
            if !parts.is_empty() {
                return format!("**Args:** `{}`", parts.join(" "));
            }
        }
        _ => {}
    }

    let params: Vec<String> = call
        .input
        .iter()
        .map(|(key, value)| {
            format!("{}=`{}`", key, truncate_display(&value.to_string(), MAX_PARAM_DISPLAY))
        })
        .collect();

    format!("**Parameters:** {}", params.join(", "))
}

/// Text shown for a result: its output, else its error, else a placeholder
pub fn result_display_output(result: &ToolResult) -> String {
    if !result.output.is_empty() {
        return result.output.clone();
    }
    match &result.error {
        Some(err) if !err.is_empty() => format!("Error: {}", err),
        _ => "No output returned".to_string(),
    }
}

/// Markdown block describing one tool execution for the user
pub fn format_tool_block(call: &ToolCall, result: &ToolResult) -> String {
    let output = result_display_output(result);

    let mut header = format!("**Tool:** `{}`", call.name);
    let params = format_tool_parameters(call);
    if !params.is_empty() {
        header.push('\n');
        header.push_str(&params);
    }

    format!(
        "{}\n\n```{}\n{}\n```",
        header,
        detect_output_format(&output).fence_tag(),
        output
    )
}

/// Compact block describing one tool execution for the model
pub fn format_tool_result_for_llm(call: &ToolCall, result: &ToolResult) -> String {
    format!("Tool: {}\nResult:\n{}", call.name, result_display_output(result))
}

/// User message carrying all tool results back to the model
pub fn tool_results_message(blocks: &[String]) -> String {
    format!(
        "Tool execution results:\n\n{}\n\nPlease provide your final response based on these results.",
        blocks.join("\n\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ToolInput;

    fn call(name: &str, params: &[(&str, &str)]) -> ToolCall {
        let input: ToolInput = params
            .iter()
            .map(|(k, v)| (k.to_string(), (*v).into()))
            .collect();
        ToolCall::new("id", name, input)
    }

    #[test]
    fn test_detect_json() {
        assert_eq!(detect_output_format("  {\"a\": 1}"), OutputFormat::Json);
        assert_eq!(detect_output_format("[1, 2]"), OutputFormat::Json);
    }

    #[test]
    fn test_detect_yaml() {
        let yaml = "vars:\n  region: us-east-1\n  stage: prod\n  tags:\n    - a";
        assert_eq!(detect_output_format(yaml), OutputFormat::Yaml);
    }

    #[test]
    fn test_detect_hcl() {
        let hcl = "resource \"aws_vpc\" \"main\" {\n  cidr_block = \"10.0.0.0/16\"\n}";
        assert_eq!(detect_output_format(hcl), OutputFormat::Hcl);
    }

    #[test]
    fn test_detect_table() {
        let table = "| a | b |\n| - | - |\n| 1 | 2 |";
        assert_eq!(detect_output_format(table), OutputFormat::Table);
        assert_eq!(OutputFormat::Table.fence_tag(), "text");
    }

    #[test]
    fn test_detect_plain() {
        assert_eq!(detect_output_format("hello"), OutputFormat::Text);
    }

    #[test]
    fn test_parameters_specialised() {
        assert_eq!(
            format_tool_parameters(&call("read_file", &[("path", "/path/to/file.yaml")])),
            "**Path:** `/path/to/file.yaml`"
        );
        assert_eq!(
            format_tool_parameters(&call("search_files", &[("pattern", "*.yaml")])),
            "**Pattern:** `*.yaml`"
        );
        assert_eq!(
            format_tool_parameters(&call("describe_component", &[("component", "vpc"), ("stack", "ue1-network")])),
            "**Args:** `vpc -s ue1-network`"
        );
    }

    #[test]
    fn test_parameters_long_command_truncated() {
        let long = "very long command ".repeat(10);
        let expected = format!("**Command:** `{}...`", &long[..77]);
        assert_eq!(format_tool_parameters(&call("execute_bash", &[("command", long.as_str())])), expected);
    }

    #[test]
    fn test_parameters_generic() {
        assert_eq!(format_tool_parameters(&call("some_tool", &[])), "");
        assert_eq!(
            format_tool_parameters(&call("unknown_tool", &[("param2", "value2"), ("param1", "value1")])),
            "**Parameters:** param1=`value1`, param2=`value2`"
        );
    }

    #[test]
    fn test_display_output_fallbacks() {
        assert_eq!(result_display_output(&ToolResult::success("ok")), "ok");
        assert_eq!(result_display_output(&ToolResult::failure("boom")), "Error: boom");
        assert_eq!(result_display_output(&ToolResult::success("")), "No output returned");
    }

    #[test]
    fn test_tool_block() {
        let block = format_tool_block(&call("read_file", &[("path", "a.json")]), &ToolResult::success("{\"k\": 1}"));
        assert_eq!(block, "**Tool:** `read_file`\n**Path:** `a.json`\n\n```json\n{\"k\": 1}\n```");
    }

    #[test]
    fn test_llm_block_and_message() {
        let block = format_tool_result_for_llm(&call("read_file", &[]), &ToolResult::success("hello"));
        assert_eq!(block, "Tool: read_file\nResult:\nhello");

        let msg = tool_results_message(&[block.clone(), block]);
        assert!(msg.starts_with("Tool execution results:\n\nTool: read_file"));
        assert!(msg.contains("hello\n\nTool: read_file"));
        assert!(msg.ends_with("Please provide your final response based on these results."));
    }
}
