// Cross-cutting prompt fragments for guided generation.
// Per-template steering lives in the template itself (instructions and
// field guides) — these fragments are the fixed framing around them.

/// Appended to every session's template instructions.
pub const SESSION_PREAMBLE: &str = "You will receive one free-text input. \
    Produce the requested structured output by calling the provided tool \
    exactly once. \
    Fill every declared field using only information from the input. \
    Follow each field's description precisely. \
    Keep list fields within their declared bounds.";

/// Description of the forced structured-output tool.
pub const STRUCTURED_TOOL_DESCRIPTION: &str = "Emit the structured result \
    for the user's input. Every property is required and described; the \
    schema is the contract.";
