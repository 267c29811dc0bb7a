// Cover letter generation
// Implements: prompt rendering, section extraction, the generate pipeline,
// and plain-text letter assembly.
// All LLM calls go through llm_client; no direct Gemini calls here.

pub mod generator;
pub mod handlers;
pub mod letter;
pub mod sections;
pub mod template;
