//! Prompt template for grounded question answering

use crate::storage::ChunkRow;

/// Builds the grounding prompt sent to the generation endpoint.
pub struct PromptBuilder;

impl PromptBuilder {
    /// Assemble the full prompt from retrieved excerpts and the user question.
    ///
    /// The trailing `Answer:` line is load-bearing: the instructions require
    /// the model to continue after it with the literal `Answer: ` prefix, which
    /// is what answer extraction looks for.
    pub fn build_prompt(excerpts: &[ChunkRow], question: &str) -> String {
        let mut prompt = String::new();

        prompt.push_str(
            "System: You are an assistant that answers user questions using ONLY the provided document excerpts. ",
        );
        prompt.push_str(
            "If the answer is not found in those excerpts, reply exactly: \"I don't know\".\n\n",
        );

        prompt.push_str("=== DOCUMENT EXCERPTS (use these only) ===\n");
        for (i, excerpt) in excerpts.iter().enumerate() {
            prompt.push_str(&format!("[{}] {}\n\n", i + 1, excerpt.content));
        }

        prompt.push_str("=== USER QUESTION ===\n");
        prompt.push_str(question);
        prompt.push_str("\n\n");

        prompt.push_str("=== INSTRUCTIONS ===\n");
        prompt.push_str(
            "- Provide one complete answer only. Start your final output with the literal prefix: \"Answer: \" followed by the answer text.\n",
        );
        prompt.push_str(
            "- Do NOT return only the word \"Answer\". The text after the prefix must contain the actual answer.\n",
        );
        prompt.push_str(
            "- If you must cite an excerpt, include its number in square brackets, e.g. [2].\n",
        );
        prompt.push_str(
            "- If no answer is present in the excerpts, output exactly: \"I don't know\"\n\n",
        );

        prompt.push_str("=== EXAMPLE ===\n");
        prompt.push_str("Question: What color is the sky?\n");
        prompt.push_str(
            "Answer: The sky usually appears blue during the day due to Rayleigh scattering [1].\n\n",
        );

        prompt.push_str("Now answer below.\n");
        prompt.push_str("Answer:");
        prompt
    }
}
