//! Prompts for rule extraction

/// Instruction prompt prepended to the source document text
pub const EXTRACTION_PROMPT: &str = r#"You are an insurance claims analyst. Your task is to extract every claim-handling rule from the policy document that follows.

## Output Requirements

Return a single JSON object and nothing else, with this structure:

{
  "sections": [
    {
      "title": "<section heading>",
      "subsections": [
        {
          "title": "<subsection heading>",
          "guidelines": [
            { "rule": "<one self-contained rule, stated as a condition and an outcome>" }
          ]
        }
      ]
    }
  ]
}

## Critical Rules

1. Keep sections, subsections and guidelines in the order they appear in the document.
2. Each guideline states exactly one rule. Split compound rules.
3. Rules must be standalone: include thresholds, amounts and timeframes verbatim.
4. Do not invent rules that the document does not state.
5. If the document has no headings, use a single section and subsection titled "General".

## Document

"#;

/// Build the extraction prompt for one document
pub fn build_extraction_prompt(document_text: &str) -> String {
    format!("{EXTRACTION_PROMPT}{document_text}")
}
