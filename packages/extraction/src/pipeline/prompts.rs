//! LLM prompts for contract-driven extraction.
//!
//! Prompt authoring lives with the template author; this module only fills
//! placeholders from the contract and supplies a default when a template
//! carries none.

use crate::types::contract::{OutputFormat, SemanticContract, VALUE_KEY};

/// Default prompt for the LLM engine.
pub const EXTRACT_PROMPT: &str = r#"Extract the {entity} from the user's message.

Entity description: {description}

Fields:
{fields}

Rules:
- Only use information present in the message
- Omit a field you cannot find; never guess
- Output nothing but JSON

Output JSON with exactly these keys: {keys}

User message:
{text}"#;

/// Describe the fields a contract expects, one per line.
pub fn format_fields(contract: &SemanticContract) -> String {
    if contract.subentities.is_empty() {
        return format!("- {}: {}", VALUE_KEY, contract.entity.label);
    }

    contract
        .subentities
        .iter()
        .map(|s| {
            let mut line = format!("- {} ({}, {})", s.sub_task_key, s.label, s.field_type);
            if !s.meaning.is_empty() {
                line.push_str(": ");
                line.push_str(&s.meaning);
            }
            if s.optional {
                line.push_str(" [optional]");
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fill a prompt template from the contract and input text.
pub fn format_extract_prompt(
    template: Option<&str>,
    contract: &SemanticContract,
    text: &str,
) -> String {
    let keys = match contract.output_canonical.format {
        OutputFormat::Value => VALUE_KEY.to_string(),
        OutputFormat::Object => contract.expected_keys().join(", "),
    };

    let description = if contract.entity.description.is_empty() {
        contract.entity.label.as_str()
    } else {
        contract.entity.description.as_str()
    };

    let fields = format_fields(contract);
    fill_placeholders(
        template.unwrap_or(EXTRACT_PROMPT),
        &[
            ("entity", contract.entity.label.as_str()),
            ("description", description),
            ("fields", fields.as_str()),
            ("keys", keys.as_str()),
            ("text", text),
        ],
    )
}

/// Replace `{name}` placeholders in one pass. Substituted values are never
/// rescanned, so braces in contract text or user input stay literal.
fn fill_placeholders(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];

        let value = tail.find('}').and_then(|close| {
            let name = &tail[1..close];
            values
                .iter()
                .find(|(placeholder, _)| *placeholder == name)
                .map(|(_, value)| (*value, close))
        });

        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::contract::Subentity;

    #[test]
    fn test_default_prompt_lists_fields_and_keys() {
        let contract = SemanticContract::composite(
            "date",
            "Date of birth",
            vec![
                Subentity::new("day", "Day").number().with_meaning("day of month"),
                Subentity::new("note", "Note").optional(),
            ],
        );

        let prompt = format_extract_prompt(None, &contract, "born on the 3rd");
        assert!(prompt.contains("Extract the Date of birth"));
        assert!(prompt.contains("- day (Day, number): day of month"));
        assert!(prompt.contains("- note (Note, string) [optional]"));
        assert!(prompt.contains("exactly these keys: day, note"));
        assert!(prompt.ends_with("born on the 3rd"));
    }

    #[test]
    fn test_custom_template_and_injection() {
        let contract = SemanticContract::simple("email", "Email address");
        let prompt = format_extract_prompt(Some("{entity} <- {text} ({keys})"), &contract, "{keys}");
        assert_eq!(prompt, "Email address <- {keys} (value)");
    }

    #[test]
    fn test_contract_text_is_not_rescanned() {
        let contract = SemanticContract::simple("note", "Note {keys}")
            .with_description("Anything after {text} is ignored");
        let prompt = format_extract_prompt(
            Some("{entity} | {description} | {text} | {missing} | {"),
            &contract,
            "hello",
        );
        assert_eq!(
            prompt,
            "Note {keys} | Anything after {text} is ignored | hello | {missing} | {"
        );
    }
}
