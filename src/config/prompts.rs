//! Prompt templates for Hark.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub answer: AnswerPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for answer generation over retrieved passages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerPrompts {
    pub system: String,
    pub user: String,
}

impl Default for AnswerPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a helpful assistant answering questions about podcast episodes.
Use the provided context to answer the user's question accurately.
If the information is not in the context, say so clearly.
Cite the passages you rely on using their [episode start-end] labels."#
                .to_string(),

            user: r#"Context:
{{context}}

Question: {{question}}

Answer:"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts with an optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let answer_path = custom_path.join("answer.toml");
            if answer_path.exists() {
                let content = std::fs::read_to_string(&answer_path)?;
                prompts.answer = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render with both provided variables and custom config variables.
    /// Provided variables take precedence.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.answer.user.contains("{{context}}"));
        assert!(prompts.answer.user.contains("{{question}}"));
    }

    #[test]
    fn test_render_with_custom_prefers_provided() {
        let mut prompts = Prompts::default();
        prompts.variables.insert("show".to_string(), "Default Show".to_string());
        prompts.variables.insert("question".to_string(), "ignored".to_string());

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "Who spoke first?".to_string());

        let rendered = prompts.render_with_custom("{{show}}: {{question}}", &vars);
        assert_eq!(rendered, "Default Show: Who spoke first?");
    }

    #[test]
    fn test_load_custom_answer_prompt() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("answer.toml"),
            "system = \"Be brief.\"\nuser = \"{{question}}\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.answer.system, "Be brief.");
    }
}
