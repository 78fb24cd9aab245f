//! `{{ variable }}` substitution for message templates.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([^{}\s]+)\s*\}\}").expect("placeholder pattern is valid")
});

/// Replaces every `{{ key }}` whose key is present in `vars`. Whitespace inside
/// the braces is ignored; values are inserted verbatim and placeholders with no
/// matching key are left as written.
pub fn render_template(template: &str, vars: &HashMap<&str, String>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Variable names referenced by `template`, in order of first appearance.
pub fn placeholders(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in PLACEHOLDER.captures_iter(template) {
        let name = &caps[1];
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&'static str, &str)]) -> HashMap<&'static str, String> {
        pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    #[test]
    fn test_replaces_known_variables() {
        let rendered = render_template(
            "Olá! Lembramos da sua consulta amanhã às {{hora}}.",
            &vars(&[("hora", "14:00")]),
        );
        assert_eq!(rendered, "Olá! Lembramos da sua consulta amanhã às 14:00.");
    }

    #[test]
    fn test_tolerates_whitespace_inside_braces() {
        let rendered = render_template(
            "{{ paciente }}, até {{data }} às {{  hora}}",
            &vars(&[("paciente", "Ana"), ("data", "02/05/2024"), ("hora", "10:00")]),
        );
        assert_eq!(rendered, "Ana, até 02/05/2024 às 10:00");
    }

    #[test]
    fn test_unknown_placeholders_are_untouched() {
        let rendered = render_template("{{hora}} {{ local }}", &vars(&[("hora", "09:00")]));
        assert_eq!(rendered, "09:00 {{ local }}");
    }

    #[test]
    fn test_values_are_not_escaped_or_reexpanded() {
        let rendered = render_template(
            "{{paciente}}",
            &vars(&[("paciente", "<b>{{hora}}</b>"), ("hora", "10:00")]),
        );
        assert_eq!(rendered, "<b>{{hora}}</b>");
    }

    #[test]
    fn test_keys_with_accents_and_punctuation() {
        let rendered = render_template(
            "às {{horário}} com {{ nome-paciente }} ({{valor.total}})",
            &vars(&[("horário", "10:00"), ("nome-paciente", "Ana"), ("valor.total", "R$ 200,00")]),
        );
        assert_eq!(rendered, "às 10:00 com Ana (R$ 200,00)");
        assert_eq!(placeholders("{{horário}} {{ nome-paciente }}"), vec!["horário", "nome-paciente"]);
    }

    #[test]
    fn test_repeated_placeholders() {
        let rendered = render_template("{{x}}-{{ x }}", &vars(&[("x", "1")]));
        assert_eq!(rendered, "1-1");
    }

    #[test]
    fn test_placeholders_lists_each_name_once() {
        assert_eq!(
            placeholders("{{data}} às {{ hora }}, {{data}}"),
            vec!["data".to_string(), "hora".to_string()]
        );
        assert!(placeholders("Obrigado(a) pelo comparecimento!").is_empty());
    }
}
