use super::types::{CategoryLabel, PrefixRule};

/// Built-in rule table from the exchange-code convention: Shenzhen-listed
/// LOF codes support intraday drag trades, Shanghai-listed ones do not.
/// Overridable through `PREFIX_RULES_PATH` without touching the pipeline.
pub fn default_rules() -> Vec<PrefixRule> {
    vec![
        PrefixRule {
            prefix: "SZ".to_string(),
            label: CategoryLabel::Draggable,
        },
        PrefixRule {
            prefix: "SH".to_string(),
            label: CategoryLabel::NonDraggable,
        },
    ]
}

/// First matching prefix wins; codes outside the table are non-draggable.
pub fn classify(code: &str, rules: &[PrefixRule]) -> CategoryLabel {
    rules
        .iter()
        .find(|rule| code.starts_with(rule.prefix.as_str()))
        .map(|rule| rule.label)
        .unwrap_or(CategoryLabel::NonDraggable)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shenzhen_codes_are_draggable() {
        assert_eq!(classify("SZ161128", &default_rules()), CategoryLabel::Draggable);
    }

    #[test]
    fn shanghai_codes_are_not_draggable() {
        assert_eq!(classify("SH501300", &default_rules()), CategoryLabel::NonDraggable);
    }

    #[test]
    fn unknown_prefixes_fall_back_to_non_draggable() {
        assert_eq!(classify("501300", &default_rules()), CategoryLabel::NonDraggable);
        assert_eq!(classify("", &default_rules()), CategoryLabel::NonDraggable);
    }

    #[test]
    fn first_matching_rule_wins() {
        // A narrower rule listed first carves an exception out of a broad one
        let rules = vec![
            PrefixRule {
                prefix: "SZ16".to_string(),
                label: CategoryLabel::NonDraggable,
            },
            PrefixRule {
                prefix: "SZ".to_string(),
                label: CategoryLabel::Draggable,
            },
        ];
        assert_eq!(classify("SZ161128", &rules), CategoryLabel::NonDraggable);
        assert_eq!(classify("SZ159901", &rules), CategoryLabel::Draggable);
    }
}
