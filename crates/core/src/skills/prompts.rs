//! Default system prompts bundled at compile time.

/// Query Creator - extracts conflict signatures and a search query
pub const QUERY_CREATOR: &str = include_str!("defaults/query_creator.md");

/// Research Team - grounded search for compatible versions
pub const RESEARCHER: &str = include_str!("defaults/researcher.md");

/// Code Surgeon - rewrites the manifest from research findings
pub const CODE_SURGEON: &str = include_str!("defaults/code_surgeon.md");

/// Solver - one-shot manifest fix for the tool surface
pub const SOLVER: &str = include_str!("defaults/solver.md");

/// Install Simulator - predicts a pip install before it happens
pub const SIMULATOR: &str = include_str!("defaults/simulator.md");

/// All default prompts with their slugs
pub fn all_defaults() -> Vec<(&'static str, &'static str)> {
    vec![
        ("query_creator", QUERY_CREATOR),
        ("researcher", RESEARCHER),
        ("code_surgeon", CODE_SURGEON),
        ("solver", SOLVER),
        ("simulator", SIMULATOR),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_prompts_non_empty() {
        for (slug, content) in all_defaults() {
            assert!(!content.is_empty(), "Prompt '{}' should not be empty", slug);
            assert!(content.len() > 50, "Prompt '{}' seems too short", slug);
        }
    }

    #[test]
    fn test_prompt_count() {
        assert_eq!(all_defaults().len(), 5, "Should have 5 default prompts");
    }
}
