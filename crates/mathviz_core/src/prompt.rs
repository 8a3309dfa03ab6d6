//! Generation prompt template.

use std::fmt::Write;

/// Formatting and structure rules every generation prompt lists, in order.
pub const REQUIREMENTS: [&str; 9] = [
    r"LaTeX: Use single backslash for commands, e.g., \frac{num}{den} for fractions. Only use LaTeX from: amsmath, amssymb, mathtools, physics, xcolor.",
    "Use latest Manim syntax (e.g., 'Create' instead of 'ShowCreation').",
    "Structure: Intro, Problem Statement, Visualization, Explanation, Conclusion.",
    "Use MathTex for math, Text for regular text. No $ symbols in MathTex.",
    "Ensure readability: proper spacing, consistent fonts, colors. Make sure all the text other than the title has a font size of 24.",
    "Use smooth animations and transitions.",
    "Code must be clean, well-commented, and organized.",
    "Make sure that the render is zoomed out so that all the text is in the frame and can be seen.",
    "Have multiple scenes that are rendered and cleared before next scene comes on. Don't accept user input, instead merge all the scenes into one video.",
];

const LATEX_EXAMPLES: &str = r#"
LaTeX Examples:
- Correct: r"\frac{a}{b}"
- Incorrect: r"\f\frac{a}{b}" or r"\\frac{a}{b}"
"#;

const EXAMPLE_STRUCTURE: &str = r#"
Example structure:
```python
from manim import *

class ConceptVisualization(Scene):
    def construct(self):
        # Introduction
        title = Text("Concept Title")
        self.play(Write(title))
        self.play(title.animate.to_edge(UP))

        # Problem Statement
        problem = Text("Problem description", font_size=24)
        self.play(Write(problem))

        # Visualization
        # (Add relevant visual elements and animations)

        # Explanation
        explanation = MathTex(r"E = mc^2")
        self.play(Write(explanation))

        # Conclusion
        conclusion = Text("Key takeaways", font_size=24)
        self.play(Write(conclusion))

        self.wait(2)
```
"#;

const RESPONSE_FORMAT: &str = "
Provide only a JSON response with:
- manim_code: Complete Manim code as a string
- description: Brief description of the visualization
- scene_class: Name of the Scene subclass to render

No additional text or explanations outside the JSON structure.
";

/// Build the generation prompt for a question.
pub fn build_prompt(question: &str) -> String {
    let mut prompt = String::with_capacity(2048 + question.len());

    let _ = writeln!(
        prompt,
        "Generate Manim code (Community Edition v0.17.0+) to visualize: \"{}\"",
        question
    );
    prompt.push_str("\nRequirements:\n");
    for (index, requirement) in REQUIREMENTS.iter().enumerate() {
        let _ = writeln!(prompt, "{}. {}", index + 1, requirement);
    }

    prompt.push_str(LATEX_EXAMPLES);
    prompt.push_str(EXAMPLE_STRUCTURE);
    prompt.push_str(RESPONSE_FORMAT);
    prompt
}

/// Instruction for the structured-parse call wrapping a generation draft.
pub fn build_extraction_prompt(draft: &str) -> String {
    format!(
        "Given the following data, format it with the given response format: {}",
        draft
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_question_and_all_requirements() {
        let prompt = build_prompt("Explain 1D motion in physics");

        assert!(prompt.contains("visualize: \"Explain 1D motion in physics\""));
        for (index, requirement) in REQUIREMENTS.iter().enumerate() {
            let marker = format!("{}. {}", index + 1, requirement);
            assert!(prompt.contains(&marker), "missing requirement {}", index + 1);
        }
        assert!(prompt.contains("class ConceptVisualization(Scene):"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        assert_eq!(build_prompt("Pythagoras"), build_prompt("Pythagoras"));
        assert_ne!(build_prompt("Pythagoras"), build_prompt("Fourier"));
    }

    #[test]
    fn test_latex_escapes_survive_template() {
        let prompt = build_prompt("fractions");
        assert!(prompt.contains(r#"Correct: r"\frac{a}{b}""#));
        assert!(!prompt.contains('\u{0c}'));
    }

    #[test]
    fn test_question_with_braces_is_literal() {
        let prompt = build_prompt("sets like {1, 2} and {x}");
        assert!(prompt.contains("sets like {1, 2} and {x}"));
    }

    #[test]
    fn test_extraction_prompt_wraps_draft() {
        let prompt = build_extraction_prompt("```python\nclass A(Scene): pass\n```");
        assert!(prompt.starts_with("Given the following data"));
        assert!(prompt.ends_with("class A(Scene): pass\n```"));
    }
}
