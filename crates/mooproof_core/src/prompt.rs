//! crates/mooproof_core/src/prompt.rs
//!
//! Assembles the prompts sent to the text generation provider.

use crate::domain::{ChatRole, ChatTurn, ResourceConfig};

/// How much of the paper the chat prompt carries. The full feedback is always included.
pub const CHAT_PAPER_CHAR_LIMIT: usize = 3000;

/// Substitutes the grade level into the resource's instructions template.
pub fn render_instructions(resource: &ResourceConfig) -> String {
    resource
        .instructions_template()
        .replace("{gradelevel}", &resource.grade_level.to_string())
}

/// The prompt asking for proofreading feedback on a full paper.
pub fn proofing_prompt(resource: &ResourceConfig, paper_text: &str) -> String {
    format!(
        "{}\n\nGrade Level: {}\n\nPaper to proof:\n\n{}",
        render_instructions(resource),
        resource.grade_level,
        paper_text
    )
}

/// The prompt for one follow-up question about previously returned feedback.
pub fn chat_prompt(
    resource: &ResourceConfig,
    paper_text: &str,
    feedback: &str,
    history: &[ChatTurn],
    message: &str,
) -> String {
    let mut prompt = format!(
        "You are a helpful writing tutor assisting a grade {} student. \
         The student submitted a paper for proofreading and received feedback. \
         Now they have questions about the feedback. Answer their questions clearly and helpfully.\n\n",
        resource.grade_level
    );

    prompt.push_str("IMPORTANT INSTRUCTIONS:\n");
    prompt.push_str(&render_instructions(resource));
    prompt.push('\n');
    prompt.push_str(
        "Remember: Do NOT rewrite the student's paper for them, even if they ask. \
         Only provide guidance, suggestions, and explanations. The student must do their own writing.\n\n",
    );

    prompt.push_str("ORIGINAL PAPER:\n");
    prompt.push_str(&truncate_chars(paper_text, CHAT_PAPER_CHAR_LIMIT));
    prompt.push_str("\n\n");

    prompt.push_str("FEEDBACK PROVIDED:\n");
    prompt.push_str(feedback);
    prompt.push_str("\n\n");

    if !history.is_empty() {
        prompt.push_str("CONVERSATION SO FAR:\n");
        for turn in history {
            let speaker = match turn.role {
                ChatRole::User => "Student",
                ChatRole::Assistant => "Tutor",
                ChatRole::Other => continue,
            };
            prompt.push_str(speaker);
            prompt.push_str(": ");
            prompt.push_str(&turn.content);
            prompt.push('\n');
        }
    }

    prompt.push_str("Student: ");
    prompt.push_str(message);
    prompt.push_str("\nTutor:");
    prompt
}

fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn resource() -> ResourceConfig {
        let mut config = ResourceConfig::with_defaults(Uuid::new_v4(), "Proofer");
        config.grade_level = 7;
        config.proof_instructions = "Check grade {gradelevel} spelling.".to_string();
        config
    }

    #[test]
    fn proofing_prompt_has_the_expected_shape() {
        let prompt = proofing_prompt(&resource(), "My paper.");
        assert_eq!(
            prompt,
            "Check grade 7 spelling.\n\nGrade Level: 7\n\nPaper to proof:\n\nMy paper."
        );
    }

    #[test]
    fn blank_instructions_fall_back_to_the_default() {
        let mut config = resource();
        config.proof_instructions = "   ".to_string();
        let prompt = proofing_prompt(&config, "x");
        assert!(prompt.starts_with("Proof this paper for grade 7."));
    }

    #[test]
    fn proofing_prompt_keeps_long_papers_whole() {
        let paper = "a".repeat(10_000);
        let prompt = proofing_prompt(&resource(), &paper);
        assert!(prompt.ends_with(&paper));
    }

    #[test]
    fn chat_prompt_truncates_the_paper_to_3000_chars() {
        let paper = format!("{}{}", "é".repeat(CHAT_PAPER_CHAR_LIMIT), "TAIL");
        let prompt = chat_prompt(&resource(), &paper, "Looks good.", &[], "Why?");

        let expected = format!("ORIGINAL PAPER:\n{}\n\n", "é".repeat(CHAT_PAPER_CHAR_LIMIT));
        assert!(prompt.contains(&expected));
        assert!(!prompt.contains("TAIL"));
    }

    #[test]
    fn chat_prompt_renders_history_in_order() {
        let history = vec![
            ChatTurn::user("What is a comma splice?"),
            ChatTurn::assistant("Two sentences joined by a comma."),
        ];
        let prompt = chat_prompt(&resource(), "Paper", "Feedback text", &history, "Example?");

        assert!(prompt.starts_with("You are a helpful writing tutor assisting a grade 7 student."));
        assert!(prompt.contains("Do NOT rewrite the student's paper"));
        assert!(prompt.contains("IMPORTANT INSTRUCTIONS:\nCheck grade 7 spelling.\n"));
        assert!(prompt.contains("FEEDBACK PROVIDED:\nFeedback text\n\n"));
        assert!(prompt.ends_with(
            "CONVERSATION SO FAR:\n\
             Student: What is a comma splice?\n\
             Tutor: Two sentences joined by a comma.\n\
             Student: Example?\nTutor:"
        ));
    }

    #[test]
    fn chat_prompt_without_history_skips_the_conversation_block() {
        let prompt = chat_prompt(&resource(), "Paper", "Feedback", &[], "Hi");
        assert!(!prompt.contains("CONVERSATION SO FAR"));
        assert!(prompt.ends_with("FEEDBACK PROVIDED:\nFeedback\n\nStudent: Hi\nTutor:"));
    }

    #[test]
    fn chat_prompt_substitutes_the_grade_into_the_instructions() {
        let prompt = chat_prompt(&resource(), "Paper", "Feedback", &[], "Hi");
        assert!(!prompt.contains("{gradelevel}"));
        assert_eq!(prompt.matches("Check grade 7 spelling.").count(), 1);
    }
}
