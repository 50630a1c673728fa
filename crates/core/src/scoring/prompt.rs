use crate::scoring::{AnswerContext, QuestionType};

// The label strings below are a hard contract with the extractor: it matches
// them verbatim, so any wording change here must be mirrored there.

/// Renders one of the two fixed evaluation templates. Pure and
/// deterministic; a missing template answer is rendered as the literal
/// placeholder `None`.
pub fn build_prompt(ctx: &AnswerContext) -> String {
    match ctx.question_type {
        QuestionType::RoleBased => role_based_prompt(ctx),
        QuestionType::Personal => personal_prompt(ctx),
    }
}

fn role_based_prompt(ctx: &AnswerContext) -> String {
    let template_answer = ctx.template_answer.as_deref().unwrap_or("None");
    let keywords = ctx.keywords.join(", ");
    format!(
        "You are an AI assistant evaluating a candidate's answer based on a question related to the role they're applying for. (Position specific)\n\n\
         Question: {question}\n\
         Template Answer: {template_answer}\n\
         Answer: {answer}\n\
         Important keywords to consider: {keywords}.\n\n\
         Evaluate the candidate's answer by comparing it to the template answer and the provided keywords.\n\
         Give higher scores to answers with matching or has similar meanings to the provided keywords, and align or similar to the template answer.\n\
         Use the following structure for your response: (Scores must be from 0 to 1)\n\n\
         **Scoring Matrix**:\n\
         - Relevance: [Score]\n\
         - Clarity: [Score]\n\
         - Depth of Information: [Score]\n\
         - Keywords Coverage: [Score]\n\n\
         **Extracted Information**:\n\
         - Extracted Keywords:\n\
         - Matching Keywords:\n\
         - Alignment with Template Answer:\n\
         - Key strengths:\n\
         - Areas for improvement:\n\n",
        question = ctx.question,
        answer = ctx.transcript,
    )
}

fn personal_prompt(ctx: &AnswerContext) -> String {
    format!(
        "You are an AI assistant evaluating a candidate's answer based on a personal interview question.\n\n\
         Question: {question}\n\
         Answer: {answer}\n\n\
         Evaluate the candidate's answer based on relevance between the question and answer, confidence in the answer, experience level, depth of detail, and clarity.\n\
         Extract the main mentioned keywords in the answer (e.g: names, organizations, tools)\n\
         Use the following structure for your response: (Scores must be from 0 to 1)\n\n\
         **Scoring Matrix**:\n\
         - Relevance: [Score]\n\
         - Clarity: [Score]\n\
         - Depth of Information: [Score]\n\
         - Extracted Keywords:\n\
         **Extracted Information**:\n\
         - Key strengths:\n",
        question = ctx.question,
        answer = ctx.transcript,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role_based_ctx() -> AnswerContext {
        AnswerContext {
            question: "What is a race condition?".to_owned(),
            keywords: vec!["mutex".to_owned(), "atomicity".to_owned()],
            transcript: "A race condition happens when two threads touch shared state.".to_owned(),
            question_type: QuestionType::RoleBased,
            template_answer: Some("Unsynchronized concurrent access to shared data.".to_owned()),
        }
    }

    fn personal_ctx() -> AnswerContext {
        AnswerContext {
            question: "Tell me about a project you led.".to_owned(),
            keywords: Vec::new(),
            transcript: "I led a team of five engineers to ship a payment gateway".to_owned(),
            question_type: QuestionType::Personal,
            template_answer: None,
        }
    }

    #[test]
    fn identical_inputs_render_identical_prompts() {
        let ctx = role_based_ctx();
        assert_eq!(build_prompt(&ctx), build_prompt(&ctx));
        let ctx = personal_ctx();
        assert_eq!(build_prompt(&ctx), build_prompt(&ctx));
    }

    #[test]
    fn role_based_prompt_contains_all_score_labels() {
        let prompt = build_prompt(&role_based_ctx());
        for label in [
            "Relevance:",
            "Clarity:",
            "Depth of Information:",
            "Keywords Coverage:",
            "Extracted Keywords:",
            "Matching Keywords:",
            "Alignment with Template Answer:",
            "Key strengths:",
            "Areas for improvement:",
        ] {
            assert!(prompt.contains(label), "missing label {label}");
        }
    }

    #[test]
    fn role_based_prompt_includes_keywords_and_template() {
        let prompt = build_prompt(&role_based_ctx());
        assert!(prompt.contains("mutex, atomicity"));
        assert!(prompt.contains("Unsynchronized concurrent access"));
    }

    #[test]
    fn missing_template_answer_renders_none_placeholder() {
        let mut ctx = role_based_ctx();
        ctx.template_answer = None;
        let prompt = build_prompt(&ctx);
        assert!(prompt.contains("Template Answer: None\n"));
    }

    #[test]
    fn personal_prompt_omits_keywords_and_template() {
        let prompt = build_prompt(&personal_ctx());
        assert!(!prompt.contains("Template Answer:"));
        assert!(!prompt.contains("Keywords Coverage:"));
        assert!(!prompt.contains("Important keywords"));
        assert!(prompt.contains("Extracted Keywords:"));
        assert!(prompt.contains("Key strengths:"));
    }

    #[test]
    fn scores_bounded_instruction_present_in_both_templates() {
        for ctx in [role_based_ctx(), personal_ctx()] {
            assert!(build_prompt(&ctx).contains("(Scores must be from 0 to 1)"));
        }
    }
}
