//! Prompt and reply validation for multiple-choice quizzes built from a summary.

use super::types::{QuizError, QuizQuestion};

pub(crate) const QUESTION_COUNT: usize = 5;
pub(crate) const OPTION_COUNT: usize = 4;

/// Build the quiz prompt for `summary_text`.
pub(crate) fn build_quiz_prompt(language: &str, summary_text: &str) -> String {
    format!(
        "Create a quiz of exactly {QUESTION_COUNT} multiple-choice questions in {language} based \
         only on the summary below. Each question must have exactly {OPTION_COUNT} options and a \
         single correct answer that is identical to one of the options.\n\
         Reply with a JSON array only, no prose and no Markdown, where every element has the form \
         {{\"question\": string, \"options\": [string, string, string, string], \"answer\": string}}.\n\n\
         Summary:\n{}",
        summary_text.trim()
    )
}

/// Parse and validate the vendor reply.
pub(crate) fn parse_quiz(reply: &str) -> Result<Vec<QuizQuestion>, QuizError> {
    let json = strip_code_fence(reply);
    let questions: Vec<QuizQuestion> =
        serde_json::from_str(json).map_err(|error| QuizError::Malformed(error.to_string()))?;

    if questions.len() != QUESTION_COUNT {
        return Err(QuizError::Invalid(format!(
            "expected {QUESTION_COUNT} questions, got {}",
            questions.len()
        )));
    }

    for (index, question) in questions.iter().enumerate() {
        let number = index + 1;
        if question.question.trim().is_empty() {
            return Err(QuizError::Invalid(format!("question {number} is blank")));
        }
        if question.options.len() != OPTION_COUNT {
            return Err(QuizError::Invalid(format!(
                "question {number} has {} options",
                question.options.len()
            )));
        }
        if !question.options.iter().any(|option| option == &question.answer) {
            return Err(QuizError::Invalid(format!(
                "question {number} answer is not one of its options"
            )));
        }
    }

    Ok(questions)
}

// Models often wrap JSON in ```json fences despite being told not to.
fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
