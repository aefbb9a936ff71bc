//! Batch question answering.

use futures::{StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use finrag_embeddings::ProgressSink;

use crate::answer::AnswerGenerator;
use crate::engine::{RetrievedArticle, Retriever};
use crate::error::Result;

/// The outcome for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnsweredQuestion {
    /// Position of the question in the input.
    pub position: usize,

    /// The question text.
    pub question: String,

    /// The article the answer was grounded in.
    pub article: RetrievedArticle,

    /// The generated answer.
    pub answer: String,
}

/// Retrieve and answer one question.
pub async fn answer_question(
    retriever: &Retriever,
    generator: &dyn AnswerGenerator,
    position: usize,
    question: &str,
) -> Result<AnsweredQuestion> {
    let article = retriever.retrieve(question).await?;
    let answer = generator.generate(question, &article.text).await?;
    debug!(
        "Question {position} answered from article {} (score {:.4})",
        article.id, article.score
    );

    Ok(AnsweredQuestion {
        position,
        question: question.to_string(),
        article,
        answer,
    })
}

/// Answer every question, keeping at most `concurrency` in flight.
///
/// The returned answers are in question order regardless of completion
/// order. The first failure stops the batch and is returned.
pub async fn answer_questions(
    retriever: &Retriever,
    generator: &dyn AnswerGenerator,
    questions: &[String],
    concurrency: usize,
    progress: &dyn ProgressSink,
) -> Result<Vec<AnsweredQuestion>> {
    info!(
        "Answering {} questions with concurrency {}",
        questions.len(),
        concurrency.max(1)
    );
    progress.start("Answering questions", questions.len());

    let answers = futures::stream::iter(questions.iter().enumerate())
        .map(|(position, question)| async move {
            let answered = answer_question(retriever, generator, position, question).await;
            progress.advance(1);
            answered
        })
        .buffered(concurrency.max(1))
        .try_collect::<Vec<_>>()
        .await?;

    progress.finish();
    Ok(answers)
}
