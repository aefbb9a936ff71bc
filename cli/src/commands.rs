//! Subcommand implementations.

use std::sync::Arc;

use anyhow::Context;
use finrag_embeddings::ProgressSink;
use finrag_retrieval::{
    CachedFullRebuild, ChatCompletionsGenerator, Corpus, Embedder, EmbeddingCache,
    OpenAIProvider, QuestionSet, RetrievalConfig, Retriever, answer_questions,
};

/// Load the corpus and bring its embeddings up to date.
async fn build_retriever(
    config: &RetrievalConfig,
    progress: &dyn ProgressSink,
) -> anyhow::Result<Retriever> {
    config.require_embedding_key()?;

    let path = &config.data.articles_path;
    let corpus = Corpus::from_csv(path)
        .with_context(|| format!("failed to load articles from {}", path.display()))?;

    let provider = Arc::new(OpenAIProvider::new(&config.embedding)?);
    let embedder = Embedder::from_config(provider, &config.embedding);
    let builder = CachedFullRebuild::new(
        EmbeddingCache::new(&config.data.cache_path),
        embedder.clone(),
        config.embed_field,
    );

    Ok(Retriever::build(corpus, embedder, &builder, progress).await?)
}

pub async fn embed(config: &RetrievalConfig, progress: &dyn ProgressSink) -> anyhow::Result<()> {
    let retriever = build_retriever(config, progress).await?;
    println!(
        "{} articles embedded, cache at {}",
        retriever.corpus().len(),
        config.data.cache_path.display()
    );
    Ok(())
}

pub async fn search(
    config: &RetrievalConfig,
    question: &str,
    limit: usize,
    progress: &dyn ProgressSink,
) -> anyhow::Result<()> {
    let retriever = build_retriever(config, progress).await?;
    let ranked = retriever.retrieve_top_k(question, limit).await?;

    if ranked.is_empty() {
        println!("No matching articles.");
        return Ok(());
    }
    for (rank, article) in ranked.iter().enumerate() {
        println!(
            "{}. [{}] {:.4}  {}",
            rank + 1,
            article.id,
            article.score,
            article.annotation
        );
    }
    Ok(())
}

pub async fn run(config: &RetrievalConfig, progress: &dyn ProgressSink) -> anyhow::Result<()> {
    config.require_generation_key()?;
    let generator = ChatCompletionsGenerator::new(&config.generation)?;

    let data = &config.data;
    let questions = QuestionSet::from_csv(&data.questions_path, &data.question_column)
        .with_context(|| {
            format!(
                "failed to load questions from {}",
                data.questions_path.display()
            )
        })?;

    let retriever = build_retriever(config, progress).await?;
    let answered = answer_questions(
        &retriever,
        &generator,
        &questions.questions(),
        config.concurrency,
        progress,
    )
    .await?;

    let answers: Vec<String> = answered.into_iter().map(|a| a.answer).collect();
    questions
        .save_with_answers(&data.output_path, &answers, &data.answer_column)
        .with_context(|| format!("failed to write {}", data.output_path.display()))?;

    println!(
        "{} answers written to {}",
        answers.len(),
        data.output_path.display()
    );
    Ok(())
}
