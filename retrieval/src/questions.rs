//! Question files and their answered output.
//!
//! The question CSV is kept row for row so the output file carries every
//! original column plus one answer column.

use std::io::{Read, Write};
use std::path::Path;

use csv::StringRecord;
use tracing::info;

use crate::error::{CorpusError, Result};

/// Default header of the question column.
pub const DEFAULT_QUESTION_COLUMN: &str = "Вопрос";

/// Default header of the appended answer column.
pub const DEFAULT_ANSWER_COLUMN: &str = "Ответы на вопрос";

/// Rows of a question CSV.
#[derive(Debug, Clone)]
pub struct QuestionSet {
    headers: StringRecord,
    rows: Vec<StringRecord>,
    question_column: usize,
}

impl QuestionSet {
    /// Read questions, locating the question column by header name.
    pub fn from_reader(reader: impl Read, question_column: &str) -> Result<Self> {
        let mut csv = csv::Reader::from_reader(reader);
        let headers = csv.headers()?.clone();
        let column = headers
            .iter()
            .position(|h| h.trim() == question_column)
            .ok_or_else(|| CorpusError::MissingColumn(question_column.to_string()))?;

        let rows = csv
            .records()
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            headers,
            rows,
            question_column: column,
        })
    }

    /// Read questions from a CSV file.
    pub fn from_csv(path: impl AsRef<Path>, question_column: &str) -> Result<Self> {
        let path = path.as_ref();
        let set = Self::from_reader(std::fs::File::open(path)?, question_column)?;
        info!("Loaded {} questions from {}", set.len(), path.display());
        Ok(set)
    }

    /// Question texts in file order.
    pub fn questions(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| row.get(self.question_column).unwrap_or_default().to_string())
            .collect()
    }

    /// Number of questions.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the file had no question rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write all original columns plus `answer_column`.
    ///
    /// `answers[i]` must belong to question `i`.
    pub fn write_with_answers(
        &self,
        writer: impl Write,
        answers: &[String],
        answer_column: &str,
    ) -> Result<()> {
        if answers.len() != self.rows.len() {
            return Err(CorpusError::AnswerCount {
                expected: self.rows.len(),
                actual: answers.len(),
            }
            .into());
        }

        let mut csv = csv::Writer::from_writer(writer);

        let mut headers = self.headers.clone();
        headers.push_field(answer_column);
        csv.write_record(&headers)?;

        for (row, answer) in self.rows.iter().zip(answers) {
            let mut record = row.clone();
            record.push_field(answer);
            csv.write_record(&record)?;
        }

        csv.flush()?;
        Ok(())
    }

    /// Write the answered set to a file.
    pub fn save_with_answers(
        &self,
        path: impl AsRef<Path>,
        answers: &[String],
        answer_column: &str,
    ) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        self.write_with_answers(std::fs::File::create(path)?, answers, answer_column)?;
        info!("Wrote {} answers to {}", answers.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RetrievalError;
    use pretty_assertions::assert_eq;

    const DATA: &str = "ID,Вопрос\n1,Как открыть вклад?\n2,\"Что такое\nкредит?\"\n";

    #[test]
    fn test_questions_in_file_order() {
        let set = QuestionSet::from_reader(DATA.as_bytes(), DEFAULT_QUESTION_COLUMN).unwrap();
        assert_eq!(
            set.questions(),
            vec!["Как открыть вклад?", "Что такое\nкредит?"]
        );
    }

    #[test]
    fn test_missing_question_column() {
        let err = QuestionSet::from_reader(DATA.as_bytes(), "Question").unwrap_err();
        assert!(matches!(
            err,
            RetrievalError::Corpus(CorpusError::MissingColumn(ref c)) if c == "Question"
        ));
    }

    #[test]
    fn test_write_with_answers_appends_column() {
        let set = QuestionSet::from_reader(DATA.as_bytes(), DEFAULT_QUESTION_COLUMN).unwrap();
        let mut out = Vec::new();
        set.write_with_answers(
            &mut out,
            &["Через приложение.".to_string(), "Заём, ответ 2".to_string()],
            DEFAULT_ANSWER_COLUMN,
        )
        .unwrap();

        let written = String::from_utf8(out).unwrap();
        assert_eq!(
            written,
            "ID,Вопрос,Ответы на вопрос\n\
             1,Как открыть вклад?,Через приложение.\n\
             2,\"Что такое\nкредит?\",\"Заём, ответ 2\"\n"
        );
    }

    #[test]
    fn test_answer_count_must_match() {
        let set = QuestionSet::from_reader(DATA.as_bytes(), DEFAULT_QUESTION_COLUMN).unwrap();
        let err = set
            .write_with_answers(Vec::new(), &["only one".to_string()], DEFAULT_ANSWER_COLUMN)
            .unwrap_err();
        assert!(matches!(
            err,
            RetrievalError::Corpus(CorpusError::AnswerCount {
                expected: 2,
                actual: 1
            })
        ));
    }
}
