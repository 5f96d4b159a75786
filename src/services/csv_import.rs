use csv::ReaderBuilder;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CsvImportError {
    #[error("Failed to parse CSV: {0}")]
    Malformed(#[from] csv::Error),
}

/// One normalized question row, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedQuestionRow {
    pub question_text: String,
    pub option1: String,
    pub option2: String,
    pub option3: String,
    pub option4: String,
    pub option5: String,
    pub answer: String,
    pub explanation: String,
    pub question_type: i32,
    pub section: String,
}

/// Legacy numeric subject codes remap to canonical section codes; everything
/// else (including already-canonical codes) passes through unchanged.
fn normalize_section(raw: &str) -> String {
    let section = raw.trim();
    if section.is_empty() {
        return "0".to_string();
    }
    match section {
        "1" => "p".to_string(),
        "2" => "c".to_string(),
        "3" => "m".to_string(),
        "4" => "b".to_string(),
        _ => section.to_string(),
    }
}

/// Parses CSV text into normalized question rows.
///
/// The first row is a header row; header names are matched case-insensitively
/// and trimmed. Question text comes from a `questions` cell when non-empty,
/// falling back to a `question` cell. Rows whose resolved text is blank are
/// skipped without leaving gaps in the output order.
///
/// With `convert_zero_indexed`, a single-character answer `0`-`4` is shifted
/// to the 1-based convention (`0` -> `1` ... `4` -> `5`); any other answer
/// value passes through unchanged.
pub fn parse_csv(
    csv_text: &str,
    convert_zero_indexed: bool,
) -> Result<Vec<ParsedQuestionRow>, CsvImportError> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_reader(csv_text.as_bytes());

    let headers = reader.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    };

    let questions_col = column("questions");
    let question_col = column("question");
    let option_cols = [
        column("option1"),
        column("option2"),
        column("option3"),
        column("option4"),
        column("option5"),
    ];
    let answer_col = column("answer");
    let explanation_col = column("explanation");
    let type_col = column("type");
    let section_col = column("section");

    let mut rows = Vec::new();

    for record in reader.records() {
        let record = record?;
        let cell = |col: Option<usize>| col.and_then(|i| record.get(i)).unwrap_or("");

        // A present-but-empty `questions` cell falls back to `question`.
        let question_text = match cell(questions_col) {
            "" => cell(question_col),
            text => text,
        };

        if question_text.trim().is_empty() {
            continue;
        }

        let mut answer = cell(answer_col).trim().to_string();
        if convert_zero_indexed && answer.len() == 1 {
            if let b @ b'0'..=b'4' = answer.as_bytes()[0] {
                answer = ((b - b'0' + 1) as u32).to_string();
            }
        }

        rows.push(ParsedQuestionRow {
            question_text: question_text.to_string(),
            option1: cell(option_cols[0]).trim().to_string(),
            option2: cell(option_cols[1]).trim().to_string(),
            option3: cell(option_cols[2]).trim().to_string(),
            option4: cell(option_cols[3]).trim().to_string(),
            option5: cell(option_cols[4]).trim().to_string(),
            answer,
            explanation: cell(explanation_col).trim().to_string(),
            question_type: cell(type_col).trim().parse().unwrap_or(0),
            section: normalize_section(cell(section_col)),
        });
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_matching_is_case_insensitive() {
        for header in ["question", "Question", "QUESTIONS ", "questions"] {
            let csv = format!("{header},answer\nWhat is 2+2?,4\n");
            let rows = parse_csv(&csv, false).unwrap();
            assert_eq!(rows.len(), 1, "header {header:?} not resolved");
            assert_eq!(rows[0].question_text, "What is 2+2?");
        }
    }

    #[test]
    fn test_questions_column_wins_over_question() {
        let csv = "questions,question\nprimary,secondary\n";
        let rows = parse_csv(csv, false).unwrap();
        assert_eq!(rows[0].question_text, "primary");
    }

    #[test]
    fn test_empty_questions_cell_falls_back_to_question() {
        let csv = "questions,question\n,fallback\n";
        let rows = parse_csv(csv, false).unwrap();
        assert_eq!(rows[0].question_text, "fallback");
    }

    #[test]
    fn test_blank_rows_are_skipped_and_compacted() {
        let csv = "question,answer\nfirst,1\n   ,2\n,3\nthird,3\n";
        let rows = parse_csv(csv, false).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].question_text, "first");
        assert_eq!(rows[1].question_text, "third");
    }

    #[test]
    fn test_question_text_is_not_trimmed() {
        let csv = "question\n  padded  \n";
        let rows = parse_csv(csv, false).unwrap();
        assert_eq!(rows[0].question_text, "  padded  ");
    }

    #[test]
    fn test_optional_fields_default_to_empty() {
        let csv = "question\nonly text\n";
        let rows = parse_csv(csv, false).unwrap();
        let row = &rows[0];
        assert_eq!(row.option1, "");
        assert_eq!(row.option5, "");
        assert_eq!(row.answer, "");
        assert_eq!(row.explanation, "");
        assert_eq!(row.question_type, 0);
        assert_eq!(row.section, "0");
    }

    #[test]
    fn test_zero_indexed_conversion_boundaries() {
        let csv = "question,answer\na,0\nb,4\nc,5\nd,A\n";
        let rows = parse_csv(csv, true).unwrap();
        assert_eq!(rows[0].answer, "1");
        assert_eq!(rows[1].answer, "5");
        assert_eq!(rows[2].answer, "5"); // out of 0-4 range, unchanged
        assert_eq!(rows[3].answer, "A");
    }

    #[test]
    fn test_zero_indexed_conversion_disabled() {
        let csv = "question,answer\na,0\n";
        let rows = parse_csv(csv, false).unwrap();
        assert_eq!(rows[0].answer, "0");
    }

    #[test]
    fn test_multichar_answer_is_never_converted() {
        let csv = "question,answer\na,04\n";
        let rows = parse_csv(csv, true).unwrap();
        assert_eq!(rows[0].answer, "04");
    }

    #[test]
    fn test_section_remap_exactness() {
        let csv = "question,section\na,2\nb,p\nc,\nd,9\n";
        let rows = parse_csv(csv, false).unwrap();
        assert_eq!(rows[0].section, "c");
        assert_eq!(rows[1].section, "p"); // no double-mapping
        assert_eq!(rows[2].section, "0");
        assert_eq!(rows[3].section, "9"); // unmapped numeric passes through
    }

    #[test]
    fn test_type_parses_with_zero_fallback() {
        let csv = "question,type\na,3\nb,abc\nc,\n";
        let rows = parse_csv(csv, false).unwrap();
        assert_eq!(rows[0].question_type, 3);
        assert_eq!(rows[1].question_type, 0);
        assert_eq!(rows[2].question_type, 0);
    }

    #[test]
    fn test_fields_are_trimmed() {
        let csv = "question,option1,answer,explanation\nq, first option , 2 , because \n";
        let rows = parse_csv(csv, false).unwrap();
        assert_eq!(rows[0].option1, "first option");
        assert_eq!(rows[0].answer, "2");
        assert_eq!(rows[0].explanation, "because");
    }

    #[test]
    fn test_parsing_is_deterministic() {
        let csv = "question,answer,section\nq1,0,1\nq2,3,x\n";
        let first = parse_csv(csv, true).unwrap();
        let second = parse_csv(csv, true).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_header_only_csv_yields_no_rows() {
        let rows = parse_csv("question,option1,answer\n", false).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_malformed_csv_is_an_error() {
        let csv = "question,answer\n\"unterminated,1\n";
        assert!(parse_csv(csv, false).is_err());
    }
}
