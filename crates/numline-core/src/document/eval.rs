use numline_engine::engine::{EvalContext, Quantity, Token, Variable, format_number, tokenize};

use super::line::{LineType, ParsedLine, classify};

const SUM_WORDS: &[&str] = &["sum", "total"];
const AVERAGE_WORDS: &[&str] = &["average", "avg"];

fn is_any_word(token: &Token, words: &[&str]) -> bool {
    words.iter().any(|w| token.is_word(w))
}

/// Evaluates documents line by line.
///
/// Owns the per-document state: the variable table and previous result live
/// in the [`EvalContext`], the lines produced so far drive block aggregation.
pub struct Evaluator {
    ctx: EvalContext,
    lines: Vec<ParsedLine>,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::with_context(EvalContext::new())
    }

    pub fn with_context(ctx: EvalContext) -> Self {
        Evaluator {
            ctx,
            lines: Vec::new(),
        }
    }

    /// Lines evaluated since the last reset.
    pub fn lines(&self) -> &[ParsedLine] {
        &self.lines
    }

    /// Reset state, then evaluate every line of `text`.
    ///
    /// The result has one entry per `\n`-separated line, including a trailing
    /// empty one.
    pub fn evaluate_document(&mut self, text: &str) -> Vec<ParsedLine> {
        self.clear();
        for (idx, line) in text.split('\n').enumerate() {
            let parsed = self.parse_line(idx, line);
            self.lines.push(parsed);
        }
        tracing::debug!(lines = self.lines.len(), "document evaluated");
        self.lines.clone()
    }

    /// Evaluate one more line against the current state.
    ///
    /// Returns the formatted result, `Error: <message>`, or an empty string
    /// for blank, header and comment lines.
    pub fn evaluate_line(&mut self, text: &str) -> String {
        let parsed = self.parse_line(self.lines.len(), text);
        let shown = parsed.display().unwrap_or_default();
        self.lines.push(parsed);
        shown
    }

    /// Variables sorted by name.
    pub fn variables(&self) -> Vec<Variable> {
        self.ctx.variables()
    }

    /// Forget variables, the previous result and all lines.
    pub fn clear(&mut self) {
        self.ctx.clear();
        self.lines.clear();
    }

    fn parse_line(&mut self, line_number: usize, input: &str) -> ParsedLine {
        let (line_type, header_level) = classify(input);
        let mut parsed = ParsedLine::passive(line_number, input, line_type);
        if line_type != LineType::Calculation {
            parsed.header_level = header_level;
            return parsed;
        }

        match self.calculate(input.trim()) {
            Ok(quantity) => {
                parsed.result = Some(format_number(quantity.value));
                parsed.value = Some(quantity.value);
                self.ctx.set_previous(Some(quantity.value));
            }
            Err(err) => {
                tracing::debug!(line = line_number + 1, error = %err, "line failed");
                parsed.error = Some(err.to_string());
            }
        }
        parsed
    }

    fn calculate(&mut self, text: &str) -> numline_engine::Result<Quantity> {
        let mut tokens = tokenize(text);

        let target = match tokens.as_slice() {
            [Token::Ident(name), Token::Equals, rest @ ..] if !rest.is_empty() => {
                Some(name.clone())
            }
            _ => None,
        };
        if target.is_some() {
            tokens.drain(..2);
        }

        let tokens = self.substitute_aggregates(tokens);
        let quantity = self.ctx.evaluate_tokens(tokens)?;

        if let Some(name) = target {
            self.ctx.define(&name, quantity.value, quantity.unit.clone());
        }
        Ok(quantity)
    }

    fn substitute_aggregates(&self, tokens: Vec<Token>) -> Vec<Token> {
        let wants_sum = tokens.iter().any(|t| is_any_word(t, SUM_WORDS));
        let wants_avg = tokens.iter().any(|t| is_any_word(t, AVERAGE_WORDS));
        if !wants_sum && !wants_avg {
            return tokens;
        }

        let values = block_values(&self.lines);
        let sum: f64 = values.iter().sum();
        let average = if values.is_empty() {
            0.0
        } else {
            sum / values.len() as f64
        };

        tokens
            .into_iter()
            .map(|t| {
                if is_any_word(&t, SUM_WORDS) {
                    Token::Number(sum)
                } else if is_any_word(&t, AVERAGE_WORDS) {
                    Token::Number(average)
                } else {
                    t
                }
            })
            .collect()
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

/// Numeric results of the block above the current line.
///
/// Blank lines directly above the current line are stepped over; the walk
/// then stops at the next blank line or the start of the document. Lines
/// without a numeric result are skipped.
fn block_values(lines: &[ParsedLine]) -> Vec<f64> {
    lines
        .iter()
        .rev()
        .skip_while(|l| l.line_type == LineType::Blank)
        .take_while(|l| l.line_type != LineType::Blank)
        .filter_map(|l| l.value)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use numline_engine::engine::CurrencyService;
    use std::sync::Arc;

    fn evaluator() -> Evaluator {
        Evaluator::with_context(EvalContext::with_currency(Arc::new(CurrencyService::new())))
    }

    fn results(text: &str) -> Vec<Option<String>> {
        evaluator()
            .evaluate_document(text)
            .into_iter()
            .map(|l| l.result)
            .collect()
    }

    #[test]
    fn test_variable_then_use() {
        let lines = evaluator().evaluate_document("x = 10\nx * 2");
        assert_eq!(lines[0].result.as_deref(), Some("10"));
        assert_eq!(lines[1].result.as_deref(), Some("20"));
    }

    #[test]
    fn test_scenarios() {
        assert_eq!(results("20 inches in cm"), vec![Some("50.8".into())]);
        assert_eq!(results("100 - 20%"), vec![Some("80".into())]);
        assert_eq!(results("$100 - 5%"), vec![Some("95".into())]);
    }

    #[test]
    fn test_sum_skips_blank_directly_above() {
        let lines = evaluator().evaluate_document("10\n20\n\nsum");
        assert_eq!(lines[3].result.as_deref(), Some("30"));
    }

    #[test]
    fn test_aggregation_stops_at_block_boundary() {
        let lines = evaluator().evaluate_document("100\n\n10\n20\ntotal\navg");
        assert_eq!(lines[4].result.as_deref(), Some("30"));
        // The block now holds 10, 20 and the total of 30.
        assert_eq!(lines[5].result.as_deref(), Some("20"));
    }

    #[test]
    fn test_aggregation_skips_errors_and_non_calculations() {
        let lines = evaluator().evaluate_document("# Costs\n10\n// rent below\nbogus\n30\nAVERAGE");
        assert!(lines[3].is_error());
        assert_eq!(lines[5].result.as_deref(), Some("20"));
    }

    #[test]
    fn test_empty_block_aggregates_to_zero() {
        assert_eq!(results("sum + 1"), vec![Some("1".into())]);
        assert_eq!(results("avg"), vec![Some("0".into())]);
    }

    #[test]
    fn test_assignment_target_is_not_an_aggregate() {
        let mut eval = evaluator();
        let lines = eval.evaluate_document("5\n7\ntotal = sum\ntotal * 2");
        assert_eq!(lines[2].result.as_deref(), Some("12"));
        // Aggregate words win over a variable of the same name: 5 + 7 + 12.
        assert_eq!(lines[3].result.as_deref(), Some("48"));
        assert_eq!(eval.variables()[0].value, 12.0);
    }

    #[test]
    fn test_unknown_currency_is_line_error() {
        let lines = evaluator().evaluate_document("5 XYZ in USD");
        let error = lines[0].error.as_deref().unwrap();
        assert!(error.contains("Unknown currency"));
        assert!(error.contains("XYZ"));
        assert_eq!(lines[0].result, None);
    }

    #[test]
    fn test_category_mismatch_is_line_error() {
        let lines = evaluator().evaluate_document("10 kg in cm");
        assert_eq!(
            lines[0].error.as_deref(),
            Some("Cannot convert between weight and length")
        );
    }

    #[test]
    fn test_errors_do_not_abort_document() {
        let lines = evaluator().evaluate_document("1 + 1\nfoo bar\n3 * 3");
        assert_eq!(lines[0].result.as_deref(), Some("2"));
        assert!(lines[1].is_error());
        assert_eq!(lines[2].result.as_deref(), Some("9"));
    }

    #[test]
    fn test_output_length_matches_input_lines() {
        let text = "# Title\n\n1 + 1\n// note\n";
        let lines = evaluator().evaluate_document(text);
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[4].line_type, LineType::Blank);
        assert_eq!(lines[0].header_level, Some(1));
        assert_eq!(lines[3].line_type, LineType::Comment);
        assert_eq!(lines[2].line_number, 2);
        assert_eq!(lines[3].input, "// note");
    }

    #[test]
    fn test_prev_tracks_last_success() {
        let lines = evaluator().evaluate_document("prev\n4\nnope\nprev * 2");
        assert!(lines[0].is_error());
        assert_eq!(lines[3].result.as_deref(), Some("8"));
    }

    #[test]
    fn test_variables_visible_only_to_later_lines() {
        let lines = evaluator().evaluate_document("y + 1\ny = 3\ny + 1");
        assert_eq!(
            lines[0].error.as_deref(),
            Some("Undefined symbol: y")
        );
        assert_eq!(lines[2].result.as_deref(), Some("4"));
    }

    #[test]
    fn test_variable_keeps_conversion_unit() {
        let mut eval = evaluator();
        eval.evaluate_document("d = 5 km in miles\nc = 100 USD in EUR\nn = 2 + 2");
        let vars = eval.variables();
        let names: Vec<&str> = vars.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["c", "d", "n"]);
        assert_eq!(vars[0].unit.as_deref(), Some("EUR"));
        assert_eq!(vars[1].unit.as_deref(), Some("mi"));
        assert_eq!(vars[2].unit, None);
    }

    #[test]
    fn test_document_pass_resets_state() {
        let mut eval = evaluator();
        eval.evaluate_document("x = 1");
        let lines = eval.evaluate_document("x");
        assert!(lines[0].is_error());
        assert!(eval.variables().is_empty());
    }

    #[test]
    fn test_evaluate_line_shares_state() {
        let mut eval = evaluator();
        assert_eq!(eval.evaluate_line("rate = 4"), "4");
        assert_eq!(eval.evaluate_line("rate * 2"), "8");
        assert_eq!(eval.evaluate_line("sum"), "12");
        assert_eq!(eval.evaluate_line("# header"), "");
        assert_eq!(eval.evaluate_line("nope"), "Error: Undefined symbol: nope");

        eval.clear();
        assert!(eval.lines().is_empty());
        assert_eq!(eval.evaluate_line("prev"), "Error: Undefined symbol: prev");
    }
}
