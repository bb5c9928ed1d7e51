//! Inline-span splitter: `**bold**` and `__underline__` regions.
//!
//! The two delimiters never nest and never overlap. The scan repeatedly
//! takes the *first* opening delimiter in the remaining text, looks for the
//! next occurrence of the same delimiter, emits the plain prefix and the
//! styled region, then continues on whatever follows the closing delimiter.
//!
//! An opening delimiter with no matching close turns the whole remainder of
//! the line (delimiter included) into one plain span, so a stray `**` in
//! model output is printed rather than swallowing text.

use super::block::{Block, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delimiter {
    Bold,
    Underline,
}

impl Delimiter {
    const ALL: [Delimiter; 2] = [Delimiter::Bold, Delimiter::Underline];

    fn marker(self) -> &'static str {
        match self {
            Delimiter::Bold => "**",
            Delimiter::Underline => "__",
        }
    }

    fn span(self, text: &str) -> Span {
        match self {
            Delimiter::Bold => Span::bold(text),
            Delimiter::Underline => Span::underline(text),
        }
    }
}

/// Earliest opening delimiter in `text`, if any.
fn first_opening(text: &str) -> Option<(usize, Delimiter)> {
    Delimiter::ALL
        .iter()
        .filter_map(|&d| text.find(d.marker()).map(|pos| (pos, d)))
        .min_by_key(|&(pos, _)| pos)
}

/// Split one line into spans. Empty spans are skipped, but the result is
/// never empty: a line with no visible text yields one empty plain span.
pub fn split_spans(line: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut rest = line;

    while !rest.is_empty() {
        let Some((start, delim)) = first_opening(rest) else {
            push_nonempty(&mut spans, Span::plain(rest));
            break;
        };

        let (before, opened) = rest.split_at(start);
        let body = &opened[delim.marker().len()..];

        match body.find(delim.marker()) {
            Some(end) => {
                push_nonempty(&mut spans, Span::plain(before));
                push_nonempty(&mut spans, delim.span(&body[..end]));
                rest = &body[end + delim.marker().len()..];
            }
            None => {
                // Unterminated: keep everything literally.
                push_nonempty(&mut spans, Span::plain(rest));
                break;
            }
        }
    }

    if spans.is_empty() {
        spans.push(Span::plain(""));
    }
    spans
}

fn push_nonempty(spans: &mut Vec<Span>, span: Span) {
    if !span.text.is_empty() {
        spans.push(span);
    }
}

/// Wrap a line's spans in a [`Block::Paragraph`].
pub fn build_paragraph(line: &str) -> Block {
    Block::Paragraph {
        spans: split_spans(line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concat(spans: &[Span]) -> String {
        spans.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn plain_line_is_single_span() {
        assert_eq!(split_spans("Just text"), vec![Span::plain("Just text")]);
    }

    #[test]
    fn bold_and_underline_regions() {
        let spans = split_spans("Revenue grew **40%** last __quarter__");
        assert_eq!(
            spans,
            vec![
                Span::plain("Revenue grew "),
                Span::bold("40%"),
                Span::plain(" last "),
                Span::underline("quarter"),
            ]
        );
    }

    #[test]
    fn underline_sets_both_flags() {
        let spans = split_spans("__x__");
        assert!(spans[0].bold);
        assert!(spans[0].underline);
    }

    #[test]
    fn unterminated_bold_kept_literally() {
        let spans = split_spans("Sale **ends soon");
        assert_eq!(spans, vec![Span::plain("Sale **ends soon")]);
    }

    #[test]
    fn unterminated_after_closed_region() {
        let spans = split_spans("**a** then __b");
        assert_eq!(spans, vec![Span::bold("a"), Span::plain(" then __b")]);
    }

    #[test]
    fn unterminated_first_marker_swallows_later_pairs() {
        // The first opening wins even if a later pair of the other kind is closed.
        let spans = split_spans("x ** y __z__");
        assert_eq!(spans, vec![Span::plain("x ** y __z__")]);
    }

    #[test]
    fn markers_of_other_kind_inside_region_are_literal() {
        let spans = split_spans("**a __b__ c**");
        assert_eq!(spans, vec![Span::bold("a __b__ c")]);
    }

    #[test]
    fn empty_region_is_dropped() {
        assert_eq!(split_spans("a****b"), vec![Span::plain("a"), Span::plain("b")]);
        assert_eq!(split_spans("****"), vec![Span::plain("")]);
    }

    #[test]
    fn empty_line_yields_one_empty_span() {
        assert_eq!(split_spans(""), vec![Span::plain("")]);
    }

    #[test]
    fn triple_asterisks_do_not_panic() {
        let spans = split_spans("***bold***");
        assert_eq!(spans, vec![Span::bold("*bold"), Span::plain("*")]);
    }

    #[test]
    fn multibyte_text_is_split_on_char_boundaries() {
        let spans = split_spans("Réduction **−30 %** à Noël");
        assert_eq!(concat(&spans), "Réduction −30 % à Noël");
        assert_eq!(spans[1], Span::bold("−30 %"));
    }

    #[test]
    fn concatenation_reconstructs_stripped_line() {
        let spans = split_spans("A **b** c __d__ e");
        assert_eq!(concat(&spans), "A b c d e");
    }

    #[test]
    fn build_paragraph_wraps_spans() {
        match build_paragraph("**Hi**") {
            Block::Paragraph { spans } => assert_eq!(spans, vec![Span::bold("Hi")]),
            other => panic!("expected paragraph, got {other:?}"),
        }
    }
}
