// Tag-pattern chunk grammar, e.g. "NP: {<ADJ>*<NOUN|PROPN>}".
//
// Each rule is compiled to a regular expression over the sentence's tag
// sequence rendered as "<DET><ADJ><NOUN>...". Angle brackets cannot occur
// inside a tag, so a match always starts and ends on a token boundary.

use regex_lite::Regex;

use super::tagger::PosTag;
use crate::error::HandlerError;

/// Rendered in place of a token an earlier rule already claimed. It has no
/// brackets, so no later rule can match across it.
const CLAIMED: &str = "#";

#[derive(Debug, Clone)]
struct ChunkRule {
    label: String,
    regex: Regex,
}

/// A span `[start, end)` of one sentence matched by a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub label: String,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone)]
pub struct ChunkGrammar {
    rules: Vec<ChunkRule>,
}

impl ChunkGrammar {
    /// Compile a grammar of `LABEL: {pattern}` rules, one per line. A line
    /// without a label continues the previous label.
    pub fn parse(grammar: &str) -> Result<Self, HandlerError> {
        let mut rules = Vec::new();
        let mut label: Option<String> = None;

        for line in grammar.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let body = match line.split_once(':') {
                Some((head, rest)) if is_label(head.trim()) => {
                    label = Some(head.trim().to_string());
                    rest.trim()
                }
                _ => line,
            };
            let label = label
                .clone()
                .ok_or_else(|| invalid(format!("rule {body:?} has no label")))?;

            let pattern = body
                .strip_prefix('{')
                .and_then(|b| b.strip_suffix('}'))
                .ok_or_else(|| {
                    if body.starts_with('}') {
                        invalid(format!("chink rules are not supported: {body:?}"))
                    } else {
                        invalid(format!("expected a {{...}} chunk rule, found {body:?}"))
                    }
                })?;

            rules.push(ChunkRule {
                label,
                regex: compile_tag_pattern(pattern)?,
            });
        }

        if rules.is_empty() {
            return Err(invalid("grammar has no rules".to_string()));
        }
        Ok(Self { rules })
    }

    /// Find every chunk in a tagged sentence, rule by rule, in sentence order
    /// within each rule.
    pub fn chunk(&self, tags: &[PosTag]) -> Vec<Chunk> {
        let mut claimed = vec![false; tags.len()];
        let mut chunks = Vec::new();

        for rule in &self.rules {
            let (rendered, starts) = render(tags, &claimed);

            for m in rule.regex.find_iter(&rendered) {
                if m.start() == m.end() {
                    continue;
                }
                let (Ok(start), Ok(end)) =
                    (starts.binary_search(&m.start()), starts.binary_search(&m.end()))
                else {
                    continue;
                };
                claimed[start..end].iter_mut().for_each(|c| *c = true);
                chunks.push(Chunk {
                    label: rule.label.clone(),
                    start,
                    end,
                });
            }
        }

        chunks.sort_by_key(|c| c.start);
        chunks
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

fn is_label(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

fn invalid(reason: String) -> HandlerError {
    HandlerError::invalid_param("grammar", reason)
}

/// Translate a tag pattern into a regex over rendered tags.
///
/// `<ADJ>*<NOUN|PROPN>` becomes `(<(ADJ)>)*(<(NOUN|PROPN)>)`; `.` inside a
/// tag matches any tag character.
fn compile_tag_pattern(pattern: &str) -> Result<Regex, HandlerError> {
    let pattern: String = pattern.chars().filter(|c| !c.is_whitespace()).collect();
    if pattern.is_empty() {
        return Err(invalid("empty tag pattern".to_string()));
    }

    let mut depth = 0usize;
    let mut out = String::with_capacity(pattern.len() * 2);
    for c in pattern.chars() {
        match c {
            '<' => {
                if depth > 0 {
                    return Err(invalid(format!("nested '<' in {pattern:?}")));
                }
                depth = 1;
                out.push_str("(<(");
            }
            '>' => {
                if depth == 0 {
                    return Err(invalid(format!("unbalanced '>' in {pattern:?}")));
                }
                depth = 0;
                out.push_str(")>)");
            }
            '.' if depth > 0 => out.push_str("[^<>]"),
            '{' | '}' => return Err(invalid(format!("unexpected brace in {pattern:?}"))),
            _ => out.push(c),
        }
    }
    if depth > 0 {
        return Err(invalid(format!("unclosed '<' in {pattern:?}")));
    }

    Regex::new(&out).map_err(|e| invalid(format!("bad tag pattern {pattern:?}: {e}")))
}

/// Render tags as "<TAG><TAG>..." and return each token's byte offset, plus
/// one trailing offset for the end of the string.
fn render(tags: &[PosTag], claimed: &[bool]) -> (String, Vec<usize>) {
    let mut rendered = String::new();
    let mut starts = Vec::with_capacity(tags.len() + 1);
    for (tag, &taken) in tags.iter().zip(claimed) {
        starts.push(rendered.len());
        if taken {
            rendered.push_str(CLAIMED);
        } else {
            rendered.push('<');
            rendered.push_str(tag.as_str());
            rendered.push('>');
        }
    }
    starts.push(rendered.len());
    (rendered, starts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use PosTag::*;

    #[test]
    fn test_adjective_noun_phrase() {
        let grammar = ChunkGrammar::parse("NP: {<ADJ>*<NOUN|PROPN>}").unwrap();
        // the large language model is new
        let tags = [Det, Adj, Noun, Noun, Aux, Adj];
        let chunks = grammar.chunk(&tags);
        assert_eq!(
            chunks,
            vec![
                Chunk { label: "NP".into(), start: 1, end: 3 },
                Chunk { label: "NP".into(), start: 3, end: 4 },
            ]
        );
    }

    #[test]
    fn test_one_or_more_nouns() {
        let grammar = ChunkGrammar::parse("NP:{<ADJ>*<NOUN|PROPN>+}").unwrap();
        let chunks = grammar.chunk(&[Adj, Noun, Propn, Verb, Noun]);
        assert_eq!(chunks.len(), 2);
        assert_eq!((chunks[0].start, chunks[0].end), (0, 3));
        assert_eq!((chunks[1].start, chunks[1].end), (4, 5));
    }

    #[test]
    fn test_later_rules_skip_claimed_tokens() {
        let grammar = ChunkGrammar::parse("NP: {<NOUN>+}\nVP: {<VERB><NOUN>}").unwrap();
        assert_eq!(grammar.rule_count(), 2);
        // VERB NOUN: the noun is claimed by NP first, so VP cannot match.
        let chunks = grammar.chunk(&[Verb, Noun]);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].label, "NP");
    }

    #[test]
    fn test_continuation_line_reuses_label() {
        let grammar = ChunkGrammar::parse("NP: {<PROPN>+}\n{<ADJ><NOUN>}").unwrap();
        let chunks = grammar.chunk(&[Adj, Noun, Verb, Propn]);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.label == "NP"));
    }

    #[test]
    fn test_wildcard_tag() {
        let grammar = ChunkGrammar::parse("ANY: {<N.*>}").unwrap();
        let chunks = grammar.chunk(&[Noun, Verb, Num]);
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn test_no_match_in_empty_sentence() {
        let grammar = ChunkGrammar::parse("NP: {<NOUN>}").unwrap();
        assert!(grammar.chunk(&[]).is_empty());
    }

    #[test]
    fn test_rejects_chink_rule() {
        let err = ChunkGrammar::parse("NP: }<DET>{").unwrap_err();
        assert!(matches!(err, HandlerError::InvalidParameter { ref key, .. } if key == "grammar"));
    }

    #[test]
    fn test_rejects_unbalanced_pattern() {
        assert!(ChunkGrammar::parse("NP: {<ADJ*<NOUN>}").is_err());
        assert!(ChunkGrammar::parse("NP: {ADJ>}").is_err());
        assert!(ChunkGrammar::parse("").is_err());
    }
}
