//! Parse decoded model output into relation triples
//!
//! The model emits linearized triplets:
//!
//! ```text
//! <triplet> head <subj> tail <obj> relation [<subj> tail <obj> relation]...
//! ```
//!
//! A `<subj>` following a completed triple starts another triple sharing the
//! same head. Parsing never fails: malformed or truncated output simply yields
//! fewer triples.

use kbforge_domain::RelationTriple;
use tracing::debug;

const TRIPLET: &str = "<triplet>";
const SUBJECT_END: &str = "<subj>";
const OBJECT_END: &str = "<obj>";

/// Decoder control tokens stripped before parsing
const NOISE_TOKENS: [&str; 3] = ["<s>", "<pad>", "</s>"];

/// Field currently being collected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Before the first marker; text is discarded
    Idle,
    /// After `<triplet>`
    Head,
    /// After `<subj>`
    Tail,
    /// After `<obj>`
    Relation,
}

/// Partially assembled triple
#[derive(Debug, Default)]
struct OpenTriple {
    head: String,
    tail: String,
    relation: String,
}

impl OpenTriple {
    fn push(field: &mut String, token: &str) {
        if !field.is_empty() {
            field.push(' ');
        }
        field.push_str(token);
    }

    fn emit_into(&self, triples: &mut Vec<RelationTriple>) {
        let triple = RelationTriple::new(&self.head, &self.relation, &self.tail);
        if triple.is_complete() {
            triples.push(triple);
        }
    }
}

/// Parse one decoded string into triples, in emission order
///
/// Triples are not deduplicated here.
///
/// # Examples
///
/// ```
/// use kbforge_extractor::parse_relations;
///
/// let triples = parse_relations("<s><triplet> Paris <subj> France <obj> capital of</s>");
/// assert_eq!(triples.len(), 1);
/// assert_eq!(triples[0].head, "Paris");
/// assert_eq!(triples[0].tail, "France");
/// assert_eq!(triples[0].relation, "capital of");
/// ```
pub fn parse_relations(decoded: &str) -> Vec<RelationTriple> {
    let cleaned = NOISE_TOKENS
        .iter()
        .fold(decoded.to_string(), |text, noise| text.replace(noise, ""));

    let mut triples = Vec::new();
    let mut state = ParseState::Idle;
    let mut open = OpenTriple::default();

    for token in cleaned.split_whitespace() {
        match token {
            TRIPLET => {
                open.emit_into(&mut triples);
                open = OpenTriple::default();
                state = ParseState::Head;
            }
            SUBJECT_END => {
                open.emit_into(&mut triples);
                open.tail.clear();
                state = ParseState::Tail;
            }
            OBJECT_END => {
                open.relation.clear();
                state = ParseState::Relation;
            }
            word => match state {
                ParseState::Idle => {}
                ParseState::Head => OpenTriple::push(&mut open.head, word),
                ParseState::Tail => OpenTriple::push(&mut open.tail, word),
                ParseState::Relation => OpenTriple::push(&mut open.relation, word),
            },
        }
    }
    open.emit_into(&mut triples);

    debug!("Parsed {} triples from {} chars", triples.len(), decoded.len());
    triples
}
