use tracing::debug;

use crate::semantic_chunking::config::ChunkingOptions;
use crate::semantic_chunking::tokenizer::TokenEstimator;
use crate::semantic_chunking::types::{
    ChunkingOutcome, ChunkingStats, ChunkingTrace, SemanticChunk, Sentence, TraceEvent,
};

/// The subset of options the greedy pass depends on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AssemblyParams {
    pub max_tokens: usize,
    pub min_similarity: f32,
    pub overlap: usize,
    pub estimator: TokenEstimator,
}

impl From<&ChunkingOptions> for AssemblyParams {
    fn from(options: &ChunkingOptions) -> Self {
        Self {
            max_tokens: options.max_tokens,
            min_similarity: options.min_similarity,
            overlap: options.overlap,
            estimator: options.estimator,
        }
    }
}

/// In-progress chunk: a contiguous sentence range whose first `carried`
/// sentences were seeded from the previous chunk.
#[derive(Clone, Copy, Debug)]
struct Draft {
    start: usize,
    end: usize,
    carried: usize,
    tokens: usize,
}

impl Draft {
    fn len(&self) -> usize {
        self.end - self.start
    }

    fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Greedily pack sentences into chunks bounded by topic continuity and token budget.
///
/// `similarities[i]` scores sentence `i` against sentence `i + 1`. A sentence
/// joins the current chunk when the chunk is empty or the score linking it to
/// its predecessor reaches `min_similarity`, and its tokens fit the budget.
/// Otherwise a new chunk starts, seeded with up to `overlap` trailing sentences
/// of the closed one. A sentence that alone exceeds the budget ends up on its
/// own (after any seed).
pub fn assemble(
    sentences: &[Sentence],
    similarities: &[f32],
    params: &AssemblyParams,
) -> ChunkingOutcome {
    if sentences.is_empty() {
        return ChunkingOutcome::empty();
    }

    let counts = params
        .estimator
        .batch_estimate(sentences.iter().map(|sentence| sentence.text.as_str()));

    let mut events: Vec<TraceEvent> = similarities
        .iter()
        .enumerate()
        .map(|(idx, score)| TraceEvent::new("similarity", Some(*score), Some(idx)))
        .collect();
    let mut oversize = 0usize;

    let mut drafts = vec![Draft {
        start: 0,
        end: 0,
        carried: 0,
        tokens: 0,
    }];

    for (i, &tokens) in counts.iter().enumerate() {
        let score = predecessor_score(similarities, i);
        let Some(current) = drafts.last_mut() else {
            break;
        };

        let same_topic =
            current.is_empty() || score.is_some_and(|value| value >= params.min_similarity);
        let fits = current.tokens + tokens <= params.max_tokens;

        if same_topic && fits {
            current.end = i + 1;
            current.tokens += tokens;
            continue;
        }

        let closed = *current;
        if tokens > params.max_tokens {
            oversize += 1;
            events.push(TraceEvent::new("oversize_sentence", None, Some(i)));
        } else if !same_topic {
            events.push(TraceEvent::new("topic_shift", score, Some(i)));
        } else {
            events.push(TraceEvent::new("budget_split", None, Some(i)));
        }

        let carried = params.overlap.min(closed.len());
        let seed_start = closed.end - carried;
        let seed_tokens: usize = counts[seed_start..closed.end].iter().sum();
        drafts.push(Draft {
            start: seed_start,
            end: i + 1,
            carried,
            tokens: seed_tokens + tokens,
        });
    }

    let chunks = render(sentences, &drafts);
    let stats = compute_stats(&chunks, sentences.len(), oversize);

    debug!(
        sentences = sentences.len(),
        chunks = chunks.len(),
        oversize,
        "assembled semantic chunks"
    );

    ChunkingOutcome {
        chunks,
        trace: Some(ChunkingTrace { events }),
        stats,
    }
}

/// Score linking sentence `index` to its predecessor. The first sentence has none.
fn predecessor_score(similarities: &[f32], index: usize) -> Option<f32> {
    if index == 0 {
        return None;
    }
    similarities.get(index - 1).copied()
}

fn render(sentences: &[Sentence], drafts: &[Draft]) -> Vec<SemanticChunk> {
    drafts
        .iter()
        .filter_map(|draft| {
            let content = sentences[draft.start..draft.end]
                .iter()
                .map(|sentence| sentence.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
                .trim()
                .to_string();
            (!content.is_empty()).then_some((content, *draft))
        })
        .enumerate()
        .map(|(index, (content, draft))| SemanticChunk {
            index,
            content,
            tokens: draft.tokens,
            sentences: draft.start..draft.end,
            carried: draft.carried,
        })
        .collect()
}

/// Compute aggregate statistics for assembled chunks.
pub fn compute_stats(
    chunks: &[SemanticChunk],
    total_sentences: usize,
    oversize_sentences: usize,
) -> ChunkingStats {
    let total_chunks = chunks.len();
    let token_sum: usize = chunks.iter().map(|chunk| chunk.tokens).sum();
    let average_tokens = if total_chunks == 0 {
        0.0
    } else {
        token_sum as f32 / total_chunks as f32
    };

    ChunkingStats {
        total_sentences,
        total_chunks,
        average_tokens,
        oversize_sentences,
    }
}
