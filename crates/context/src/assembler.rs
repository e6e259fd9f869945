//! Context assembly
//!
//! Renders fused passages as labelled blocks and enforces the character
//! budget. Two truncation modes:
//! - hard: cut the joined string at exactly `max_chars` characters
//! - passage boundary: stop before the first block that would overflow

use hydradoc_common::config::ContextConfig;
use hydradoc_common::passage::RetrievedPassage;
use serde::Serialize;

const BLOCK_SEPARATOR: &str = "\n\n";

/// Assembled context handed to the answer requester
#[derive(Debug, Clone, Serialize)]
pub struct AssembledContext {
    pub text: String,

    /// Leading passages (in fused order) whose full label is in `text`
    pub passages_included: usize,

    pub truncated: bool,
}

impl AssembledContext {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Context assembler configuration
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    max_chars: usize,
    at_passage_boundary: bool,
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::from_config(&ContextConfig::default())
    }
}

fn render_label(passage: &RetrievedPassage) -> String {
    format!(
        "[Source: {} p.{}]",
        passage.metadata.source_file, passage.metadata.page_number
    )
}

/// `[Source: <file> p.<page>]` followed by the passage text
pub fn render_block(passage: &RetrievedPassage) -> String {
    format!("{}\n{}", render_label(passage), passage.content)
}

impl ContextAssembler {
    pub fn new(max_chars: usize, at_passage_boundary: bool) -> Self {
        Self {
            max_chars,
            at_passage_boundary,
        }
    }

    pub fn from_config(config: &ContextConfig) -> Self {
        Self::new(config.max_chars, config.truncate_at_passage_boundary)
    }

    pub fn assemble(&self, passages: &[RetrievedPassage]) -> AssembledContext {
        let blocks: Vec<String> = passages.iter().map(render_block).collect();
        let labels: Vec<String> = passages.iter().map(render_label).collect();

        if self.at_passage_boundary {
            self.assemble_whole_blocks(blocks, labels)
        } else {
            self.assemble_hard(blocks, labels)
        }
    }

    fn assemble_hard(&self, blocks: Vec<String>, labels: Vec<String>) -> AssembledContext {
        let joined = blocks.join(BLOCK_SEPARATOR);
        let total = joined.chars().count();

        if total <= self.max_chars {
            return AssembledContext {
                text: joined,
                passages_included: blocks.len(),
                truncated: false,
            };
        }

        // blocks whose whole label line ends before the cut
        let mut passages_included = 0;
        let mut offset = 0;
        for (block, label) in blocks.iter().zip(labels) {
            if offset + label.chars().count() > self.max_chars {
                break;
            }
            passages_included += 1;
            offset += block.chars().count() + BLOCK_SEPARATOR.len();
        }

        AssembledContext {
            text: joined.chars().take(self.max_chars).collect(),
            passages_included,
            truncated: true,
        }
    }

    fn assemble_whole_blocks(&self, blocks: Vec<String>, labels: Vec<String>) -> AssembledContext {
        let mut text = String::new();
        let mut used = 0;
        let mut passages_included = 0;

        for block in &blocks {
            let separator = if passages_included == 0 { 0 } else { BLOCK_SEPARATOR.len() };
            let needed = separator + block.chars().count();
            if used + needed > self.max_chars {
                break;
            }
            if separator > 0 {
                text.push_str(BLOCK_SEPARATOR);
            }
            text.push_str(block);
            used += needed;
            passages_included += 1;
        }

        // a first block larger than the whole budget is cut rather than dropped
        if passages_included == 0 {
            if let (Some(first), Some(label)) = (blocks.first(), labels.first()) {
                return AssembledContext {
                    text: first.chars().take(self.max_chars).collect(),
                    passages_included: usize::from(label.chars().count() <= self.max_chars),
                    truncated: true,
                };
            }
        }

        AssembledContext {
            text,
            passages_included,
            truncated: passages_included < blocks.len(),
        }
    }
}
