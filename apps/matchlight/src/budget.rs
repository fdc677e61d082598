//! Content budgeting — trims oversized postings before extraction by
//! dropping low-information sections, never more than the retention floor
//! allows.

use tracing::debug;

use crate::markup::classifier::{classify, RegionKind};

/// Documents at or under this many characters pass through untouched.
pub const THRESHOLD: usize = 6_000;

/// Default ceiling on how much of a document may be dropped (0.3 keeps at
/// least 70 % of the original characters).
pub const MAX_DROP: f64 = 0.3;

/// Section headings whose content rarely affects the match analysis.
const LOW_INFORMATION_HEADINGS: &[&str] = &[
    "about us",
    "about the company",
    "company overview",
    "who we are",
    "our culture",
    "our mission",
    "our values",
    "why join",
    "benefits",
    "perks",
    "compensation and benefits",
    "equal opportunity",
    "diversity",
];

#[derive(Debug)]
struct Block {
    start_line: usize,
    end_line: usize, // exclusive
    char_len: usize,
}

/// Budgets with the default threshold and retention floor.
pub fn budget(text: &str) -> String {
    budget_with(text, THRESHOLD, MAX_DROP)
}

/// Trims `text` to approach `threshold` characters by removing
/// low-information heading blocks, largest first. A removal that would
/// leave less than `1 - max_drop` of the original is skipped; if nothing
/// can be removed, the text is returned unchanged.
pub fn budget_with(text: &str, threshold: usize, max_drop: f64) -> String {
    let original_len = text.chars().count();
    if original_len <= threshold {
        return text.to_string();
    }

    let lines: Vec<&str> = text.split('\n').collect();
    let mut blocks = find_removable_blocks(&lines);
    if blocks.is_empty() {
        debug!(chars = original_len, "over budget but nothing removable");
        return text.to_string();
    }
    blocks.sort_by(|a, b| b.char_len.cmp(&a.char_len));

    let floor = ((original_len as f64) * (1.0 - max_drop)).ceil() as usize;
    let mut remaining = original_len;
    let mut removed: Vec<&Block> = Vec::new();

    for block in &blocks {
        if remaining <= threshold {
            break;
        }
        if remaining.saturating_sub(block.char_len) < floor {
            continue;
        }
        remaining -= block.char_len;
        removed.push(block);
    }

    if removed.is_empty() {
        debug!(
            chars = original_len,
            floor, "every removable block would breach the retention floor"
        );
        return text.to_string();
    }

    let mut drop_lines = vec![false; lines.len()];
    for block in &removed {
        for flag in drop_lines
            .iter_mut()
            .take(block.end_line)
            .skip(block.start_line)
        {
            *flag = true;
        }
    }

    let kept: Vec<&str> = lines
        .iter()
        .zip(&drop_lines)
        .filter(|(_, dropped)| !**dropped)
        .map(|(line, _)| *line)
        .collect();
    let result = kept.join("\n");

    debug!(
        before = original_len,
        after = result.chars().count(),
        blocks = removed.len(),
        "budgeted document"
    );
    result
}

/// Finds non-overlapping blocks: a low-information heading through to the
/// next section heading or end of text.
fn find_removable_blocks(lines: &[&str]) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if !is_low_information_heading(lines[i]) {
            i += 1;
            continue;
        }

        let mut end = i + 1;
        while end < lines.len() {
            let line = lines[end];
            if !line.trim().is_empty() && classify(line, end) == RegionKind::Section {
                break;
            }
            end += 1;
        }

        // +1 per line for the separators the removal takes with it
        let char_len: usize = lines[i..end]
            .iter()
            .map(|l| l.chars().count() + 1)
            .sum::<usize>()
            .saturating_sub(1);

        blocks.push(Block {
            start_line: i,
            end_line: end,
            char_len,
        });
        i = end;
    }

    blocks
}

fn is_low_information_heading(line: &str) -> bool {
    let normalized = line
        .trim()
        .trim_end_matches(':')
        .trim()
        .to_ascii_lowercase();
    if normalized.is_empty() || normalized.len() > 48 {
        return false;
    }
    LOW_INFORMATION_HEADINGS
        .iter()
        .any(|heading| normalized == *heading)
}
