//! The fitted-parameter stream of the intra-potential section.
//!
//! CRYOFF writes one block per bonded sub-type declaration, in the same
//! order the declarations appear in the echoed input. A block starts at a
//! line of the form `<spaces>[ ... ]` and its content begins right after the
//! last `]` of that line; the text before the first block header belongs to
//! the section marker and is discarded.
//!
//! Consumption order is the contract: every sub-type declaration in the
//! echoed input pulls exactly one block, so the parser threads a single
//! cursor through all molecules.

/// Strictly ordered, consume-once access to the fitted blocks.
#[derive(Debug)]
pub(crate) struct FittedCursor<'a> {
    blocks: Vec<&'a str>,
    next: usize,
}

impl<'a> FittedCursor<'a> {
    pub fn new(intra_potential: &'a str) -> Self {
        Self {
            blocks: split_blocks(intra_potential),
            next: 0,
        }
    }

    /// Hands out the next block in file order.
    pub fn pull(&mut self) -> Option<&'a str> {
        let block = self.blocks.get(self.next).copied();
        if block.is_some() {
            self.next += 1;
        }
        block
    }

    /// How many blocks have been pulled so far.
    pub fn consumed(&self) -> usize {
        self.next
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }
}

/// Splits the section at block-header lines (at least one leading space,
/// then a bracket token). Each block slice starts after the last `]` of its
/// header line.
fn split_blocks(intra_potential: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut block_start: Option<usize> = None;
    let mut offset = 0usize;

    for line in intra_potential.split('\n') {
        if let Some(content) = header_content_offset(line) {
            if let Some(start) = block_start {
                blocks.push(&intra_potential[start..offset.saturating_sub(1)]);
            }
            block_start = Some(offset + content);
        }
        offset += line.len() + 1;
    }
    if let Some(start) = block_start {
        blocks.push(&intra_potential[start..intra_potential.len()]);
    }
    blocks
}

/// For a block-header line, the offset where its content starts (just past
/// the last `]`); `None` for any other line.
fn header_content_offset(line: &str) -> Option<usize> {
    let unindented = line.trim_start_matches(' ');
    if unindented.len() == line.len() || !unindented.starts_with('[') {
        return None;
    }
    let open = line.len() - unindented.len();
    let close = line.rfind(']')?;
    // At least one character between the brackets.
    if close > open + 1 { Some(close + 1) } else { None }
}

/// The authoritative parameters of a block: the last `count` whitespace
/// tokens of its first line.
pub(crate) fn leading_params(block: &str, count: usize) -> Result<Vec<f64>, ParamError> {
    let first_line = block.split('\n').next().unwrap_or("");
    let tokens: Vec<&str> = first_line.split_whitespace().collect();
    if tokens.len() < count {
        return Err(ParamError::Count(tokens.len()));
    }
    tokens[tokens.len() - count..]
        .iter()
        .map(|t| {
            t.parse::<f64>()
                .map_err(|_| ParamError::Float(t.to_string()))
        })
        .collect()
}

/// Local extraction failure; the bonded parser maps it into a positioned
/// parse error with section context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ParamError {
    /// Too few tokens on the first line; carries how many were found.
    Count(usize),
    /// A token that does not parse as a float.
    Float(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTRA: &str = "\
Intra-Potential:
 [ BON HAR WAT ]  0.9572  450.0
   1    2    411.3
 [ ANG HAR WAT ] extra ] 104.52  55.0
 [ BON QUA ETH ]  1.54  300.0  -80.0  25.0
";

    #[test]
    fn split_discards_the_preamble_and_keeps_order() {
        let cursor = FittedCursor::new(INTRA);
        assert_eq!(cursor.len(), 3);
    }

    #[test]
    fn blocks_start_after_the_last_bracket_of_the_header() {
        let mut cursor = FittedCursor::new(INTRA);
        let first = cursor.pull().unwrap();
        assert_eq!(first, "  0.9572  450.0\n   1    2    411.3");

        // The stray bracket inside the header line belongs to the header,
        // not the block.
        let second = cursor.pull().unwrap();
        assert_eq!(second, " 104.52  55.0");
    }

    #[test]
    fn cursor_consumes_strictly_in_order() {
        let mut cursor = FittedCursor::new(INTRA);
        assert_eq!(cursor.consumed(), 0);
        cursor.pull();
        cursor.pull();
        assert_eq!(cursor.consumed(), 2);
        assert!(cursor.pull().is_some());
        assert!(cursor.pull().is_none());
        assert_eq!(cursor.consumed(), 3);
    }

    #[test]
    fn leading_params_take_the_tail_of_the_first_line() {
        let block = " label 1.54  300.0  -80.0  25.0\n 9 9 9";
        assert_eq!(
            leading_params(block, 4).unwrap(),
            vec![1.54, 300.0, -80.0, 25.0]
        );
        assert_eq!(leading_params(block, 2).unwrap(), vec![-80.0, 25.0]);
    }

    #[test]
    fn leading_params_report_short_and_malformed_lines() {
        assert_eq!(leading_params(" 1.0\nrest", 3), Err(ParamError::Count(1)));
        assert_eq!(
            leading_params(" 1.0 two 3.0", 3),
            Err(ParamError::Float("two".to_string()))
        );
    }

    #[test]
    fn unindented_brackets_do_not_split() {
        let intra = "Intra-Potential:\n[ BON HAR ] 1.0 2.0\n [ ANG HAR ] 3.0 4.0\n";
        let cursor = FittedCursor::new(intra);
        assert_eq!(cursor.len(), 1);
    }
}
