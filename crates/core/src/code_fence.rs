//! Line-based fenced code block tracking.
//!
//! Keeps the text table-of-contents scan from reading `##` lines inside
//! code, and cuts the literal interior out of a parsed fenced block.

/// Fence parsing phases tracked across lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FencePhase {
    /// Not currently inside a fence.
    #[default]
    Outside,
    /// Within fence contents.
    InsideFence,
}

/// Current fence state (phase, marker, indent, and length).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FenceState {
    /// Current fence phase.
    pub phase: FencePhase,
    /// Fence marker character (``` or ~~~).
    pub marker: Option<char>,
    /// Leading whitespace count captured at opening.
    pub indent: usize,
    /// Length of the opening fence (number of ` or ~ characters).
    pub length: usize,
}

/// Outcome of processing a single line for fence state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineParseOutcome {
    /// State to carry into the next line.
    pub next_state: FenceState,
    /// Whether this line belongs to a fence (delimiters included).
    pub in_fence: bool,
}

/// Advance fence state based on a single line of text.
pub fn advance_fence_state(line: &str, state: FenceState) -> LineParseOutcome {
    let (columns, bytes) = indent_width(line);
    let run = (columns <= 3).then(|| fence_run(&line[bytes..])).flatten();

    let next_state = match (state.phase, run) {
        (FencePhase::Outside, Some(run)) if run.opens() => FenceState {
            phase: FencePhase::InsideFence,
            marker: Some(run.marker),
            indent: columns,
            length: run.length,
        },
        (FencePhase::InsideFence, Some(run)) if run.closes(&state) => FenceState::default(),
        _ => state,
    };

    LineParseOutcome {
        next_state,
        in_fence: state.phase == FencePhase::InsideFence
            || next_state.phase == FencePhase::InsideFence,
    }
}

/// Literal interior of one fenced code block, or `None` if it is unclosed.
///
/// `block` is the block's source from its opening fence marker through the
/// end of its last line, as the parser reports it. Every line after the first
/// still carries the list item or block quote prefix the block is nested in;
/// up to `container_width` bytes of that prefix (spaces, tabs, `>`) are
/// removed from each line. Indentation belonging to the fence itself is kept,
/// as are the original line endings.
pub fn fence_interior(block: &str, container_width: usize) -> Option<String> {
    let block = block.trim_end_matches(['\n', '\r']);
    let (opener, rest) = block.split_once('\n')?;
    let open = fence_run(opener.trim_start_matches([' ', '\t']))?;
    let state = FenceState {
        phase: FencePhase::InsideFence,
        marker: Some(open.marker),
        indent: 0,
        length: open.length,
    };

    let (interior, closer) = match rest.rfind('\n') {
        Some(at) => (&rest[..=at], &rest[at + 1..]),
        None => ("", rest),
    };
    let closer = strip_container(closer, container_width).trim_start_matches([' ', '\t']);
    if !fence_run(closer).is_some_and(|close| close.closes(&state)) {
        return None;
    }

    Some(
        interior
            .split_inclusive('\n')
            .map(|line| strip_container(line, container_width))
            .collect(),
    )
}

fn strip_container(line: &str, width: usize) -> &str {
    let cut = line
        .bytes()
        .take(width)
        .take_while(|b| matches!(b, b' ' | b'\t' | b'>'))
        .count();
    &line[cut..]
}

/// A run of three or more identical fence characters and what follows it.
#[derive(Debug, Clone, Copy)]
struct FenceRun<'a> {
    marker: char,
    length: usize,
    rest: &'a str,
}

impl FenceRun<'_> {
    /// Backtick openers may not carry backticks in their info string.
    fn opens(&self) -> bool {
        self.marker != '`' || !self.rest.contains('`')
    }

    /// Closers use the opener's marker, are at least as long, and carry no info.
    fn closes(&self, state: &FenceState) -> bool {
        Some(self.marker) == state.marker
            && self.length >= state.length
            && self.rest.trim().is_empty()
    }
}

fn fence_run(text: &str) -> Option<FenceRun<'_>> {
    let marker = text.chars().next().filter(|c| matches!(*c, '`' | '~'))?;
    let length = text.bytes().take_while(|b| *b == marker as u8).count();
    (length >= 3).then(|| FenceRun {
        marker,
        length,
        rest: &text[length..],
    })
}

/// Visual columns and bytes of leading whitespace; tabs stop every 4 columns.
fn indent_width(line: &str) -> (usize, usize) {
    let mut columns = 0;
    let mut bytes = 0;
    for b in line.bytes() {
        columns = match b {
            b' ' => columns + 1,
            b'\t' => columns + 4 - columns % 4,
            _ => break,
        };
        bytes += 1;
    }
    (columns, bytes)
}
