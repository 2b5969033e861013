// Component C: the matching stack, the explicit backtrack log.
//
// The source implements this as a chunked byte arena holding
// virtual-dispatch record objects (`MatchingStackNode` and its
// subclasses). Per the design notes "replace virtual-dispatch backtrack
// records with a tagged variant" and "chunked arena for the backtrack
// log," this is a `Vec<StackRecord>`: a plain sum type with pop-time
// behaviour implemented as a `match` in the matcher's unwind loop rather
// than a vtable, and `Vec`'s amortized growth standing in for the
// chunk-linked-list allocator (the 256 KiB chunk size in spec §9 is
// flagged there as a non-semantic policy choice).

use crate::groups::{CaptureValue, GroupStackFrame};
use crate::ir::{GroupId, SymbolId};

/// What a `Resume` record does when it becomes the active choice point
/// again. This is the tagged-variant analogue of the source's per-record
/// `popTo` override.
#[derive(Clone, Copy, Debug)]
pub enum ResumeAction {
    /// Retry a group at `alt_index`, one alternative at a time.
    NextAlternative { group: GroupId, alt_index: u32 },
    /// A greedy group repetition gave back one iteration; finalize the
    /// group as though it had stopped after `count` loops.
    LoopRepeatFewer { group: GroupId, count: u32, capture_start: u64 },
    /// A lazy group repetition is asked for one more iteration.
    LoopRepeatMore { group: GroupId, count: u32 },
    /// A greedy simple repeat (character/class/string/backref) gave back
    /// one repetend.
    SimpleRepeatFewer { symbol: SymbolId, start: u64, count: u64, multiple: u64 },
    /// A lazy simple repeat is asked for one more repetend.
    SimpleRepeatMore { symbol: SymbolId, start: u64, count: u64, multiple: u64 },
}

#[derive(Debug)]
pub enum StackRecord {
    /// A choice point: on backtrack, restore `position` and perform
    /// `action`.
    Resume { position: u64, action: ResumeAction },
    /// Undo a capture write.
    RestoreCapture { index: u32, previous: CaptureValue },
    /// Undo a group-stack push (pop it back off).
    UndoGroupPush,
    /// Undo a group-stack pop (push the frame back on).
    UndoGroupPop { frame: GroupStackFrame },
    /// Undo a `\K` reset-start.
    RestoreMatchStart { previous: u64 },
}

/// The matching stack proper. A thin wrapper over `Vec` so call sites read
/// like the source's `push`/`pop`/`top` rather than raw `Vec` calls.
#[derive(Debug, Default)]
pub struct MatchingStack {
    records: Vec<StackRecord>,
}

impl MatchingStack {
    pub fn new() -> MatchingStack {
        MatchingStack { records: Vec::new() }
    }

    pub fn push(&mut self, record: StackRecord) {
        self.records.push(record);
    }

    pub fn pop(&mut self) -> Option<StackRecord> {
        self.records.pop()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Discards every record above `mark`, used by atomic groups and the
    /// `(*PRUNE)`/`(*COMMIT)`/`(*THEN)` verbs to cut off backtracking into
    /// already-committed territory.
    pub fn cut_to(&mut self, mark: usize) {
        self.records.truncate(mark);
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
