//! The FORMAT interpreter.
//!
//! [`FormatControl`] treats a FORMAT string as a small program and runs it
//! one data edit descriptor at a time: each call to [`get_next`] consumes
//! whatever control edit descriptors, character literals, slashes, and
//! repeat/parenthesis machinery precede the next data edit, then hands that
//! edit back to the caller. Side effects along the way (literal output,
//! record positioning, mode changes) go through the [`FormatContext`]
//! capability the caller passes in.
//!
//! [`get_next`]: FormatControl::get_next
use crate::format_specs::{DataEdit, EditingFlags, FormatChar, MutableModes, RoundingMode};
use crate::io_error::IoErrorHandler;

/// Sink capability for FORMAT interpretation.
///
/// Every operation a FORMAT string can request of its surrounding statement
/// appears here. The provided methods reject the request fatally; a
/// statement kind overrides exactly the operations it supports, so a FORMAT
/// that asks an internal unit for (say) record advancement dies with a
/// descriptive diagnostic rather than corrupting state.
pub trait FormatContext<C: FormatChar> {
    fn handler(&mut self) -> &mut IoErrorHandler;

    /// The statement's current formatting modes, mutated by control edit
    /// descriptors and snapshotted into every [`DataEdit`].
    fn mutable_modes(&mut self) -> &mut MutableModes;

    /// Report an unrecoverable FORMAT or usage error.
    fn crash(&mut self, message: &str) -> ! {
        self.handler().crash(message)
    }

    /// Copy characters to the current record. Returns `false` when the sink
    /// could not accept all of them.
    fn emit(&mut self, _data: &[C]) -> bool {
        self.crash("Cannot emit data from this FORMAT string")
    }

    /// Terminate the current record `count` times.
    fn handle_slash(&mut self, _count: i32) {
        self.crash("A / control edit descriptor may not appear in this FORMAT string")
    }

    /// Move the record position to `column`.
    fn handle_absolute_position(&mut self, _column: i32) -> bool {
        self.crash("A Tn control edit descriptor may not appear in this FORMAT string")
    }

    /// Move the record position by `delta` characters.
    fn handle_relative_position(&mut self, _delta: i32) -> bool {
        self.crash("An nX, TLn, or TRn control edit descriptor may not appear in this FORMAT string")
    }
}

/// Capacity of the inline iteration stack. The statement sizes its actual
/// limit from the validator pre-pass; this bound only has to exceed any
/// plausible nesting depth.
const MAX_MAX_HEIGHT: usize = 100;

/// One entry of the iteration stack: where a repeatable item begins and how
/// many more passes remain. `None` is an unlimited repeat.
#[derive(Debug, Clone, Copy)]
struct Iteration {
    start: usize,
    remaining: Option<u32>,
}

/// A parenthesis-nested cursor over a FORMAT string.
///
/// The control owns its position in the FORMAT, the iteration stack, and
/// the current scale factor; everything else about the statement is reached
/// through the [`FormatContext`] passed to each call, so one statement can
/// own both its buffer and its control without the two borrowing each
/// other.
#[derive(Debug)]
pub struct FormatControl<'a, C: FormatChar> {
    format: &'a [C],
    offset: usize,
    height: usize,
    max_height: usize,
    scale: i32,
    stack: [Iteration; MAX_MAX_HEIGHT],
}

impl<'a, C: FormatChar> FormatControl<'a, C> {
    /// `max_height` bounds the iteration stack and normally comes from the
    /// validator's nesting depth plus two (room for the outermost frame and
    /// for one repeated non-parenthesized edit descriptor).
    pub fn new(handler: &IoErrorHandler, format: &'a [C], max_height: usize) -> Self {
        if max_height > MAX_MAX_HEIGHT {
            handler.crash(&format!(
                "internal runtime error: FORMAT iteration stack height {max_height} is out of range"
            ));
        }
        let mut control = Self {
            format,
            offset: 0,
            height: 0,
            max_height,
            scale: 0,
            stack: [Iteration {
                start: 0,
                remaining: Some(0),
            }; MAX_MAX_HEIGHT],
        };
        // The whole FORMAT reverts without limit once the data items outlast
        // it (Fortran 2018 13.4).
        control.stack[0] = Iteration {
            start: 0,
            remaining: None,
        };
        control
    }

    /// The scale factor most recently established by a `kP` control edit
    /// descriptor.
    pub fn scale(&self) -> i32 {
        self.scale
    }

    /// Advance to the next data edit descriptor and return it.
    ///
    /// `max_repeat` caps how many applications of a repeated descriptor the
    /// caller is willing to consume in one call; the returned edit's
    /// `repeat` is at most that, and any residue stays on the iteration
    /// stack for subsequent calls.
    pub fn get_next<S: FormatContext<C>>(&mut self, context: &mut S, max_repeat: i32) -> DataEdit {
        let repeat = self.cue_up_next_data_edit(context, false);
        let start = self.offset;
        let mut edit = DataEdit::default();
        edit.descriptor = self.next_char(context).to_ascii_uppercase();
        if edit.descriptor == 'E' {
            let variation = self.peek_char().to_ascii_uppercase();
            if variation.is_ascii_uppercase() {
                edit.variation = Some(variation);
                self.offset += 1;
            }
        }
        edit.width = self.get_int_field(context, None);
        if edit.width < 0 {
            context.crash("Invalid FORMAT: negative field width");
        }
        edit.modes = *context.mutable_modes();
        if self.peek_char() == '.' {
            self.offset += 1;
            edit.digits = Some(self.get_int_field(context, None));
            let exponent = self.peek_char();
            if exponent == 'e' || exponent == 'E' || exponent == 'd' || exponent == 'D' {
                self.offset += 1;
                edit.expo_digits = Some(self.get_int_field(context, None));
            }
        }

        // A repeated non-parenthesized edit descriptor becomes an iteration
        // frame anchored at the descriptor letter, so re-entry consumes it
        // again without rescanning the count.
        if repeat > 1 {
            self.stack[self.height] = Iteration {
                start,
                remaining: Some(repeat as u32),
            };
            self.height += 1;
        }
        edit.repeat = 1;
        if self.height > 1 {
            let top = self.height - 1;
            let frame_start = self.stack[top].start;
            if self.format[frame_start].to_char() != '(' {
                let remaining = self.stack[top].remaining.unwrap_or(0) as i32;
                if remaining > max_repeat {
                    edit.repeat = max_repeat;
                    self.stack[top].remaining = Some((remaining - max_repeat) as u32);
                    self.offset = frame_start;
                } else {
                    edit.repeat = remaining;
                    self.height -= 1;
                }
            }
        }
        tracing::trace!(edit = %edit, repeat = edit.repeat, "cued up data edit");
        edit
    }

    /// Consume the tail of the FORMAT after the last data item: literals
    /// still flush and control edits still apply, but the walk stops at a
    /// `:`, at the rightmost `)`, or at the next data edit descriptor.
    pub fn finish_output<S: FormatContext<C>>(&mut self, context: &mut S) {
        self.cue_up_next_data_edit(context, true);
    }

    /// Locates the next data edit descriptor in the format, handling all
    /// repetition counts and control edit descriptors on the way. Returns
    /// the repeat count attached to the descriptor it stopped in front of,
    /// or 0 when `stop` ended the walk first.
    fn cue_up_next_data_edit<S: FormatContext<C>>(&mut self, context: &mut S, stop: bool) -> i32 {
        let mut unlimited_loop_check: Option<usize> = None;
        loop {
            let mut repeat: Option<i32> = None;
            let mut unlimited = false;
            let mut ch = self.next_char(context).to_ascii_uppercase();
            while ch == ',' || ch == ':' {
                // Commas are insignificant between items; a colon only
                // matters once the data items have run out.
                if stop && ch == ':' {
                    return 0;
                }
                ch = self.next_char(context).to_ascii_uppercase();
            }
            if ch == '-' || ch == '+' || ch.is_ascii_digit() {
                repeat = Some(self.get_int_field(context, Some(ch)));
                ch = self.next_char(context).to_ascii_uppercase();
            } else if ch == '*' {
                unlimited = true;
                ch = self.next_char(context).to_ascii_uppercase();
                if ch != '(' {
                    context.crash("Invalid FORMAT: '*' may appear only before '('");
                }
            }
            match ch {
                '(' => {
                    if self.height >= self.max_height {
                        context.crash("FORMAT stack overflow: too many nested parentheses");
                    }
                    let start = self.offset - 1;
                    let remaining = if unlimited || self.height == 0 {
                        // Remember where reversion re-enters this group; if
                        // a full lap comes back here without producing a
                        // data edit, the FORMAT can make no progress.
                        unlimited_loop_check = Some(self.offset);
                        None
                    } else if let Some(repeat) = repeat {
                        Some(repeat.max(1) as u32 - 1)
                    } else {
                        Some(0)
                    };
                    self.stack[self.height] = Iteration { start, remaining };
                    self.height += 1;
                }
                _ if self.height == 0 => {
                    context.crash("FORMAT lacks initial '('");
                }
                ')' => {
                    if self.height == 1 {
                        if stop {
                            return 0;
                        }
                        // Implied record advance before the rightmost ')'.
                        context.handle_slash(1);
                    }
                    let top = self.height - 1;
                    match self.stack[top].remaining {
                        None => {
                            self.offset = self.stack[top].start + 1;
                            if Some(self.offset) == unlimited_loop_check {
                                context.crash(
                                    "Unlimited repetition in FORMAT lacks data edit descriptors",
                                );
                            }
                        }
                        Some(0) => self.height -= 1,
                        Some(remaining) => {
                            self.stack[top].remaining = Some(remaining - 1);
                            self.offset = self.stack[top].start + 1;
                        }
                    }
                }
                '\'' | '"' => {
                    let quote = self.format[self.offset - 1];
                    let start = self.offset;
                    while self.offset < self.format.len() && self.format[self.offset] != quote {
                        self.offset += 1;
                    }
                    if self.offset >= self.format.len() {
                        context.crash("FORMAT missing closing quote on character literal");
                    }
                    self.offset += 1;
                    let mut chars = self.offset - start;
                    if self.format.get(self.offset) == Some(&quote) {
                        // Doubled quote: keep the first quote in the output
                        // and let the second open another literal on the
                        // next pass.
                    } else {
                        chars -= 1;
                    }
                    context.emit(&self.format[start..start + chars]);
                }
                'H' => {
                    let payload = repeat.unwrap_or(0);
                    if payload < 1 || self.offset + payload as usize > self.format.len() {
                        context.crash("Invalid width on Hollerith in FORMAT");
                    }
                    let payload = payload as usize;
                    context.emit(&self.format[self.offset..self.offset + payload]);
                    self.offset += payload;
                }
                'A'..='Z' => {
                    let start = self.offset - 1;
                    let next = {
                        let peeked = self.peek_char().to_ascii_uppercase();
                        peeked.is_ascii_uppercase().then_some(peeked)
                    };
                    let is_data_edit = ch == 'E'
                        || (next.is_none()
                            && matches!(ch, 'A' | 'I' | 'B' | 'O' | 'Z' | 'F' | 'D' | 'G'));
                    if is_data_edit {
                        self.offset = start;
                        return repeat.map_or(1, |r| r.max(1));
                    }
                    if next.is_some() {
                        self.offset += 1;
                    }
                    let n = if ch == 'T' {
                        // Tn, TLn, TRn carry their count after the letters.
                        self.get_int_field(context, None)
                    } else {
                        repeat.unwrap_or(1)
                    };
                    Self::handle_control(context, &mut self.scale, ch, next, n);
                }
                '/' => {
                    context.handle_slash(repeat.map_or(1, |r| r.max(1)));
                }
                _ => {
                    context.crash(&format!("Invalid character '{ch}' in FORMAT"));
                }
            }
        }
    }

    /// Apply one control edit descriptor (`ch` plus an optional second
    /// letter) with its count `n`.
    fn handle_control<S: FormatContext<C>>(
        context: &mut S,
        scale: &mut i32,
        ch: char,
        next: Option<char>,
        n: i32,
    ) {
        match (ch, next) {
            ('B', Some('N')) => {
                context.mutable_modes().flags.remove(EditingFlags::BLANK_ZERO);
            }
            ('B', Some('Z')) => {
                context.mutable_modes().flags.insert(EditingFlags::BLANK_ZERO);
            }
            ('D', Some('C')) => {
                context.mutable_modes().flags.insert(EditingFlags::DECIMAL_COMMA);
            }
            ('D', Some('P')) => {
                context.mutable_modes().flags.remove(EditingFlags::DECIMAL_COMMA);
            }
            ('P', None) => *scale = n,
            ('R', Some('N')) => context.mutable_modes().rounding = RoundingMode::TiesToEven,
            ('R', Some('Z')) => context.mutable_modes().rounding = RoundingMode::ToZero,
            ('R', Some('U')) => context.mutable_modes().rounding = RoundingMode::Up,
            ('R', Some('D')) => context.mutable_modes().rounding = RoundingMode::Down,
            ('R', Some('C')) => context.mutable_modes().rounding = RoundingMode::TiesAwayFromZero,
            ('S', None) | ('S', Some('S')) => {
                context.mutable_modes().flags.remove(EditingFlags::SIGN_PLUS);
            }
            ('S', Some('P')) => {
                context.mutable_modes().flags.insert(EditingFlags::SIGN_PLUS);
            }
            ('T', None) => {
                context.handle_absolute_position(n);
            }
            ('T', Some('L')) => {
                context.handle_relative_position(-n);
            }
            ('T', Some('R')) => {
                context.handle_relative_position(n);
            }
            ('X', None) => {
                context.handle_relative_position(n);
            }
            (_, Some(next)) => {
                context.crash(&format!("Unknown '{ch}{next}' edit descriptor in FORMAT"))
            }
            (_, None) => context.crash(&format!("Unknown '{ch}' edit descriptor in FORMAT")),
        }
    }

    /// Parse a signed integer field at the cursor. When the caller already
    /// consumed the field's first character it passes it as `first`.
    fn get_int_field<S: FormatContext<C>>(&mut self, context: &mut S, first: Option<char>) -> i32 {
        let mut ch = match first {
            Some(ch) => ch,
            None => self.peek_char(),
        };
        if ch != '-' && ch != '+' && !ch.is_ascii_digit() {
            context.crash(&format!("Invalid FORMAT: integer expected at '{ch}'"));
        }
        let negate = ch == '-';
        // A first character passed in by the caller is already consumed.
        let mut pending = first.is_some();
        if negate || ch == '+' {
            if !pending {
                self.offset += 1;
            }
            pending = false;
            ch = self.peek_char();
        }
        let mut value: i32 = 0;
        while ch.is_ascii_digit() {
            let digit = ch as i32 - '0' as i32;
            value = match value.checked_mul(10).and_then(|v| v.checked_add(digit)) {
                Some(value) => value,
                None => context.crash("FORMAT integer field out of range"),
            };
            if pending {
                pending = false;
            } else {
                self.offset += 1;
            }
            ch = self.peek_char();
        }
        if negate {
            -value
        } else {
            value
        }
    }

    /// The character at the cursor, or `'\0'` at the end of the FORMAT.
    fn peek_char(&self) -> char {
        self.format.get(self.offset).map_or('\0', |c| c.to_char())
    }

    /// Consume and return the next character, skipping insignificant
    /// blanks. Running off the end of the FORMAT mid-scan is fatal.
    fn next_char<S: FormatContext<C>>(&mut self, context: &mut S) -> char {
        while self.offset < self.format.len() && self.format[self.offset].to_char() == ' ' {
            self.offset += 1;
        }
        if self.offset >= self.format.len() {
            context.crash("FORMAT missing at least one ')'");
        }
        let ch = self.format[self.offset].to_char();
        self.offset += 1;
        ch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A sink that records everything the interpreter asks of it.
    struct CaptureContext {
        handler: IoErrorHandler,
        modes: MutableModes,
        emitted: String,
        slashes: Vec<i32>,
        moves: Vec<i32>,
        tabs: Vec<i32>,
    }

    impl CaptureContext {
        fn new() -> Self {
            Self {
                handler: IoErrorHandler::new(None, 0),
                modes: MutableModes::default(),
                emitted: String::new(),
                slashes: vec![],
                moves: vec![],
                tabs: vec![],
            }
        }
    }

    impl FormatContext<u8> for CaptureContext {
        fn handler(&mut self) -> &mut IoErrorHandler {
            &mut self.handler
        }

        fn mutable_modes(&mut self) -> &mut MutableModes {
            &mut self.modes
        }

        fn emit(&mut self, data: &[u8]) -> bool {
            self.emitted.push_str(std::str::from_utf8(data).unwrap());
            true
        }

        fn handle_slash(&mut self, count: i32) {
            self.slashes.push(count);
        }

        fn handle_absolute_position(&mut self, column: i32) -> bool {
            self.tabs.push(column);
            true
        }

        fn handle_relative_position(&mut self, delta: i32) -> bool {
            self.moves.push(delta);
            true
        }
    }

    fn control(format: &'static str) -> (FormatControl<'static, u8>, CaptureContext) {
        let context = CaptureContext::new();
        let control = FormatControl::new(&context.handler, format.as_bytes(), 10);
        (control, context)
    }

    #[test]
    fn test_data_edit_sequence() {
        let (mut control, mut ctx) = control("(A8,I5,F10.2,E12.4E3,ES11.2,G0)");
        let edit = control.get_next(&mut ctx, 1);
        assert_eq!((edit.descriptor, edit.width), ('A', 8));

        let edit = control.get_next(&mut ctx, 1);
        assert_eq!((edit.descriptor, edit.width, edit.digits), ('I', 5, None));

        let edit = control.get_next(&mut ctx, 1);
        assert_eq!((edit.descriptor, edit.width, edit.digits), ('F', 10, Some(2)));

        let edit = control.get_next(&mut ctx, 1);
        assert_eq!(edit.descriptor, 'E');
        assert_eq!(edit.variation, None);
        assert_eq!((edit.width, edit.digits, edit.expo_digits), (12, Some(4), Some(3)));

        let edit = control.get_next(&mut ctx, 1);
        assert_eq!((edit.descriptor, edit.variation), ('E', Some('S')));
        assert_eq!((edit.width, edit.digits), (11, Some(2)));

        let edit = control.get_next(&mut ctx, 1);
        assert_eq!((edit.descriptor, edit.width), ('G', 0));
    }

    #[test]
    fn test_lower_case_folds() {
        let (mut control, mut ctx) = control("(i5.3)");
        let edit = control.get_next(&mut ctx, 1);
        assert_eq!((edit.descriptor, edit.width, edit.digits), ('I', 5, Some(3)));
    }

    #[test]
    fn test_repeated_descriptor_one_at_a_time() {
        let (mut control, mut ctx) = control("(3I2,I4)");
        for _ in 0..3 {
            let edit = control.get_next(&mut ctx, 1);
            assert_eq!((edit.descriptor, edit.width, edit.repeat), ('I', 2, 1));
        }
        let edit = control.get_next(&mut ctx, 1);
        assert_eq!((edit.descriptor, edit.width), ('I', 4));
    }

    #[test]
    fn test_repeated_descriptor_batched() {
        let (mut control, mut ctx) = control("(3I2,I4)");
        let edit = control.get_next(&mut ctx, 8);
        assert_eq!(edit.repeat, 3, "a large enough max_repeat should drain the whole repeat");
        let edit = control.get_next(&mut ctx, 8);
        assert_eq!((edit.descriptor, edit.width, edit.repeat), ('I', 4, 1));
    }

    #[test]
    fn test_repeated_descriptor_partial_batches() {
        let (mut control, mut ctx) = control("(5I3,A1)");
        let edit = control.get_next(&mut ctx, 2);
        assert_eq!(edit.repeat, 2);
        let edit = control.get_next(&mut ctx, 2);
        assert_eq!(edit.repeat, 2);
        let edit = control.get_next(&mut ctx, 2);
        assert_eq!(edit.repeat, 1, "residue of 5 split 2+2+1");
        let edit = control.get_next(&mut ctx, 2);
        assert_eq!(edit.descriptor, 'A');
    }

    #[test]
    fn test_group_repeat_matches_literal_expansion() {
        // n(…) must cue up the same edits as writing the group n times.
        let (mut grouped, mut ctx_a) = control("(2(I1,I2),I3)");
        let (mut spelled, mut ctx_b) = control("(I1,I2,I1,I2,I3)");
        for _ in 0..5 {
            let a = grouped.get_next(&mut ctx_a, 1);
            let b = spelled.get_next(&mut ctx_b, 1);
            assert_eq!((a.descriptor, a.width), (b.descriptor, b.width));
        }
    }

    #[test]
    fn test_unlimited_group_cycles() {
        let (mut control, mut ctx) = control("(I1,*(I2,1X))");
        let mut widths = vec![];
        for _ in 0..6 {
            widths.push(control.get_next(&mut ctx, 1).width);
        }
        assert_eq!(widths, [1, 2, 2, 2, 2, 2]);
        assert_eq!(ctx.moves, [1, 1, 1, 1], "each lap past 1X should move the position");
    }

    #[test]
    fn test_character_literals_emit() {
        let (mut control, mut ctx) = control("('it''s',1X,\"a \"\"test\"\"\",I2)");
        let edit = control.get_next(&mut ctx, 1);
        assert_eq!(edit.descriptor, 'I');
        assert_eq!(ctx.emitted, "it'sa \"test\"");
        assert_eq!(ctx.moves, [1]);
    }

    #[test]
    fn test_hollerith_emits_verbatim() {
        let (mut control1, mut ctx1) = control("(12HHELLO, WORLD,I3)");
        control1.get_next(&mut ctx1, 1);
        assert_eq!(ctx1.emitted, "HELLO, WORLD");

        // The payload is opaque, parentheses and quotes included.
        let (mut control2, mut ctx2) = control("(4H(')),I1)");
        control2.get_next(&mut ctx2, 1);
        assert_eq!(ctx2.emitted, "('))");
    }

    #[test]
    fn test_slash_and_repeat() {
        let (mut control, mut ctx) = control("(I1,/,3/,I1)");
        control.get_next(&mut ctx, 1);
        control.get_next(&mut ctx, 1);
        assert_eq!(ctx.slashes, [1, 3]);
    }

    #[test]
    fn test_mode_snapshots_per_edit() {
        let (mut control, mut ctx) = control("(I4,SP,BZ,RU,I4,SS,I4)");
        let edit = control.get_next(&mut ctx, 1);
        assert!(edit.modes.flags.is_empty());
        assert_eq!(edit.modes.rounding, RoundingMode::TiesToEven);

        let edit = control.get_next(&mut ctx, 1);
        assert!(edit.modes.flags.contains(EditingFlags::SIGN_PLUS));
        assert!(edit.modes.flags.contains(EditingFlags::BLANK_ZERO));
        assert_eq!(edit.modes.rounding, RoundingMode::Up);

        let edit = control.get_next(&mut ctx, 1);
        assert!(!edit.modes.flags.contains(EditingFlags::SIGN_PLUS), "SS should clear SP");
        assert!(edit.modes.flags.contains(EditingFlags::BLANK_ZERO));
    }

    #[test]
    fn test_decimal_comma_modes() {
        let (mut control, mut ctx) = control("(DC,F6.2,DP,F6.2)");
        let edit = control.get_next(&mut ctx, 1);
        assert!(edit.modes.flags.contains(EditingFlags::DECIMAL_COMMA));
        let edit = control.get_next(&mut ctx, 1);
        assert!(!edit.modes.flags.contains(EditingFlags::DECIMAL_COMMA));
    }

    #[test]
    fn test_scale_factor() {
        let (mut control, mut ctx) = control("(-2P,F7.1,3P,F7.1)");
        control.get_next(&mut ctx, 1);
        assert_eq!(control.scale(), -2, "kP with a negative k must carry its sign");
        control.get_next(&mut ctx, 1);
        assert_eq!(control.scale(), 3);
    }

    #[test]
    fn test_position_controls() {
        let (mut control, mut ctx) = control("(T10,I1,TL3,I1,TR4,I1,5X,I1)");
        for _ in 0..4 {
            control.get_next(&mut ctx, 1);
        }
        assert_eq!(ctx.tabs, [10]);
        assert_eq!(ctx.moves, [-3, 4, 5]);
    }

    #[test]
    fn test_finish_stops_at_colon() {
        let (mut control, mut ctx) = control("(I2,:,' unwanted')");
        control.get_next(&mut ctx, 1);
        control.finish_output(&mut ctx);
        assert_eq!(ctx.emitted, "", "nothing past the colon may flush");
    }

    #[test]
    fn test_finish_flushes_trailing_literal() {
        let (mut control, mut ctx) = control("(I2,' items')");
        control.get_next(&mut ctx, 1);
        control.finish_output(&mut ctx);
        assert_eq!(ctx.emitted, " items");
        assert_eq!(ctx.slashes, [], "the stop walk must not run the implied record advance");
    }

    #[test]
    fn test_format_reversion_reuses_last_group() {
        // With the data items outlasting the FORMAT, control reverts after
        // the implied record advance at the rightmost ')'.
        let (mut control, mut ctx) = control("(I2)");
        control.get_next(&mut ctx, 1);
        let edit = control.get_next(&mut ctx, 1);
        assert_eq!((edit.descriptor, edit.width), ('I', 2));
        assert_eq!(ctx.slashes, [1]);
    }

    #[test]
    #[should_panic(expected = "lacks initial '('")]
    fn test_missing_outer_parenthesis() {
        let (mut control, mut ctx) = control("I5)");
        control.get_next(&mut ctx, 1);
    }

    #[test]
    #[should_panic(expected = "'*' may appear only before '('")]
    fn test_star_requires_group() {
        let (mut control, mut ctx) = control("(*I5)");
        control.get_next(&mut ctx, 1);
    }

    #[test]
    #[should_panic(expected = "missing closing quote")]
    fn test_unclosed_literal() {
        let (mut control, mut ctx) = control("('oops,I5)");
        control.get_next(&mut ctx, 1);
    }

    #[test]
    #[should_panic(expected = "Invalid width on Hollerith")]
    fn test_hollerith_overrun() {
        let (mut control, mut ctx) = control("(9Hab)");
        control.get_next(&mut ctx, 1);
    }

    #[test]
    #[should_panic(expected = "Invalid width on Hollerith")]
    fn test_hollerith_requires_count() {
        let (mut control, mut ctx) = control("(Hx,I2)");
        control.get_next(&mut ctx, 1);
    }

    #[test]
    #[should_panic(expected = "Invalid character '#'")]
    fn test_invalid_character() {
        let (mut control, mut ctx) = control("(#)");
        control.get_next(&mut ctx, 1);
    }

    #[test]
    #[should_panic(expected = "Unknown 'Q' edit descriptor")]
    fn test_unknown_descriptor() {
        let (mut control, mut ctx) = control("(Q)");
        control.get_next(&mut ctx, 1);
    }

    #[test]
    #[should_panic(expected = "Unknown 'SQ' edit descriptor")]
    fn test_unknown_two_letter_descriptor() {
        let (mut control, mut ctx) = control("(SQ,I2)");
        control.get_next(&mut ctx, 1);
    }

    #[test]
    #[should_panic(expected = "integer field out of range")]
    fn test_repeat_count_overflow() {
        let (mut control, mut ctx) = control("(99999999999I2)");
        control.get_next(&mut ctx, 1);
    }

    #[test]
    #[should_panic(expected = "negative field width")]
    fn test_negative_width() {
        let (mut control, mut ctx) = control("(I-5)");
        control.get_next(&mut ctx, 1);
    }

    #[test]
    #[should_panic(expected = "integer expected")]
    fn test_width_is_required() {
        let (mut control, mut ctx) = control("(I)");
        control.get_next(&mut ctx, 1);
    }

    #[test]
    #[should_panic(expected = "stack overflow")]
    fn test_stack_overflow() {
        let context = CaptureContext::new();
        let mut control = FormatControl::new(&context.handler, b"((((I1))))", 3);
        let mut ctx = context;
        control.get_next(&mut ctx, 1);
    }

    #[test]
    #[should_panic(expected = "Unlimited repetition in FORMAT lacks data edit descriptors")]
    fn test_unlimited_group_without_data_edit() {
        let (mut control, mut ctx) = control("(*(2X))");
        control.get_next(&mut ctx, 1);
    }

    #[test]
    #[should_panic(expected = "iteration stack height")]
    fn test_max_height_out_of_range() {
        let handler = IoErrorHandler::new(None, 0);
        FormatControl::<u8>::new(&handler, b"(I5)", 512);
    }

    #[test]
    #[should_panic(expected = "missing at least one ')'")]
    fn test_truncated_format() {
        let (mut control, mut ctx) = control("(I5,");
        control.get_next(&mut ctx, 1);
        control.get_next(&mut ctx, 1);
    }
}
