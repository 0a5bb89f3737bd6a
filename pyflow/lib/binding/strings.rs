/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Escape-sequence checking for string and bytes literals. Python treats an
//! unrecognized escape as a warning today and an error eventually; we report
//! it at the exact two characters inside the literal.

use ruff_text_size::TextRange;
use ruff_text_size::TextSize;

use crate::binding::binder::Binder;
use crate::error::kind::ErrorKind;

/// Escapes shared by str and bytes literals.
fn is_common_escape(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\\' | '\'' | '"' | 'a' | 'b' | 'f' | 'n' | 'r' | 't' | 'v' | 'x' | '0'..='7'
    )
}

/// Escapes only meaningful in str literals.
fn is_str_only_escape(c: char) -> bool {
    matches!(c, 'N' | 'u' | 'U')
}

impl<'a> Binder<'a> {
    /// Scan one string or bytes literal part for unsupported escapes.
    /// We rescan the raw source text rather than the cooked value, because
    /// only the source has the escape offsets.
    pub(crate) fn check_string_escapes(&mut self, range: TextRange) {
        let text = self.module_info.code_at(range);
        let Some(quote_at) = text.find(['"', '\'']) else {
            return;
        };
        let prefix = text[..quote_at].to_ascii_lowercase();
        if prefix.contains('r') {
            return;
        }
        let is_bytes = prefix.contains('b');
        let quote = &text[quote_at..quote_at + 1];
        let quote_len = if text[quote_at..].starts_with(&quote.repeat(3)) {
            3
        } else {
            1
        };
        let content_start = quote_at + quote_len;
        let content_end = text.len().saturating_sub(quote_len).max(content_start);
        let content = &text[content_start..content_end];

        let mut chars = content.char_indices();
        while let Some((offset, c)) = chars.next() {
            if c != '\\' {
                continue;
            }
            let Some((_, escaped)) = chars.next() else {
                break;
            };
            if is_common_escape(escaped) || (!is_bytes && is_str_only_escape(escaped)) {
                continue;
            }
            let at = range.start()
                + TextSize::new((content_start + offset) as u32);
            let len = TextSize::new(('\\'.len_utf8() + escaped.len_utf8()) as u32);
            self.error(
                TextRange::at(at, len),
                ErrorKind::InvalidEscapeSequence,
                format!("Unsupported escape sequence `\\{escaped}` in string literal"),
            );
        }
    }
}
