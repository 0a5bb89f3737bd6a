/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Utilities that have no knowledge of Python. Everything here could
//! plausibly live in a third-party crate; it just doesn't yet.

#![warn(clippy::all)]
#![allow(clippy::new_without_default)]
#![deny(clippy::cloned_instead_of_copied)]
#![deny(clippy::str_to_string)]
#![deny(clippy::string_to_string)]
#![deny(clippy::trivially_copy_pass_by_ref)]

pub mod index;
pub mod lined_buffer;
pub mod prelude;

/// Assert that a type fits in the given number of machine words.
/// Types we allocate a lot of should not grow by accident.
#[macro_export]
macro_rules! assert_words {
    ($t:ty, $words:expr) => {
        const _: () = assert!(std::mem::size_of::<$t>() <= $words * 8);
    };
}
