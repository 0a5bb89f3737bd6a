/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */

#![warn(clippy::all)]
#![allow(clippy::match_like_matches_macro)]
#![allow(clippy::should_implement_trait)]
#![deny(clippy::cloned_instead_of_copied)]
#![deny(clippy::str_to_string)]
#![deny(clippy::string_to_string)]

pub mod ast;
pub mod dunder;
pub mod module_name;
pub mod module_path;
pub mod sys_info;
