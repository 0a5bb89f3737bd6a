/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */

use dupe::Dupe;
use ruff_python_ast::name::Name;

/// Names that the `typing` stub assigns with plain `=` but which the rest
/// of the checker needs to treat as classes with special meaning. When the
/// binder sees `Tuple = ...` inside the typing stub it records one of these
/// instead of an ordinary variable.
#[derive(Debug, Clone, Dupe, Copy, PartialEq, Eq)]
pub enum SpecialBuiltIn {
    Annotated,
    Callable,
    ChainMap,
    ClassVar,
    Counter,
    DefaultDict,
    Deque,
    Dict,
    Final,
    FrozenSet,
    Generic,
    List,
    Literal,
    Optional,
    OrderedDict,
    Protocol,
    Set,
    Tuple,
    Type,
    TypedDict,
    Union,
}

impl SpecialBuiltIn {
    pub fn new(name: &Name) -> Option<Self> {
        match name.as_str() {
            "Annotated" => Some(Self::Annotated),
            "Callable" => Some(Self::Callable),
            "ChainMap" => Some(Self::ChainMap),
            "ClassVar" => Some(Self::ClassVar),
            "Counter" => Some(Self::Counter),
            "DefaultDict" => Some(Self::DefaultDict),
            "Deque" => Some(Self::Deque),
            "Dict" => Some(Self::Dict),
            "Final" => Some(Self::Final),
            "FrozenSet" => Some(Self::FrozenSet),
            "Generic" => Some(Self::Generic),
            "List" => Some(Self::List),
            "Literal" => Some(Self::Literal),
            "Optional" => Some(Self::Optional),
            "OrderedDict" => Some(Self::OrderedDict),
            "Protocol" => Some(Self::Protocol),
            "Set" => Some(Self::Set),
            "Tuple" => Some(Self::Tuple),
            "Type" => Some(Self::Type),
            "TypedDict" => Some(Self::TypedDict),
            "Union" => Some(Self::Union),
            _ => None,
        }
    }
}
