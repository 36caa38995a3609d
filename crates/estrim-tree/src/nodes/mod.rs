// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! ESTree node model and the visitable registry.

mod kind;
mod node;

pub use kind::NodeKind;
pub use node::{Field, Node, NodeId};
