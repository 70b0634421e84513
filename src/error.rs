// Copyright 2023 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use thiserror::Error;

/// Errors from the crate's fallible setup paths.
///
/// Primitive submission never fails; see [`GpuVec`](crate::GpuVec) for how
/// capacity limits are handled.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid render config: {0}")]
    InvalidConfig(&'static str),
    #[error("failed to parse font: {0}")]
    FontParse(#[from] ttf_parser::FaceParsingError),
}
