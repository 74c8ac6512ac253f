//! Poseidon sponge hashing over the BLS12-381 scalar field.
//!
//! The crate hashes many independent inputs in one call, in parallel, with a
//! Poseidon permutation whose partial rounds run in sparse-matrix form.
//!
//! # Architecture
//!
//! - [`field`] - BLS12-381 scalar field arithmetic (Fr)
//! - [`params`] - parameter sets: validation, Grain LFSR generation, built-ins
//! - [`poseidon`] - permutation core and sponge driver
//! - [`device`] - execution contexts and location-tagged buffers
//! - [`config`] - per-call hash configuration
//! - [`batch`] - batch executor and asynchronous submissions
//! - [`handle`] - instance handles with explicit release
//! - [`error`] - error codes
//!
//! # Example
//!
//! ```
//! use poseidon_engine::{Fr, Poseidon};
//!
//! let poseidon = Poseidon::load(2)?;
//! let cfg = poseidon.default_hash_config();
//! let inputs: Vec<Fr> = (0..6).map(Fr::from_u64).collect();
//! let mut digests = vec![Fr::ZERO; 3];
//! poseidon.hash_many(&inputs, &mut digests, 3, 2, 1, &cfg)?;
//! # Ok::<(), poseidon_engine::ErrorCode>(())
//! ```

// Library code propagates errors; tests are checked separately.
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]

pub mod batch;
pub mod config;
pub mod device;
pub mod error;
pub mod field;
pub mod handle;
pub mod params;
pub mod poseidon;

pub use batch::{BatchShape, PendingHash, Submission};
pub use config::{HashConfig, Layout};
pub use device::{DeviceVec, ExecutionContext, FieldSlice, FieldSliceMut, Location};
pub use error::{ErrorCode, PoseidonResult};
pub use field::Fr;
pub use handle::Poseidon;
pub use params::{ParameterFile, PoseidonConstants};
pub use poseidon::Padding;
