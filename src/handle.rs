//! Poseidon instance handles.
//!
//! A [`Poseidon`] handle owns a shared reference to one parameter set and is
//! the entry point for batch hashing. Releasing the handle (explicitly with
//! [`Poseidon::release`] or by dropping it) gives up that reference; batches
//! already submitted keep their own.

use crate::batch::{self, BatchShape, Submission};
use crate::config::HashConfig;
use crate::device::{FieldSlice, FieldSliceMut};
use crate::error::{ErrorCode, PoseidonResult};
use crate::field::Fr;
use crate::params::{builtin, PoseidonConstants};
use std::sync::Arc;
use tracing::{debug, trace};

/// A Poseidon instance bound to one parameter set.
#[derive(Debug)]
pub struct Poseidon {
    width: usize,
    constants: Option<Arc<PoseidonConstants>>,
}

impl Poseidon {
    /// Instance over caller-supplied constants. See [`PoseidonConstants::create`].
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        arity: usize,
        alpha: u64,
        full_rounds_half: usize,
        partial_rounds: usize,
        round_constants: &[Fr],
        mds_matrix: &[Fr],
        non_sparse_matrix: &[Fr],
        sparse_matrices: &[Fr],
        domain_tag: Fr,
    ) -> PoseidonResult<Self> {
        let constants = PoseidonConstants::create(
            arity,
            alpha,
            full_rounds_half,
            partial_rounds,
            round_constants,
            mds_matrix,
            non_sparse_matrix,
            sparse_matrices,
            domain_tag,
        )?;
        Ok(Self::from_constants(Arc::new(constants)))
    }

    /// Instance over the built-in parameter set for `arity`.
    pub fn load(arity: usize) -> PoseidonResult<Self> {
        Ok(Self::from_constants(builtin::load(arity)?))
    }

    /// Instance sharing an existing parameter set.
    pub fn from_constants(constants: Arc<PoseidonConstants>) -> Self {
        debug!(arity = constants.arity(), "poseidon instance created");
        Self {
            width: constants.width(),
            constants: Some(constants),
        }
    }

    /// State width (`arity + 1`). Still available after release.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of elements absorbed per permutation with the default configuration.
    pub fn arity(&self) -> usize {
        self.width - 1
    }

    /// The parameter set.
    pub fn constants(&self) -> PoseidonResult<&Arc<PoseidonConstants>> {
        self.constants.as_ref().ok_or(ErrorCode::UseAfterRelease)
    }

    /// Full-rate synchronous configuration matching this instance.
    pub fn default_hash_config(&self) -> HashConfig {
        HashConfig::for_width(self.width)
    }

    /// Hash `number_of_states` blocks of `input_block_len` elements each,
    /// writing `output_len` elements per block.
    ///
    /// The buffers are borrowed, so this call always blocks until the batch
    /// is done and `cfg.is_async` has no effect here; use
    /// [`Poseidon::submit_many`] with owned buffers to run in the background.
    ///
    /// On error the output buffer is left untouched.
    pub fn hash_many<I, O>(
        &self,
        inputs: &I,
        output: &mut O,
        number_of_states: usize,
        input_block_len: usize,
        output_len: usize,
        cfg: &HashConfig,
    ) -> PoseidonResult<()>
    where
        I: FieldSlice + ?Sized,
        O: FieldSliceMut + ?Sized,
    {
        let constants = self.constants()?;
        let shape = BatchShape {
            number_of_states,
            input_block_len,
            output_len,
        };
        batch::validate(
            self.width,
            inputs.as_fields().len(),
            output.as_fields().len(),
            shape,
            cfg,
        )?;
        let residency = batch::resolve(inputs, &*output, cfg)?;
        if cfg.is_async {
            trace!("borrowed buffers run synchronously");
        }
        batch::run(constants, inputs, output, shape, residency, cfg)
    }

    /// Like [`Poseidon::hash_many`] over owned buffers.
    ///
    /// With `cfg.is_async` set the batch runs in the background on the
    /// configuration's context and the output buffer comes back through
    /// [`Submission::Pending`]. Shape and buffer-location errors are still
    /// returned here, before anything is queued; only failures of the running
    /// batch surface when it is waited on.
    pub fn submit_many<I, O>(
        &self,
        inputs: I,
        output: O,
        number_of_states: usize,
        input_block_len: usize,
        output_len: usize,
        cfg: &HashConfig,
    ) -> PoseidonResult<Submission<O>>
    where
        I: FieldSlice + Send + 'static,
        O: FieldSliceMut + Send + 'static,
    {
        let constants = Arc::clone(self.constants()?);
        let shape = BatchShape {
            number_of_states,
            input_block_len,
            output_len,
        };
        batch::submit(constants, inputs, output, shape, cfg)
    }

    /// Give up this handle's parameter set.
    ///
    /// Any later hash call, or a second release, fails with
    /// [`ErrorCode::UseAfterRelease`].
    pub fn release(&mut self) -> PoseidonResult<()> {
        match self.constants.take() {
            Some(constants) => {
                debug!(
                    width = self.width,
                    shared = Arc::strong_count(&constants) - 1,
                    "poseidon instance released"
                );
                Ok(())
            }
            None => Err(ErrorCode::UseAfterRelease),
        }
    }

    /// Whether [`Poseidon::release`] has been called.
    pub fn is_released(&self) -> bool {
        self.constants.is_none()
    }
}

impl Drop for Poseidon {
    fn drop(&mut self) {
        if self.constants.take().is_some() {
            trace!(width = self.width, "poseidon instance dropped");
        }
    }
}
