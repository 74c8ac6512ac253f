//! Batch executor.
//!
//! Hashes `number_of_states` independent blocks with one sponge each. All
//! shape checks run before any work starts; results are computed into a
//! staging buffer and copied to the output only once every instance is
//! done, so a failed batch never leaves partial results behind.

mod pending;

pub use pending::{PendingHash, Submission};

use crate::config::{HashConfig, Layout};
use crate::device::{ExecutionContext, FieldSlice, FieldSliceMut, Location};
use crate::error::{ErrorCode, PoseidonResult};
use crate::field::Fr;
use crate::params::PoseidonConstants;
use crate::poseidon::Sponge;
use futures::channel::oneshot;
use rayon::prelude::*;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, instrument, trace};

/// Dimensions of one batch call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchShape {
    /// Number of independent hash instances.
    pub number_of_states: usize,
    /// Elements consumed per instance.
    pub input_block_len: usize,
    /// Elements produced per instance.
    pub output_len: usize,
}

impl BatchShape {
    fn elements(&self, per_state: usize, what: &str) -> PoseidonResult<usize> {
        self.number_of_states.checked_mul(per_state).ok_or_else(|| {
            ErrorCode::ShapeMismatch(format!("{} element count overflows", what))
        })
    }
}

/// Check a batch against the instance width and the buffer lengths.
pub(crate) fn validate(
    width: usize,
    inputs_len: usize,
    output_len: usize,
    shape: BatchShape,
    cfg: &HashConfig,
) -> PoseidonResult<()> {
    if cfg.width() != width {
        return Err(ErrorCode::InvalidRateConfiguration(format!(
            "configuration is for width {}, instance width is {}",
            cfg.width(),
            width
        )));
    }
    if shape.input_block_len > cfg.input_rate() {
        return Err(ErrorCode::ShapeMismatch(format!(
            "input block of {} exceeds input rate {}",
            shape.input_block_len,
            cfg.input_rate()
        )));
    }
    if shape.output_len > cfg.output_rate() {
        return Err(ErrorCode::ShapeMismatch(format!(
            "output length {} exceeds output rate {}",
            shape.output_len,
            cfg.output_rate()
        )));
    }

    let needed_in = shape.elements(shape.input_block_len, "input")?;
    if inputs_len < needed_in {
        return Err(ErrorCode::ShapeMismatch(format!(
            "inputs hold {} elements, {} states x {} need {}",
            inputs_len, shape.number_of_states, shape.input_block_len, needed_in
        )));
    }
    let needed_out = shape.elements(shape.output_len, "output")?;
    if output_len < needed_out {
        return Err(ErrorCode::ShapeMismatch(format!(
            "output holds {} elements, {} states x {} need {}",
            output_len, shape.number_of_states, shape.output_len, needed_out
        )));
    }
    Ok(())
}

/// Decide whether a buffer is treated as device-resident.
///
/// An explicit hint wins over the buffer's tag. A buffer on another device
/// than the context cannot be reached at all.
fn resolve_location(
    hint: Option<bool>,
    tag: Location,
    ctx: &ExecutionContext,
    what: &str,
) -> PoseidonResult<bool> {
    if let Location::Device(id) = tag {
        if id != ctx.device_id() {
            return Err(ErrorCode::ExecutionFailure(format!(
                "{} buffer is on device {}, context runs on device {}",
                what,
                id,
                ctx.device_id()
            )));
        }
    }

    let tagged_device = matches!(tag, Location::Device(_));
    let on_device = hint.unwrap_or(tagged_device);
    if on_device != tagged_device {
        debug!(what, on_device, "location hint overrides buffer tag");
    }
    Ok(on_device)
}

/// Hash every instance into a row-major staging buffer.
fn compute(
    constants: &PoseidonConstants,
    inputs: &[Fr],
    shape: BatchShape,
    cfg: &HashConfig,
) -> PoseidonResult<Vec<Fr>> {
    let BatchShape {
        number_of_states: n,
        input_block_len: block,
        output_len: out_len,
    } = shape;

    let mut staging = vec![Fr::ZERO; n * out_len];
    if n == 0 || out_len == 0 {
        return Ok(staging);
    }

    let template = Sponge::new(constants, cfg.input_rate(), cfg.padding)?;
    let layout = cfg.layout;

    cfg.ctx.install(|| {
        staging
            .par_chunks_mut(out_len)
            .enumerate()
            .try_for_each(|(i, out)| {
                let mut sponge = template.clone();
                match layout {
                    Layout::RowMajor => sponge.absorb(&inputs[i * block..(i + 1) * block]),
                    Layout::ColumnMajor => {
                        for j in 0..block {
                            sponge.absorb_one(inputs[j * n + i]);
                        }
                    }
                }
                sponge.squeeze_into(out)
            })
    })?;

    Ok(staging)
}

/// Copy row-major staging results into the output layout.
fn scatter(staging: &[Fr], output: &mut [Fr], shape: BatchShape, layout: Layout) {
    let n = shape.number_of_states;
    let out_len = shape.output_len;
    match layout {
        Layout::RowMajor => output[..staging.len()].copy_from_slice(staging),
        Layout::ColumnMajor => {
            for (i, row) in staging.chunks_exact(out_len.max(1)).enumerate() {
                for (j, &value) in row.iter().enumerate() {
                    output[j * n + i] = value;
                }
            }
        }
    }
}

/// Where a batch's buffers live, resolved once before launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Residency {
    inputs_on_device: bool,
    outputs_on_device: bool,
}

/// Resolve both buffer locations against the configuration's context.
pub(crate) fn resolve<I, O>(inputs: &I, output: &O, cfg: &HashConfig) -> PoseidonResult<Residency>
where
    I: FieldSlice + ?Sized,
    O: FieldSlice + ?Sized,
{
    let inputs_on_device =
        resolve_location(cfg.inputs_on_device, inputs.location(), &cfg.ctx, "input")?;
    let outputs_on_device =
        resolve_location(cfg.outputs_on_device, output.location(), &cfg.ctx, "output")?;
    Ok(Residency {
        inputs_on_device,
        outputs_on_device,
    })
}

/// Run a validated, resolved batch, blocking until done.
#[instrument(level = "debug", skip_all, fields(states = shape.number_of_states), err)]
pub(crate) fn run<I, O>(
    constants: &PoseidonConstants,
    inputs: &I,
    output: &mut O,
    shape: BatchShape,
    residency: Residency,
    cfg: &HashConfig,
) -> PoseidonResult<()>
where
    I: FieldSlice + ?Sized,
    O: FieldSliceMut + ?Sized,
{
    let needed_in = shape.number_of_states * shape.input_block_len;
    let raw_inputs = &inputs.as_fields()[..needed_in];
    let staged;
    let device_inputs = if residency.inputs_on_device {
        raw_inputs
    } else {
        trace!(elements = needed_in, "staging host inputs");
        staged = raw_inputs.to_vec();
        &staged[..]
    };

    let results = compute(constants, device_inputs, shape, cfg)?;

    if !residency.outputs_on_device {
        trace!(elements = results.len(), "copying results to host");
    }
    scatter(&results, output.as_fields_mut(), shape, cfg.layout);
    Ok(())
}

/// Validate, then run a batch over owned buffers, possibly in the background.
pub(crate) fn submit<I, O>(
    constants: Arc<PoseidonConstants>,
    inputs: I,
    mut output: O,
    shape: BatchShape,
    cfg: &HashConfig,
) -> PoseidonResult<Submission<O>>
where
    I: FieldSlice + Send + 'static,
    O: FieldSliceMut + Send + 'static,
{
    validate(
        constants.width(),
        inputs.as_fields().len(),
        output.as_fields().len(),
        shape,
        cfg,
    )?;
    let residency = resolve(&inputs, &output, cfg)?;

    if !cfg.is_async {
        run(&constants, &inputs, &mut output, shape, residency, cfg)?;
        return Ok(Submission::Ready(output));
    }

    let (sender, receiver) = oneshot::channel();
    let job_cfg = cfg.clone();
    debug!(states = shape.number_of_states, "submitting asynchronous batch");
    cfg.ctx.spawn(move || {
        let result = catch_unwind(AssertUnwindSafe(|| {
            run(&constants, &inputs, &mut output, shape, residency, &job_cfg)
        }))
        .unwrap_or_else(|_| Err(ErrorCode::ExecutionFailure("batch worker panicked".to_string())))
        .map(|()| output);
        _ = sender.send(result);
    });

    Ok(Submission::Pending(PendingHash::new(receiver)))
}
