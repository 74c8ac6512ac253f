//! Per-call hash configuration.
//!
//! The rates are fixed when the configuration is built and validated
//! against the instance width; every other option has a `with_*` setter.

use crate::device::ExecutionContext;
use crate::error::{ErrorCode, PoseidonResult};
use crate::poseidon::Padding;
use serde::{Deserialize, Serialize};

/// How the blocks of a batch are laid out in a flat buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layout {
    /// Block `i` is contiguous: element `j` of instance `i` is at `i * block_len + j`.
    #[default]
    RowMajor,
    /// Element `j` of instance `i` is at `j * number_of_states + i`.
    ColumnMajor,
}

/// Options for one batch call.
#[derive(Debug, Clone)]
pub struct HashConfig {
    width: usize,
    input_rate: usize,
    output_rate: usize,
    /// Device and worker pool running the batch.
    pub ctx: ExecutionContext,
    /// Return before the batch completes (owned-buffer submissions only).
    pub is_async: bool,
    /// Overrides the input buffer's location tag when set.
    pub inputs_on_device: Option<bool>,
    /// Overrides the output buffer's location tag when set.
    pub outputs_on_device: Option<bool>,
    /// Buffer layout, shared by inputs and output.
    pub layout: Layout,
    /// Padding applied to each instance's block.
    pub padding: Padding,
}

impl HashConfig {
    /// Configuration for a `width`-element state.
    ///
    /// Requires `1 <= input_rate <= width - 1` (one slot stays reserved for
    /// the capacity) and `1 <= output_rate <= width`.
    pub fn new(width: usize, input_rate: usize, output_rate: usize) -> PoseidonResult<Self> {
        if width < 2 {
            return Err(ErrorCode::InvalidRateConfiguration(format!(
                "width must be at least 2, got {}",
                width
            )));
        }
        if input_rate == 0 || input_rate >= width {
            return Err(ErrorCode::InvalidRateConfiguration(format!(
                "input rate must be in 1..={}, got {}",
                width - 1,
                input_rate
            )));
        }
        if output_rate == 0 || output_rate > width {
            return Err(ErrorCode::InvalidRateConfiguration(format!(
                "output rate must be in 1..={}, got {}",
                width, output_rate
            )));
        }
        Ok(Self::with_rates(width, input_rate, output_rate))
    }

    /// Full-absorb, full-squeeze configuration for a width.
    pub(crate) fn for_width(width: usize) -> Self {
        Self::with_rates(width, width - 1, width)
    }

    fn with_rates(width: usize, input_rate: usize, output_rate: usize) -> Self {
        Self {
            width,
            input_rate,
            output_rate,
            ctx: ExecutionContext::default(),
            is_async: false,
            inputs_on_device: None,
            outputs_on_device: None,
            layout: Layout::RowMajor,
            padding: Padding::Zeros,
        }
    }

    /// State width this configuration was validated against.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Maximum elements absorbed per instance per permutation.
    pub fn input_rate(&self) -> usize {
        self.input_rate
    }

    /// Maximum elements squeezed per instance.
    pub fn output_rate(&self) -> usize {
        self.output_rate
    }

    /// Run on the given context.
    pub fn with_context(mut self, ctx: ExecutionContext) -> Self {
        self.ctx = ctx;
        self
    }

    /// Select asynchronous submission.
    pub fn with_async(mut self, is_async: bool) -> Self {
        self.is_async = is_async;
        self
    }

    /// Declare where the inputs live.
    pub fn with_inputs_on_device(mut self, on_device: bool) -> Self {
        self.inputs_on_device = Some(on_device);
        self
    }

    /// Declare where the output lives.
    pub fn with_outputs_on_device(mut self, on_device: bool) -> Self {
        self.outputs_on_device = Some(on_device);
        self
    }

    /// Select the buffer layout.
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// Select the padding mode.
    pub fn with_padding(mut self, padding: Padding) -> Self {
        self.padding = padding;
        self
    }
}
