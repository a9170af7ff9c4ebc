use iscale_image::{Polarity, ScaleParams};

use crate::cursor::InputCursor;
use crate::downscale::DetailDownscaler;
use crate::error::StreamError;
use crate::mitchell::MitchellScaler;

/// Outcome of one [`ScaleStream::process`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamStatus {
    /// The stream consumed all it could and needs another input row.
    NeedsInput,
    /// One resampled row was written to the output slot.
    OutputReady,
    /// Every output row has been produced.
    EndOfStream,
}

/// The resampling filter run by a stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterKind {
    /// Separable Mitchell-Netravali cubic.
    Mitchell,
    /// Keep the darkest pixel of every reduction window.
    DetailDownscale,
}

/// A stateful row-in / row-out resampling transform.
///
/// Input rows hold `params().input_row_samples()` samples in
/// `params().format_in`; output rows hold `params().output_row_samples()`
/// samples in `params().format_out`. A stream consumes at most one input row
/// per call before returning, and writes at most one output row per call.
pub trait ScaleStream {
    /// The parameters the stream was created with.
    fn params(&self) -> &ScaleParams;

    /// Whether the most recent output row lies inside the clip rectangle.
    fn is_active(&self) -> bool;

    /// Advance the stream.
    ///
    /// # Arguments
    ///
    /// * `input` - The remaining canonical input samples.
    /// * `output` - Slot receiving one resampled row.
    /// * `last` - Whether no input will follow `input`.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::PartialRow`] if the input ends inside a row.
    fn process(
        &mut self,
        input: &mut InputCursor<'_>,
        output: &mut [u16],
        last: bool,
    ) -> Result<StreamStatus, StreamError>;
}

/// Create a stream for the given filter.
///
/// # Arguments
///
/// * `kind` - The filter to run.
/// * `params` - The immutable scale parameters.
///
/// # Errors
///
/// Returns an error if the geometry is empty, the working memory cannot be
/// reserved, or the detail-preserving filter has no known polarity.
pub fn init_stream(
    kind: FilterKind,
    params: ScaleParams,
) -> Result<Box<dyn ScaleStream>, StreamError> {
    if params.width_in() == 0
        || params.height_in() == 0
        || params.width_out() == 0
        || params.height_out() == 0
        || params.spp_interp == 0
    {
        return Err(StreamError::EmptyGeometry);
    }

    log::debug!(
        "stream {:?}: {}x{} -> {}x{}, {} samples per pixel",
        kind,
        params.width_in(),
        params.height_in(),
        params.width_out(),
        params.height_out(),
        params.spp_interp
    );

    Ok(match kind {
        FilterKind::Mitchell => Box::new(MitchellScaler::new(params)?),
        FilterKind::DetailDownscale => {
            if params.polarity == Polarity::Unknown {
                return Err(StreamError::UnknownPolarity);
            }
            Box::new(DetailDownscaler::new(params)?)
        }
    })
}

/// Check an input row against the stream's input format.
pub(crate) fn check_width(cursor: &InputCursor<'_>, params: &ScaleParams) -> Result<(), StreamError> {
    let expected = params.format_in.bits();
    if cursor.remaining() > 0 && cursor.bits() != expected {
        return Err(StreamError::SampleWidth(cursor.bits(), expected));
    }
    Ok(())
}

/// Check an output slot against the stream's row size.
pub(crate) fn check_output(output: &[u16], params: &ScaleParams) -> Result<(), StreamError> {
    let expected = params.output_row_samples();
    if output.len() < expected {
        return Err(StreamError::OutputTooSmall {
            expected,
            actual: output.len(),
        });
    }
    Ok(())
}
