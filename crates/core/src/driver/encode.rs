use std::io::{Seek, Write};

use tracing::info;

use super::{DriverContext, ExitReason, Mode, RunSummary};
use crate::{
    host::{InputSource, ScreenInfo},
    pacer::{Clock, ReplayPacer},
    InputState, Result, SignalEncoder, SignalWriter,
};

/// Samples host input once per output sample and writes the encoded signal
/// until the run flag clears or `sample_limit` samples have been written.
///
/// The header is back-patched on return. On an error the writer is dropped,
/// which back-patches it as well.
pub fn encode<H, W, C>(
    host: &mut H,
    mut writer: SignalWriter<W>,
    ctx: DriverContext<'_, C>,
    sample_limit: Option<u64>,
) -> Result<RunSummary>
where
    H: ScreenInfo + InputSource,
    W: Write + Seek,
    C: Clock,
{
    let basis = ctx.config.encode_basis()?;
    let screen = host.screen_size()?;
    let mut encoder = SignalEncoder::new(&basis);
    let mut pacer = ReplayPacer::new(ctx.clock.now(), basis.frame_interval());
    let sample_rate = u64::from(basis.sample_rate());
    let mut summary = RunSummary::new(Mode::Encode);

    info!(
        freq_x = basis.freq_x(),
        freq_y = basis.freq_y(),
        freq_key = basis.freq_key(),
        width = screen.width,
        height = screen.height,
        "encoding input"
    );

    while ctx.flag.is_running() {
        if sample_limit.is_some_and(|limit| encoder.produced() >= limit) {
            summary.exit = ExitReason::LimitReached;
            break;
        }

        if encoder.at_window_start() {
            if encoder.produced() > 0 {
                summary.windows += 1;
            }
            if ctx.config.encode.realtime {
                pacer.wait(ctx.clock);
            }
        }

        let (x, y) = host.pointer_position()?;
        let key_down = host.any_key_down()?;
        let state = InputState::from_pointer(x, y, screen.width, screen.height, key_down);
        writer.write(encoder.next_sample(&state))?;

        if encoder.produced() % sample_rate == 0 {
            info!(
                seconds = encoder.produced() / sample_rate,
                x = state.x_mod,
                y = state.y_mod,
                key_down,
                "recording"
            );
        }
    }

    if encoder.at_window_start() && encoder.produced() > 0 {
        summary.windows += 1;
    }
    summary.samples = writer.finalize()?;
    info!(samples = summary.samples, exit = ?summary.exit, "encoding finished");
    Ok(summary)
}
