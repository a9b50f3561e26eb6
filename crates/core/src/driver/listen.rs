use tracing::{debug, info};

use super::{DriverContext, Mode, RunSummary};
use crate::{
    capture::{CaptureDevice, CaptureError},
    host::{InputSink, ScreenInfo},
    pacer::{Clock, LivePacer},
    window::{WindowBuffer, WindowPush},
    ActionEmitter, LiveNormalizer, Result, SignalAnalyzer,
};

/// Decodes live capture into host input until the run flag clears.
///
/// Windows are framed at the host refresh rate. Only windows that pass the
/// elapsed-time gate are analysed and emitted. An xrun re-primes the device
/// and drops the partial window; any other capture error ends the run.
pub fn listen<D, H, C>(
    device: &mut D,
    host: &mut H,
    ctx: DriverContext<'_, C>,
) -> Result<RunSummary>
where
    D: CaptureDevice,
    H: ScreenInfo + InputSink,
    C: Clock,
{
    let basis = ctx.config.live_basis(host.refresh_rate())?;
    let screen = host.screen_size()?;

    let analyzer = SignalAnalyzer::new(&basis);
    let mut window = WindowBuffer::new(basis.window_size());
    let mut normalizer = LiveNormalizer::new(screen, ctx.config.live.clone());
    let mut pacer = LivePacer::new(ctx.clock.now(), basis.frame_interval());
    let mut chunk = vec![0i16; basis.window_size()];
    let mut summary = RunSummary::new(Mode::Listen);

    info!(
        refresh_rate = basis.frame_rate(),
        window = basis.window_size(),
        freq_x = basis.freq_x(),
        freq_y = basis.freq_y(),
        freq_key = basis.freq_key(),
        width = screen.width,
        height = screen.height,
        "listening"
    );

    let mut emitter = ActionEmitter::new(host, ctx.config.key_code);
    while ctx.flag.is_running() {
        let read = match device.read(&mut chunk) {
            Ok(read) => read,
            Err(CaptureError::Xrun) => {
                summary.xruns += 1;
                debug!(xruns = summary.xruns, "capture overrun, re-priming device");
                device.recover()?;
                window.clear();
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        for &sample in &chunk[..read] {
            summary.samples += 1;
            let WindowPush::Ready(samples) = window.push_pcm(sample) else {
                continue;
            };
            summary.windows += 1;
            if !pacer.should_emit(ctx.clock.now()) {
                continue;
            }

            let frame = normalizer.update(analyzer.analyze(samples));
            emitter.emit(&frame)?;
            debug!(
                x = frame.cursor.x,
                y = frame.cursor.y,
                key_down = frame.cursor.key_down,
                moved = frame.move_pointer,
                "window decoded"
            );
        }
    }

    emitter.release()?;
    summary.warps = emitter.warps();
    summary.key_transitions = emitter.transitions();
    info!(windows = summary.windows, xruns = summary.xruns, "listening stopped");
    Ok(summary)
}
