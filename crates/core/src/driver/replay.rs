use std::io::Read;

use tracing::{debug, info};

use super::{DriverContext, ExitReason, Mode, RunSummary};
use crate::{
    host::{InputSink, ScreenInfo},
    pacer::{Clock, ReplayPacer},
    window::{WindowBuffer, WindowPush},
    ActionEmitter, ReplayNormalizer, Result, SignalAnalyzer, SignalReader,
};

/// Decodes a signal file window by window and replays it as host input, one
/// window per frame interval. A trailing partial window is discarded.
pub fn replay<R, H, C>(
    mut reader: SignalReader<R>,
    host: &mut H,
    ctx: DriverContext<'_, C>,
) -> Result<RunSummary>
where
    R: Read,
    H: ScreenInfo + InputSink,
    C: Clock,
{
    let basis = ctx.config.replay_basis()?;
    reader.check_sample_rate(basis.sample_rate());
    let screen = host.screen_size()?;

    let analyzer = SignalAnalyzer::new(&basis);
    let mut window = WindowBuffer::new(basis.window_size());
    let mut normalizer = ReplayNormalizer::new(screen, ctx.config.replay.clone());
    let mut pacer = ReplayPacer::new(ctx.clock.now(), basis.frame_interval());
    let mut summary = RunSummary::new(Mode::Replay);

    info!(
        samples = reader.info().samples,
        frame_rate = basis.frame_rate(),
        width = screen.width,
        height = screen.height,
        "replaying signal"
    );

    let mut emitter = ActionEmitter::new(host, ctx.config.key_code);
    while ctx.flag.is_running() {
        let Some(sample) = reader.next_sample()? else {
            summary.exit = ExitReason::EndOfInput;
            break;
        };
        summary.samples += 1;

        if let WindowPush::Ready(samples) = window.push_pcm(sample) {
            pacer.wait(ctx.clock);
            let power = analyzer.analyze(samples);
            let frame = normalizer.update(power);
            emitter.emit(&frame)?;
            summary.windows += 1;

            debug!(
                x = frame.cursor.x,
                y = frame.cursor.y,
                key_down = frame.cursor.key_down,
                power_key = power.key,
                "window decoded"
            );
            if summary.windows % u64::from(basis.frame_rate()) == 0 {
                info!(seconds = summary.windows / u64::from(basis.frame_rate()), "replaying");
            }
        }
    }

    emitter.release()?;
    summary.warps = emitter.warps();
    summary.key_transitions = emitter.transitions();
    info!(windows = summary.windows, exit = ?summary.exit, "replay finished");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::{
        host::mock::MockHost, pacer::ManualClock, AppConfig, InputState, RunFlag, SignalEncoder,
        SignalWriter,
    };

    /// Encodes `windows` windows of each state back to back.
    fn signal(segments: &[(InputState, usize)], extra_samples: usize) -> Cursor<Vec<u8>> {
        let basis = AppConfig::default().encode_basis().unwrap();
        let mut encoder = SignalEncoder::new(&basis);
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut writer = SignalWriter::new(&mut buffer, basis.sample_rate()).unwrap();
            for (state, windows) in segments {
                for _ in 0..windows * basis.window_size() {
                    writer.write(encoder.next_sample(state)).unwrap();
                }
            }
            let last = segments.last().map(|(state, _)| *state).unwrap_or_default();
            for _ in 0..extra_samples {
                writer.write(encoder.next_sample(&last)).unwrap();
            }
            writer.finalize().unwrap();
        }
        buffer.set_position(0);
        buffer
    }

    fn run(buffer: Cursor<Vec<u8>>, host: &mut MockHost, clock: &ManualClock) -> RunSummary {
        let config = AppConfig::default();
        let flag = RunFlag::new();
        let reader = SignalReader::new(buffer).unwrap();
        replay(reader, host, DriverContext::new(&config, clock, &flag)).unwrap()
    }

    #[test]
    fn key_segments_become_one_press_and_one_release() {
        let up = InputState::new(0.3, 0.6, false);
        let down = InputState::new(0.3, 0.6, true);
        let buffer = signal(&[(up, 10), (down, 10), (up, 10)], 0);
        let mut host = MockHost::new(1920, 1080);

        let summary = run(buffer, &mut host, &ManualClock::new());

        assert_eq!(summary.windows, 30);
        assert_eq!(summary.exit, ExitReason::EndOfInput);
        assert_eq!(host.key_events(), vec![true, false]);
        assert_eq!(summary.key_transitions, 2);
        assert_eq!(host.warps().len(), 30);
    }

    #[test]
    fn key_held_at_end_of_file_is_released() {
        let down = InputState::new(0.5, 0.5, true);
        let buffer = signal(&[(down, 4)], 0);
        let mut host = MockHost::new(800, 600);

        let summary = run(buffer, &mut host, &ManualClock::new());

        assert_eq!(host.key_events(), vec![true, false]);
        assert_eq!(summary.key_transitions, 2);
    }

    #[test]
    fn trailing_partial_window_is_dropped() {
        let state = InputState::new(0.2, 0.2, false);
        let buffer = signal(&[(state, 2)], 100);
        let mut host = MockHost::new(800, 600);

        let summary = run(buffer, &mut host, &ManualClock::new());

        assert_eq!(summary.samples, 2 * 367 + 100);
        assert_eq!(summary.windows, 2);
        assert_eq!(host.warps().len(), 2);
    }

    #[test]
    fn truncated_file_ends_normally() {
        let state = InputState::new(0.4, 0.8, false);
        let mut bytes = signal(&[(state, 3)], 0).into_inner();
        bytes.pop();
        let mut host = MockHost::new(800, 600);

        let summary = run(Cursor::new(bytes), &mut host, &ManualClock::new());

        assert_eq!(summary.exit, ExitReason::EndOfInput);
        assert_eq!(summary.samples, 3 * 367 - 1);
        assert_eq!(summary.windows, 2);
    }

    #[test]
    fn unpatched_header_still_replays_every_window() {
        let state = InputState::new(0.4, 0.8, true);
        let mut bytes = signal(&[(state, 3)], 0).into_inner();
        bytes[4..8].fill(0);
        bytes[40..44].fill(0);
        let mut host = MockHost::new(800, 600);

        let summary = run(Cursor::new(bytes), &mut host, &ManualClock::new());

        assert_eq!(summary.exit, ExitReason::EndOfInput);
        assert_eq!(summary.windows, 3);
        assert_eq!(host.key_events(), vec![true, false]);
    }

    #[test]
    fn windows_are_paced_one_interval_apart() {
        let state = InputState::new(0.7, 0.1, false);
        let buffer = signal(&[(state, 12)], 0);
        let mut host = MockHost::new(800, 600);
        let clock = ManualClock::new();

        let summary = run(buffer, &mut host, &clock);

        let interval = AppConfig::default().replay_basis().unwrap().frame_interval();
        assert_eq!(summary.windows, 12);
        assert_eq!(clock.slept(), interval * 11);
    }

    #[test]
    fn stopped_flag_emits_nothing() {
        let config = AppConfig::default();
        let clock = ManualClock::new();
        let flag = RunFlag::new();
        flag.stop();
        let buffer = signal(&[(InputState::new(0.5, 0.5, true), 3)], 0);
        let mut host = MockHost::new(800, 600);

        let reader = SignalReader::new(buffer).unwrap();
        let summary = replay(reader, &mut host, DriverContext::new(&config, &clock, &flag)).unwrap();

        assert_eq!(summary.exit, ExitReason::Cancelled);
        assert_eq!(summary.samples, 0);
        assert!(host.events.is_empty());
    }

    #[test]
    fn host_failure_aborts_the_run() {
        let config = AppConfig::default();
        let clock = ManualClock::new();
        let flag = RunFlag::new();
        let buffer = signal(&[(InputState::new(0.5, 0.5, false), 2)], 0);
        let mut host = MockHost::new(800, 600);
        host.should_fail = true;

        let reader = SignalReader::new(buffer).unwrap();
        let result = replay(reader, &mut host, DriverContext::new(&config, &clock, &flag));

        assert!(matches!(result, Err(crate::ToneLinkError::Host(_))));
    }
}
