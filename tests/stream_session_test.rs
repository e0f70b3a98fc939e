//! Stream session tests
//!
//! All timing assertions run on tokio's paused clock.

use camtether::config::StreamConfig;
use camtether::link::ActiveLink;
use camtether::testing::{RecordingSink, Reply, StubControl};
use camtether::{
    CameraCommand, CameraEndpoint, ControlFailure, StreamSession, StreamState, TetherConfig,
    TetherError,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

struct Fixture {
    camera: Arc<StubControl>,
    sink: Arc<RecordingSink>,
    session: StreamSession,
}

fn fixture() -> Fixture {
    let config = TetherConfig::default();
    let camera = Arc::new(StubControl::new(CameraEndpoint::access_point(&config)));
    let sink = Arc::new(RecordingSink::new());
    let link = Arc::new(ActiveLink::new(camera.clone()));
    let session = StreamSession::new(
        link,
        sink.clone(),
        config.stream.clone(),
        config.camera.stream_url.clone(),
    );
    Fixture {
        camera,
        sink,
        session,
    }
}

fn count(camera: &StubControl, command: CameraCommand) -> usize {
    camera.commands().iter().filter(|c| **c == command).count()
}

#[cfg(test)]
mod request_stream_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_request_stream_success() {
        let f = fixture();
        let invoked = Instant::now();

        assert!(f.session.request_stream().await);

        assert_eq!(f.session.state(), StreamState::Streaming);
        assert_eq!(f.sink.endpoints(), vec!["udp://@0.0.0.0:8554".to_string()]);
        assert_eq!(f.sink.buffering(), vec![true]);

        let stop_recording = f.camera.received_at(CameraCommand::StopRecording).unwrap();
        let start_stream = f.camera.received_at(CameraCommand::StartStream).unwrap();
        assert!(stop_recording <= start_stream);
        assert!(start_stream - invoked >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_camera_hits_deadline() {
        let f = fixture();
        f.camera.reply(CameraCommand::StartStream, Reply::Hang);
        let invoked = Instant::now();

        let result = f.session.start_stream_detailed().await;

        assert!(matches!(
            result,
            Err(TetherError::DeadlineExceeded(d)) if d == Duration::from_secs(10)
        ));
        assert!(invoked.elapsed() <= Duration::from_secs(10));
        assert_eq!(f.session.state(), StreamState::Idle);
        assert_eq!(f.sink.buffering(), vec![true, false]);
        assert!(f.sink.endpoints().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_camera_error_reports_false() {
        let f = fixture();
        f.camera.reply(
            CameraCommand::StartStream,
            Reply::Fail(ControlFailure::HttpError(500)),
        );

        assert!(!f.session.request_stream().await);
        assert_eq!(f.session.state(), StreamState::Idle);

        let detailed = f.session.start_stream_detailed().await;
        assert!(matches!(
            detailed,
            Err(TetherError::Control(ControlFailure::HttpError(500)))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_state_transitions_are_published() {
        let f = fixture();
        let mut states = f.session.subscribe();

        let watcher = async {
            states.changed().await.unwrap();
            *states.borrow_and_update()
        };
        let (first, started) = tokio::join!(watcher, f.session.request_stream());

        assert_eq!(first, StreamState::Starting);
        assert!(started);
        assert_eq!(*states.borrow(), StreamState::Streaming);
    }
}

#[cfg(test)]
mod stop_stream_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_stop_from_idle_still_sends_command() {
        let f = fixture();

        assert!(f.session.stop_stream().await);

        assert_eq!(f.camera.commands(), vec![CameraCommand::StopStream]);
        assert_eq!(f.session.state(), StreamState::Idle);
        assert_eq!(f.sink.cleared(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_stop_restores_previous_state() {
        let f = fixture();
        assert!(f.session.request_stream().await);

        f.camera.reply(
            CameraCommand::StopStream,
            Reply::Fail(ControlFailure::EmptyBody),
        );
        assert!(!f.session.stop_stream().await);

        assert_eq!(f.session.state(), StreamState::Streaming);
        assert_eq!(f.sink.cleared(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_stop_hits_deadline() {
        let f = fixture();
        f.camera.reply(CameraCommand::StopStream, Reply::Hang);
        let invoked = Instant::now();

        assert!(!f.session.stop_stream().await);
        assert_eq!(invoked.elapsed(), Duration::from_secs(10));
        assert_eq!(f.session.state(), StreamState::Idle);
    }
}

#[cfg(test)]
mod link_lost_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_link_lost_while_streaming_clears_sink() {
        let f = fixture();
        assert!(f.session.request_stream().await);

        f.session.on_link_lost();

        assert_eq!(f.session.state(), StreamState::Idle);
        assert_eq!(f.sink.cleared(), 1);
        assert_eq!(f.sink.buffering(), vec![true, false]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_link_lost_supersedes_pending_start() {
        let f = fixture();

        let (started, _) = tokio::join!(f.session.start_stream_detailed(), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            f.session.on_link_lost();
        });

        assert!(matches!(started, Err(TetherError::Superseded)));
        assert_eq!(count(&f.camera, CameraCommand::StartStream), 0);
        assert_eq!(f.session.state(), StreamState::Idle);
    }

    #[tokio::test]
    async fn test_link_lost_when_idle_leaves_sink_alone() {
        let f = fixture();
        f.session.on_link_lost();
        assert_eq!(f.sink.cleared(), 0);
        assert!(f.sink.buffering().is_empty());
    }
}

#[cfg(test)]
mod overlap_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_stop_during_settle_cancels_pending_start() {
        let f = fixture();

        let (started, stopped) = tokio::join!(f.session.start_stream_detailed(), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            f.session.stop_stream().await
        });

        assert!(matches!(started, Err(TetherError::Superseded)));
        assert!(stopped);
        // Stop was the last intent, so it is the last stream command on the wire.
        assert_eq!(
            f.camera.commands(),
            vec![CameraCommand::StopRecording, CameraCommand::StopStream]
        );
        assert_eq!(f.session.state(), StreamState::Idle);
        assert!(f.sink.endpoints().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_while_start_in_flight_is_sent_after_it() {
        let f = fixture();
        f.camera.reply(
            CameraCommand::StartStream,
            Reply::Delayed(Duration::from_secs(5)),
        );

        let (started, stopped) = tokio::join!(f.session.request_stream(), async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            f.session.stop_stream().await
        });

        assert!(started);
        assert!(stopped);
        let stream_commands: Vec<_> = f
            .camera
            .commands()
            .into_iter()
            .filter(|c| *c != CameraCommand::StopRecording)
            .collect();
        assert_eq!(
            stream_commands,
            vec![CameraCommand::StartStream, CameraCommand::StopStream]
        );
        assert_eq!(f.session.state(), StreamState::Idle);
        assert!(f.sink.endpoints().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_issued_during_stop_wins() {
        let f = fixture();
        f.camera.reply(
            CameraCommand::StopStream,
            Reply::Delayed(Duration::from_secs(5)),
        );

        let (stopped, started) = tokio::join!(f.session.stop_stream(), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            f.session.request_stream().await
        });

        assert!(stopped);
        assert!(started);
        assert_eq!(f.session.state(), StreamState::Streaming);
        assert_eq!(f.sink.cleared(), 0);
        assert_eq!(f.sink.endpoints().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_requests_send_one_start() {
        let f = fixture();

        let (a, b) = tokio::join!(f.session.request_stream(), f.session.request_stream());

        // The first request is superseded during its settle delay.
        assert!(!a);
        assert!(b);
        assert_eq!(count(&f.camera, CameraCommand::StartStream), 1);
        assert_eq!(f.session.state(), StreamState::Streaming);
        assert_eq!(f.sink.endpoints().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_burst_settles_on_last_intent() {
        let f = fixture();
        f.camera.reply(
            CameraCommand::StartStream,
            Reply::Delayed(Duration::from_secs(1)),
        );

        let calls = (0..4).map(|i| {
            let session = &f.session;
            async move {
                tokio::time::sleep(Duration::from_millis(100 * i)).await;
                if i == 3 {
                    session.stop_stream().await
                } else {
                    session.request_stream().await
                }
            }
        });
        let results = futures::future::join_all(calls).await;

        assert_eq!(results, vec![false, false, false, true]);
        assert_eq!(count(&f.camera, CameraCommand::StartStream), 0);
        assert_eq!(f.session.state(), StreamState::Idle);
        assert!(f.sink.endpoints().is_empty());
    }
}

#[cfg(test)]
mod keep_streaming_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_keep_streaming_retries_until_started() {
        let f = fixture();
        f.camera.reply(
            CameraCommand::StartStream,
            Reply::Fail(ControlFailure::HttpError(503)),
        );

        let (started, _) = tokio::join!(
            f.session.keep_streaming(CancellationToken::new()),
            async {
                // First attempt fails at 2s; the second one calls the camera at 5s.
                tokio::time::sleep(Duration::from_secs(4)).await;
                f.camera.reply(CameraCommand::StartStream, Reply::Ok("{}"));
            }
        );

        assert!(started);
        assert_eq!(count(&f.camera, CameraCommand::StartStream), 2);
        assert_eq!(f.session.state(), StreamState::Streaming);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keep_streaming_stops_on_cancel() {
        let f = fixture();
        f.camera.reply(
            CameraCommand::StartStream,
            Reply::Fail(ControlFailure::HttpError(503)),
        );
        let cancel = CancellationToken::new();

        let (started, _) = tokio::join!(f.session.keep_streaming(cancel.clone()), async {
            tokio::time::sleep(Duration::from_secs(7)).await;
            cancel.cancel();
        });

        assert!(!started);
        assert!(count(&f.camera, CameraCommand::StartStream) >= 2);
        assert_ne!(f.session.state(), StreamState::Streaming);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keep_streaming_yields_to_stop() {
        let f = fixture();
        f.camera.reply(
            CameraCommand::StartStream,
            Reply::Fail(ControlFailure::HttpError(503)),
        );

        let (started, stopped) = tokio::join!(
            f.session.keep_streaming(CancellationToken::new()),
            async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                f.session.stop_stream().await
            }
        );

        assert!(!started);
        assert!(stopped);
        assert_eq!(count(&f.camera, CameraCommand::StartStream), 0);
        assert_eq!(f.session.state(), StreamState::Idle);
    }

    #[test]
    fn test_defaults_match_camera_timings() {
        let timings = StreamConfig {
            deadline_ms: 10_000,
            settle_delay_ms: 2_000,
            restart_delay_ms: 1_000,
        };
        assert_eq!(TetherConfig::default().stream, timings);
        assert_eq!(timings.deadline(), Duration::from_secs(10));
    }
}
