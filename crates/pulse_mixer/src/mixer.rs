//! Mixer Operations
//!
//! The operations scripts call, written against [`MixerBackend`] so they
//! work the same over a live server session or the in-memory emulation.

use tracing::{debug, info, warn};

use crate::error::{MixerError, MixerResult};
use crate::traits::MixerBackend;
use crate::types::{Sink, SinkEntry, SinkInput, SinkInputEntry, Target, VolumeRequest};
use crate::volume::{clamp_linear, to_decibel, to_linear};

/// List all sinks, marking the server's default
///
/// Resolves the default sink name first, then lists the sinks.
pub fn list_sinks<B: MixerBackend + ?Sized>(backend: &mut B) -> MixerResult<Vec<Sink>> {
    let server = backend.server_info()?;
    let default_sink = server.default_sink.as_deref();

    let sinks: Vec<Sink> = backend
        .sinks()?
        .into_iter()
        .map(|entry| sink_record(entry, default_sink))
        .collect();

    debug!("Listed {} sinks (default: {:?})", sinks.len(), default_sink);
    Ok(sinks)
}

/// List all sink inputs
pub fn list_sink_inputs<B: MixerBackend + ?Sized>(backend: &mut B) -> MixerResult<Vec<SinkInput>> {
    let inputs: Vec<SinkInput> = backend
        .sink_inputs()?
        .into_iter()
        .map(sink_input_record)
        .collect();

    debug!("Listed {} sink inputs", inputs.len());
    Ok(inputs)
}

/// Apply a volume/mute request to a sink or sink input
///
/// Mute is applied before volume; each is a separate request and the
/// outcomes are combined with AND. A field left unset is not touched and
/// counts as success, so an empty request succeeds without any request.
pub fn set_volume<B: MixerBackend + ?Sized>(
    backend: &mut B,
    target: Target,
    index: u32,
    request: &VolumeRequest,
) -> MixerResult<bool> {
    if request.is_empty() {
        debug!("Nothing to change for {} {}", target.as_str(), index);
        return Ok(true);
    }

    let mut mute_ok = true;
    let mut volume_ok = true;

    if let Some(mute) = request.mute {
        mute_ok = backend.set_mute(target, index, mute)?;
        info!("Set {} {} mute={} (ok: {})", target.as_str(), index, mute, mute_ok);
    }

    if let Some(volume) = request.volume {
        let linear = clamp_linear(volume);
        let volume_db = to_decibel(linear);
        volume_ok = backend.set_volume(target, index, volume_db)?;
        info!(
            "Set {} {} volume={} ({:.2} dB, ok: {})",
            target.as_str(),
            index,
            linear,
            volume_db,
            volume_ok
        );
    }

    if !(mute_ok && volume_ok) {
        warn!("Server declined volume change for {} {}", target.as_str(), index);
    }
    Ok(mute_ok && volume_ok)
}

/// Move a sink input to another sink
pub fn move_sink_input<B: MixerBackend + ?Sized>(
    backend: &mut B,
    sink_input: u32,
    sink: u32,
) -> MixerResult<bool> {
    let ok = backend.move_sink_input(sink_input, sink)?;
    info!("Move sink input {} to sink {} (ok: {})", sink_input, sink, ok);
    Ok(ok)
}

/// Make the named sink the default
///
/// Names travel as C strings, so an embedded NUL is rejected up front.
pub fn set_default_sink<B: MixerBackend + ?Sized>(backend: &mut B, name: &str) -> MixerResult<bool> {
    if name.contains('\0') {
        return Err(MixerError::InvalidArgument(
            "sink name contains a NUL byte".into(),
        ));
    }
    let ok = backend.set_default_sink(name)?;
    info!("Set default sink {:?} (ok: {})", name, ok);
    Ok(ok)
}

fn sink_record(entry: SinkEntry, default_sink: Option<&str>) -> Sink {
    let is_default = default_sink == Some(entry.name.as_str());
    Sink {
        index: entry.index,
        volume: to_linear(entry.volume_db),
        mute: entry.mute,
        name: entry.name,
        is_default,
    }
}

fn sink_input_record(entry: SinkInputEntry) -> SinkInput {
    let name = entry
        .application_name
        .or(entry.name)
        .unwrap_or_default();

    SinkInput {
        index: entry.index,
        volume: to_linear(entry.volume_db),
        sink: entry.sink,
        mute: entry.mute,
        name,
        pid: entry.process_id.as_deref().and_then(parse_pid),
        binary: entry.process_binary,
    }
}

/// Parse the leading decimal digits of a process id property
fn parse_pid(raw: &str) -> Option<u32> {
    let trimmed = raw.trim_start();
    let end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    trimmed[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryConnector, MemoryServer, Request};
    use crate::traits::Connector;

    fn server() -> MemoryServer {
        let mut server = MemoryServer::new();
        server.add_sink(0, "alsa_output.pci-analog-stereo", 0.0, false);
        server.add_sink(3, "bluez_sink.headphones", to_decibel(40.0), true);
        server.add_sink_input(SinkInputEntry {
            index: 5,
            sink: 0,
            name: Some("playback".to_string()),
            volume_db: to_decibel(80.0),
            mute: false,
            application_name: Some("Firefox".to_string()),
            process_id: Some("4242".to_string()),
            process_binary: Some("firefox".to_string()),
        });
        server.add_sink_input(SinkInputEntry {
            index: 6,
            sink: 3,
            name: Some("ALSA plug-in [mpv]".to_string()),
            volume_db: 0.0,
            mute: true,
            application_name: None,
            process_id: None,
            process_binary: None,
        });
        server.set_default_sink_name(Some("bluez_sink.headphones"));
        server
    }

    #[test]
    fn test_list_sinks_marks_exactly_one_default() {
        let connector = MemoryConnector::new(server());
        let mut session = connector.connect().unwrap();

        let sinks = list_sinks(&mut session).unwrap();
        assert_eq!(sinks.len(), 2);

        let defaults: Vec<_> = sinks.iter().filter(|s| s.is_default).collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].name, "bluez_sink.headphones");
        assert_eq!(defaults[0].index, 3);
        assert_eq!(defaults[0].volume, 40);
        assert!(defaults[0].mute);
    }

    #[test]
    fn test_list_sinks_without_default() {
        let mut server = server();
        server.set_default_sink_name(None);
        let connector = MemoryConnector::new(server);
        let mut session = connector.connect().unwrap();

        let sinks = list_sinks(&mut session).unwrap();
        assert!(sinks.iter().all(|s| !s.is_default));
    }

    #[test]
    fn test_list_sinks_queries_default_first() {
        let connector = MemoryConnector::new(server());
        let mut session = connector.connect().unwrap();
        list_sinks(&mut session).unwrap();

        let requests = connector.requests();
        assert_eq!(requests, vec![Request::ServerInfo, Request::ListSinks]);
    }

    #[test]
    fn test_list_sink_inputs_prefers_application_name() {
        let connector = MemoryConnector::new(server());
        let mut session = connector.connect().unwrap();

        let inputs = list_sink_inputs(&mut session).unwrap();
        assert_eq!(inputs.len(), 2);

        let firefox = inputs.iter().find(|i| i.index == 5).unwrap();
        assert_eq!(firefox.name, "Firefox");
        assert_eq!(firefox.volume, 80);
        assert_eq!(firefox.sink, 0);
        assert_eq!(firefox.pid, Some(4242));
        assert_eq!(firefox.binary.as_deref(), Some("firefox"));

        let mpv = inputs.iter().find(|i| i.index == 6).unwrap();
        assert_eq!(mpv.name, "ALSA plug-in [mpv]");
        assert!(mpv.mute);
        assert_eq!(mpv.pid, None);
        assert_eq!(mpv.binary, None);
    }

    #[test]
    fn test_set_volume_clamps_to_full_scale() {
        let connector = MemoryConnector::new(server());
        let mut session = connector.connect().unwrap();

        let ok = set_volume(&mut session, Target::Sink, 3, &VolumeRequest::volume(150.0)).unwrap();
        assert!(ok);

        let requests = connector.requests();
        assert_eq!(
            requests,
            vec![Request::SetVolume {
                target: Target::Sink,
                index: 3,
                volume_db: 0.0,
            }]
        );
    }

    #[test]
    fn test_set_volume_success_reflects_server_only() {
        let connector = MemoryConnector::new(server());
        let mut session = connector.connect().unwrap();

        // Clamped input on a missing sink: the clamp does not rescue the outcome
        let ok = set_volume(&mut session, Target::Sink, 99, &VolumeRequest::volume(150.0)).unwrap();
        assert!(!ok);
    }

    #[test]
    fn test_mute_only_leaves_volume() {
        let connector = MemoryConnector::new(server());

        {
            let mut session = connector.connect().unwrap();
            let ok = set_volume(&mut session, Target::Sink, 0, &VolumeRequest::mute(true)).unwrap();
            assert!(ok);
        }

        let mut session = connector.connect().unwrap();
        let sinks = list_sinks(&mut session).unwrap();
        let sink = sinks.iter().find(|s| s.index == 0).unwrap();
        assert!(sink.mute);
        assert_eq!(sink.volume, 100);
    }

    #[test]
    fn test_empty_request_succeeds_without_requests() {
        let connector = MemoryConnector::new(server());
        let mut session = connector.connect().unwrap();

        let ok = set_volume(&mut session, Target::SinkInput, 12345, &VolumeRequest::default()).unwrap();
        assert!(ok);
        assert!(connector.requests().is_empty());
    }

    #[test]
    fn test_mute_then_volume_order_and_and() {
        let connector = MemoryConnector::new(server());
        let mut session = connector.connect().unwrap();

        let request = VolumeRequest {
            mute: Some(false),
            volume: Some(50.0),
        };
        let ok = set_volume(&mut session, Target::SinkInput, 6, &request).unwrap();
        assert!(ok);

        let requests = connector.requests();
        assert_eq!(requests.len(), 2);
        assert!(matches!(
            requests[0],
            Request::SetMute {
                target: Target::SinkInput,
                index: 6,
                mute: false
            }
        ));
        assert!(matches!(
            requests[1],
            Request::SetVolume {
                target: Target::SinkInput,
                index: 6,
                ..
            }
        ));

        let inputs = list_sink_inputs(&mut session).unwrap();
        let mpv = inputs.iter().find(|i| i.index == 6).unwrap();
        assert!(!mpv.mute);
        assert_eq!(mpv.volume, 50);
    }

    #[test]
    fn test_declined_mute_fails_combined_result() {
        let mut server = server();
        server.decline_mute(5);
        let connector = MemoryConnector::new(server);
        let mut session = connector.connect().unwrap();

        let request = VolumeRequest {
            mute: Some(true),
            volume: Some(10.0),
        };
        let ok = set_volume(&mut session, Target::SinkInput, 5, &request).unwrap();
        assert!(!ok);
        // Volume is still attempted after a declined mute
        assert_eq!(connector.requests().len(), 2);
    }

    #[test]
    fn test_move_sink_input_issues_one_request() {
        let mut server = server();
        server.add_sink(2, "hdmi_output", 0.0, false);
        let connector = MemoryConnector::new(server);
        let mut session = connector.connect().unwrap();

        let ok = move_sink_input(&mut session, 5, 2).unwrap();
        assert!(ok);
        assert_eq!(
            connector.requests(),
            vec![Request::MoveSinkInput {
                sink_input: 5,
                sink: 2
            }]
        );

        let inputs = list_sink_inputs(&mut session).unwrap();
        assert_eq!(inputs.iter().find(|i| i.index == 5).unwrap().sink, 2);
    }

    #[test]
    fn test_move_to_missing_sink_fails() {
        let connector = MemoryConnector::new(server());
        let mut session = connector.connect().unwrap();
        assert!(!move_sink_input(&mut session, 5, 77).unwrap());
    }

    #[test]
    fn test_set_default_sink() {
        let connector = MemoryConnector::new(server());
        let mut session = connector.connect().unwrap();

        assert!(set_default_sink(&mut session, "alsa_output.pci-analog-stereo").unwrap());
        assert!(!set_default_sink(&mut session, "no_such_sink").unwrap());

        let sinks = list_sinks(&mut session).unwrap();
        let default = sinks.iter().find(|s| s.is_default).unwrap();
        assert_eq!(default.index, 0);
    }

    #[test]
    fn test_default_sink_name_with_nul_rejected() {
        let connector = MemoryConnector::new(server());
        let mut session = connector.connect().unwrap();

        let err = set_default_sink(&mut session, "sink\0evil").unwrap_err();
        assert!(matches!(err, MixerError::InvalidArgument(_)));
        assert!(connector.requests().is_empty());
    }

    #[test]
    fn test_parse_pid() {
        assert_eq!(parse_pid("1234"), Some(1234));
        assert_eq!(parse_pid(" 77abc"), Some(77));
        assert_eq!(parse_pid("abc"), None);
        assert_eq!(parse_pid(""), None);
    }
}
