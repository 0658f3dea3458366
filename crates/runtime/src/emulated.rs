//! In-process emulated glove engine.
//!
//! The emulated engine serves the full wire contract over an in-memory
//! duplex pipe: a virtual dongle with a left and right glove, a profile
//! store with working/durable copies, coordinate-system configuration, and a
//! deterministic stand-in IK placement. It is the equivalent of the native
//! engine's debug device and is what the test suite (and the CLI's
//! `--emulated` mode) drives.
//!
//! Determinism: every generated sample and every IK solve is a pure function
//! of the sample sequence number, the selected working profile, and the
//! configured coordinate system.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use mg_protocol::{
    ArmSolve, CoordUp, DeviceType, ErrorCode, Finger, Hand, HandProfile, HandRaw, Handedness,
    IkInput, IkProfile, IkSolve, JOINTS_PER_FINGER, Pose, Quat, SENSORS_PER_GLOVE, Vec3,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream, ReadHalf, WriteHalf};
use tokio::sync::mpsc;

use crate::connection::{ErrorPayload, Request, Response};
use crate::error::{Error, Result};
use crate::transport::{PipeTransport, TransportParts};

/// File the durable profile set is committed to under the storage directory.
pub const PROFILES_FILE: &str = "profiles.json";

/// Configuration for [`EmulatedEngine::spawn`].
#[derive(Debug, Clone)]
pub struct EmulatedEngineOptions {
    /// Directory holding `profiles.json`. `None` keeps the durable copy in
    /// memory only, so commits do not survive a respawn.
    pub storage_dir: Option<PathBuf>,
    /// Whether the virtual dongle (and its two gloves) is present at
    /// startup.
    pub debug_device: bool,
    /// Spacing between generated device samples.
    pub sample_interval: Duration,
}

impl Default for EmulatedEngineOptions {
    fn default() -> Self {
        EmulatedEngineOptions {
            storage_dir: None,
            debug_device: true,
            sample_interval: Duration::from_millis(11),
        }
    }
}

/// One named profile as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct StoredProfile {
    name: String,
    profile: IkProfile,
}

impl StoredProfile {
    fn default_set() -> Vec<StoredProfile> {
        vec![StoredProfile {
            name: "default".to_string(),
            profile: IkProfile::default(),
        }]
    }
}

/// Wire-level failure: the code is authoritative, the message is context.
type WireError = (ErrorCode, String);

struct EngineState {
    initialized: bool,
    shut_down: bool,
    up: CoordUp,
    handedness: Handedness,
    debug_device: bool,
    radio_channel: u32,
    /// Working copies, mutated by set/select/create.
    working: Vec<StoredProfile>,
    /// Durable snapshot, replaced by commit, restored by revert.
    durable: Vec<StoredProfile>,
    selected: usize,
    storage_dir: Option<PathBuf>,
    seq: u64,
}

impl EngineState {
    fn load(options: &EmulatedEngineOptions) -> Result<Self> {
        let stored = match &options.storage_dir {
            Some(dir) => {
                let path = dir.join(PROFILES_FILE);
                if path.exists() {
                    let bytes = std::fs::read(&path)
                        .map_err(|e| Error::Filesystem(format!("read {}: {e}", path.display())))?;
                    serde_json::from_slice(&bytes)
                        .map_err(|e| Error::Filesystem(format!("parse {}: {e}", path.display())))?
                } else {
                    StoredProfile::default_set()
                }
            }
            None => StoredProfile::default_set(),
        };

        Ok(EngineState {
            initialized: false,
            shut_down: false,
            up: CoordUp::Y,
            handedness: Handedness::Right,
            debug_device: options.debug_device,
            radio_channel: 0,
            durable: stored.clone(),
            working: stored,
            selected: 0,
            storage_dir: options.storage_dir.clone(),
            seq: 0,
        })
    }

    fn connected(&self, _device: DeviceType) -> bool {
        self.debug_device
    }

    fn selected_profile(&self) -> &StoredProfile {
        &self.working[self.selected]
    }

    fn commit(&mut self) -> std::result::Result<(), WireError> {
        if let Some(dir) = &self.storage_dir {
            let path = dir.join(PROFILES_FILE);
            let bytes = serde_json::to_vec_pretty(&self.working).map_err(|e| {
                (
                    ErrorCode::FilesystemError,
                    format!("encode profiles: {e}"),
                )
            })?;
            std::fs::write(&path, bytes).map_err(|e| {
                (
                    ErrorCode::FilesystemError,
                    format!("write {}: {e}", path.display()),
                )
            })?;
        }
        // The durable snapshot changes only once the write succeeded.
        self.durable = self.working.clone();
        Ok(())
    }

    fn revert(&mut self) {
        self.working = self.durable.clone();
        if self.selected >= self.working.len() {
            self.selected = self.working.len().saturating_sub(1);
        }
    }
}

/// The in-process engine. Spawn it to get client-side transport parts wired
/// to a running engine task.
pub struct EmulatedEngine;

impl EmulatedEngine {
    /// Start the emulated engine and return the client side of its pipe.
    ///
    /// The engine tasks exit when the returned transport is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Filesystem`] if the profile storage exists but
    /// cannot be read or parsed.
    pub fn spawn(options: EmulatedEngineOptions) -> Result<TransportParts> {
        let state = Arc::new(Mutex::new(EngineState::load(&options)?));

        // Pipe A carries engine -> client, pipe B client -> engine.
        let (client_read, engine_write) = tokio::io::duplex(256 * 1024);
        let (engine_read, client_write) = tokio::io::duplex(256 * 1024);

        let (transport, message_rx) = PipeTransport::new(client_write, client_read);
        let parts = transport.into_transport_parts(message_rx);

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel::<Value>();

        tokio::spawn(write_loop(engine_write, outbound_rx));
        let ticker = tokio::spawn(sample_ticker(
            outbound_tx.clone(),
            Arc::clone(&state),
            options.sample_interval,
        ));
        tokio::spawn(serve_requests(engine_read, outbound_tx, state, ticker));

        Ok(parts)
    }
}

async fn write_loop(stream: DuplexStream, mut outbound_rx: mpsc::UnboundedReceiver<Value>) {
    let (_, mut writer) = tokio::io::split(stream);
    while let Some(message) = outbound_rx.recv().await {
        if write_frame(&mut writer, &message).await.is_err() {
            // Client side went away; nothing left to deliver to.
            return;
        }
    }
}

async fn serve_requests(
    stream: DuplexStream,
    outbound_tx: mpsc::UnboundedSender<Value>,
    state: Arc<Mutex<EngineState>>,
    ticker: tokio::task::JoinHandle<()>,
) {
    let (mut reader, _) = tokio::io::split(stream);

    loop {
        let request = match read_frame(&mut reader).await {
            Ok(Some(value)) => value,
            Ok(None) => break,
            Err(e) => {
                tracing::debug!("emulated engine read error: {e}");
                break;
            }
        };

        let request: Request = match serde_json::from_value(request) {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("emulated engine dropping malformed request: {e}");
                continue;
            }
        };

        // Device presence events must precede the response so a caller that
        // has observed the response cannot read a stale buffered sample.
        let (reply, events) = handle_request(&state, &request.method, request.params);
        for event in events {
            let _ = outbound_tx.send(event);
        }

        let response = match reply {
            Ok(result) => Response {
                id: request.id,
                result: Some(result),
                error: None,
            },
            Err((code, message)) => Response {
                id: request.id,
                result: None,
                error: Some(ErrorPayload {
                    code: code.code(),
                    message,
                }),
            },
        };

        let value = match serde_json::to_value(&response) {
            Ok(v) => v,
            Err(e) => {
                tracing::error!("emulated engine failed to encode response: {e}");
                continue;
            }
        };
        if outbound_tx.send(value).is_err() {
            break;
        }

        // An acknowledged shutdown closes the pipe: the queued response is
        // flushed, then the client observes EOF.
        if state.lock().shut_down {
            break;
        }
    }

    ticker.abort();
}

async fn sample_ticker(
    outbound_tx: mpsc::UnboundedSender<Value>,
    state: Arc<Mutex<EngineState>>,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        let events: Vec<Value> = {
            let mut state = state.lock();
            if !state.initialized || state.shut_down || !state.debug_device {
                continue;
            }
            state.seq += 1;
            let seq = state.seq;
            let up = state.up;
            let handedness = state.handedness;
            let hand_profile = state.selected_profile().profile.hand_profile;

            DeviceType::ALL
                .iter()
                .map(|&device| {
                    let hand = synthesize_hand(device, seq, &hand_profile, up, handedness);
                    json!({
                        "method": "sample",
                        "params": {"device": device, "seq": seq, "hand": hand},
                    })
                })
                .collect()
        };

        for event in events {
            if outbound_tx.send(event).is_err() {
                return;
            }
        }
    }
}

async fn read_frame(reader: &mut ReadHalf<DuplexStream>) -> Result<Option<Value>> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(Error::TransportError(format!("read failed: {e}"))),
    }
    let len = u32::from_le_bytes(len_buf) as usize;
    let mut payload = vec![0u8; len];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(|e| Error::TransportError(format!("read failed mid-frame: {e}")))?;
    Ok(Some(serde_json::from_slice(&payload)?))
}

async fn write_frame(writer: &mut WriteHalf<DuplexStream>, message: &Value) -> Result<()> {
    let payload = serde_json::to_vec(message)?;
    writer
        .write_all(&(payload.len() as u32).to_le_bytes())
        .await
        .map_err(|e| Error::TransportError(format!("write failed: {e}")))?;
    writer
        .write_all(&payload)
        .await
        .map_err(|e| Error::TransportError(format!("write failed: {e}")))?;
    writer
        .flush()
        .await
        .map_err(|e| Error::TransportError(format!("flush failed: {e}")))?;
    Ok(())
}

fn invalid_argument(message: impl Into<String>) -> WireError {
    (ErrorCode::InvalidArgument, message.into())
}

fn parse_params<T: serde::de::DeserializeOwned>(
    params: Value,
) -> std::result::Result<T, WireError> {
    serde_json::from_value(params).map_err(|e| invalid_argument(format!("bad parameters: {e}")))
}

/// Handle one request; returns the reply plus events to send ahead of it.
fn handle_request(
    state: &Mutex<EngineState>,
    method: &str,
    params: Value,
) -> (std::result::Result<Value, WireError>, Vec<Value>) {
    let mut state = state.lock();
    let mut events = Vec::new();

    // Session gating comes before everything else: the engine is unusable
    // before `initialize` and after `shutdown`.
    if method == "initialize" {
        let reply = if state.initialized {
            Err((
                ErrorCode::InvalidSession,
                "session already initialized".to_string(),
            ))
        } else {
            state.initialized = true;
            Ok(json!({"sessionId": 1}))
        };
        return (reply, events);
    }
    if !state.initialized || state.shut_down {
        return (
            Err((
                ErrorCode::InvalidSession,
                "session is not initialized or was shut down".to_string(),
            )),
            events,
        );
    }

    let reply = match method {
        "shutdown" => {
            state.shut_down = true;
            Ok(json!({}))
        }
        "setCoordinateSystem" => {
            #[derive(Deserialize)]
            struct Params {
                up: CoordUp,
                handedness: Handedness,
            }
            parse_params::<Params>(params).map(|p| {
                state.up = p.up;
                state.handedness = p.handedness;
                json!({})
            })
        }
        "isConnected" => parse_params::<DeviceParams>(params)
            .map(|p| json!({"connected": state.connected(p.device)})),
        "batteryVoltage" => with_connected_device(&state, params, |device| {
            // Deterministic per-device telemetry.
            let millivolts: u16 = match device {
                DeviceType::Left => 3974,
                DeviceType::Right => 3921,
            };
            json!({"millivolts": millivolts})
        }),
        "batteryPercent" => with_connected_device(&state, params, |device| {
            let percent: u8 = match device {
                DeviceType::Left => 87,
                DeviceType::Right => 82,
            };
            json!({"percent": percent})
        }),
        "signalStrength" => with_connected_device(&state, params, |device| {
            let rssi: i16 = match device {
                DeviceType::Left => -41,
                DeviceType::Right => -44,
            };
            json!({"rssi": rssi})
        }),
        "vibrate" => {
            #[derive(Deserialize)]
            #[serde(rename_all = "camelCase")]
            struct Params {
                device: DeviceType,
                power: f64,
                duration_ms: u16,
            }
            parse_params::<Params>(params).and_then(|p| {
                if !p.power.is_finite() || !(0.0..=1.0).contains(&p.power) {
                    return Err(invalid_argument(format!(
                        "vibration power {} outside [0, 1]",
                        p.power
                    )));
                }
                if !state.connected(p.device) {
                    return Err((ErrorCode::Disconnected, format!("{} not connected", p.device)));
                }
                tracing::debug!(
                    device = %p.device,
                    power = p.power,
                    duration_ms = p.duration_ms,
                    "emulated vibration"
                );
                Ok(json!({}))
            })
        }
        "profileCount" => Ok(json!({"count": state.working.len()})),
        "profileName" => {
            #[derive(Deserialize)]
            struct Params {
                index: usize,
            }
            parse_params::<Params>(params).and_then(|p| {
                state
                    .working
                    .get(p.index)
                    .map(|s| json!({"name": s.name}))
                    .ok_or_else(|| {
                        invalid_argument(format!("profile index {} out of range", p.index))
                    })
            })
        }
        "createProfile" => {
            #[derive(Deserialize)]
            struct Params {
                name: String,
            }
            parse_params::<Params>(params).map(|p| {
                state.working.push(StoredProfile {
                    name: p.name,
                    profile: IkProfile::default(),
                });
                json!({"index": state.working.len() - 1})
            })
        }
        "selectProfile" => {
            #[derive(Deserialize)]
            struct Params {
                index: usize,
            }
            parse_params::<Params>(params).and_then(|p| {
                if p.index >= state.working.len() {
                    return Err(invalid_argument(format!(
                        "profile index {} out of range",
                        p.index
                    )));
                }
                state.selected = p.index;
                Ok(json!({}))
            })
        }
        "getProfile" => serde_json::to_value(state.selected_profile().profile)
            .map_err(|e| (ErrorCode::GenericError, e.to_string())),
        "setProfile" => parse_params::<IkProfile>(params).map(|profile| {
            let selected = state.selected;
            state.working[selected].profile = profile;
            json!({})
        }),
        "commitProfiles" => state.commit().map(|_| json!({})),
        "revertProfiles" => {
            state.revert();
            Ok(json!({}))
        }
        "updateIk" => parse_params::<IkInput>(params).and_then(|input| {
            if !input.is_valid() {
                return Err(invalid_argument(
                    "pose rotation is a degenerate quaternion",
                ));
            }
            let solve = solve_ik(
                &input,
                &state.selected_profile().profile,
                state.up,
                state.handedness,
            );
            serde_json::to_value(solve).map_err(|e| (ErrorCode::GenericError, e.to_string()))
        }),
        "dongleIds" => {
            let ids: Vec<u32> = if state.debug_device { vec![0x4D47_0001] } else { vec![] };
            Ok(json!({"ids": ids}))
        }
        "setChannel" => {
            #[derive(Deserialize)]
            struct Params {
                channel: u32,
            }
            parse_params::<Params>(params).and_then(|p| {
                if p.channel > 125 {
                    return Err(invalid_argument(format!(
                        "radio channel {} out of range",
                        p.channel
                    )));
                }
                state.radio_channel = p.channel;
                Ok(json!({}))
            })
        }
        "addDebugDevice" => {
            if !state.debug_device {
                state.debug_device = true;
                for device in DeviceType::ALL {
                    events.push(json!({
                        "method": "deviceConnected",
                        "params": {"device": device},
                    }));
                }
            }
            Ok(json!({}))
        }
        "removeDebugDevice" => {
            if state.debug_device {
                state.debug_device = false;
                for device in DeviceType::ALL {
                    events.push(json!({
                        "method": "deviceDisconnected",
                        "params": {"device": device},
                    }));
                }
            }
            Ok(json!({}))
        }
        other => Err((
            ErrorCode::NotImplemented,
            format!("unknown method: {other}"),
        )),
    };

    (reply, events)
}

#[derive(Deserialize)]
struct DeviceParams {
    device: DeviceType,
}

fn with_connected_device(
    state: &EngineState,
    params: Value,
    f: impl FnOnce(DeviceType) -> Value,
) -> std::result::Result<Value, WireError> {
    let p: DeviceParams = parse_params(params)?;
    if !state.connected(p.device) {
        return Err((ErrorCode::Disconnected, format!("{} not connected", p.device)));
    }
    Ok(f(p.device))
}

/// World up direction for the configured coordinate system.
fn up_vector(up: CoordUp) -> Vec3 {
    match up {
        CoordUp::X => Vec3::new(1.0, 0.0, 0.0),
        CoordUp::Y => Vec3::new(0.0, 1.0, 0.0),
        CoordUp::Z => Vec3::new(0.0, 0.0, 1.0),
    }
}

/// Lateral (toward the right shoulder) direction. The base axis follows the
/// up axis; handedness flips it.
fn lateral_vector(up: CoordUp, handedness: Handedness) -> Vec3 {
    let base = match up {
        CoordUp::X => Vec3::new(0.0, 1.0, 0.0),
        CoordUp::Y => Vec3::new(1.0, 0.0, 0.0),
        CoordUp::Z => Vec3::new(1.0, 0.0, 0.0),
    };
    match handedness {
        Handedness::Right => base,
        Handedness::Left => base.scale(-1.0),
    }
}

/// Deterministic stand-in for the engine's skeletal model: a pure function
/// of (device, seq, profile, coordinate system). Finger poses accumulate the
/// profile's bone lengths along a curled chain, so profile scaling is
/// observable in the output.
fn synthesize_hand(
    device: DeviceType,
    seq: u64,
    profile: &HandProfile,
    up: CoordUp,
    handedness: Handedness,
) -> Hand {
    let phase = seq as f64 * 0.04;
    let side = match device {
        DeviceType::Left => -1.0,
        DeviceType::Right => 1.0,
    };

    let up_axis = up_vector(up);
    let lateral = lateral_vector(up, handedness);
    let forward = up_axis.cross(lateral).normalized();
    let bend_axis = lateral;

    let mut sensors = [0.0f64; SENSORS_PER_GLOVE];
    for (i, sensor) in sensors.iter_mut().enumerate() {
        *sensor = 0.5 + 0.5 * (phase + i as f64 * 0.6).sin();
    }

    let imu_hand = Quat::from_axis_angle(up_axis, 0.3 * phase.sin() * side);
    let imu_thumb = Quat::from_axis_angle(up_axis, 0.3 * phase.sin() * side + 0.15);
    let raw = HandRaw {
        imu: [imu_hand, imu_thumb],
        finger_sensors: sensors,
    };

    let mut fingers = [Finger::default(); 5];
    for (k, finger) in fingers.iter_mut().enumerate() {
        // Hand order is thumb..pinky; the raw pairs run little finger first,
        // even index = lower sensor.
        let pair = 4 - k;
        let lower = sensors[2 * pair];
        let upper = sensors[2 * pair + 1];
        let curl = 1.3 * 0.5 * (lower + upper);

        let spread = lateral.scale(side * (k as f64 - 2.0) * 0.02);
        let mut position = spread;
        let mut joints = [Pose::IDENTITY; JOINTS_PER_FINGER];
        joints[0] = Pose::new(position, imu_hand);

        let weights = [0.2, 0.5, 0.8, 1.0];
        for (j, weight) in weights.iter().enumerate() {
            let rotation = imu_hand.mul(Quat::from_axis_angle(bend_axis, curl * weight));
            position = position.add(rotation.rotate(forward).scale(profile.fingers[k].bones[j]));
            joints[j + 1] = Pose::new(position, rotation);
        }
        finger.joints = joints;
    }

    Hand {
        raw,
        wrist: imu_hand,
        fingers,
    }
}

/// Deterministic stand-in placement: shoulders hang off the neck root by the
/// profile's neck and shoulder lengths; the upper arm points from the
/// shoulder toward the supplied wrist. Honors the contract (determinism,
/// field ownership, profile and coordinate-system dependence), not the
/// proprietary solve.
fn solve_ik(input: &IkInput, profile: &IkProfile, up: CoordUp, handedness: Handedness) -> IkSolve {
    let up_axis = up_vector(up);
    let lateral = lateral_vector(up, handedness);

    let neck_drop = profile.upper_neck_length + profile.lower_neck_length;
    let neck_root = input
        .head
        .translation
        .sub(up_axis.scale(neck_drop))
        .add(input.head.rotation.rotate(profile.upper_neck_offset));

    let solve_arm = |sign: f64, lower_arm: &Pose| {
        let shoulder_pos = neck_root.add(lateral.scale(sign * profile.shoulder_length));
        let to_wrist = lower_arm.translation.sub(shoulder_pos);
        let direction = if to_wrist.length() > 1e-9 {
            to_wrist.normalized()
        } else {
            up_axis.scale(-1.0)
        };
        ArmSolve {
            shoulder: Pose::new(shoulder_pos, input.head.rotation),
            upper_arm: Quat::between(up_axis.scale(-1.0), direction),
        }
    };

    IkSolve {
        left: solve_arm(-1.0, &input.left_lower_arm),
        right: solve_arm(1.0, &input.right_lower_arm),
    }
}
